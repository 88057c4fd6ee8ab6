use std::{fmt, rc::Rc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum Button {
    Left,
    Right,
    Center,
    Bluetooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
}

/// Probed in this order; the first port with a sensor wins.
pub const PORTS: [Port; 6] = [Port::A, Port::B, Port::C, Port::D, Port::E, Port::F];

/// A device call that failed.
/// Always recovered from locally, by treating the feature as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceError(pub String);

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Device Error: {}", self.0)
    }
}

pub trait Touch {
    fn pressed(&self) -> Result<bool, DeviceError>;
}

pub trait Motor {
    fn stop(&self) -> Result<(), DeviceError>;
}

/// The hub, as the menu sees it.
pub trait Device {
    fn display(&mut self, text: &str) -> Result<(), DeviceError>;
    fn pressed(&self) -> Result<Vec<Button>, DeviceError>;
    fn storage_read(&self, offset: usize, len: usize) -> Result<Vec<u8>, DeviceError>;
    fn storage_write(&mut self, offset: usize, bytes: &[u8]) -> Result<(), DeviceError>;
    fn probe_touch(&mut self, port: Port) -> Result<Rc<dyn Touch>, DeviceError>;
    /// Prints an operator-facing message.
    fn report(&mut self, message: &str);
}

/// Whether `button` is held. A failing query counts as nothing held.
pub fn is_pressed(device: &dyn Device, button: Button) -> bool {
    device.pressed().map(|b| b.contains(&button)).unwrap_or(false)
}

/// The first touch sensor found, if any.
pub fn detect_touch(device: &mut dyn Device) -> Option<Rc<dyn Touch>> {
    PORTS.iter().find_map(|port| device.probe_touch(*port).ok())
}

/// The handles a run's setup call returns, minus the hub itself.
#[derive(Clone)]
pub struct RunContext {
    pub robot: Rc<dyn Motor>,
    pub left_wheel: Rc<dyn Motor>,
    pub right_wheel: Rc<dyn Motor>,
    pub left_lift: Rc<dyn Motor>,
    pub right_lift: Rc<dyn Motor>,
}

impl RunContext {
    pub fn motors(&self) -> [&Rc<dyn Motor>; 5] {
        [
            &self.robot,
            &self.left_wheel,
            &self.right_wheel,
            &self.left_lift,
            &self.right_lift,
        ]
    }

    /// Best effort: a motor failing to stop doesn't keep
    /// the others from being stopped.
    pub fn stop_all(&self) {
        for motor in self.motors().iter() {
            let _ = motor.stop();
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::cell::Cell;

    use super::*;

    #[derive(Default)]
    pub struct MockTouch {
        pub held: Cell<bool>,
    }

    impl Touch for MockTouch {
        fn pressed(&self) -> Result<bool, DeviceError> {
            Ok(self.held.get())
        }
    }

    #[derive(Default)]
    pub struct MockMotor {
        pub stops: Cell<usize>,
        pub broken: bool,
    }

    impl Motor for MockMotor {
        fn stop(&self) -> Result<(), DeviceError> {
            self.stops.set(self.stops.get() + 1);
            if self.broken {
                Err(DeviceError("motor unplugged".into()))
            } else {
                Ok(())
            }
        }
    }

    /// A scriptable hub: tests set what is held before each tick.
    #[derive(Default)]
    pub struct MockDevice {
        pub held: Vec<Button>,
        pub touch: Option<(Port, Rc<MockTouch>)>,
        pub storage: Vec<u8>,
        pub storage_broken: bool,
        pub shown: Vec<String>,
        pub reports: Vec<String>,
    }

    impl MockDevice {
        pub fn with_touch(port: Port) -> (MockDevice, Rc<MockTouch>) {
            let touch = Rc::new(MockTouch::default());
            let device = MockDevice {
                touch: Some((port, Rc::clone(&touch))),
                ..MockDevice::default()
            };
            (device, touch)
        }
    }

    impl Device for MockDevice {
        fn display(&mut self, text: &str) -> Result<(), DeviceError> {
            self.shown.push(text.to_string());
            Ok(())
        }

        fn pressed(&self) -> Result<Vec<Button>, DeviceError> {
            Ok(self.held.clone())
        }

        fn storage_read(&self, offset: usize, len: usize) -> Result<Vec<u8>, DeviceError> {
            if self.storage_broken {
                return Err(DeviceError("storage unavailable".into()));
            }
            Ok(self.storage.iter().skip(offset).take(len).copied().collect())
        }

        fn storage_write(&mut self, offset: usize, bytes: &[u8]) -> Result<(), DeviceError> {
            if self.storage_broken {
                return Err(DeviceError("storage unavailable".into()));
            }
            if self.storage.len() < offset + bytes.len() {
                self.storage.resize(offset + bytes.len(), 0);
            }
            self.storage[offset..offset + bytes.len()].copy_from_slice(bytes);
            Ok(())
        }

        fn probe_touch(&mut self, port: Port) -> Result<Rc<dyn Touch>, DeviceError> {
            match &self.touch {
                Some((at, touch)) if *at == port => Ok(Rc::clone(touch) as Rc<dyn Touch>),
                _ => Err(DeviceError(format!("no sensor on port {:?}", port))),
            }
        }

        fn report(&mut self, message: &str) {
            self.reports.push(message.to_string());
        }
    }

    pub fn motors() -> (RunContext, Vec<Rc<MockMotor>>) {
        let motors: Vec<Rc<MockMotor>> = (0..5).map(|_| Rc::new(MockMotor::default())).collect();
        let handle = |i: usize| Rc::clone(&motors[i]) as Rc<dyn Motor>;
        let ctx = RunContext {
            robot: handle(0),
            left_wheel: handle(1),
            right_wheel: handle(2),
            left_lift: handle(3),
            right_lift: handle(4),
        };
        (ctx, motors)
    }
}
