use std::{mem, rc::Rc, task::Poll};

use crate::runtime::{
    device::{detect_touch, is_pressed, Button, Device, RunContext, Touch},
    entry::Entry,
    selection::{Selection, RUN_MIN},
    task::{race, Fault, Routine},
    variant::VariantTable,
    watchdog::Watchdog,
};

/// A run's setup call, producing its handles.
pub type Setup = Rc<dyn Fn(&mut dyn Device) -> Result<RunContext, Fault>>;

/// What a run factory hands the menu: the setup call,
/// and the variants the entry point chooses from.
pub struct RunBundle {
    pub setup: Setup,
    pub variants: VariantTable,
    /// Forces a variant by name, when it exists.
    pub requested: Option<String>,
}

impl RunBundle {
    pub fn entry(&self, context: &RunContext) -> Result<Entry, Fault> {
        let requested = self.requested.as_deref();
        match self.variants.resolve(requested) {
            Some(variant) => Ok(Entry::new(variant, context)),
            None => Err(Fault::Failed(format!(
                "no variant named `{}`",
                self.variants.resolve_name(requested)
            ))),
        }
    }
}

/// Builds a fresh bundle each time its run is launched.
pub type RunFactory = Rc<dyn Fn() -> RunBundle>;

/// The menu's runs, keyed `"1"..="N"` in registration order.
#[derive(Default)]
pub struct RunRegistry {
    runs: Vec<(String, RunFactory)>,
}

impl RunRegistry {
    pub fn new() -> RunRegistry {
        RunRegistry::default()
    }

    /// Registers the next run, returning its key.
    pub fn register(&mut self, factory: RunFactory) -> String {
        let key = (self.runs.len() + RUN_MIN as usize).to_string();
        self.runs.push((key.clone(), factory));
        key
    }

    pub fn get(&self, key: &str) -> Option<&RunFactory> {
        self.runs.iter().find(|(k, _)| k == key).map(|(_, f)| f)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.runs.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// How a launched run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Stopped by the operator; never reported as an error.
    Cancelled,
    Failed(String),
}

enum State {
    Idle,
    /// Waiting for a navigation button to be let go.
    Releasing(Button),
    /// The touch sensor is held; the run starts on release.
    Armed,
    Running {
        routine: Box<dyn Routine>,
        context: Rc<RunContext>,
    },
    /// Waiting for touch and centre to be let go after a run.
    Settling,
}

/// The on-hub menu loop, one `step` per tick.
/// Only one run is ever in flight: while a run is going,
/// steps only drive the run and its watchdog.
pub struct Menu {
    registry: RunRegistry,
    selection: Selection,
    touch: Option<Rc<dyn Touch>>,
    state: State,
    last_context: Option<Rc<RunContext>>,
}

impl Menu {
    pub fn new(registry: RunRegistry, device: &mut dyn Device) -> Menu {
        let max = u8::try_from(registry.len()).unwrap_or(u8::MAX);
        Menu {
            selection: Selection::load(device, max),
            touch: detect_touch(device),
            registry,
            state: State::Idle,
            last_context: None,
        }
    }

    pub fn selected(&self) -> u8 {
        self.selection.value()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    fn touch_pressed(&self) -> bool {
        match &self.touch {
            Some(touch) => touch.pressed().unwrap_or(false),
            None => false,
        }
    }

    /// Advances the menu by one tick.
    /// Returns how a run ended, on the tick it ends.
    pub fn step(&mut self, device: &mut dyn Device) -> Option<Outcome> {
        let (next, outcome) = match mem::replace(&mut self.state, State::Idle) {
            State::Idle => (self.idle(device), None),
            State::Releasing(button) if is_pressed(device, button) => (State::Releasing(button), None),
            State::Releasing(button) => {
                match button {
                    Button::Left => self.selection.previous(),
                    Button::Right => self.selection.next(),
                    _ => (),
                }
                self.selection.store(device);
                (State::Idle, None)
            },
            State::Armed if self.touch_pressed() => (State::Armed, None),
            State::Armed => {
                self.selection.store(device);
                match self.launch(device) {
                    Ok(state) => (state, None),
                    Err(fault) => (State::Settling, Some(self.fail(device, fault))),
                }
            },
            State::Running {
                mut routine,
                context,
            } => match routine.resume(device) {
                Ok(Poll::Pending) => (State::Running { routine, context }, None),
                Ok(Poll::Ready(())) => {
                    context.stop_all();
                    (State::Settling, Some(Outcome::Completed))
                },
                Err(fault) => (State::Settling, Some(self.fail(device, fault))),
            },
            State::Settling if self.touch_pressed() || is_pressed(device, Button::Center) => {
                (State::Settling, None)
            },
            State::Settling => (State::Idle, None),
        };

        self.state = next;
        outcome
    }

    fn idle(&mut self, device: &mut dyn Device) -> State {
        let _ = device.display(&self.selection.key());
        if self.touch_pressed() {
            return State::Armed;
        }

        let pressed = device.pressed().unwrap_or_default();
        if pressed.contains(&Button::Left) {
            State::Releasing(Button::Left)
        } else if pressed.contains(&Button::Right) {
            State::Releasing(Button::Right)
        } else {
            State::Idle
        }
    }

    /// Builds the selected run and starts it under a watchdog.
    fn launch(&mut self, device: &mut dyn Device) -> Result<State, Fault> {
        let factory = match self.registry.get(&self.selection.key()) {
            Some(factory) => Rc::clone(factory),
            None => return Ok(State::Idle),
        };

        let bundle = factory();
        let context = Rc::new((bundle.setup)(device)?);
        self.last_context = Some(Rc::clone(&context));

        let entry = bundle.entry(&context)?;
        let routine = Box::new(race(Watchdog::new(Rc::clone(&context)), entry));
        Ok(State::Running { routine, context })
    }

    /// A cancelled run was already stopped by the watchdog;
    /// a failed one is reported, then stopped.
    fn fail(&mut self, device: &mut dyn Device, fault: Fault) -> Outcome {
        match fault {
            Fault::StopRequested => Outcome::Cancelled,
            Fault::Failed(reason) => {
                device.report(&format!("Run failed: {}", reason));
                if let Some(context) = &self.last_context {
                    context.stop_all();
                }
                Outcome::Failed(reason)
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::runtime::{
        device::{
            mock::{motors, MockDevice, MockMotor, MockTouch},
            Port,
        },
        task::{from_fn, Step},
        variant::{RoutineFactory, Variant},
    };

    fn routine(body: impl Fn() -> Step + 'static) -> RoutineFactory {
        let body = Rc::new(body);
        Rc::new(move |_: &RunContext| {
            let body = Rc::clone(&body);
            Box::new(from_fn(move |_| body())) as Box<dyn Routine>
        })
    }

    fn registry(count: usize, run: RoutineFactory, ctx: &RunContext) -> RunRegistry {
        let mut registry = RunRegistry::new();
        for _ in 0..count {
            let (run, ctx) = (Rc::clone(&run), ctx.clone());
            registry.register(Rc::new(move || {
                let ctx = ctx.clone();
                let mut variants = VariantTable::new("m01");
                variants.insert(Variant::new("m01", Rc::clone(&run)));
                RunBundle {
                    setup: Rc::new(move |_: &mut dyn Device| Ok::<RunContext, Fault>(ctx.clone())),
                    variants,
                    requested: None,
                }
            }));
        }
        registry
    }

    struct Rig {
        device: MockDevice,
        touch: Rc<MockTouch>,
        motors: Vec<Rc<MockMotor>>,
        menu: Menu,
    }

    fn rig(count: usize, run: RoutineFactory) -> Rig {
        let (mut device, touch) = MockDevice::with_touch(Port::C);
        let (ctx, motors) = motors();
        let menu = Menu::new(registry(count, run, &ctx), &mut device);
        Rig {
            device,
            touch,
            motors,
            menu,
        }
    }

    impl Rig {
        fn step(&mut self) -> Option<Outcome> {
            self.menu.step(&mut self.device)
        }

        /// Press and release the touch sensor.
        fn launch(&mut self) {
            self.touch.held.set(true);
            assert_eq!(self.step(), None);
            assert_eq!(self.step(), None);
            self.touch.held.set(false);
            assert_eq!(self.step(), None);
            assert!(self.menu.is_running());
        }

        fn stops(&self) -> Vec<usize> {
            self.motors.iter().map(|m| m.stops.get()).collect()
        }
    }

    #[test]
    fn stop_cancels_a_stuck_run() {
        let mut rig = rig(1, routine(|| Ok(Poll::Pending)));
        rig.step();
        rig.launch();

        for _ in 0..10 {
            assert_eq!(rig.step(), None);
        }
        rig.device.held = vec![Button::Center];
        assert_eq!(rig.step(), Some(Outcome::Cancelled));
        assert_eq!(rig.stops(), vec![1; 5]);
        assert!(rig.device.reports.is_empty());

        // held centre keeps the menu settling, release returns to it
        assert_eq!(rig.step(), None);
        rig.device.held.clear();
        rig.step();
        rig.device.shown.clear();
        rig.step();
        assert_eq!(rig.device.shown, vec!["1"]);
        assert_eq!(rig.stops(), vec![1; 5]);
    }

    #[test]
    fn failures_are_reported_and_stopped() {
        let mut rig = rig(2, routine(|| Err(Fault::Failed("lift stalled".into()))));
        rig.touch.held.set(true);
        rig.step();
        rig.touch.held.set(false);
        assert_eq!(rig.step(), None);
        assert_eq!(rig.step(), Some(Outcome::Failed("lift stalled".into())));
        assert_eq!(rig.device.reports, vec!["Run failed: lift stalled"]);
        assert_eq!(rig.stops(), vec![1; 5]);
        assert!(!rig.menu.is_running());
    }

    #[test]
    fn completed_runs_stop_their_motors() {
        let mut rig = rig(1, routine(|| Ok(Poll::Ready(()))));
        rig.launch();
        assert_eq!(rig.step(), Some(Outcome::Completed));
        assert_eq!(rig.stops(), vec![1; 5]);
        assert_eq!(rig.device.storage, vec![1]);
    }

    #[test]
    fn navigation_wraps_and_persists() {
        let mut rig = rig(3, routine(|| Ok(Poll::Ready(()))));
        assert_eq!(rig.menu.selected(), 1);

        rig.device.held = vec![Button::Left];
        rig.step();
        rig.step();
        assert_eq!(rig.menu.selected(), 1);
        rig.device.held.clear();
        rig.step();
        assert_eq!(rig.menu.selected(), 3);
        assert_eq!(rig.device.storage, vec![3]);

        rig.device.held = vec![Button::Right];
        rig.step();
        rig.device.held.clear();
        rig.step();
        assert_eq!(rig.menu.selected(), 1);
        assert_eq!(rig.device.storage, vec![1]);
    }

    #[test]
    fn starts_from_the_stored_selection() {
        let (ctx, _) = motors();
        let run = routine(|| Ok(Poll::Ready(())));

        let mut device = MockDevice {
            storage: vec![2],
            ..MockDevice::default()
        };
        assert_eq!(Menu::new(registry(3, run.clone(), &ctx), &mut device).selected(), 2);

        device.storage = vec![9];
        assert_eq!(Menu::new(registry(3, run, &ctx), &mut device).selected(), 1);
    }

    #[test]
    fn without_touch_nothing_launches() {
        let (ctx, motors) = motors();
        let mut device = MockDevice::default();
        let mut menu = Menu::new(registry(1, routine(|| Ok(Poll::Ready(()))), &ctx), &mut device);
        for _ in 0..5 {
            assert_eq!(menu.step(&mut device), None);
        }
        assert!(!menu.is_running());
        assert_eq!(motors[0].stops.get(), 0);
    }

    #[test]
    fn registry_keys() {
        let (ctx, _) = motors();
        let registry = registry(3, routine(|| Ok(Poll::Ready(()))), &ctx);
        assert_eq!(registry.keys(), vec!["1", "2", "3"]);
        assert!(registry.get("0").is_none());
        assert!(registry.get("3").is_some());
    }
}
