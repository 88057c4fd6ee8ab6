use std::{rc::Rc, task::Poll};

use crate::runtime::{
    device::{is_pressed, Button, Device, RunContext},
    task::{Fault, Routine, Step},
};

/// Raced against every run: a press of the centre button
/// stops each of the run's motors once, then cancels the run.
pub struct Watchdog {
    context: Rc<RunContext>,
}

impl Watchdog {
    pub fn new(context: Rc<RunContext>) -> Watchdog {
        Watchdog { context }
    }
}

impl Routine for Watchdog {
    fn resume(&mut self, device: &mut dyn Device) -> Step {
        if is_pressed(device, Button::Center) {
            self.context.stop_all();
            return Err(Fault::StopRequested);
        }
        Ok(Poll::Pending)
    }
}
