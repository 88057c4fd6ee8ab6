use std::task::Poll;

use crate::runtime::{
    device::{Device, RunContext},
    task::{join, race, Delay, Routine, Step},
    variant::{StopToken, Variant},
};

/// How long a logger is given to notice its stop flag.
pub const GRACE_MS: u32 = 500;

enum Phase {
    Running,
    Grace(Delay),
}

/// The variant's run routine; with a stop token, it then sets
/// the token and waits out the grace period.
struct TimedRun {
    run: Box<dyn Routine>,
    stop: Option<StopToken>,
    phase: Phase,
}

impl Routine for TimedRun {
    fn resume(&mut self, device: &mut dyn Device) -> Step {
        if let Phase::Grace(delay) = &mut self.phase {
            return delay.resume(device);
        }
        if self.run.resume(device)?.is_pending() {
            return Ok(Poll::Pending);
        }

        match &self.stop {
            Some(token) => {
                token.set();
                self.phase = Phase::Grace(Delay::new(GRACE_MS));
                Ok(Poll::Pending)
            },
            None => Ok(Poll::Ready(())),
        }
    }
}

/// A run's entry point for one context.
/// Without a logger it is just the timed run. With one, the pair
/// is raced, or joined when a stop token lets the logger finish.
pub struct Entry {
    inner: Box<dyn Routine>,
}

impl Entry {
    pub fn new(variant: &Variant, context: &RunContext) -> Entry {
        let capabilities = &variant.capabilities;

        let logger = match &capabilities.logger {
            Some(factory) => factory(context),
            None => {
                return Entry {
                    inner: Box::new(TimedRun {
                        run: (variant.run)(context),
                        stop: None,
                        phase: Phase::Running,
                    }),
                }
            },
        };

        if let Some(token) = &capabilities.stop_flag {
            token.reset();
        }
        let timed = TimedRun {
            run: (variant.run)(context),
            stop: capabilities.stop_flag.clone(),
            phase: Phase::Running,
        };

        let inner: Box<dyn Routine> = match capabilities.stop_flag {
            Some(_) => Box::new(join(logger, timed)),
            None => Box::new(race(timed, logger)),
        };
        Entry { inner }
    }
}

impl Routine for Entry {
    fn resume(&mut self, device: &mut dyn Device) -> Step {
        self.inner.resume(device)
    }
}
