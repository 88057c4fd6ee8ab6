use std::{fmt, task::Poll};

use crate::runtime::device::Device;

/// Length of one scheduler tick, in milliseconds.
pub const POLL_MS: u32 = 20;

/// Why a routine stopped before finishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// The operator pressed stop; not an error.
    StopRequested,
    Failed(String),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::StopRequested => write!(f, "stop requested"),
            Fault::Failed(reason) => write!(f, "{}", reason),
        }
    }
}

pub type Step = Result<Poll<()>, Fault>;

/// A cooperatively scheduled task, resumed once per tick.
/// Routines never block; they return `Pending` to yield.
pub trait Routine {
    fn resume(&mut self, device: &mut dyn Device) -> Step;
}

impl<R: Routine + ?Sized> Routine for Box<R> {
    fn resume(&mut self, device: &mut dyn Device) -> Step {
        (**self).resume(device)
    }
}

/// A routine driven by a closure.
pub struct FnRoutine<F>(F);

impl<F: FnMut(&mut dyn Device) -> Step> Routine for FnRoutine<F> {
    fn resume(&mut self, device: &mut dyn Device) -> Step {
        (self.0)(device)
    }
}

pub fn from_fn<F: FnMut(&mut dyn Device) -> Step>(f: F) -> FnRoutine<F> {
    FnRoutine(f)
}

/// Waits at least `ms`, rounded up to whole ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delay {
    ticks: u32,
}

impl Delay {
    pub fn new(ms: u32) -> Delay {
        Delay {
            ticks: ms / POLL_MS + u32::from(ms % POLL_MS != 0),
        }
    }
}

impl Routine for Delay {
    fn resume(&mut self, _device: &mut dyn Device) -> Step {
        if self.ticks == 0 {
            return Ok(Poll::Ready(()));
        }
        self.ticks -= 1;
        Ok(Poll::Pending)
    }
}

/// Runs both routines until either finishes.
/// The first is resumed first within each tick.
pub struct Race<A, B> {
    first: A,
    second: B,
}

pub fn race<A: Routine, B: Routine>(first: A, second: B) -> Race<A, B> {
    Race { first, second }
}

impl<A: Routine, B: Routine> Routine for Race<A, B> {
    fn resume(&mut self, device: &mut dyn Device) -> Step {
        if self.first.resume(device)?.is_ready() {
            return Ok(Poll::Ready(()));
        }
        self.second.resume(device)
    }
}

/// Runs both routines until both finish.
pub struct Join<A, B> {
    first: Option<A>,
    second: Option<B>,
}

pub fn join<A: Routine, B: Routine>(first: A, second: B) -> Join<A, B> {
    Join {
        first: Some(first),
        second: Some(second),
    }
}

fn advance<R: Routine>(slot: &mut Option<R>, device: &mut dyn Device) -> Result<(), Fault> {
    if let Some(routine) = slot {
        if routine.resume(device)?.is_ready() {
            *slot = None;
        }
    }
    Ok(())
}

impl<A: Routine, B: Routine> Routine for Join<A, B> {
    fn resume(&mut self, device: &mut dyn Device) -> Step {
        advance(&mut self.first, device)?;
        advance(&mut self.second, device)?;

        if self.first.is_none() && self.second.is_none() {
            Ok(Poll::Ready(()))
        } else {
            Ok(Poll::Pending)
        }
    }
}

/// Resumes a routine until it finishes, at most `limit` ticks.
/// Returns the number of ticks taken.
pub fn run_to_end(routine: &mut dyn Routine, device: &mut dyn Device, limit: usize) -> Result<usize, Fault> {
    for tick in 1..=limit {
        if routine.resume(device)?.is_ready() {
            return Ok(tick);
        }
    }
    Err(Fault::Failed(format!("still running after {} ticks", limit)))
}
