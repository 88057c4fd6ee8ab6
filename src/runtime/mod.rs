//! A host-side model of the menu program's runtime.
//! The hub runs cooperative tasks on a single thread; here each task
//! is a `Routine` resumed once per tick, so the menu, the stop watchdog
//! and run entries can be driven deterministically against a `Device`.
//!
//! The menu program's constants come from here, so the generated
//! runtime and this model can't drift apart on them.

pub mod device;
pub mod entry;
pub mod menu;
pub mod selection;
pub mod task;
pub mod variant;
pub mod watchdog;

pub use device::{Button, Device, DeviceError, Motor, Port, RunContext, Touch};
pub use entry::{Entry, GRACE_MS};
pub use menu::{Menu, Outcome, RunBundle, RunFactory, RunRegistry};
pub use selection::Selection;
pub use task::{Fault, Routine, POLL_MS};
pub use variant::{Capabilities, StopToken, Variant, VariantTable};
