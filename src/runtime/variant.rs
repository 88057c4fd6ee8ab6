use std::{cell::Cell, rc::Rc};

use crate::runtime::{device::RunContext, task::Routine};

/// The variant chosen when no override is given and none is current.
pub const DEFAULT_VARIANT: &str = "default";

/// A flag shared by a run routine and its logger.
/// Setting it asks the logger to wind down.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Rc<Cell<bool>>);

impl StopToken {
    pub fn new() -> StopToken {
        StopToken::default()
    }

    pub fn set(&self) {
        self.0.set(true);
    }

    pub fn reset(&self) {
        self.0.set(false);
    }

    pub fn is_set(&self) -> bool {
        self.0.get()
    }
}

/// Builds a fresh routine for one run context.
pub type RoutineFactory = Rc<dyn Fn(&RunContext) -> Box<dyn Routine>>;

/// What a variant offers beyond its run routine.
/// Filled in when the variant is registered, never probed later.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub logger: Option<RoutineFactory>,
    pub stop_flag: Option<StopToken>,
}

#[derive(Clone)]
pub struct Variant {
    pub name: String,
    /// Whether the variant nominates itself as the active one.
    pub is_current: bool,
    pub run: RoutineFactory,
    pub capabilities: Capabilities,
}

impl Variant {
    pub fn new(name: &str, run: RoutineFactory) -> Variant {
        Variant {
            name: name.to_string(),
            is_current: false,
            run,
            capabilities: Capabilities::default(),
        }
    }

    pub fn current(mut self) -> Variant {
        self.is_current = true;
        self
    }

    pub fn with_logger(mut self, logger: RoutineFactory) -> Variant {
        self.capabilities.logger = Some(logger);
        self
    }

    pub fn with_stop_flag(mut self, token: StopToken) -> Variant {
        self.capabilities.stop_flag = Some(token);
        self
    }
}

/// A run's variants, in registration order.
#[derive(Clone)]
pub struct VariantTable {
    variants: Vec<Variant>,
    default: String,
}

impl Default for VariantTable {
    fn default() -> VariantTable {
        VariantTable::new(DEFAULT_VARIANT)
    }
}

impl VariantTable {
    pub fn new(default: &str) -> VariantTable {
        VariantTable {
            variants: vec![],
            default: default.to_string(),
        }
    }

    /// Adds a variant, replacing any with the same name in place.
    pub fn insert(&mut self, variant: Variant) {
        match self.variants.iter_mut().find(|v| v.name == variant.name) {
            Some(slot) => *slot = variant,
            None => self.variants.push(variant),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// The active variant's name: the override if it names a variant,
    /// else the first variant marked current, else the default.
    pub fn resolve_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        if let Some(name) = requested {
            if self.get(name).is_some() {
                return name;
            }
        }

        self.variants
            .iter()
            .find(|v| v.is_current)
            .map(|v| v.name.as_str())
            .unwrap_or(self.default.as_str())
    }

    pub fn resolve(&self, requested: Option<&str>) -> Option<&Variant> {
        self.get(self.resolve_name(requested))
    }
}
