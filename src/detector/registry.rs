use std::collections::HashMap;

use super::crossing::CrossingPolicy;
use super::momentum::MomentumPolicy;
use super::SignalPolicy;
use crate::errors::{AppError, AppResult};

type Factory = Box<dyn Fn() -> Box<dyn SignalPolicy> + Send + Sync>;

/// Named constructors for the available signal policies.
pub struct PolicyRegistry {
    factories: HashMap<&'static str, Factory>,
}

impl PolicyRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("momentum", || Box::new(MomentumPolicy));
        registry.register("crossing", || Box::new(CrossingPolicy));
        registry
    }

    pub fn register<F>(&mut self, id: &'static str, factory: F)
    where
        F: Fn() -> Box<dyn SignalPolicy> + Send + Sync + 'static,
    {
        self.factories.insert(id, Box::new(factory));
    }

    pub fn build(&self, id: &str) -> AppResult<Box<dyn SignalPolicy>> {
        let factory = self.factories.get(id).ok_or_else(|| {
            AppError::Config(format!(
                "signal policy '{id}' not registered (known: {})",
                self.ids().join(", ")
            ))
        })?;
        Ok(factory())
    }

    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.factories.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
