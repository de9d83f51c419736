// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Target registry.
//!
//! Targets are registered as modules that can create a fresh [`Target`]
//! instance on request. Lookup is by name and ignores ASCII case. Loading
//! targets from shared libraries is left to callers; they register a module
//! wrapping whatever they loaded.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::target::Target;

pub trait TargetModule: Send + Sync {
    /// Name used for lookup, e.g. `km8`.
    fn target_id(&self) -> &'static str;

    /// One-line description for target listings.
    fn description(&self) -> &'static str {
        ""
    }

    fn create(&self) -> Box<dyn Target>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown target '{name}' (available: {})", .available.join(", "))]
    MissingTarget {
        name: String,
        available: Vec<String>,
    },
}

pub struct TargetRegistry {
    targets: BTreeMap<String, Box<dyn TargetModule>>,
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self {
            targets: BTreeMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::targets::km8::Km8TargetModule));
        registry
    }

    /// Register a module, replacing any module with the same name.
    pub fn register(&mut self, module: Box<dyn TargetModule>) {
        self.targets
            .insert(normalize_target(module.target_id()), module);
    }

    pub fn resolve(&self, name: &str) -> Result<Box<dyn Target>, RegistryError> {
        self.targets
            .get(&normalize_target(name))
            .map(|module| module.create())
            .ok_or_else(|| RegistryError::MissingTarget {
                name: name.to_string(),
                available: self.names().map(str::to_string).collect(),
            })
    }

    /// Registered target names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.targets.values().map(|module| module.target_id())
    }

    pub fn modules(&self) -> impl Iterator<Item = &dyn TargetModule> + '_ {
        self.targets.values().map(|module| module.as_ref())
    }
}

fn normalize_target(name: &str) -> String {
    name.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{RegistryError, TargetRegistry};

    #[test]
    fn resolves_default_target_ignoring_case() {
        let registry = TargetRegistry::with_defaults();
        let target = registry.resolve("KM8").unwrap();
        assert_eq!(target.info().name, "km8");
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["km8"]);
    }

    #[test]
    fn unknown_target_lists_available_names() {
        let registry = TargetRegistry::with_defaults();
        let err = registry.resolve("z80").err().unwrap();
        assert_eq!(
            err,
            RegistryError::MissingTarget {
                name: "z80".to_string(),
                available: vec!["km8".to_string()],
            }
        );
        assert_eq!(err.to_string(), "unknown target 'z80' (available: km8)");
    }
}
