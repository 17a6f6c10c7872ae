// src/check/registry.rs
use super::definition::CheckDefinition;
use crate::error::{MonitorError, Result};
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Insertion-ordered set of check definitions.
///
/// Readers get a lock-free snapshot; registration swaps in a new list.
pub struct CheckRegistry {
    checks: ArcSwap<Vec<Arc<CheckDefinition>>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self {
            checks: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn register(&self, definition: CheckDefinition) -> Result<()> {
        validate(&definition)?;
        let definition = Arc::new(definition);

        let mut duplicate = false;
        self.checks.rcu(|current| {
            duplicate = current.iter().any(|d| d.name == definition.name);
            if duplicate {
                return current.clone();
            }
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(definition.clone());
            Arc::new(next)
        });

        if duplicate {
            return Err(MonitorError::Validation(format!(
                "a check named '{}' is already registered",
                definition.name
            )));
        }

        tracing::info!(name = %definition.name, skip = definition.skip, "Registered dependency check");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<CheckDefinition>> {
        self.checks.load().iter().find(|d| d.name == name).cloned()
    }

    pub fn all(&self) -> Vec<Arc<CheckDefinition>> {
        self.checks.load_full().iter().cloned().collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.checks.load().iter().map(|d| d.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.checks.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.load().is_empty()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(definition: &CheckDefinition) -> Result<()> {
    if definition.name.trim().is_empty() {
        return Err(MonitorError::Validation(
            "check name must not be empty".to_string(),
        ));
    }

    if !definition.skip && !definition.has_check() {
        return Err(MonitorError::Validation(format!(
            "check '{}' has no check function and is not skipped",
            definition.name
        )));
    }

    Ok(())
}
