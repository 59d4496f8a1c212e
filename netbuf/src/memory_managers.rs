//! A registry for the [`MemoryManager`] a call site should use, with an
//! explicit, scoped override in place of Netty's thread-local "current
//! manager" map.
//!
//! Threading an override through a thread-local would tie the override's
//! lifetime to whichever thread happened to set it and require callers to
//! remember to clear it; an explicit [`ScopedManager`] value instead only
//! lives as long as the closure it is handed to, so there is nothing to
//! leak or forget to restore.

use std::collections::HashMap;
use std::sync::Arc;

use netbuf_core::error::{codes, ErrorCategory};
use netbuf_core::region::{DirectMemoryManager, HeapMemoryManager, MemoryManager};
use netbuf_core::{BufferError, Result};

/// Resolves to a default [`MemoryManager`], overridable for the duration of
/// a single call via [`MemoryManagers::with_override`], and doubling as a
/// registry keyed by each implementation's `implementation_name()` so a
/// caller can discover or look up an implementation by name instead of
/// holding onto its own `Arc`.
#[derive(Clone)]
pub struct MemoryManagers {
    default_manager: Arc<dyn MemoryManager>,
    registry: HashMap<&'static str, Arc<dyn MemoryManager>>,
}

impl MemoryManagers {
    /// Builds a registry whose default is `default_manager`, already
    /// registered under its own `implementation_name()`.
    pub fn new(default_manager: Arc<dyn MemoryManager>) -> Self {
        let mut registry = HashMap::new();
        registry.insert(default_manager.implementation_name(), Arc::clone(&default_manager));
        Self { default_manager, registry }
    }

    pub fn heap() -> Self {
        Self::new(Arc::new(HeapMemoryManager))
    }

    pub fn direct() -> Self {
        Self::new(Arc::new(DirectMemoryManager::default()))
    }

    pub fn current(&self) -> Arc<dyn MemoryManager> {
        Arc::clone(&self.default_manager)
    }

    /// Registers `manager` under its own `implementation_name()`, making it
    /// discoverable through [`Self::find`] and [`Self::implementations`]
    /// without disturbing the current default.
    pub fn register(&mut self, manager: Arc<dyn MemoryManager>) {
        self.registry.insert(manager.implementation_name(), manager);
    }

    /// Looks up a previously registered implementation by name.
    pub fn find(&self, name: &str) -> Result<Arc<dyn MemoryManager>> {
        self.registry.get(name).cloned().ok_or_else(|| {
            BufferError::new(
                codes::UNSUPPORTED,
                ErrorCategory::Unsupported,
                format!("no memory manager registered under {name:?}"),
            )
        })
    }

    /// Names of every implementation currently registered, in no particular order.
    pub fn implementations(&self) -> Vec<&'static str> {
        self.registry.keys().copied().collect()
    }

    /// Runs `f` with `manager` available through the [`ScopedManager`]
    /// handed to it, without mutating this registry's own default.
    pub fn with_override<R>(&self, manager: Arc<dyn MemoryManager>, f: impl FnOnce(&ScopedManager) -> R) -> R {
        f(&ScopedManager { manager })
    }
}

/// The manager in effect for the lifetime of one [`MemoryManagers::with_override`] call.
pub struct ScopedManager {
    manager: Arc<dyn MemoryManager>,
}

impl ScopedManager {
    pub fn manager(&self) -> Arc<dyn MemoryManager> {
        Arc::clone(&self.manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registering_an_implementation_makes_it_discoverable_by_name() {
        let mut registry = MemoryManagers::heap();
        assert_eq!(registry.implementations(), vec!["heap"]);

        registry.register(Arc::new(DirectMemoryManager::default()));
        let mut names = registry.implementations();
        names.sort_unstable();
        assert_eq!(names, vec!["direct", "heap"]);

        assert!(registry.find("direct").unwrap().is_native());
        assert!(!registry.find("heap").unwrap().is_native());
        assert!(!registry.current().is_native(), "registering an implementation does not change the default");
    }

    #[test]
    fn finding_an_unregistered_name_fails() {
        let registry = MemoryManagers::heap();
        assert!(registry.find("direct").is_err());
    }

    #[test]
    fn override_does_not_leak_past_its_closure() {
        let registry = MemoryManagers::heap();
        assert!(!registry.current().is_native());

        let saw_direct = registry.with_override(Arc::new(DirectMemoryManager::default()), |scoped| scoped.manager().is_native());
        assert!(saw_direct);
        assert!(!registry.current().is_native(), "override must not persist after the closure returns");
    }
}
