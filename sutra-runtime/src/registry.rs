//! Module registry and nameserver.

use parking_lot::RwLock;

use crate::error::{Result, RuntimeError};
use crate::module::ModuleHandle;

struct RegistryEntry {
    name: String,
    interfaces: &'static [&'static str],
    handle: ModuleHandle,
}

/// Directory of the modules running in one host.
///
/// Registration is an explicit host-driven step; there is no load-time
/// self-registration. Entries are never removed; a runtime's module set
/// is fixed once it starts spinning.
#[derive(Default)]
pub struct ModuleRegistry {
    entries: RwLock<Vec<RegistryEntry>>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under its declared name and interface tags.
    ///
    /// Fails if the name is already taken.
    pub fn register(&self, handle: ModuleHandle) -> Result<()> {
        let (name, interfaces) = {
            let module = handle.lock();
            (module.name().to_string(), module.interfaces())
        };
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.name == name) {
            return Err(RuntimeError::Module(format!(
                "module name '{name}' already registered"
            )));
        }
        log::debug!("registered module '{}' (interfaces: {:?})", name, interfaces);
        entries.push(RegistryEntry {
            name,
            interfaces,
            handle,
        });
        Ok(())
    }

    /// All modules declaring `interface_tag`, in registration order.
    pub fn find_by_interface(&self, interface_tag: &str) -> Vec<ModuleHandle> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.interfaces.contains(&interface_tag))
            .map(|e| e.handle.clone())
            .collect()
    }

    /// Module registered under `name`.
    pub fn find_by_name(&self, name: &str) -> Option<ModuleHandle> {
        self.entries
            .read()
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.handle.clone())
    }

    /// Registered module names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries.read().iter().map(|e| e.name.clone()).collect()
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no module is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Handles in registration order (the host's spin order).
    pub(crate) fn handles(&self) -> Vec<ModuleHandle> {
        self.entries.read().iter().map(|e| e.handle.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ModuleContext, RuntimeModule};
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Dummy {
        name: &'static str,
        tags: &'static [&'static str],
    }

    impl RuntimeModule for Dummy {
        fn name(&self) -> &str {
            self.name
        }
        fn interfaces(&self) -> &'static [&'static str] {
            self.tags
        }
        fn initialize_common(&mut self, _ctx: &ModuleContext, _cfg: &str) -> crate::Result<()> {
            Ok(())
        }
        fn spin_once(&mut self) -> crate::Result<()> {
            Ok(())
        }
    }

    fn handle(name: &'static str, tags: &'static [&'static str]) -> ModuleHandle {
        Arc::new(Mutex::new(Dummy { name, tags }))
    }

    #[test]
    fn test_find_by_interface() {
        let registry = ModuleRegistry::new();
        registry.register(handle("a", &["raw-data-source"])).unwrap();
        registry.register(handle("b", &["metric-map"])).unwrap();
        registry
            .register(handle("c", &["raw-data-source", "metric-map"]))
            .unwrap();

        assert_eq!(registry.find_by_interface("raw-data-source").len(), 2);
        assert_eq!(registry.find_by_interface("metric-map").len(), 2);
        assert!(registry.find_by_interface("unknown").is_empty());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = ModuleRegistry::new();
        registry.register(handle("a", &[])).unwrap();
        assert!(registry.register(handle("a", &[])).is_err());
    }

    #[test]
    fn test_find_by_name() {
        let registry = ModuleRegistry::new();
        registry.register(handle("replayer", &[])).unwrap();
        assert!(registry.find_by_name("replayer").is_some());
        assert!(registry.find_by_name("other").is_none());
    }
}
