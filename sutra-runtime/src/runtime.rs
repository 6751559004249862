//! The module host: registration, initialization, and the spin loop.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::module::{ModuleContext, ModuleHandle, RuntimeModule};
use crate::registry::ModuleRegistry;

/// Hosts a set of runtime modules.
///
/// Usage follows a strict order: add every module, then
/// [`Runtime::initialize_all`], then spin. Because registration precedes
/// initialization, the nameserver already knows every module when
/// `initialize*` hooks run, so modules can resolve collaborators there.
pub struct Runtime {
    registry: Arc<ModuleRegistry>,
    initialized: bool,
}

impl Runtime {
    /// Create an empty runtime.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ModuleRegistry::new()),
            initialized: false,
        }
    }

    /// Register a module, returning a typed handle to it.
    ///
    /// The returned `Arc` shares state with the registry's type-erased
    /// handle, so the caller can keep inspecting the module while the
    /// runtime drives it.
    pub fn add_module<M: RuntimeModule + 'static>(&self, module: M) -> Result<Arc<Mutex<M>>> {
        let concrete = Arc::new(Mutex::new(module));
        let erased: ModuleHandle = concrete.clone();
        self.registry.register(erased)?;
        Ok(concrete)
    }

    /// The directory-services context handed to modules.
    pub fn context(&self) -> ModuleContext {
        ModuleContext::new(self.registry.clone())
    }

    /// Shared registry access.
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Initialize every registered module in registration order.
    ///
    /// `configs` maps module names to their raw configuration blocks;
    /// missing entries initialize with an empty block.
    pub fn initialize_all(&mut self, configs: &HashMap<String, String>) -> Result<()> {
        let ctx = self.context();
        for handle in self.registry.handles() {
            let mut module = handle.lock();
            let name = module.name().to_string();
            let cfg = configs.get(&name).map(String::as_str).unwrap_or("");
            log::info!("initializing module '{}'", name);
            module.initialize(&ctx, cfg)?;
        }
        self.initialized = true;
        Ok(())
    }

    /// Whether [`Runtime::initialize_all`] has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Tick every module once, in registration order.
    pub fn spin_once(&self) -> Result<()> {
        for handle in self.registry.handles() {
            handle.lock().spin_once()?;
        }
        Ok(())
    }

    /// Spin at a fixed period until `deadline` elapses.
    pub fn spin_for(&self, duration: Duration, period: Duration) -> Result<()> {
        let deadline = Instant::now() + duration;
        while Instant::now() < deadline {
            self.spin_once()?;
            std::thread::sleep(period);
        }
        Ok(())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Module that looks up a sibling during initialization, proving the
    /// nameserver works before the first spin.
    struct Prober {
        name: &'static str,
        tags: &'static [&'static str],
        siblings_seen: usize,
        spins: usize,
    }

    impl Prober {
        fn new(name: &'static str, tags: &'static [&'static str]) -> Self {
            Self {
                name,
                tags,
                siblings_seen: 0,
                spins: 0,
            }
        }
    }

    impl RuntimeModule for Prober {
        fn name(&self) -> &str {
            self.name
        }
        fn interfaces(&self) -> &'static [&'static str] {
            self.tags
        }
        fn initialize_common(&mut self, ctx: &ModuleContext, _cfg: &str) -> Result<()> {
            self.siblings_seen = ctx.find_by_interface("probe").len();
            Ok(())
        }
        fn spin_once(&mut self) -> Result<()> {
            self.spins += 1;
            Ok(())
        }
    }

    #[test]
    fn test_nameserver_functional_during_initialize() {
        let mut runtime = Runtime::new();
        let a = runtime.add_module(Prober::new("a", &["probe"])).unwrap();
        let b = runtime.add_module(Prober::new("b", &["probe"])).unwrap();
        runtime.initialize_all(&HashMap::new()).unwrap();

        // both modules were registered before either initialized
        assert_eq!(a.lock().siblings_seen, 2);
        assert_eq!(b.lock().siblings_seen, 2);
    }

    #[test]
    fn test_spin_ticks_all_modules() {
        let mut runtime = Runtime::new();
        let a = runtime.add_module(Prober::new("a", &[])).unwrap();
        let b = runtime.add_module(Prober::new("b", &[])).unwrap();
        runtime.initialize_all(&HashMap::new()).unwrap();

        runtime.spin_once().unwrap();
        runtime.spin_once().unwrap();
        assert_eq!(a.lock().spins, 2);
        assert_eq!(b.lock().spins, 2);
    }

    #[test]
    fn test_config_blocks_routed_by_name() {
        struct CfgRecorder {
            cfg: String,
        }
        impl RuntimeModule for CfgRecorder {
            fn name(&self) -> &str {
                "recorder"
            }
            fn initialize_common(&mut self, _ctx: &ModuleContext, cfg: &str) -> Result<()> {
                self.cfg = cfg.to_string();
                Ok(())
            }
            fn spin_once(&mut self) -> Result<()> {
                Ok(())
            }
        }

        let mut runtime = Runtime::new();
        let m = runtime.add_module(CfgRecorder { cfg: String::new() }).unwrap();
        let mut configs = HashMap::new();
        configs.insert("recorder".to_string(), "params: {}".to_string());
        runtime.initialize_all(&configs).unwrap();
        assert_eq!(m.lock().cfg, "params: {}");
    }
}
