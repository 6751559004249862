//! The runtime-module contract.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::Result;
use crate::registry::ModuleRegistry;

/// Shared handle to a running module.
pub type ModuleHandle = Arc<Mutex<dyn RuntimeModule>>;

/// An executable unit inside the SLAM runtime.
///
/// Modules are registered with the host first and initialized afterwards,
/// so the nameserver is functional during `initialize_common` and
/// `initialize`; a module may locate its collaborators from either hook.
///
/// The host invokes [`RuntimeModule::initialize`], whose default forwards
/// to [`RuntimeModule::initialize_common`]. Implementations that override
/// `initialize` must still call `initialize_common` themselves.
pub trait RuntimeModule: Send {
    /// Unique module name within one runtime.
    fn name(&self) -> &str;

    /// Interface tags this module answers to in nameserver lookups.
    fn interfaces(&self) -> &'static [&'static str] {
        &[]
    }

    /// Shared setup, always invoked once before the first spin.
    /// `cfg_block` is the module's raw configuration text (possibly empty).
    fn initialize_common(&mut self, ctx: &ModuleContext, cfg_block: &str) -> Result<()>;

    /// Module-specific setup; the default forwards to `initialize_common`.
    fn initialize(&mut self, ctx: &ModuleContext, cfg_block: &str) -> Result<()> {
        self.initialize_common(ctx, cfg_block)
    }

    /// One scheduling tick.
    fn spin_once(&mut self) -> Result<()>;
}

/// Directory services handed to modules at initialization.
#[derive(Clone)]
pub struct ModuleContext {
    registry: Arc<ModuleRegistry>,
}

impl ModuleContext {
    pub(crate) fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self { registry }
    }

    /// All registered modules declaring `interface_tag`.
    pub fn find_by_interface(&self, interface_tag: &str) -> Vec<ModuleHandle> {
        self.registry.find_by_interface(interface_tag)
    }

    /// Module registered under `name`, if any.
    pub fn find_by_name(&self, name: &str) -> Option<ModuleHandle> {
        self.registry.find_by_name(name)
    }
}
