use std::{collections::HashMap, fmt::Debug, sync::Arc};
use tracing::{debug, info};
use crate::layout;
use crate::pdk::Pdk;
use crate::{ErrorContext, LpRamResult};
use super::{Circuit, CircuitError, LeafKind, Module, Shr, ShrString};

pub trait ModuleArg: Sized + Debug {
    fn module_name(&self) -> ShrString;
    fn create_module(self, factory: &mut CircuitFactory) -> LpRamResult<Module<Self>>;
}

/// Per-build switches shared by every module the factory creates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Build connectivity only and skip all geometry.
    pub netlist_only: bool,
}

/// Creates modules on request and hands out one shared copy per unique name.
pub struct CircuitFactory {
    pub pdk: Arc<Pdk>,
    pub options: BuildOptions,
    modules: HashMap<ShrString, Shr<Circuit>>,
}

impl CircuitFactory {
    pub fn new(pdk: Arc<Pdk>) -> Self {
        Self::with_options(pdk, BuildOptions::default())
    }

    pub fn with_options(pdk: Arc<Pdk>, options: BuildOptions) -> Self {
        Self {
            pdk,
            options,
            modules: HashMap::new(),
        }
    }

    pub fn netlist_only(&self) -> bool {
        self.options.netlist_only
    }

    /// Returns the module described by `arg`, building and verifying it on first request.
    /// A module that fails to build or verify is never cached.
    pub fn module<A: ModuleArg + 'static>(&mut self, arg: A) -> LpRamResult<Shr<Circuit>> {
        let name = arg.module_name();
        if let Some(module) = self.modules.get(&name) {
            debug!("reuse circuit '{}'", name);
            return Ok(module.clone());
        }

        info!("create circuit '{}'", name);
        let module = arg.create_module(self).with_context(|| format!("create circuit '{}'", name))?;
        layout::verify(&module).with_context(|| format!("verify circuit '{}'", name))?;

        let module = Shr::new(Circuit::Module(Box::new(module)));
        self.modules.insert(name, module.clone());
        Ok(module)
    }

    pub fn leafcell(&self, kind: LeafKind, port_size: usize) -> Result<Shr<Circuit>, CircuitError> {
        self.pdk.get_leafcell(kind, port_size)
            .ok_or_else(|| CircuitError::LeafcellNotFound(kind.to_string(), port_size))
    }

    /// Whether the bitcell family for `port_size` ports ships column/row end caps.
    pub fn end_caps(&self, port_size: usize) -> Result<bool, CircuitError> {
        self.pdk.end_caps(port_size)
            .ok_or_else(|| CircuitError::LeafcellNotFound(LeafKind::Bitcell.to_string(), port_size))
    }

    pub fn get(&self, name: &str) -> Option<Shr<Circuit>> {
        self.modules.get(name).cloned()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Every cached module, sorted by name.
    pub fn modules(&self) -> Vec<Shr<Circuit>> {
        let mut names: Vec<&ShrString> = self.modules.keys().collect();
        names.sort();
        names.into_iter().filter_map(|name| self.modules.get(name).cloned()).collect()
    }
}
