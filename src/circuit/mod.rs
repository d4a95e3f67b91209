mod srdstring;
mod shared;
mod module;
mod primitive;
mod base;
mod error;
mod factory;

use std::{any::Any, fmt::Debug};

pub use shared::*;
pub use srdstring::ShrString;
pub use module::*;
pub use primitive::*;
pub use base::*;
pub use error::*;
pub use factory::*;

use crate::layout::Layout;

pub trait Design: Debug {
    fn name(&self) -> ShrString;
    fn ports(&self) -> &[Shr<Port>];
    /// Geometry of the circuit, absent for netlist-only builds.
    fn layout(&self) -> Option<&Layout>;

    fn get_port(&self, name: &str) -> Option<Shr<Port>> {
        self.ports().iter().find(|port| port.read().name == name).cloned()
    }

    fn port_names(&self) -> Vec<ShrString> {
        self.ports().iter().map(|port| port.read().name.clone()).collect()
    }

    fn port_directions(&self) -> Vec<PortDirection> {
        self.ports().iter().map(|port| port.read().direction).collect()
    }
}

#[derive(Debug)]
pub enum Circuit {
    Module(Box<dyn Modular>),
    Leafcell(Leafcell),
}

impl Design for Circuit {
    fn name(&self) -> ShrString {
        match self {
            Circuit::Module(module) => module.name(),
            Circuit::Leafcell(leafcell) => leafcell.name(),
        }
    }

    fn ports(&self) -> &[Shr<Port>] {
        match self {
            Circuit::Module(module) => module.ports(),
            Circuit::Leafcell(leafcell) => leafcell.ports(),
        }
    }

    fn layout(&self) -> Option<&Layout> {
        match self {
            Circuit::Module(module) => module.layout(),
            Circuit::Leafcell(leafcell) => leafcell.layout(),
        }
    }
}

impl Circuit {
    pub fn is_leafcell(&self) -> bool {
        matches!(self, Self::Leafcell(_))
    }

    pub fn module(&self) -> Option<&dyn Modular> {
        match self {
            Self::Module(module) => Some(module.as_ref()),
            _ => None,
        }
    }

    pub fn leafcell(&self) -> Option<&Leafcell> {
        match self {
            Self::Leafcell(leafcell) => Some(leafcell),
            _ => None,
        }
    }

    /// Typed access to a module built by the factory, e.g. `downcast::<BitcellArrayArg>()`.
    pub fn downcast<A: Any>(&self) -> Option<&Module<A>> {
        self.module()?.as_any().downcast_ref::<Module<A>>()
    }
}

/// Turns a module argument into a piece of the module's unique name.
pub trait NameSegment {
    fn name_segment(&self) -> String;
}

impl NameSegment for usize {
    fn name_segment(&self) -> String {
        self.to_string()
    }
}

impl NameSegment for bool {
    fn name_segment(&self) -> String {
        if *self { "t".into() } else { "f".into() }
    }
}

impl NameSegment for Vec<usize> {
    fn name_segment(&self) -> String {
        if self.is_empty() {
            "n".into()
        } else {
            self.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("x")
        }
    }
}

impl NameSegment for [usize; 2] {
    fn name_segment(&self) -> String {
        format!("{}x{}", self[0], self[1])
    }
}
