use serde::{Deserialize, Serialize};
use crate::circuit::{Shr, ShrString};
use super::Net;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PortDirection {
    Input,
    Output,
    InOut,
    Power,
    Ground,
}

/// Coarse grouping used when checking that a connection list lines up with a pin list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinClass {
    Signal,
    Power,
    Ground,
}

impl PortDirection {
    pub fn class(&self) -> PinClass {
        match self {
            Self::Input | Self::Output | Self::InOut => PinClass::Signal,
            Self::Power => PinClass::Power,
            Self::Ground => PinClass::Ground,
        }
    }

    pub fn is_supply(&self) -> bool {
        !matches!(self.class(), PinClass::Signal)
    }
}

#[derive(Debug)]
pub struct Port {
    pub name: ShrString,
    pub direction: PortDirection,
    pub net: Option<Shr<Net>>,
}

impl Port {
    pub fn new<S: Into<ShrString>>(name: S, direction: PortDirection) -> Shr<Self> {
        Shr::new( Self { name: name.into(), direction, net: None } )
    }

    pub fn set_connected_net(&mut self, net: Shr<Net>) {
        self.net = Some(net)
    }
}
