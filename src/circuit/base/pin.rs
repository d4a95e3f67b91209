use crate::circuit::{ShrString, Shr};
use super::{Net, Port, PortDirection};

/// One terminal of an instance, mirroring a port of the instantiated circuit.
#[derive(Debug)]
pub struct Pin {
    pub name: ShrString,
    pub net: Option<Shr<Net>>,
    pub template_port: Shr<Port>,
}

impl Pin {
    pub fn new<S: Into<ShrString>>(name: S, template_port: Shr<Port>) -> Shr<Self> {
        Shr::new(Self {
            name: name.into(), net: None, template_port
        })
    }

    pub fn connected(&self) -> bool {
        self.net.is_some()
    }

    pub fn set_connected_net(&mut self, net: Shr<Net>) {
        self.net = Some(net)
    }

    pub fn direction(&self) -> PortDirection {
        self.template_port.read().direction
    }

    pub fn net_name(&self) -> Option<ShrString> {
        self.net.as_ref().map(|net| net.read().name.clone())
    }
}
