use crate::circuit::{ShrString, Shr};
use super::{Pin, Port};

#[derive(Debug)]
pub struct Net {
    pub name: ShrString,
    pub connections: Vec<NetNode>
}

#[derive(Debug)]
pub enum NetNode {
    Port(Shr<Port>),
    Pin(Shr<Pin>),
}

impl From<Shr<Port>> for NetNode {
    fn from(port: Shr<Port>) -> Self {
        NetNode::Port(port)
    }
}

impl From<Shr<Pin>> for NetNode {
    fn from(pin: Shr<Pin>) -> Self {
        NetNode::Pin(pin)
    }
}

impl Net {
    pub fn new<S: Into<ShrString>>(name: S) -> Shr<Self> {
        Shr::new( Self { name: name.into(), connections: vec![] } )
    }

    pub fn add_connection<N: Into<NetNode>>(&mut self, node: N) {
        self.connections.push(node.into());
    }

    /// Number of instance pins on this net.
    pub fn pin_count(&self) -> usize {
        self.connections.iter().filter(|node| matches!(node, NetNode::Pin(_))).count()
    }

    pub fn is_port(&self) -> bool {
        self.connections.iter().any(|node| matches!(node, NetNode::Port(_)))
    }
}
