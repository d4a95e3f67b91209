use std::fmt;
use serde::{Deserialize, Serialize};
use crate::circuit::{Design, Port, PortDirection, Shr, ShrString};
use crate::layout::{Coord, Layout};

/// Which leaf of a bitcell family a cell is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafKind {
    Bitcell,
    ReplicaBitcell,
    DummyBitcell,
    ColCap,
    RowCap,
}

impl LeafKind {
    pub const ALL: [LeafKind; 5] = [
        LeafKind::Bitcell, LeafKind::ReplicaBitcell, LeafKind::DummyBitcell, LeafKind::ColCap, LeafKind::RowCap,
    ];

    pub fn is_cap(&self) -> bool {
        matches!(self, Self::ColCap | Self::RowCap)
    }
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bitcell => "bitcell",
            Self::ReplicaBitcell => "replica_bitcell",
            Self::DummyBitcell => "dummy_bitcell",
            Self::ColCap => "col_cap",
            Self::RowCap => "row_cap",
        };
        f.write_str(name)
    }
}

/// What a leaf pin is for, independent of how the PDK names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinRole {
    Bitline(usize),
    BitlineBar(usize),
    Wordline(usize),
    Vdd,
    Gnd,
}

/// Axes a cell may be mirrored about when tiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorAxes {
    pub x: bool,
    pub y: bool,
}

impl Default for MirrorAxes {
    fn default() -> Self {
        Self { x: true, y: false }
    }
}

#[derive(Debug)]
pub struct Leafcell {
    pub name: ShrString,
    pub kind: LeafKind,
    pub port_size: usize,
    pub ports: Vec<Shr<Port>>,
    /// Parallel to `ports`.
    pub roles: Vec<PinRole>,
    pub mirror: MirrorAxes,
    pub storage_nets: Vec<ShrString>,
    pub layout: Layout,
}

impl Leafcell {
    pub fn new<S: Into<ShrString>>(
        name: S,
        kind: LeafKind,
        port_size: usize,
        pins: Vec<(ShrString, PinRole, PortDirection)>,
        mirror: MirrorAxes,
        storage_nets: Vec<ShrString>,
        layout: Layout,
    ) -> Self {
        let (ports, roles) = pins.into_iter()
            .map(|(name, role, direction)| (Port::new(name, direction), role))
            .unzip();

        Self {
            name: name.into(),
            kind,
            port_size,
            ports,
            roles,
            mirror,
            storage_nets,
            layout,
        }
    }

    pub fn pin_name(&self, role: PinRole) -> Option<ShrString> {
        self.roles.iter()
            .position(|r| *r == role)
            .map(|index| self.ports[index].read().name.clone())
    }

    pub fn has_role(&self, role: PinRole) -> bool {
        self.roles.contains(&role)
    }

    /// Nets for an instance of this cell, in pin order, chosen by pin role.
    pub fn connections(&self, mut net_of: impl FnMut(PinRole) -> ShrString) -> Vec<ShrString> {
        self.roles.iter().map(|role| net_of(*role)).collect()
    }

    pub fn width(&self) -> Coord {
        self.layout.width()
    }

    pub fn height(&self) -> Coord {
        self.layout.height()
    }
}

impl Design for Leafcell {
    fn name(&self) -> ShrString {
        self.name.clone()
    }

    fn ports(&self) -> &[Shr<Port>] {
        &self.ports
    }

    fn layout(&self) -> Option<&Layout> {
        Some(&self.layout)
    }
}
