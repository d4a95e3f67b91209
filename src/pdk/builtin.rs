use std::collections::HashMap;
use crate::circuit::{LeafKind, MirrorAxes, PinRole, PortDirection};
use crate::layout::Coord;
use super::{CellFamilyConfig, CellProperties, Pdk, PdkConfig, PdkError, PinProperties, PinShape, TechConfig};

pub const BITCELL_WIDTH: Coord = 1200;
pub const BITCELL_HEIGHT: Coord = 1580;
pub const COL_CAP_HEIGHT: Coord = 400;
pub const ROW_CAP_WIDTH: Coord = 400;

const SUPPLY_LAYER: &str = "m2";
const BITLINE_LAYER: &str = "m1";
const WORDLINE_LAYER: &str = "m2";

impl Pdk {
    /// Synthetic process without end caps, with one- and two-port cell families.
    pub fn builtin() -> Result<Self, PdkError> {
        Self::from_config(builtin_config(false))
    }

    /// Same synthetic process, but every family ships column and row end caps.
    pub fn builtin_with_end_caps() -> Result<Self, PdkError> {
        Self::from_config(builtin_config(true))
    }
}

pub fn builtin_config(end_caps: bool) -> PdkConfig {
    PdkConfig {
        pdk_path: Default::default(),
        name: if end_caps { "synthetic_caps".into() } else { "synthetic".into() },
        tech: TechConfig::default(),
        families: vec![builtin_family(1, end_caps), builtin_family(2, end_caps)],
    }
}

fn builtin_family(port_size: usize, end_caps: bool) -> CellFamilyConfig {
    let mut cells = vec![
        builtin_cell(LeafKind::Bitcell, port_size),
        builtin_cell(LeafKind::ReplicaBitcell, port_size),
        builtin_cell(LeafKind::DummyBitcell, port_size),
    ];
    if end_caps {
        cells.push(builtin_cell(LeafKind::ColCap, port_size));
        cells.push(builtin_cell(LeafKind::RowCap, port_size));
    }

    CellFamilyConfig {
        port_size,
        end_caps,
        mirror: MirrorAxes::default(),
        storage_nets: vec!["Q".into(), "Q_bar".into()],
        port_map: HashMap::new(),
        cells,
    }
}

fn builtin_cell(kind: LeafKind, port_size: usize) -> CellProperties {
    let name = match kind {
        LeafKind::Bitcell => format!("cell_{}rw", port_size),
        _ => format!("{}_cell_{}rw", kind.to_string().trim_end_matches("_bitcell"), port_size),
    };
    let (width, height) = match kind {
        LeafKind::ColCap => (BITCELL_WIDTH, COL_CAP_HEIGHT),
        LeafKind::RowCap => (ROW_CAP_WIDTH, BITCELL_HEIGHT),
        _ => (BITCELL_WIDTH, BITCELL_HEIGHT),
    };

    let mut pins = Vec::new();
    if kind != LeafKind::RowCap {
        for port in 0..port_size {
            let ([bl0, bl1], [br0, br1]) = bitline_tracks(port, port_size);
            pins.push(pin(pin_name("bl", port, port_size), PinRole::Bitline(port), PortDirection::InOut, BITLINE_LAYER, [bl0, 0, bl1, height]));
            pins.push(pin(pin_name("br", port, port_size), PinRole::BitlineBar(port), PortDirection::InOut, BITLINE_LAYER, [br0, 0, br1, height]));
        }
    }
    if kind != LeafKind::ColCap {
        for port in 0..port_size {
            let [y0, y1] = wordline_track(port, port_size);
            pins.push(pin(pin_name("wl", port, port_size), PinRole::Wordline(port), PortDirection::Input, WORDLINE_LAYER, [0, y0, width, y1]));
        }
    }

    let (vdd, gnd) = if kind == LeafKind::ColCap { ([300, 360], [40, 100]) } else { ([1440, 1540], [40, 140]) };
    pins.push(pin("vdd".into(), PinRole::Vdd, PortDirection::Power, SUPPLY_LAYER, [0, vdd[0], width, vdd[1]]));
    pins.push(pin("gnd".into(), PinRole::Gnd, PortDirection::Ground, SUPPLY_LAYER, [0, gnd[0], width, gnd[1]]));

    CellProperties { kind, name, size: [width, height], pins }
}

fn pin_name(base: &str, port: usize, port_size: usize) -> String {
    if port_size == 1 { base.to_string() } else { format!("{}{}", base, port) }
}

fn pin(name: String, role: PinRole, direction: PortDirection, layer: &str, rect: [Coord; 4]) -> PinProperties {
    PinProperties {
        name,
        role,
        direction,
        shapes: vec![PinShape { layer: layer.into(), rect }],
    }
}

fn bitline_tracks(port: usize, port_size: usize) -> ([Coord; 2], [Coord; 2]) {
    match (port_size, port) {
        (1, _) => ([160, 300], [900, 1040]),
        (_, 0) => ([100, 240], [340, 480]),
        _ => ([720, 860], [960, 1100]),
    }
}

fn wordline_track(port: usize, port_size: usize) -> [Coord; 2] {
    match (port_size, port) {
        (1, _) => [720, 860],
        (_, 0) => [560, 660],
        _ => [920, 1020],
    }
}
