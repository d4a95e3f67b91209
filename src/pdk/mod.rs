mod builtin;
mod cell;
mod config;
mod error;

pub use builtin::*;
pub use cell::*;
pub use config::*;
pub use error::*;

use std::{collections::{BTreeMap, HashMap}, path::Path};
use tracing::{debug, info};
use crate::circuit::{Circuit, LeafKind, Shr, ShrString};
use crate::LpRamResult;

/// Technology parameters the array modules consult while drawing.
#[derive(Debug, Clone)]
pub struct TechParams {
    pub power_layer: ShrString,
    pub power_via: Vec<ShrString>,
    pub replica_column_even_rows: bool,
}

impl From<&TechConfig> for TechParams {
    fn from(config: &TechConfig) -> Self {
        Self {
            power_layer: config.power_layer.as_str().into(),
            power_via: config.power_via.iter().map(|layer| ShrString::from(layer.as_str())).collect(),
            replica_column_even_rows: config.replica_column_even_rows,
        }
    }
}

#[derive(Debug)]
pub struct CellFamily {
    pub port_size: usize,
    pub end_caps: bool,
    pub cells: HashMap<LeafKind, Shr<Circuit>>,
}

/// Cell property registry: every leaf cell of the process, resolved once at load.
#[derive(Debug)]
pub struct Pdk {
    pub config: PdkConfig,
    pub tech: TechParams,
    families: BTreeMap<usize, CellFamily>,
}

impl Pdk {
    pub fn load<P: AsRef<Path>>(path: P) -> LpRamResult<Self> {
        let config = PdkConfig::load(path)?;
        Ok(Self::from_config(config)?)
    }

    pub fn from_config(config: PdkConfig) -> Result<Self, PdkError> {
        if config.families.is_empty() {
            return Err(PdkError::NoCellFamily(config.name.clone()));
        }

        let mut families = BTreeMap::new();
        for family in config.families.iter() {
            if families.contains_key(&family.port_size) {
                return Err(PdkError::DuplicateFamily(family.port_size));
            }

            let mut cells = HashMap::new();
            for cell in family.cells.iter() {
                let leafcell = extract_leafcell(family, cell)?;
                debug!("load leaf cell '{}' as {} for {} port(s)", cell.name, cell.kind, family.port_size);
                cells.insert(cell.kind, Shr::new(Circuit::Leafcell(leafcell)));
            }

            let mut required = vec![LeafKind::Bitcell, LeafKind::ReplicaBitcell, LeafKind::DummyBitcell];
            if family.end_caps {
                required.extend([LeafKind::ColCap, LeafKind::RowCap]);
            }
            if let Some(kind) = required.into_iter().find(|kind| !cells.contains_key(kind)) {
                return Err(PdkError::MissingLeafCell(family.port_size, kind.to_string()));
            }

            families.insert(family.port_size, CellFamily {
                port_size: family.port_size,
                end_caps: family.end_caps,
                cells,
            });
        }

        info!("load pdk '{}' with {} cell famil(ies)", config.name, families.len());
        let tech = TechParams::from(&config.tech);
        Ok(Self { config, tech, families })
    }

    pub fn get_leafcell(&self, kind: LeafKind, port_size: usize) -> Option<Shr<Circuit>> {
        self.families.get(&port_size)?.cells.get(&kind).cloned()
    }

    pub fn end_caps(&self, port_size: usize) -> Option<bool> {
        self.families.get(&port_size).map(|family| family.end_caps)
    }

    pub fn port_sizes(&self) -> Vec<usize> {
        self.families.keys().copied().collect()
    }
}

#[cfg(test)]
mod test {
    use crate::circuit::{Design, LeafKind, PinRole};
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let pdk = Pdk::builtin().unwrap();
        assert_eq!(pdk.port_sizes(), vec![1, 2]);
        assert_eq!(pdk.end_caps(1), Some(false));
        assert!(pdk.get_leafcell(LeafKind::ColCap, 1).is_none());

        let cell = pdk.get_leafcell(LeafKind::Bitcell, 2).unwrap();
        let cell = cell.read();
        let names: Vec<_> = cell.port_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["bl0", "br0", "bl1", "br1", "wl0", "wl1", "vdd", "gnd"]);
        let leafcell = cell.leafcell().unwrap();
        assert_eq!(leafcell.pin_name(PinRole::Wordline(1)).unwrap(), "wl1");
        assert!(leafcell.mirror.x);
    }

    #[test]
    fn test_builtin_with_end_caps() {
        let pdk = Pdk::builtin_with_end_caps().unwrap();
        assert_eq!(pdk.end_caps(2), Some(true));
        let col_cap = pdk.get_leafcell(LeafKind::ColCap, 2).unwrap();
        let col_cap = col_cap.read();
        assert!(!col_cap.leafcell().unwrap().has_role(PinRole::Wordline(0)));
        assert_eq!(col_cap.layout().unwrap().height(), COL_CAP_HEIGHT);
    }

    #[test]
    fn test_port_map_renames_pins() {
        let mut config = builtin_config(false);
        config.families[0].port_map.insert("bl".into(), "BL".into());
        let pdk = Pdk::from_config(config).unwrap();
        let cell = pdk.get_leafcell(LeafKind::Bitcell, 1).unwrap();
        let cell = cell.read();
        assert!(cell.get_port("BL").is_some());
        assert!(cell.layout().unwrap().has_pin("BL"));
        assert!(cell.get_port("bl").is_none());
    }

    #[test]
    fn test_missing_cell_is_rejected() {
        let mut config = builtin_config(true);
        config.families[0].cells.retain(|cell| cell.kind != LeafKind::RowCap);
        assert!(matches!(Pdk::from_config(config), Err(PdkError::MissingLeafCell(1, _))));
    }

    #[test]
    fn test_wrong_direction_is_rejected() {
        let mut config = builtin_config(false);
        config.families[0].cells[0].pins[2].direction = crate::circuit::PortDirection::Output;
        assert!(matches!(Pdk::from_config(config), Err(PdkError::PinDirection(..))));
    }

    #[test]
    fn test_load_synthetic_platform() {
        let pdk = Pdk::load("./platforms/synthetic").unwrap();
        assert_eq!(pdk.config.name, "synthetic");
        assert!(pdk.get_leafcell(LeafKind::ReplicaBitcell, 1).is_some());
        assert_eq!(pdk.tech.power_layer, "m3");
    }
}
