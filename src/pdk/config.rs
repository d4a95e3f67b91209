use std::{collections::HashMap, path::{Path, PathBuf}};
use serde::{Deserialize, Serialize};
use crate::circuit::{LeafKind, MirrorAxes, PinRole, PortDirection};
use crate::layout::Coord;
use crate::{ErrorContext, LpRamResult};

pub const PDK_CONFIG: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdkConfig {
    #[serde(skip)]
    pub pdk_path: PathBuf,

    pub name: String,
    #[serde(default)]
    pub tech: TechConfig,
    pub families: Vec<CellFamilyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechConfig {
    /// Layer the per-row-pair supply stripes are drawn on.
    #[serde(default = "default_power_layer")]
    pub power_layer: String,
    /// Via stack dropped on every cell vdd pin when it is not on `power_layer`.
    #[serde(default = "default_power_via")]
    pub power_via: Vec<String>,
    /// Replica columns need an even row count and an odd number of replica rows below the array.
    #[serde(default)]
    pub replica_column_even_rows: bool,
}

fn default_power_layer() -> String {
    "m3".into()
}

fn default_power_via() -> Vec<String> {
    vec!["m2".into(), "via2".into(), "m3".into()]
}

impl Default for TechConfig {
    fn default() -> Self {
        Self {
            power_layer: default_power_layer(),
            power_via: default_power_via(),
            replica_column_even_rows: false,
        }
    }
}

/// Every leaf variant of one bitcell, keyed by how many ports it has.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellFamilyConfig {
    pub port_size: usize,
    #[serde(default)]
    pub end_caps: bool,
    #[serde(default)]
    pub mirror: MirrorAxes,
    #[serde(default)]
    pub storage_nets: Vec<String>,
    /// Renames canonical pin names (`bl0`, `wl`, ..) to the names the cell views use.
    #[serde(default)]
    pub port_map: HashMap<String, String>,
    pub cells: Vec<CellProperties>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellProperties {
    pub kind: LeafKind,
    pub name: String,
    pub size: [Coord; 2],
    pub pins: Vec<PinProperties>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinProperties {
    pub name: String,
    pub role: PinRole,
    pub direction: PortDirection,
    #[serde(default)]
    pub shapes: Vec<PinShape>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinShape {
    pub layer: String,
    /// `[x0, y0, x1, y1]`
    pub rect: [Coord; 4],
}

impl PdkConfig {
    pub fn load<P: AsRef<Path>>(pdk_path: P) -> LpRamResult<Self> {
        let pdk_path: &Path = pdk_path.as_ref();
        let config_path = pdk_path.join(PDK_CONFIG);
        let config_content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("read pdk config '{}'", config_path.display()))?;
        let mut config: PdkConfig = serde_json::from_str(&config_content).context("parse pdk config")?;
        config.pdk_path = pdk_path.into();

        Ok(config)
    }

    pub fn family(&self, port_size: usize) -> Option<&CellFamilyConfig> {
        self.families.iter().find(|family| family.port_size == port_size)
    }
}

impl CellFamilyConfig {
    pub fn cell(&self, kind: LeafKind) -> Option<&CellProperties> {
        self.cells.iter().find(|cell| cell.kind == kind)
    }

    /// Name a pin is known by once `port_map` is applied.
    pub fn mapped_pin_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.port_map.get(name).map(String::as_str).unwrap_or(name)
    }
}
