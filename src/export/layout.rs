use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use serde::Serialize;
use tracing::info;
use crate::circuit::{Circuit, Design, Shr, ShrString};
use crate::layout::{LayoutPin, Orientation, Point, Rect, Shape, Via};
use crate::{LpRamError, LpRamResult};

/// One cell of the layout dump.
#[derive(Debug, Clone, Serialize)]
pub struct CellLayout {
    pub name: ShrString,
    pub leaf: bool,
    pub boundary: Rect,
    pub pins: Vec<LayoutPin>,
    pub shapes: Vec<Shape>,
    pub vias: Vec<Via>,
    pub instances: Vec<PlacedInstance>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedInstance {
    pub name: ShrString,
    pub template: ShrString,
    pub origin: Point,
    pub orientation: Orientation,
}

/// Flattens the hierarchy under `circuit` into one entry per cell, children first.
pub fn collect_layouts(circuit: &Shr<Circuit>) -> LpRamResult<Vec<CellLayout>> {
    let mut cells = Vec::new();
    let mut visited = HashSet::new();
    collect_recursive(circuit, &mut visited, &mut cells)?;
    Ok(cells)
}

fn collect_recursive(circuit: &Shr<Circuit>, visited: &mut HashSet<ShrString>, cells: &mut Vec<CellLayout>) -> LpRamResult<()> {
    let circuit = circuit.read();
    let name = circuit.name();
    if !visited.insert(name.clone()) {
        return Ok(());
    }

    let layout = circuit.layout()
        .ok_or_else(|| LpRamError::Message(format!("cell '{}' was built without layout", name)))?;

    let mut instances = Vec::new();
    if let Some(module) = circuit.module() {
        for sub in module.circuits() {
            collect_recursive(sub, visited, cells)?;
        }
        for instance in module.instances() {
            let instance = instance.read();
            let placement = instance.placement
                .ok_or_else(|| LpRamError::Message(format!("instance '{}' of '{}' is not placed", instance.name, name)))?;
            instances.push(PlacedInstance {
                name: instance.name.clone(),
                template: instance.template_name(),
                origin: placement.origin,
                orientation: placement.orientation,
            });
        }
    }

    cells.push(CellLayout {
        name,
        leaf: circuit.is_leafcell(),
        boundary: layout.boundary,
        pins: layout.pins.clone(),
        shapes: layout.shapes.clone(),
        vias: layout.vias.clone(),
        instances,
    });
    Ok(())
}

pub fn write_layout<P: AsRef<Path>>(circuit: Shr<Circuit>, path: P) -> LpRamResult<()> {
    let path = path.as_ref();
    info!("write layout of {} to {:?}", circuit.read().name(), path);
    let cells = collect_layouts(&circuit)?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &cells)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use crate::circuit::{BitcellArrayArg, BuildOptions, CircuitFactory};
    use crate::pdk::Pdk;
    use super::*;

    #[test]
    fn test_collect_children_before_parent() {
        let pdk = Arc::new(Pdk::builtin().unwrap());
        let mut factory = CircuitFactory::new(pdk);
        let array = factory.module(BitcellArrayArg::new(1, 2, 3, 1, 0)).unwrap();

        let cells = collect_layouts(&array).unwrap();
        assert_eq!(cells.len(), 2);
        assert!(cells[0].leaf);
        assert_eq!(cells[1].name, array.read().name());
        assert_eq!(cells[1].instances.len(), 6);

        let json = serde_json::to_string(&cells).unwrap();
        assert!(json.contains("\"bit_r1_c2\""));
    }

    #[test]
    fn test_netlist_only_has_nothing_to_dump() {
        let pdk = Arc::new(Pdk::builtin().unwrap());
        let mut factory = CircuitFactory::with_options(pdk, BuildOptions { netlist_only: true });
        let array = factory.module(BitcellArrayArg::new(1, 2, 2, 1, 0)).unwrap();
        assert!(collect_layouts(&array).is_err());
    }
}
