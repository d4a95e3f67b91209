use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Deref;
use std::path::Path;
use anyhow::Context;
use tracing::{debug, info};
use crate::circuit::{Circuit, CircuitError, Design, Leafcell, Modular, Shr, ShrString};

pub fn write_spice<P: AsRef<Path>>(circuit: Shr<Circuit>, path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    info!("write circuit {} to {:?}", circuit.read().name(), path);
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_spice_to(&mut writer, &circuit)?;
    writer.flush()?;
    Ok(())
}

/// Writes `circuit` and everything below it, children first, each subcircuit once.
pub fn write_spice_to<W: Write>(writer: &mut W, circuit: &Shr<Circuit>) -> anyhow::Result<()> {
    let mut exported = HashSet::new();
    write_spice_recursive(writer, circuit, &mut exported)
        .with_context(|| format!("export {}", circuit.read().name()))
}

fn write_spice_recursive<W: Write>(
    writer: &mut W,
    circuit: &Shr<Circuit>,
    exported: &mut HashSet<ShrString>,
) -> anyhow::Result<()> {
    let name = circuit.read().name();
    if !exported.insert(name.clone()) {
        return Ok(());
    }

    match circuit.read().deref() {
        Circuit::Module(module) => {
            debug!("write module {}", name);
            for sub in module.circuits() {
                write_spice_recursive(writer, sub, exported).with_context(|| format!("export {}", name))?;
            }
            write_module(writer, module.as_ref())?;
        }
        Circuit::Leafcell(leafcell) => {
            debug!("write leafcell {}", name);
            write_leafcell(writer, leafcell)?;
        }
    }

    Ok(())
}

fn write_module<W: Write>(writer: &mut W, module: &dyn Modular) -> anyhow::Result<()> {
    // .SUBCKT header
    writeln!(writer, ".SUBCKT {} {}", module.name(), join(module.port_names()))?;

    // Instance
    for inst in module.instances() {
        let inst = inst.read();

        let mut pin_nets = Vec::with_capacity(inst.pins.len());
        for pin in inst.pins.iter() {
            match pin.read().net_name() {
                Some(net) => pin_nets.push(net),
                None => return Err(CircuitError::InstanceNotConnected(inst.name.to_string()).into()),
            }
        }

        writeln!(writer, "X{} {} {}", inst.name, join(pin_nets), inst.template_name())?;
    }

    writeln!(writer, ".ENDS {}\n", module.name())?;
    Ok(())
}

/// Leaf cells come from the PDK's own netlists, so only their interface is written.
fn write_leafcell<W: Write>(writer: &mut W, leafcell: &Leafcell) -> anyhow::Result<()> {
    writeln!(writer, "* {} leaf cell, black box", leafcell.kind)?;
    writeln!(writer, ".SUBCKT {} {}", leafcell.name(), join(leafcell.port_names()))?;
    for (port, direction) in leafcell.port_names().iter().zip(leafcell.port_directions()) {
        writeln!(writer, "*.PININFO {}:{}", port, pin_info(direction))?;
    }
    writeln!(writer, ".ENDS {}\n", leafcell.name())?;
    Ok(())
}

fn pin_info(direction: crate::circuit::PortDirection) -> &'static str {
    use crate::circuit::PortDirection::*;
    match direction {
        Input => "I",
        Output => "O",
        InOut => "B",
        Power => "P",
        Ground => "G",
    }
}

fn join<I: IntoIterator<Item = ShrString>>(names: I) -> String {
    names.into_iter().map(|n| n.to_string()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use crate::circuit::{CircuitFactory, DummyArrayArg, BoundaryCell};
    use crate::pdk::Pdk;
    use super::*;

    #[test]
    fn test_subckts_written_once_children_first() {
        let pdk = Arc::new(Pdk::builtin().unwrap());
        let mut factory = CircuitFactory::new(pdk);
        let array = factory.module(DummyArrayArg::new(1, 2, 2, BoundaryCell::Dummy, 0, 0)).unwrap();

        let mut out = Vec::new();
        write_spice_to(&mut out, &array).unwrap();
        let text = String::from_utf8(out).unwrap();

        let leaf = text.find(".SUBCKT dummy_cell_1rw").unwrap();
        let top = text.find(&format!(".SUBCKT {}", array.read().name())).unwrap();
        assert!(leaf < top);
        assert_eq!(text.matches(".SUBCKT dummy_cell_1rw ").count(), 1);
        assert!(text.contains("Xdummy_r1_c1 bl_0_1 br_0_1 wl_0_1 vdd_0 gnd dummy_cell_1rw"));
    }
}
