use std::sync::Arc;
use lpram::{
    circuit::{CircuitFactory, Design, LeafKind, ModuleArg, ReplicaColumnArg},
    layout::Orientation,
    pdk::{builtin_config, Pdk},
};

fn factory(end_caps: bool) -> CircuitFactory {
    let pdk = if end_caps { Pdk::builtin_with_end_caps() } else { Pdk::builtin() };
    CircuitFactory::new(Arc::new(pdk.unwrap()))
}

fn column(rows: usize, rbl: [usize; 2], replica_bit: usize, end_caps: bool) -> ReplicaColumnArg {
    ReplicaColumnArg::new(rbl[0] + rbl[1], rows, rbl, replica_bit, 1, end_caps)
}

#[test]
fn test_replica_bit_on_row_start_is_rejected() {
    let mut factory = factory(false);
    // rows 2..6 belong to the regular array
    let arg = column(4, [1, 0], 2, false);
    let name = arg.module_name();
    let err = factory.module(arg).unwrap_err();
    assert!(err.is_configuration(), "{}", err);
    assert!(factory.get(&name).is_none());
    assert_eq!(factory.module_count(), 0);
}

#[test]
fn test_forbidden_replica_bits() {
    let mut factory = factory(false);
    for bit in [2, 3, 5, 7, 100] {
        let err = factory.module(column(4, [1, 0], bit, false)).unwrap_err();
        assert!(err.is_configuration(), "bit {}: {}", bit, err);
    }
    for bit in [0, 1, 6] {
        assert!(factory.module(column(4, [1, 0], bit, false)).is_ok(), "bit {}", bit);
    }

    let mut factory = self::factory(true);
    for bit in [0, 6] {
        let err = factory.module(column(4, [1, 0], bit, true)).unwrap_err();
        assert!(err.is_configuration(), "capped bit {}: {}", bit, err);
    }
    assert!(factory.module(column(4, [1, 0], 1, true)).is_ok());

    // the column must agree with the cell family about end caps
    assert!(factory.module(column(4, [1, 0], 1, false)).unwrap_err().is_configuration());
}

#[test]
fn test_column_cells_and_pins() {
    let mut factory = factory(false);
    let circuit = factory.module(column(4, [1, 0], 1, false)).unwrap();
    let circuit = circuit.read();
    let column = circuit.downcast::<ReplicaColumnArg>().unwrap();

    assert_eq!(column.total_size(), 7);
    assert_eq!(column.regular_rows(), 2..6);
    let kinds: Vec<LeafKind> = (0..7).map(|row| column.cell_kind(row)).collect();
    assert_eq!(kinds, vec![
        LeafKind::DummyBitcell,
        LeafKind::ReplicaBitcell, LeafKind::ReplicaBitcell, LeafKind::ReplicaBitcell,
        LeafKind::ReplicaBitcell, LeafKind::ReplicaBitcell,
        LeafKind::DummyBitcell,
    ]);

    let ports: Vec<String> = column.port_names().iter().map(|p| p.to_string()).collect();
    assert_eq!(ports, vec![
        "bl_0_0", "br_0_0",
        "wl_0_0", "wl_0_1", "wl_0_2", "wl_0_3", "wl_0_4", "wl_0_5", "wl_0_6",
        "vdd_0", "vdd_1", "vdd_2", "vdd_3",
        "gnd",
    ]);

    let rbc = |row: usize| column.get_instance(&format!("rbc_{}", row)).unwrap();
    assert_eq!(rbc(0).read().placement.unwrap().orientation, Orientation::R0);
    assert_eq!(rbc(1).read().placement.unwrap().orientation, Orientation::MX);
    assert_eq!(rbc(6).read().net_of("vdd").unwrap(), "vdd_3");

    // ground reaches the boundary only at both ends
    let layout = column.layout.as_ref().unwrap();
    assert_eq!(layout.pins_named("gnd").count(), 2);
    let ties = layout.shapes.iter()
        .filter(|shape| shape.net.as_ref().is_some_and(|net| *net == "gnd"))
        .count();
    assert_eq!(ties, 5);
}

#[test]
fn test_capped_column_shares_end_groups() {
    let mut factory = factory(true);
    let circuit = factory.module(column(4, [1, 0], 1, true)).unwrap();
    let circuit = circuit.read();
    let column = circuit.downcast::<ReplicaColumnArg>().unwrap();

    assert_eq!(column.wordline_rows(), 1..6);
    assert_eq!(column.cell_kind(0), LeafKind::ColCap);
    assert_eq!(column.cell_kind(6), LeafKind::ColCap);
    assert_eq!(column.all_vdd_names().len(), 3);

    let net = |row: usize, pin: &str| column.get_instance(&format!("rbc_{}", row)).unwrap().read().net_of(pin).unwrap();
    assert_eq!(net(0, "vdd"), net(1, "vdd"));
    assert_eq!(net(6, "vdd"), net(5, "vdd"));
    assert_eq!(net(6, "vdd"), "vdd_2");
    assert_eq!(net(1, "wl"), "wl_0_0");

    // the bottom cap keeps its own rail, rows 1 and 2 share one around their common edge
    assert_eq!(column.get_instance("rbc_0").unwrap().read().placement.unwrap().orientation, Orientation::MX);
    assert_eq!(column.get_instance("rbc_1").unwrap().read().placement.unwrap().orientation, Orientation::R0);
    let layout = column.layout.as_ref().unwrap();
    let mut rails: Vec<(i64, i64)> = layout.pins_named("vdd_0").map(|pin| (pin.rect.ll.y, pin.rect.ur.y)).collect();
    rails.sort();
    assert_eq!(rails, vec![(40, 100), (400 + 1440, 400 + 1580 + 140)]);
}

#[test]
fn test_even_rows_rule() {
    let mut config = builtin_config(false);
    config.tech.replica_column_even_rows = true;
    let mut factory = CircuitFactory::new(Arc::new(Pdk::from_config(config).unwrap()));

    assert!(factory.module(column(3, [1, 0], 1, false)).unwrap_err().is_configuration());
    assert!(factory.module(column(4, [0, 1], 5, false)).unwrap_err().is_configuration());
    assert!(factory.module(column(4, [1, 0], 1, false)).is_ok());
}
