use std::sync::Arc;
use lpram::{
    circuit::{
        supply_group, supply_group_count, BitcellArrayArg, BoundaryCell, BuildOptions, CircuitFactory, Design,
        DummyArrayArg, LeafKind, PortDirection,
    },
    layout::Orientation,
    pdk::Pdk,
};

fn factory() -> CircuitFactory {
    CircuitFactory::new(Arc::new(Pdk::builtin().unwrap()))
}

#[test]
fn test_supply_groups_follow_row_pairs() {
    let mut factory = factory();
    for rows in [1, 3, 5, 8] {
        let circuit = factory.module(BitcellArrayArg::new(1, rows, 2, 0, 0)).unwrap();
        let circuit = circuit.read();
        let array = circuit.downcast::<BitcellArrayArg>().unwrap();

        let supplies = array.port_directions().into_iter().filter(|d| *d == PortDirection::Power).count();
        assert_eq!(supplies, supply_group_count(rows));
        assert_eq!(supplies, (rows + 1) / 2);

        for row in 0..rows {
            let cell = array.get_instance(&format!("bit_r{}_c1", row)).unwrap();
            let net = cell.read().net_of("vdd").unwrap();
            assert_eq!(net, format!("vdd_{}", row >> 1));
            assert_eq!(supply_group(row), row >> 1);
        }
    }
}

#[test]
fn test_bitcell_array_ports_and_layout() {
    let mut factory = factory();
    let circuit = factory.module(BitcellArrayArg::new(2, 2, 2, 1, 0)).unwrap();
    let circuit = circuit.read();
    let array = circuit.downcast::<BitcellArrayArg>().unwrap();

    let ports: Vec<String> = array.port_names().iter().map(|p| p.to_string()).collect();
    assert_eq!(ports, vec![
        "bl_0_0", "br_0_0", "bl_1_0", "br_1_0",
        "bl_0_1", "br_0_1", "bl_1_1", "br_1_1",
        "wl_0_0", "wl_1_0", "wl_0_1", "wl_1_1",
        "vdd_0",
        "gnd",
    ]);

    let layout = array.layout.as_ref().unwrap();
    assert_eq!((layout.width(), layout.height()), (2 * 1200, 2 * 1580));
    // one rail around the edge rows 0 and 1 share
    let stripes: Vec<_> = layout.pins_named("vdd_0").collect();
    assert_eq!(stripes.len(), 1);
    assert_eq!((stripes[0].rect.ll.y, stripes[0].rect.ur.y), (1440, 1580 + 140));
    assert!(layout.vias.iter().all(|via| via.net == "vdd_0"));

    let placed = |name: &str| array.get_instance(name).unwrap().read().placement.unwrap().orientation;
    assert_eq!(placed("bit_r0_c0"), Orientation::R0);
    assert_eq!(placed("bit_r1_c0"), Orientation::MX);
}

#[test]
fn test_dummy_array_keeps_bitlines_internal() {
    let mut factory = factory();
    let circuit = factory.module(DummyArrayArg::new(1, 3, 2, BoundaryCell::Dummy, 1, 0)).unwrap();
    let circuit = circuit.read();
    let array = circuit.downcast::<DummyArrayArg>().unwrap();

    let ports = array.port_names();
    assert!(ports.iter().all(|port| !port.starts_with("bl") && !port.starts_with("br")));
    assert_eq!(ports.len(), 3 + 2 + 1);

    let layout = array.layout.as_ref().unwrap();
    assert!(!layout.has_pin("bl_0_0"));
    assert!(layout.shapes.iter().any(|shape| shape.net.as_ref().is_some_and(|net| *net == "bl_0_0")));

    // odd mirror phase flips the first row
    let orientation = array.get_instance("dummy_r0_c0").unwrap().read().placement.unwrap().orientation;
    assert_eq!(orientation, Orientation::MX);

    // rows 0 and 1 turn their rails away from each other, so group 0 gets two stripes
    let stripes: Vec<_> = layout.pins_named("vdd_0").collect();
    assert_eq!(stripes.len(), 2);
    assert!(stripes.iter().all(|pin| pin.rect.height() == 100 && pin.rect.width() == 2 * 1200));
}

#[test]
fn test_row_phase_closes_the_group_below() {
    let mut factory = factory();
    let circuit = factory.module(BitcellArrayArg::new(1, 3, 2, 0, 1)).unwrap();
    let circuit = circuit.read();
    let array = circuit.downcast::<BitcellArrayArg>().unwrap();

    let supplies: Vec<String> = array.port_names().iter()
        .filter(|port| port.starts_with("vdd"))
        .map(|port| port.to_string())
        .collect();
    assert_eq!(supplies, vec!["vdd_0", "vdd_1"]);

    let cell = |row: usize| array.get_instance(&format!("bit_r{}_c0", row)).unwrap();
    let vdd: Vec<String> = (0..3).map(|row| cell(row).read().net_of("vdd").unwrap().to_string()).collect();
    assert_eq!(vdd, vec!["vdd_0", "vdd_1", "vdd_1"]);

    // the first row faces down to the rail it shares with the row below the array
    assert_eq!(cell(0).read().placement.unwrap().orientation, Orientation::MX);
    assert_eq!(cell(1).read().placement.unwrap().orientation, Orientation::R0);

    // one rail per group: row 0 alone at its bottom edge, rows 1 and 2 around their shared edge
    let layout = array.layout.as_ref().unwrap();
    let rail = |name: &str| {
        let pins: Vec<_> = layout.pins_named(name).collect();
        assert_eq!(pins.len(), 1, "{}", name);
        (pins[0].rect.ll.y, pins[0].rect.ur.y)
    };
    assert_eq!(rail("vdd_0"), (40, 140));
    assert_eq!(rail("vdd_1"), (1580 + 1440, 2 * 1580 + 140));
}

#[test]
fn test_cap_arrays_expose_what_the_cap_has() {
    let mut factory = CircuitFactory::new(Arc::new(Pdk::builtin_with_end_caps().unwrap()));

    let colcap = factory.module(DummyArrayArg::new(1, 1, 3, BoundaryCell::ColCap, 0, 0)).unwrap();
    let colcap = colcap.read();
    let names: Vec<String> = colcap.port_names().iter().map(|p| p.to_string()).collect();
    assert_eq!(names, vec!["vdd_0", "gnd"]);

    let rowcap = factory.module(DummyArrayArg::new(1, 4, 1, BoundaryCell::RowCap, 0, 0)).unwrap();
    let rowcap = rowcap.read();
    let module = rowcap.module().unwrap();
    assert_eq!(module.port_names().len(), 4 + 2 + 1);
    assert_eq!(module.circuits()[0].read().leafcell().unwrap().kind, LeafKind::RowCap);
    assert!(rowcap.layout().unwrap().shapes.iter().all(|shape| !shape.net.as_ref().is_some_and(|net| net.starts_with("bl"))));
}

#[test]
fn test_caps_need_a_capped_family() {
    let mut factory = factory();
    let err = factory.module(DummyArrayArg::new(1, 1, 2, BoundaryCell::ColCap, 0, 0)).unwrap_err();
    assert!(err.to_string().contains("create circuit"));
}

#[test]
fn test_netlist_only_modules_have_no_layout() {
    let pdk = Arc::new(Pdk::builtin().unwrap());
    let mut factory = CircuitFactory::with_options(pdk, BuildOptions { netlist_only: true });
    let circuit = factory.module(BitcellArrayArg::new(1, 2, 2, 0, 0)).unwrap();
    let circuit = circuit.read();
    assert!(circuit.layout().is_none());
    let array = circuit.downcast::<BitcellArrayArg>().unwrap();
    assert_eq!(array.connection_table().unwrap().len(), 4);
}
