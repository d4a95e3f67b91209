use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use crate::circuit::{Design, Modular, ShrString};
use super::{Layout, LayoutError, Rect};

/// Net a conductor belongs to, seen from the module being checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NetKey {
    /// A net of the module itself.
    Net(ShrString),
    /// A net internal to one sub-instance, not reachable from the module.
    Internal(ShrString, ShrString),
}

struct Conductor {
    rect: Rect,
    owner: usize,
    net: NetKey,
}

/// Terminal self-check run on every module before it is handed out.
///
/// Connectivity is always checked. When the module carries a layout, the placement
/// of every instance, the pin set and the drawn geometry are checked as well.
pub fn verify(module: &dyn Modular) -> Result<(), LayoutError> {
    let mut violations = Vec::new();

    check_connectivity(module, &mut violations);
    if let Some(layout) = module.layout() {
        check_placements(module, layout, &mut violations);
        check_pins(module, layout, &mut violations);
        check_geometry(layout, &mut violations);
        check_vias(layout, &mut violations);
        check_net_spacing(layout, &mut violations);
        check_pin_overlaps(layout, &mut violations);
        check_instance_shorts(module, layout, &mut violations);
    }

    if violations.is_empty() {
        debug!("cell '{}' passed verification", module.name());
        Ok(())
    } else {
        warn!("cell '{}' failed verification with {} violation(s)", module.name(), violations.len());
        Err(LayoutError::Verification { cell: module.name().to_string(), violations })
    }
}

fn check_connectivity(module: &dyn Modular, violations: &mut Vec<String>) {
    for instance in module.instances() {
        let instance = instance.read();
        for pin in instance.pins.iter() {
            if !pin.read().connected() {
                violations.push(format!("pin '{}' of instance '{}' is floating", pin.read().name, instance.name));
            }
        }
    }

    for port in module.ports() {
        let port = port.read();
        match &port.net {
            None => violations.push(format!("port '{}' has no net", port.name)),
            Some(net) if net.read().pin_count() == 0 && !module.instances().is_empty() => {
                violations.push(format!("port '{}' reaches no instance", port.name));
            }
            Some(_) => {}
        }
    }
}

fn check_placements(module: &dyn Modular, layout: &Layout, violations: &mut Vec<String>) {
    let mut footprints = Vec::new();
    for instance in module.instances() {
        let instance = instance.read();
        let Some(placement) = instance.placement else {
            violations.push(format!("instance '{}' is not placed", instance.name));
            continue;
        };
        let template = instance.template_circuit.read();
        let Some(template_layout) = template.layout() else {
            violations.push(format!("instance '{}' of '{}' has no layout", instance.name, template.name()));
            continue;
        };

        let footprint = placement.footprint(&template_layout.boundary);
        if !layout.boundary.contains(&footprint) {
            violations.push(format!("instance '{}' lies outside the cell boundary", instance.name));
        }
        footprints.push((footprint, instance.name.clone()));
    }

    sweep(&mut footprints, false, |(_, a), (_, b)| {
        violations.push(format!("instances '{}' and '{}' overlap", a, b));
    });
}

fn check_pins(module: &dyn Modular, layout: &Layout, violations: &mut Vec<String>) {
    let port_names: HashSet<ShrString> = module.port_names().into_iter().collect();

    for name in port_names.iter() {
        if !layout.has_pin(name) {
            violations.push(format!("port '{}' has no layout pin", name));
        }
    }

    let mut reported = HashSet::new();
    for pin in layout.pins.iter() {
        if !port_names.contains(&pin.name) && reported.insert(pin.name.clone()) {
            violations.push(format!("layout pin '{}' is not a port", pin.name));
        }
    }
}

fn check_geometry(layout: &Layout, violations: &mut Vec<String>) {
    let rects = layout.pins.iter()
        .map(|pin| (&pin.rect, &pin.layer, Some(&pin.name)))
        .chain(layout.shapes.iter().map(|shape| (&shape.rect, &shape.layer, shape.net.as_ref())));

    for (rect, layer, label) in rects {
        let label = label.map(|l| l.as_str()).unwrap_or("<unnamed>");
        if rect.width() <= 0 || rect.height() <= 0 {
            violations.push(format!("'{}' on {} has no area", label, layer));
        }
        if !layout.boundary.contains(rect) {
            violations.push(format!("'{}' on {} at {:?} lies outside the cell boundary", label, layer, rect));
        }
    }
}

fn check_vias(layout: &Layout, violations: &mut Vec<String>) {
    for via in layout.vias.iter() {
        let Some(top) = via.top_layer() else {
            violations.push(format!("via of net '{}' has an empty layer stack", via.net));
            continue;
        };

        let on_shape = layout.shapes.iter().any(|shape| {
            shape.layer == *top && shape.net.as_ref() == Some(&via.net) && shape.rect.contains_point(via.center)
        });
        let on_pin = layout.pins.iter().any(|pin| {
            pin.layer == *top && pin.name == via.net && pin.rect.contains_point(via.center)
        });

        if !(on_shape || on_pin) {
            violations.push(format!("via of net '{}' at ({}, {}) does not land on a {} conductor of that net",
                via.net, via.center.x, via.center.y, top));
        }
    }
}

fn check_net_spacing(layout: &Layout, violations: &mut Vec<String>) {
    let mut by_layer: HashMap<ShrString, Vec<(Rect, ShrString)>> = HashMap::new();
    for shape in layout.shapes.iter() {
        if let Some(net) = &shape.net {
            by_layer.entry(shape.layer.clone()).or_default().push((shape.rect, net.clone()));
        }
    }

    for (layer, mut shapes) in by_layer {
        sweep(&mut shapes, true, |(_, a), (_, b)| {
            if a != b {
                violations.push(format!("nets '{}' and '{}' short on {}", a, b, layer));
            }
        });
    }
}

fn check_pin_overlaps(layout: &Layout, violations: &mut Vec<String>) {
    let mut by_layer: HashMap<ShrString, Vec<(Rect, ShrString)>> = HashMap::new();
    for pin in layout.pins.iter() {
        by_layer.entry(pin.layer.clone()).or_default().push((pin.rect, pin.name.clone()));
    }

    for (layer, mut pins) in by_layer {
        sweep(&mut pins, false, |(_, a), (_, b)| {
            if a != b {
                violations.push(format!("pins '{}' and '{}' overlap on {}", a, b, layer));
            }
        });
    }
}

/// Conductors of the module and of its placed sub-instances, grouped by layer. Sub-instance
/// geometry is moved into the module's coordinates and relabelled with the net its pin
/// is connected to. Labelled shapes that are not ports of the template stay internal.
fn collect_conductors(module: &dyn Modular, layout: &Layout) -> HashMap<ShrString, Vec<Conductor>> {
    let mut by_layer: HashMap<ShrString, Vec<Conductor>> = HashMap::new();
    for pin in layout.pins.iter() {
        by_layer.entry(pin.layer.clone()).or_default()
            .push(Conductor { rect: pin.rect, owner: 0, net: NetKey::Net(pin.name.clone()) });
    }
    for shape in layout.shapes.iter() {
        if let Some(net) = &shape.net {
            by_layer.entry(shape.layer.clone()).or_default()
                .push(Conductor { rect: shape.rect, owner: 0, net: NetKey::Net(net.clone()) });
        }
    }

    for (index, instance) in module.instances().iter().enumerate() {
        let instance = instance.read();
        let Some(placement) = instance.placement else { continue };
        let template = instance.template_circuit.read();
        let Some(template_layout) = template.layout() else { continue };
        let is_port = |name: &ShrString| template.ports().iter().any(|port| port.read().name == *name);
        let net_key = |name: &ShrString| match instance.net_of(name) {
            Some(net) if is_port(name) => NetKey::Net(net),
            _ => NetKey::Internal(instance.name.clone(), name.clone()),
        };

        let pins = template_layout.pins.iter().map(|pin| (&pin.layer, &pin.rect, Some(&pin.name)));
        let shapes = template_layout.shapes.iter().map(|shape| (&shape.layer, &shape.rect, shape.net.as_ref()));
        for (layer, rect, net) in pins.chain(shapes) {
            let Some(net) = net else { continue };
            by_layer.entry(layer.clone()).or_default().push(Conductor {
                rect: placement.transform_rect(rect, &template_layout.boundary),
                owner: index + 1,
                net: net_key(net),
            });
        }
    }
    by_layer
}

/// Abutting sub-instances must not join two nets of the module, directly or through
/// a conductor internal to some instance.
fn check_instance_shorts(module: &dyn Modular, layout: &Layout, violations: &mut Vec<String>) {
    for (layer, conductors) in collect_conductors(module, layout) {
        let mut keys: Vec<NetKey> = Vec::new();
        let mut key_index: HashMap<NetKey, usize> = HashMap::new();
        let mut items: Vec<(Rect, (usize, usize))> = Vec::with_capacity(conductors.len());
        for conductor in conductors {
            let index = *key_index.entry(conductor.net.clone()).or_insert_with(|| {
                keys.push(conductor.net.clone());
                keys.len() - 1
            });
            items.push((conductor.rect, (conductor.owner, index)));
        }

        // one node per net, joined wherever conductors of different owners touch
        let mut parent: Vec<usize> = (0..keys.len()).collect();
        sweep(&mut items, true, |(_, (owner_a, a)), (_, (owner_b, b))| {
            if owner_a != owner_b && a != b {
                union(&mut parent, *a, *b);
            }
        });

        let mut components: HashMap<usize, Vec<&ShrString>> = HashMap::new();
        for (index, key) in keys.iter().enumerate() {
            if let NetKey::Net(net) = key {
                components.entry(find(&mut parent, index)).or_default().push(net);
            }
        }
        for mut nets in components.into_values().filter(|nets| nets.len() > 1) {
            nets.sort();
            let nets: Vec<&str> = nets.iter().map(|net| net.as_str()).collect();
            violations.push(format!("nets '{}' short on {} between sub-instances", nets.join("', '"), layer));
        }
    }
}

fn find(parent: &mut [usize], mut node: usize) -> usize {
    while parent[node] != node {
        parent[node] = parent[parent[node]];
        node = parent[node];
    }
    node
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (a, b) = (find(parent, a), find(parent, b));
    if a != b {
        parent[b] = a;
    }
}

/// Reports every pair of rects that overlap (or touch, when `touching` is set).
fn sweep<T>(items: &mut [(Rect, T)], touching: bool, mut report: impl FnMut(&(Rect, T), &(Rect, T))) {
    items.sort_by_key(|(rect, _)| (rect.ll.x, rect.ll.y));
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            let (a, b) = (&items[i], &items[j]);
            let past = if touching { b.0.ll.x > a.0.ur.x } else { b.0.ll.x >= a.0.ur.x };
            if past {
                break;
            }
            let hit = if touching { a.0.touches(&b.0) } else { a.0.overlaps(&b.0) };
            if hit {
                report(a, b);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::circuit::{LeafKind, Module, PinRole};
    use crate::layout::{Coord, Orientation, Placement, Point};
    use crate::pdk::Pdk;
    use crate::LpRamError;
    use super::*;

    /// Two bitcells side by side, the right one on supply `right_vdd`.
    fn abutting_cells(right_vdd: &str) -> Module<()> {
        let pdk = Pdk::builtin().unwrap();
        let cell = pdk.get_leafcell(LeafKind::Bitcell, 1).unwrap();
        let mut module = Module::new("pair", ());
        for (index, vdd) in ["vdd_0", right_vdd].into_iter().enumerate() {
            let instance = module.link_leaf(format!("bit_c{}", index), &cell, |role| match role {
                PinRole::Vdd => vdd.into(),
                PinRole::Gnd => "gnd".into(),
                PinRole::Wordline(_) => "wl_0".into(),
                PinRole::Bitline(_) => format!("bl_{}", index).into(),
                PinRole::BitlineBar(_) => format!("br_{}", index).into(),
            }).unwrap();
            instance.write().place(Placement::new(Point::new(1200 * index as Coord, 0), Orientation::R0));
        }
        module.layout = Some(Layout::new(2400, 1580));
        module
    }

    #[test]
    fn test_abutting_cells_on_different_supplies_short() {
        assert!(verify(&abutting_cells("vdd_0")).is_ok());

        let err = verify(&abutting_cells("vdd_1")).unwrap_err();
        let LayoutError::Verification { violations, .. } = &err else {
            panic!("unexpected error {}", err);
        };
        assert!(violations.iter().any(|v| v.contains("'vdd_0', 'vdd_1' short on m2")), "{:?}", violations);
        assert!(LpRamError::from(err).is_verification());
    }

    #[test]
    fn test_strap_across_instance_pins_shorts() {
        let mut module = abutting_cells("vdd_0");
        let layout = module.layout.as_mut().unwrap();
        // runs from the bitline track of the left cell over to its complement
        layout.add_rect("m1", Rect::new(160, 0, 1040, 10), Some("bl_0".into()));

        let Err(LayoutError::Verification { violations, .. }) = verify(&module) else {
            panic!("strap was not reported");
        };
        assert!(violations.iter().any(|v| v.contains("'bl_0', 'br_0' short on m1")), "{:?}", violations);
    }

    #[test]
    fn test_sweep_finds_only_real_overlaps() {
        let mut rects = vec![
            (Rect::new(0, 0, 10, 10), "a"),
            (Rect::new(10, 0, 20, 10), "b"),
            (Rect::new(5, 5, 15, 15), "c"),
            (Rect::new(30, 0, 40, 10), "d"),
        ];

        let mut hits = Vec::new();
        sweep(&mut rects, false, |(_, a), (_, b)| hits.push(format!("{}{}", a, b)));
        hits.sort();
        assert_eq!(hits, vec!["ac", "cb"]);

        let mut touches = 0;
        sweep(&mut rects, true, |_, _| touches += 1);
        assert_eq!(touches, 3);
    }
}
