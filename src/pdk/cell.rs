use std::collections::HashSet;
use crate::circuit::{Leafcell, LeafKind, MirrorAxes, PinRole, PortDirection, ShrString};
use crate::layout::{Layout, Rect};
use super::{CellFamilyConfig, CellProperties, PdkError};

/// Pin roles a leaf of `kind` must carry in a family of `port_size` ports, in canonical order.
pub fn required_roles(kind: LeafKind, port_size: usize) -> Vec<PinRole> {
    let mut roles = Vec::new();
    if kind != LeafKind::RowCap {
        for port in 0..port_size {
            roles.push(PinRole::Bitline(port));
            roles.push(PinRole::BitlineBar(port));
        }
    }
    if kind != LeafKind::ColCap {
        roles.extend((0..port_size).map(PinRole::Wordline));
    }
    roles.push(PinRole::Vdd);
    roles.push(PinRole::Gnd);
    roles
}

fn role_suits(role: PinRole, direction: PortDirection) -> bool {
    match role {
        PinRole::Vdd => direction == PortDirection::Power,
        PinRole::Gnd => direction == PortDirection::Ground,
        PinRole::Wordline(_) => direction == PortDirection::Input,
        PinRole::Bitline(_) | PinRole::BitlineBar(_) => matches!(direction, PortDirection::InOut | PortDirection::Output),
    }
}

/// Checks one cell entry against its family and turns it into a leaf cell.
pub fn extract_leafcell(family: &CellFamilyConfig, cell: &CellProperties) -> Result<Leafcell, PdkError> {
    let [width, height] = cell.size;
    if width <= 0 || height <= 0 {
        return Err(PdkError::InvalidSize(cell.name.clone(), width, height));
    }

    let required = required_roles(cell.kind, family.port_size);
    let mut seen_names = HashSet::new();
    let mut seen_roles = HashSet::new();
    let mut pins = Vec::with_capacity(cell.pins.len());
    let mut layout = Layout::new(width, height);

    for pin in cell.pins.iter() {
        let name = family.mapped_pin_name(&pin.name);
        if !seen_names.insert(name.to_string()) {
            return Err(PdkError::DuplicatePin(cell.name.clone(), name.to_string()));
        }
        if !required.contains(&pin.role) || !seen_roles.insert(pin.role) {
            return Err(PdkError::UnexpectedPin(cell.name.clone(), name.to_string()));
        }
        if !role_suits(pin.role, pin.direction) {
            return Err(PdkError::PinDirection(cell.name.clone(), name.to_string(), pin.direction));
        }

        for shape in pin.shapes.iter() {
            let [x0, y0, x1, y1] = shape.rect;
            if x0 == x1 || y0 == y1 {
                return Err(PdkError::InvalidRect(name.to_string(), shape.rect));
            }
            layout.add_pin(name, shape.layer.as_str(), Rect::new(x0, y0, x1, y1));
        }

        pins.push((ShrString::from(name), pin.role, pin.direction));
    }

    if let Some(missing) = required.iter().find(|role| !seen_roles.contains(*role)) {
        return Err(PdkError::MissingPinRole(cell.name.clone(), format!("{:?}", missing)));
    }

    let mirror = match cell.kind {
        // caps are never flipped left to right
        LeafKind::ColCap | LeafKind::RowCap => MirrorAxes { x: family.mirror.x, y: false },
        _ => family.mirror,
    };

    Ok(Leafcell::new(
        cell.name.as_str(),
        cell.kind,
        family.port_size,
        pins,
        mirror,
        family.storage_nets.iter().map(|net| ShrString::from(net.as_str())).collect(),
        layout,
    ))
}

#[cfg(test)]
mod test {
    use crate::circuit::{LeafKind, PinRole};
    use super::required_roles;

    #[test]
    fn test_required_roles() {
        assert_eq!(required_roles(LeafKind::Bitcell, 1), vec![
            PinRole::Bitline(0), PinRole::BitlineBar(0), PinRole::Wordline(0), PinRole::Vdd, PinRole::Gnd,
        ]);
        assert_eq!(required_roles(LeafKind::ColCap, 2).len(), 6);
        assert_eq!(required_roles(LeafKind::RowCap, 2), vec![
            PinRole::Wordline(0), PinRole::Wordline(1), PinRole::Vdd, PinRole::Gnd,
        ]);
    }
}
