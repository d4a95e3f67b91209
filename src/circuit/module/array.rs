//! Naming, supply grouping and tiling shared by every grid-shaped module.

use crate::circuit::{Circuit, CircuitError, Design, Instance, Module, MirrorAxes, PinRole, Shr, ShrString};
use crate::layout::{Coord, Layout, LayoutError, LayoutPin, Orientation, Placement, Point, Rect};
use crate::pdk::TechParams;
use crate::{format_shr, LpRamResult};

pub const GND: &str = "gnd";

/// `bl_{port}_{col}`, `br_{port}_{col}` for every port of a column, column by column.
pub fn bitline_names(port_size: usize, cols: usize) -> Vec<ShrString> {
    let mut names = Vec::with_capacity(2 * port_size * cols);
    for col in 0..cols {
        for port in 0..port_size {
            names.push(format_shr!("bl_{}_{}", port, col));
            names.push(format_shr!("br_{}_{}", port, col));
        }
    }
    names
}

/// `wl_{port}_{row}` for every port of a row, bottom row first.
pub fn wordline_names(port_size: usize, rows: usize) -> Vec<ShrString> {
    let mut names = Vec::with_capacity(port_size * rows);
    for row in 0..rows {
        for port in 0..port_size {
            names.push(format_shr!("wl_{}_{}", port, row));
        }
    }
    names
}

pub fn vdd_names(group_count: usize) -> Vec<ShrString> {
    (0..group_count).map(|group| format_shr!("vdd_{}", group)).collect()
}

/// Two neighbouring rows share one supply group.
pub fn supply_group(row: usize) -> usize {
    row >> 1
}

pub fn supply_group_count(rows: usize) -> usize {
    (rows >> 1) + rows % 2
}

/// How the physical rows of a column map onto supply groups.
///
/// A capped column has an end-cap row at both ends. Those rows are not counted
/// when grouping and share the group of their neighbouring row. `phase` is the
/// parity of the enclosing supply row the first counted row sits on, so a
/// sub-module starting on an odd row pairs its rows the same way its parent does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyRows {
    rows: usize,
    capped: bool,
    phase: usize,
}

impl SupplyRows {
    pub fn new(rows: usize) -> Self {
        Self { rows, capped: false, phase: 0 }
    }

    /// `rows` includes both end-cap rows.
    pub fn capped(rows: usize) -> Self {
        Self { rows, capped: true, phase: 0 }
    }

    pub fn with_phase(self, phase: usize) -> Self {
        Self { phase: phase % 2, ..self }
    }

    pub fn addressable(&self) -> usize {
        if self.capped { self.rows.saturating_sub(2) } else { self.rows }
    }

    pub fn group_count(&self) -> usize {
        match self.addressable() {
            0 => 0,
            rows => supply_group(self.phase + rows - 1) + 1,
        }
    }

    pub fn group_of(&self, row: usize) -> usize {
        let row = if self.capped {
            row.saturating_sub(1).min(self.addressable().saturating_sub(1))
        } else {
            row
        };
        supply_group(self.phase + row)
    }

    /// Row phase for [`place_grid`]: odd supply rows are flipped, so both rows of a
    /// group face their shared rail. A bottom cap counts as the row below the first one.
    pub fn mirror_phase(&self) -> usize {
        (self.phase + usize::from(self.capped)) % 2
    }

    /// Physical rows of every group, group by group.
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.group_count()];
        for row in 0..self.rows {
            if let Some(group) = groups.get_mut(self.group_of(row)) {
                group.push(row);
            }
        }
        groups
    }
}

/// Supply net names of a sub-module whose first row sits on supply row `row_offset`
/// of its parent, for the sub-module's `group_count` local groups.
pub fn offset_vdd_names(row_offset: usize, group_count: usize) -> Vec<ShrString> {
    (0..group_count)
        .map(|group| format_shr!("vdd_{}", supply_group(row_offset + 2 * group)))
        .collect()
}

impl<A> Module<A> {
    /// Instantiates a leaf cell and wires each pin by its role.
    pub fn link_leaf<S, F>(&mut self, name: S, leaf: &Shr<Circuit>, net_of: F) -> LpRamResult<Shr<Instance>>
    where
        S: Into<ShrString>,
        F: FnMut(PinRole) -> ShrString,
    {
        let nets = {
            let circuit = leaf.read();
            let leafcell = circuit.leafcell()
                .ok_or_else(|| CircuitError::msg(format!("'{}' is not a leaf cell", circuit.name())))?;
            leafcell.connections(net_of)
        };

        let instance = self.add_instance(name, leaf.clone())?;
        self.connect_instance_in_order(&instance, nets)?;
        Ok(instance)
    }
}

pub(super) fn template_extent(instance: &Shr<Instance>) -> Result<(Coord, Coord, MirrorAxes), LayoutError> {
    let instance = instance.read();
    let template = instance.template_circuit.read();
    let layout = template.layout()
        .ok_or_else(|| LayoutError::MissingLayout(template.name().to_string()))?;
    let mirror = template.leafcell()
        .map(|leafcell| leafcell.mirror)
        .unwrap_or(MirrorAxes { x: false, y: false });
    Ok((layout.width(), layout.height(), mirror))
}

/// Tiles `grid` (rows bottom to top) from the origin and returns the covered width and height.
///
/// Row `r` is flipped upside down when `(r + row_phase)` is odd, column `c` left to right
/// when `(c + column_offset)` is odd and the cell allows it.
pub fn place_grid(grid: &[Vec<Shr<Instance>>], row_phase: usize, column_offset: usize) -> LpRamResult<(Coord, Coord)> {
    let mut y = 0;
    let mut width = 0;
    for (row, line) in grid.iter().enumerate() {
        let mut x = 0;
        let mut row_height = 0;
        for (col, instance) in line.iter().enumerate() {
            let (w, h, mirror) = template_extent(instance)?;
            let orientation = Orientation::from_mirror(
                mirror.x && (row + row_phase) % 2 == 1,
                mirror.y && (col + column_offset) % 2 == 1,
            );
            instance.write().place(Placement::new(Point::new(x, y), orientation));
            x += w;
            row_height = row_height.max(h);
        }
        width = width.max(x);
        y += row_height;
    }
    Ok((width, y))
}

/// Layout pins of an instance's template, moved into the parent's coordinates.
pub fn instance_pins(instance: &Shr<Instance>, pin_name: &str) -> Result<Vec<LayoutPin>, LayoutError> {
    let instance = instance.read();
    let placement = instance.placement
        .ok_or_else(|| LayoutError::InstanceNotPlaced(instance.name.to_string()))?;
    let template = instance.template_circuit.read();
    let layout = template.layout()
        .ok_or_else(|| LayoutError::MissingLayout(template.name().to_string()))?;

    Ok(layout.pins_named(pin_name)
        .map(|pin| LayoutPin {
            name: pin.name.clone(),
            layer: pin.layer.clone(),
            rect: placement.transform_rect(&pin.rect, &layout.boundary),
        })
        .collect())
}

/// Same as [`instance_pins`], with the pin picked by its role in a leaf cell.
pub fn leaf_pins(instance: &Shr<Instance>, role: PinRole) -> Result<Vec<LayoutPin>, LayoutError> {
    let pin_name = {
        let instance = instance.read();
        let template = instance.template_circuit.read();
        template.leafcell().and_then(|leafcell| leafcell.pin_name(role))
    };
    match pin_name {
        Some(pin_name) => instance_pins(instance, &pin_name),
        None => Ok(vec![]),
    }
}

/// Copies every layout pin `pin_name` of `instance` into `layout`, labelled `as_name`.
pub fn copy_pin(layout: &mut Layout, instance: &Shr<Instance>, pin_name: &str, as_name: &ShrString) -> Result<(), LayoutError> {
    let pins = instance_pins(instance, pin_name)?;
    if pins.is_empty() {
        return Err(LayoutError::PinNotFound(pin_name.to_string(), instance.read().template_name().to_string()));
    }
    for pin in pins {
        layout.add_pin(as_name.clone(), pin.layer, pin.rect);
    }
    Ok(())
}

/// Area a placed instance covers in its parent.
pub fn footprint(instance: &Shr<Instance>) -> Result<Rect, LayoutError> {
    let instance = instance.read();
    let placement = instance.placement
        .ok_or_else(|| LayoutError::InstanceNotPlaced(instance.name.to_string()))?;
    let template = instance.template_circuit.read();
    let layout = template.layout()
        .ok_or_else(|| LayoutError::MissingLayout(template.name().to_string()))?;
    Ok(placement.footprint(&layout.boundary))
}

/// Splits the vdd pins of a group's cells, given bottom to top, into rails.
///
/// Two abutting cells share one rail when their pins both face the common edge,
/// which is how a mirrored row pair is drawn. Any other member gets a rail of its own.
pub fn supply_rails(members: &[Shr<Instance>]) -> Result<Vec<Rect>, LayoutError> {
    let mut rails: Vec<Rect> = Vec::new();
    let mut below: Option<(Rect, Rect)> = None;
    for instance in members {
        let pin = leaf_pins(instance, PinRole::Vdd)?
            .into_iter()
            .map(|pin| pin.rect)
            .reduce(|a, b| a.union(&b));
        let Some(pin) = pin else { continue };
        let cell = footprint(instance)?;

        let shared = below.is_some_and(|(below_cell, below_pin)| {
            below_cell.ur.y == cell.ll.y
                && below_pin.center().y > below_cell.center().y
                && pin.center().y < cell.center().y
        });
        match rails.last_mut() {
            Some(rail) if shared => *rail = rail.union(&pin),
            _ => rails.push(pin),
        }
        below = Some((cell, pin));
    }
    Ok(rails)
}

/// Draws one stripe per supply rail on the power layer across the whole cell and
/// labels it as its group's pin. Every cell gets a via from its vdd pin up to the
/// stripe when the pin sits on another layer.
pub fn draw_supply_stripes(
    layout: &mut Layout,
    tech: &TechParams,
    groups: &[(ShrString, Vec<Shr<Instance>>)],
    cells: &[Shr<Instance>],
) -> Result<(), LayoutError> {
    let width = layout.width();
    for (name, members) in groups {
        let rails = supply_rails(members)?;
        if rails.is_empty() {
            return Err(LayoutError::PinNotFound("vdd".into(), name.to_string()));
        }
        for rail in rails {
            let stripe = rail.span_x(0, width);
            layout.add_rect(tech.power_layer.clone(), stripe, Some(name.clone()));
            layout.add_pin(name.clone(), tech.power_layer.clone(), stripe);
        }
    }

    for instance in cells {
        for pin in leaf_pins(instance, PinRole::Vdd)? {
            if pin.layer == tech.power_layer {
                continue;
            }
            let instance = instance.read();
            let net = instance.net_of(&pin.name)
                .ok_or_else(|| LayoutError::PinNotFound(pin.name.to_string(), instance.name.to_string()))?;
            layout.add_via(&tech.power_via, pin.rect.center(), net);
        }
    }
    Ok(())
}

/// Supply groups of a grid, each with the first cell of its member rows.
pub fn grid_supply_groups<F>(grid: &[Vec<Shr<Instance>>], supply: &SupplyRows, name_of: F) -> Vec<(ShrString, Vec<Shr<Instance>>)>
where
    F: Fn(usize) -> ShrString,
{
    supply.members()
        .into_iter()
        .enumerate()
        .map(|(group, rows)| {
            let members = rows.into_iter().filter_map(|row| grid.get(row)?.first().cloned()).collect();
            (name_of(group), members)
        })
        .collect()
}

/// Labels a conductor spanning the full height of the cell for each pin `role` of `instance`.
pub fn add_column_pins(layout: &mut Layout, instance: &Shr<Instance>, role: PinRole, name: &ShrString) -> Result<(), LayoutError> {
    let height = layout.height();
    for pin in leaf_pins(instance, role)? {
        layout.add_pin(name.clone(), pin.layer, pin.rect.span_y(0, height));
    }
    Ok(())
}

/// Labels a conductor spanning the full width of the cell for each pin `role` of `instance`.
pub fn add_row_pins(layout: &mut Layout, instance: &Shr<Instance>, role: PinRole, name: &ShrString) -> Result<(), LayoutError> {
    let width = layout.width();
    for pin in leaf_pins(instance, role)? {
        layout.add_pin(name.clone(), pin.layer, pin.rect.span_x(0, width));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bitline_order_is_column_major() {
        let names: Vec<String> = bitline_names(2, 2).iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec![
            "bl_0_0", "br_0_0", "bl_1_0", "br_1_0",
            "bl_0_1", "br_0_1", "bl_1_1", "br_1_1",
        ]);
    }

    #[test]
    fn test_wordline_order_is_row_major() {
        let names: Vec<String> = wordline_names(2, 2).iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["wl_0_0", "wl_1_0", "wl_0_1", "wl_1_1"]);
    }

    #[test]
    fn test_supply_groups() {
        for (rows, groups) in [(1, 1), (3, 2), (5, 3), (8, 4)] {
            assert_eq!(supply_group_count(rows), groups);
            for row in 0..rows {
                assert_eq!(supply_group(row), row >> 1);
                assert!(supply_group(row) < groups);
            }
        }
    }

    #[test]
    fn test_capped_supply_rows() {
        // cap, 4 addressable rows, cap
        let rows = SupplyRows::capped(6);
        assert_eq!(rows.addressable(), 4);
        assert_eq!(rows.group_count(), 2);
        let groups: Vec<usize> = (0..6).map(|row| rows.group_of(row)).collect();
        assert_eq!(groups, vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(rows.members(), vec![vec![0, 1, 2], vec![3, 4, 5]]);

        let rows = SupplyRows::new(5);
        assert_eq!(rows.members(), vec![vec![0, 1], vec![2, 3], vec![4]]);
    }

    #[test]
    fn test_offset_vdd_names() {
        let names: Vec<String> = offset_vdd_names(2, 3).iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["vdd_1", "vdd_2", "vdd_3"]);
        let names: Vec<String> = offset_vdd_names(5, 1).iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["vdd_2"]);
    }
}
