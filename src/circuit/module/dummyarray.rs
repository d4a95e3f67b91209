use std::fmt;
use lpram_macro::module;
use crate::circuit::{CircuitFactory, Instance, LeafKind, NameSegment, PinRole, Shr, ShrString};
use crate::layout::Layout;
use crate::pdk::TechParams;
use crate::{check_arg, LpRamResult};
use super::array::{self, add_row_pins, copy_pin, draw_supply_stripes, grid_supply_groups, leaf_pins, place_grid, SupplyRows};
use super::bitcellarray::leaf_gnd_name;

/// Which non-storage cell a boundary array is tiled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryCell {
    /// Dummy storage cells: a wordline on every row, bitlines left floating.
    Dummy,
    /// Column end caps closing the bitlines, no wordlines.
    ColCap,
    /// Row end caps closing the wordlines, no bitlines.
    RowCap,
}

impl BoundaryCell {
    pub fn leaf_kind(&self) -> LeafKind {
        match self {
            Self::Dummy => LeafKind::DummyBitcell,
            Self::ColCap => LeafKind::ColCap,
            Self::RowCap => LeafKind::RowCap,
        }
    }

    pub fn has_wordlines(&self) -> bool {
        !matches!(self, Self::ColCap)
    }

    pub fn has_bitlines(&self) -> bool {
        !matches!(self, Self::RowCap)
    }
}

impl fmt::Display for BoundaryCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dummy => f.write_str("dummy"),
            Self::ColCap => f.write_str("colcap"),
            Self::RowCap => f.write_str("rowcap"),
        }
    }
}

impl NameSegment for BoundaryCell {
    fn name_segment(&self) -> String {
        self.to_string()
    }
}

#[module(
    wordline:    ("wl_{port}_{row}", Input, all_wordline_names),
    vdd:         ("vdd_{group}", Power, all_vdd_names),
    gnd:         ("gnd", Ground),
    bitline:     ("bl_{port}_{col}", InOut),
    bitline_bar: ("br_{port}_{col}", InOut),
)]
/// Grid of dummy or end-cap cells. Bitlines stay internal and are only drawn.
pub struct DummyArray {
    pub port_size: usize,
    pub rows: usize,
    pub cols: usize,
    pub boundary: BoundaryCell,
    /// Local row `r` is flipped when `r + mirror` is odd.
    pub mirror: usize,
    pub column_offset: usize,
}

impl DummyArray {
    pub fn build(&mut self, factory: &mut CircuitFactory) -> LpRamResult<()> {
        let DummyArrayArg { port_size, rows, cols, boundary, .. } = self.args.clone();
        check_arg!(port_size >= 1, "port size {} < 1", port_size);
        check_arg!(rows >= 1, "row size {} < 1", rows);
        check_arg!(cols >= 1, "column size {} < 1", cols);

        let cell = self.add_leafcell(boundary.leaf_kind(), port_size, factory)?;

        let mut grid = Vec::with_capacity(rows);
        for row in 0..rows {
            let mut line = Vec::with_capacity(cols);
            for col in 0..cols {
                let instance = self.link_leaf(format!("dummy_r{}_c{}", row, col), &cell, |role| match role {
                    PinRole::Bitline(port) => Self::bitline_pn(port, col),
                    PinRole::BitlineBar(port) => Self::bitline_bar_pn(port, col),
                    PinRole::Wordline(port) => Self::wordline_pn(port, row),
                    // local row, whatever the caller's offset
                    PinRole::Vdd => Self::vdd_pn(array::supply_group(row)),
                    PinRole::Gnd => Self::gnd_pn(),
                })?;
                line.push(instance);
            }
            grid.push(line);
        }

        if !factory.netlist_only() {
            self.create_layout(&grid, &factory.pdk.tech)?;
        }

        Ok(())
    }

    fn create_layout(&mut self, grid: &[Vec<Shr<Instance>>], tech: &TechParams) -> LpRamResult<()> {
        let DummyArrayArg { port_size, rows, cols, boundary, mirror, column_offset } = self.args.clone();
        let (width, height) = place_grid(grid, mirror, column_offset)?;
        let mut layout = Layout::new(width, height);

        let groups = grid_supply_groups(grid, &SupplyRows::new(rows), Self::vdd_pn);
        let cells: Vec<_> = grid.iter().flatten().cloned().collect();
        draw_supply_stripes(&mut layout, tech, &groups, &cells)?;

        // floating bitlines: drawn metal, no pins
        if boundary.has_bitlines() {
            for col in 0..cols {
                for port in 0..port_size {
                    for (role, net) in [
                        (PinRole::Bitline(port), Self::bitline_pn(port, col)),
                        (PinRole::BitlineBar(port), Self::bitline_bar_pn(port, col)),
                    ] {
                        for pin in leaf_pins(&grid[0][col], role)? {
                            layout.add_rect(pin.layer, pin.rect.span_y(0, height), Some(net.clone()));
                        }
                    }
                }
            }
        }

        if boundary.has_wordlines() {
            for (row, line) in grid.iter().enumerate() {
                for port in 0..port_size {
                    add_row_pins(&mut layout, &line[0], PinRole::Wordline(port), &Self::wordline_pn(port, row))?;
                }
            }
        }

        let gnd = Self::gnd_pn();
        for instance in cells.iter() {
            copy_pin(&mut layout, instance, &leaf_gnd_name(instance), &gnd)?;
        }

        self.layout = Some(layout);
        Ok(())
    }

    pub fn all_wordline_names(&self) -> Vec<ShrString> {
        if self.args.boundary.has_wordlines() {
            array::wordline_names(self.args.port_size, self.args.rows)
        } else {
            vec![]
        }
    }

    pub fn all_vdd_names(&self) -> Vec<ShrString> {
        array::vdd_names(array::supply_group_count(self.args.rows))
    }
}
