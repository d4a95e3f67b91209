use std::ops::Range;
use lpram_macro::module;
use tracing::debug;
use crate::circuit::{CircuitFactory, Instance, LeafKind, PinRole, Shr, ShrString};
use crate::layout::Layout;
use crate::pdk::TechParams;
use crate::{check_arg, LpRamResult};
use super::array::{self, add_column_pins, add_row_pins, copy_pin, draw_supply_stripes, grid_supply_groups, leaf_pins, place_grid, SupplyRows};
use super::bitcellarray::leaf_gnd_name;

#[module(
    bitline:     ("bl_{port}_{col}", InOut, all_bitline_names),
    bitline_bar: ("br_{port}_{col}", InOut),
    wordline:    ("wl_{port}_{row}", Input, all_wordline_names),
    vdd:         ("vdd_{group}", Power, all_vdd_names),
    gnd:         ("gnd", Ground),
)]
/// One column of replica cells running the full height of a replica array.
///
/// From the bottom: a dummy row (or column cap), `rbl[0]` replica wordline rows,
/// `rows` regular rows, `rbl[1]` replica wordline rows and another dummy row (or cap).
/// The cell on `replica_bit` and every regular row is a replica cell, the rest are dummies.
pub struct ReplicaColumn {
    pub port_size: usize,
    pub rows: usize,
    pub rbl: [usize; 2],
    pub replica_bit: usize,
    pub column_offset: usize,
    pub end_caps: bool,
}

impl ReplicaColumn {
    pub fn build(&mut self, factory: &mut CircuitFactory) -> LpRamResult<()> {
        let ReplicaColumnArg { port_size, rows, rbl, replica_bit, end_caps, .. } = self.args.clone();
        check_arg!(port_size >= 1, "port size {} < 1", port_size);
        check_arg!(rows >= 1, "row size {} < 1", rows);
        let pdk_end_caps = factory.end_caps(port_size)?;
        check_arg!(end_caps == pdk_end_caps,
            "replica column built with end_caps={} but the {} port cell family has end_caps={}", end_caps, port_size, pdk_end_caps);

        let total_size = self.total_size();
        if end_caps {
            check_arg!(replica_bit != 0 && replica_bit != total_size - 1,
                "replica bit {} cannot be the dummy/cap row", replica_bit);
        }
        let regular_rows = self.regular_rows();
        check_arg!(!regular_rows.contains(&replica_bit),
            "replica bit {} cannot be in the regular array rows {:?}", replica_bit, regular_rows);
        check_arg!(replica_bit < total_size,
            "replica bit {} is outside the column of {} rows", replica_bit, total_size);
        if factory.pdk.tech.replica_column_even_rows {
            // The regular rows start at local row rbl[0] + 1, counted from the bottom dummy or
            // cap row, and that row's mirror phase must be even. So rbl[0] is odd, not rbl[0] + 1.
            check_arg!(rows % 2 == 0 && (rbl[0] + 1) % 2 == 0,
                "rows must be even and rbl[0] odd so the regular rows start on an even local row, got rows={} rbl[0]={}", rows, rbl[0]);
        }

        let supply = self.supply_rows();
        let wordline_rows = self.wordline_rows();
        let mut column = Vec::with_capacity(total_size);
        for row in 0..total_size {
            let kind = self.cell_kind(row);
            let cell = self.add_leafcell(kind, port_size, factory)?;
            debug!("replica column row {} uses {}", row, kind);

            let wordline_row = row.checked_sub(wordline_rows.start);
            let instance = self.link_leaf(format!("rbc_{}", row), &cell, |role| match role {
                PinRole::Bitline(port) => Self::bitline_pn(port, 0),
                PinRole::BitlineBar(port) => Self::bitline_bar_pn(port, 0),
                PinRole::Wordline(port) => match wordline_row {
                    Some(local) if wordline_rows.contains(&row) => Self::wordline_pn(port, local),
                    // only cap rows lack a wordline, and caps have no wordline pin
                    _ => Self::gnd_pn(),
                },
                PinRole::Vdd => Self::vdd_pn(supply.group_of(row)),
                PinRole::Gnd => Self::gnd_pn(),
            })?;
            column.push(vec![instance]);
        }

        if !factory.netlist_only() {
            self.create_layout(&column, &factory.pdk.tech)?;
        }

        Ok(())
    }

    fn create_layout(&mut self, column: &[Vec<Shr<Instance>>], tech: &TechParams) -> LpRamResult<()> {
        let ReplicaColumnArg { port_size, column_offset, .. } = self.args.clone();
        let supply = self.supply_rows();
        let (width, height) = place_grid(column, supply.mirror_phase(), column_offset)?;
        let mut layout = Layout::new(width, height);

        let groups = grid_supply_groups(column, &supply, Self::vdd_pn);
        let cells: Vec<_> = column.iter().flatten().cloned().collect();
        draw_supply_stripes(&mut layout, tech, &groups, &cells)?;

        for port in 0..port_size {
            add_column_pins(&mut layout, &column[0][0], PinRole::Bitline(port), &Self::bitline_pn(port, 0))?;
            add_column_pins(&mut layout, &column[0][0], PinRole::BitlineBar(port), &Self::bitline_bar_pn(port, 0))?;
        }

        let wordline_rows = self.wordline_rows();
        for port in 0..port_size {
            for row in wordline_rows.clone() {
                let name = Self::wordline_pn(port, row - wordline_rows.start);
                add_row_pins(&mut layout, &column[row][0], PinRole::Wordline(port), &name)?;
            }
        }

        // ground is a pin only at both ends of the column, interior rows are tied internally
        let gnd = Self::gnd_pn();
        let last = cells.len() - 1;
        for (row, instance) in cells.iter().enumerate() {
            if row == 0 || row == last {
                copy_pin(&mut layout, instance, &leaf_gnd_name(instance), &gnd)?;
            } else {
                for pin in leaf_pins(instance, PinRole::Gnd)? {
                    layout.add_rect(pin.layer, pin.rect, Some(gnd.clone()));
                }
            }
        }

        self.layout = Some(layout);
        Ok(())
    }

    /// Every row including the two dummy/cap rows.
    pub fn total_size(&self) -> usize {
        self.args.rbl[0] + self.args.rows + self.args.rbl[1] + 2
    }

    /// Rows holding the cells of the regular array.
    pub fn regular_rows(&self) -> Range<usize> {
        let row_start = self.args.rbl[0] + 1;
        row_start..row_start + self.args.rows
    }

    /// Rows with wordline pins: all of them unless the column is capped.
    pub fn wordline_rows(&self) -> Range<usize> {
        let total_size = self.total_size();
        if self.args.end_caps { 1..total_size - 1 } else { 0..total_size }
    }

    pub fn supply_rows(&self) -> SupplyRows {
        if self.args.end_caps {
            SupplyRows::capped(self.total_size())
        } else {
            SupplyRows::new(self.total_size())
        }
    }

    pub fn cell_kind(&self, row: usize) -> LeafKind {
        let total_size = self.total_size();
        if self.args.end_caps && (row == 0 || row == total_size - 1) {
            LeafKind::ColCap
        } else if row == self.args.replica_bit || self.regular_rows().contains(&row) {
            LeafKind::ReplicaBitcell
        } else {
            LeafKind::DummyBitcell
        }
    }

    pub fn all_bitline_names(&self) -> Vec<ShrString> {
        array::bitline_names(self.args.port_size, 1)
    }

    pub fn all_wordline_names(&self) -> Vec<ShrString> {
        array::wordline_names(self.args.port_size, self.wordline_rows().len())
    }

    pub fn all_vdd_names(&self) -> Vec<ShrString> {
        array::vdd_names(self.supply_rows().group_count())
    }
}
