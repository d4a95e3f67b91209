use lpram_macro::module;
use crate::circuit::{CircuitFactory, Instance, LeafKind, PinRole, Shr, ShrString};
use crate::layout::Layout;
use crate::pdk::TechParams;
use crate::{check_arg, LpRamResult};
use super::array::{self, add_column_pins, add_row_pins, copy_pin, draw_supply_stripes, grid_supply_groups, place_grid, SupplyRows};

#[module(
    bitline:     ("bl_{port}_{col}", InOut, all_bitline_names),
    bitline_bar: ("br_{port}_{col}", InOut),
    wordline:    ("wl_{port}_{row}", Input, all_wordline_names),
    vdd:         ("vdd_{group}", Power, all_vdd_names),
    gnd:         ("gnd", Ground),
)]
/// Regular grid of storage cells. Every two rows share one supply group.
pub struct BitcellArray {
    pub port_size: usize,
    pub rows: usize,
    pub cols: usize,
    /// Physical column of the first cell in the enclosing macro, sets the column mirror phase.
    pub column_offset: usize,
    /// Parity of the enclosing supply row the first row sits on. With 1 the first row
    /// closes a supply group started below the array.
    pub row_phase: usize,
}

impl BitcellArray {
    /*
                  vdd_{last} stripe
         +-------------------------------+
   wl_*_n|  bit_r{n}_c0  ...             |
         |  (MX)                         |
         |-------------------------------|  vdd_0 stripe on the shared
   wl_*_1|  bit_r1_c0    bit_r1_c1  ...  |  edge of rows 0 and 1
         |  (MX)                         |
   wl_*_0|  bit_r0_c0    bit_r0_c1  ...  |
         +-------------------------------+
            bl/br_*_0    bl/br_*_1  ...
    */
    pub fn build(&mut self, factory: &mut CircuitFactory) -> LpRamResult<()> {
        let BitcellArrayArg { port_size, rows, cols, row_phase, .. } = self.args.clone();
        check_arg!(port_size >= 1, "port size {} < 1", port_size);
        check_arg!(rows >= 1, "row size {} < 1", rows);
        check_arg!(cols >= 1, "column size {} < 1", cols);
        check_arg!(row_phase < 2, "row phase {} is not 0 or 1", row_phase);

        let supply = self.supply_rows();

        let cell = self.add_leafcell(LeafKind::Bitcell, port_size, factory)?;

        let mut grid = Vec::with_capacity(rows);
        for row in 0..rows {
            let mut line = Vec::with_capacity(cols);
            for col in 0..cols {
                let instance = self.link_leaf(format!("bit_r{}_c{}", row, col), &cell, |role| match role {
                    PinRole::Bitline(port) => Self::bitline_pn(port, col),
                    PinRole::BitlineBar(port) => Self::bitline_bar_pn(port, col),
                    PinRole::Wordline(port) => Self::wordline_pn(port, row),
                    PinRole::Vdd => Self::vdd_pn(supply.group_of(row)),
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
        let BitcellArrayArg { port_size, cols, column_offset, .. } = self.args.clone();
        let supply = self.supply_rows();
        let (width, height) = place_grid(grid, supply.mirror_phase(), column_offset)?;
        let mut layout = Layout::new(width, height);

        let groups = grid_supply_groups(grid, &supply, Self::vdd_pn);
        let cells: Vec<_> = grid.iter().flatten().cloned().collect();
        draw_supply_stripes(&mut layout, tech, &groups, &cells)?;

        for col in 0..cols {
            for port in 0..port_size {
                add_column_pins(&mut layout, &grid[0][col], PinRole::Bitline(port), &Self::bitline_pn(port, col))?;
                add_column_pins(&mut layout, &grid[0][col], PinRole::BitlineBar(port), &Self::bitline_bar_pn(port, col))?;
            }
        }
        for (row, line) in grid.iter().enumerate() {
            for port in 0..port_size {
                add_row_pins(&mut layout, &line[0], PinRole::Wordline(port), &Self::wordline_pn(port, row))?;
            }
        }

        let gnd = Self::gnd_pn();
        for instance in cells.iter() {
            let pin_name = leaf_gnd_name(instance);
            copy_pin(&mut layout, instance, &pin_name, &gnd)?;
        }

        self.layout = Some(layout);
        Ok(())
    }

    pub fn all_bitline_names(&self) -> Vec<ShrString> {
        array::bitline_names(self.args.port_size, self.args.cols)
    }

    pub fn all_wordline_names(&self) -> Vec<ShrString> {
        array::wordline_names(self.args.port_size, self.args.rows)
    }

    pub fn all_vdd_names(&self) -> Vec<ShrString> {
        array::vdd_names(self.supply_rows().group_count())
    }

    pub fn supply_rows(&self) -> SupplyRows {
        SupplyRows::new(self.args.rows).with_phase(self.args.row_phase)
    }
}

/// Name of the ground pin of a leaf instance's template.
pub(super) fn leaf_gnd_name(instance: &Shr<Instance>) -> ShrString {
    let instance = instance.read();
    let template = instance.template_circuit.read();
    template.leafcell()
        .and_then(|leafcell| leafcell.pin_name(PinRole::Gnd))
        .unwrap_or_else(|| array::GND.into())
}
