use itertools::Itertools;
use lpram_macro::module;
use tracing::{debug, info};
use crate::circuit::{CircuitFactory, Instance, Shr, ShrString};
use crate::layout::{Coord, Layout, LayoutError, Orientation, Placement, Point};
use crate::{check_arg, config_err, LpRamResult};
use super::array::{self, copy_pin, offset_vdd_names, template_extent, SupplyRows};
use super::{BitcellArrayArg, BoundaryCell, DummyArrayArg, ReplicaArraySpec, ReplicaBudget, ReplicaColumnArg};

#[module(
    bitline:             ("bl_{port}_{col}", InOut, all_bitline_names),
    bitline_bar:         ("br_{port}_{col}", InOut),
    replica_bitline:     ("rbl_bl_{port}_{replica}", InOut),
    replica_bitline_bar: ("rbl_br_{port}_{replica}", InOut),
    wordline:            ("wl_{port}_{row}", Input, all_wordline_names),
    replica_wordline:    ("rbl_wl_{port}_{replica}", Input),
    vdd:                 ("vdd_{group}", Power, all_vdd_names),
    gnd:                 ("gnd", Ground),
)]
/// Regular array framed by replica wordline rows, replica columns and dummy or end-cap cells.
pub struct ReplicaBitcellArray {
    pub port_size: usize,
    pub rows: usize,
    pub cols: usize,
    pub budget: ReplicaBudget,
    pub end_caps: bool,
}

impl ReplicaBitcellArrayArg {
    /// Resolves `spec` against the cell family of the factory's PDK.
    pub fn from_spec(spec: &ReplicaArraySpec, factory: &CircuitFactory) -> LpRamResult<Self> {
        let end_caps = factory.end_caps(spec.port_size)?;
        Ok(Self::new(spec.port_size, spec.rows, spec.cols, spec.budget(), end_caps))
    }
}

/// One sub-module instance, in placement terms.
struct Slot {
    instance: Shr<Instance>,
    x: Coord,
    y: Coord,
}

impl ReplicaBitcellArray {
    /*
        +----+------+--------------------------+------+----+
        |    |      |   dummy row / col cap    |      |    |
        | r  |      +--------------------------+      | r  |
        | o  |  r   | dummy rows, upper ports  |  r   | o  |
        | w  |  e   +--------------------------+  e   | w  |
        |    |  p   |                          |  p   |    |
        | c  |  l   |      bitcell array       |  l   | c  |
        | a  |      |                          |      | a  |
        | p  |  c   +--------------------------+  c   | p  |
        |    |  o   | dummy rows, lower ports  |  o   |    |
        |    |  l   +--------------------------+  l   |    |
        |    |      |   dummy row / col cap    |      |    |
        +----+------+--------------------------+------+----+
    */
    pub fn build(&mut self, factory: &mut CircuitFactory) -> LpRamResult<()> {
        let ReplicaBitcellArrayArg { port_size, rows, cols, budget, end_caps } = self.args.clone();
        check_arg!(rows >= 1, "row size {} < 1", rows);
        check_arg!(cols >= 1, "column size {} < 1", cols);
        budget.validate(port_size)?;
        let pdk_end_caps = factory.end_caps(port_size)?;
        check_arg!(end_caps == pdk_end_caps,
            "replica array built with end_caps={} but the {} port cell family has end_caps={}", end_caps, port_size, pdk_end_caps);

        info!("compose replica array {}x{} with {} port(s), rbl {:?}, left {:?}, right {:?}",
            rows, cols, port_size, budget.rbl, budget.left_rbl, budget.right_rbl);

        let base_col = self.base_col();
        let base_row = self.base_row();
        let rbl = budget.rbl;
        let gnd = Self::gnd_pn();
        let vdd_names = self.all_vdd_names();
        let replica_wordlines = self.replica_array_wordline_names();

        // regular array
        let array_row = base_row + rbl[0];
        let array_arg = BitcellArrayArg::new(port_size, rows, cols, self.array_column_offset(), array_row % 2);
        let array_groups = SupplyRows::new(rows).with_phase(array_row).group_count();
        let array = self.add_module(array_arg, factory)?;
        let array_inst = self.add_instance("bitcell_array", array)?;
        let nets = array::bitline_names(port_size, cols).into_iter()
            .chain(array::wordline_names(port_size, rows))
            .chain(offset_vdd_names(array_row, array_groups))
            .chain([gnd.clone()]);
        self.connect_instance_in_order(&array_inst, nets)?;

        // replica columns
        let mut left_cols = Vec::new();
        let mut right_cols = Vec::new();
        for (index, port) in budget.left_rbl.iter().copied().enumerate() {
            let Some(replica_bit) = rbl[0].checked_sub(port) else {
                config_err!("left replica port {} has no replica row below the array (rbl[0] = {})", port, rbl[0]);
            };
            left_cols.push(self.link_replica_column(factory, port, replica_bit, base_col + index, &replica_wordlines, &vdd_names)?);
        }
        for (index, port) in budget.right_rbl.iter().copied().enumerate() {
            let replica_bit = rbl[0] + rows + port;
            let column_offset = base_col + budget.left_rbl.len() + cols + index;
            right_cols.push(self.link_replica_column(factory, port, replica_bit, column_offset, &replica_wordlines, &vdd_names)?);
        }

        // dummy rows carrying the replica wordlines, one per port
        let mut dummy_rows = Vec::with_capacity(port_size);
        for port in 0..port_size {
            let supply_row = self.replica_row(port);
            let physical_row = supply_row + usize::from(end_caps);
            let arg = DummyArrayArg::new(port_size, 1, cols, BoundaryCell::Dummy, self.mirror_phase(physical_row), self.array_column_offset());
            let dummy_row = self.add_module(arg, factory)?;
            let instance = self.add_instance(format!("dummy_row_{}", port), dummy_row)?;
            let nets = self.replica_row_wordline_names(port).into_iter()
                .chain(offset_vdd_names(supply_row, 1))
                .chain([gnd.clone()]);
            self.connect_instance_in_order(&instance, nets)?;
            dummy_rows.push((port, instance));
        }

        // dummy rows or column caps closing the bottom and the top
        let boundary = if end_caps { BoundaryCell::ColCap } else { BoundaryCell::Dummy };
        let top_row = rows + budget.total() + 1;
        let mut edge_rows = Vec::with_capacity(2);
        for (name, physical_row, vdd) in [
            ("dummy_row_bot", 0, vdd_names.first()),
            ("dummy_row_top", top_row, vdd_names.last()),
        ] {
            let Some(vdd) = vdd.cloned() else {
                config_err!("replica array without supply groups");
            };
            let arg = DummyArrayArg::new(port_size, 1, cols, boundary, self.mirror_phase(physical_row), self.array_column_offset());
            let edge = self.add_module(arg, factory)?;
            let instance = self.add_instance(name, edge)?;
            let wordlines = if boundary.has_wordlines() { port_size } else { 0 };
            let nets = std::iter::repeat(gnd.clone()).take(wordlines)
                .chain([vdd, gnd.clone()]);
            self.connect_instance_in_order(&instance, nets)?;
            edge_rows.push(instance);
        }

        // dummy columns or row caps on both sides
        let (side, side_rows, first_row) = if end_caps {
            (BoundaryCell::RowCap, rows + budget.extra_rows(true), 1)
        } else {
            (BoundaryCell::Dummy, rows + budget.extra_rows(false), 0)
        };
        let right_offset = base_col + budget.left_rbl.len() + cols + budget.right_rbl.len();
        let mut side_cols = Vec::with_capacity(2);
        for (name, column_offset) in [("dummy_col_left", 0), ("dummy_col_right", right_offset)] {
            let arg = DummyArrayArg::new(port_size, side_rows, 1, side, self.mirror_phase(first_row), column_offset);
            let column = self.add_module(arg, factory)?;
            let instance = self.add_instance(name, column)?;
            let nets = replica_wordlines.iter().cloned()
                .chain(vdd_names.iter().cloned())
                .chain([gnd.clone()]);
            self.connect_instance_in_order(&instance, nets)?;
            side_cols.push(instance);
        }

        if !factory.netlist_only() {
            self.create_layout(Frame { array: array_inst, left_cols, right_cols, dummy_rows, edge_rows, side_cols })?;
        }

        Ok(())
    }

    fn link_replica_column(
        &mut self,
        factory: &mut CircuitFactory,
        port: usize,
        replica_bit: usize,
        column_offset: usize,
        replica_wordlines: &[ShrString],
        vdd_names: &[ShrString],
    ) -> LpRamResult<Shr<Instance>> {
        let ReplicaBitcellArrayArg { port_size, rows, budget, end_caps, .. } = self.args.clone();
        debug!("replica column for port {} at column {} with replica bit {}", port, column_offset, replica_bit);

        let arg = ReplicaColumnArg::new(port_size, rows, budget.rbl, replica_bit, column_offset, end_caps);
        let column = self.add_module(arg, factory)?;
        let instance = self.add_instance(format!("replica_col_{}", port), column)?;
        let nets = self.rbl_bitline_names(port).into_iter()
            .chain(replica_wordlines.iter().cloned())
            .chain(vdd_names.iter().cloned())
            .chain([Self::gnd_pn()]);
        self.connect_instance_in_order(&instance, nets)?;
        Ok(instance)
    }

    fn create_layout(&mut self, frame: Frame) -> LpRamResult<()> {
        let rbl = self.args.budget.rbl;

        // center stack, bottom to top
        let mut center = Vec::new();
        center.push(frame.edge_rows[0].clone());
        center.extend(frame.dummy_rows.iter().filter(|(port, _)| *port < rbl[0]).map(|(_, inst)| inst.clone()));
        center.push(frame.array.clone());
        center.extend(frame.dummy_rows.iter().filter(|(port, _)| *port >= rbl[0]).map(|(_, inst)| inst.clone()));
        center.push(frame.edge_rows[1].clone());

        let left_cap_width = extent(&frame.side_cols[0])?.0;
        let left_width: Coord = frame.left_cols.iter().map(|inst| extent(inst).map(|e| e.0)).sum::<Result<_, _>>()?;
        let center_x = left_cap_width + left_width;
        let center_width = extent(&frame.array)?.0;

        let mut slots = Vec::new();
        let mut y = 0;
        for instance in center {
            let height = extent(&instance)?.1;
            slots.push(Slot { instance, x: center_x, y });
            y += height;
        }
        let height = y;

        let mut x = left_cap_width;
        for instance in frame.left_cols.iter() {
            slots.push(Slot { instance: instance.clone(), x, y: 0 });
            x += extent(instance)?.0;
        }
        x = center_x + center_width;
        for instance in frame.right_cols.iter() {
            slots.push(Slot { instance: instance.clone(), x, y: 0 });
            x += extent(instance)?.0;
        }

        // row caps leave the corners to the column caps
        let side_y = if self.args.end_caps { extent(&frame.edge_rows[0])?.1 } else { 0 };
        slots.push(Slot { instance: frame.side_cols[0].clone(), x: 0, y: side_y });
        slots.push(Slot { instance: frame.side_cols[1].clone(), x, y: side_y });
        let width = x + extent(&frame.side_cols[1])?.0;

        let mut layout = Layout::new(width, height);
        for slot in slots.iter() {
            slot.instance.write().place(Placement::new(Point::new(slot.x, slot.y), Orientation::R0));
        }
        for slot in slots.iter() {
            self.copy_port_pins(&mut layout, &slot.instance)?;
        }

        self.layout = Some(layout);
        Ok(())
    }

    /// Copies every pin of `instance` whose net is a port of this array, under the port's name.
    fn copy_port_pins(&self, layout: &mut Layout, instance: &Shr<Instance>) -> Result<(), LayoutError> {
        let pins: Vec<(ShrString, Option<ShrString>)> = instance.read().pins.iter()
            .map(|pin| (pin.read().name.clone(), pin.read().net_name()))
            .collect();
        for (pin_name, net) in pins {
            let Some(net) = net else { continue };
            let is_port = self.nets.get(&net).is_some_and(|n| n.read().is_port());
            if is_port {
                copy_pin(layout, instance, &pin_name, &net)?;
            }
        }
        Ok(())
    }

    /// 0 with end caps, else 1 for the dummy column on the left.
    pub fn base_col(&self) -> usize {
        if self.args.end_caps { 0 } else { 1 }
    }

    /// Supply row of the lowest replica row: the bottom dummy row takes supply row 0
    /// unless the column caps close the array instead.
    pub fn base_row(&self) -> usize {
        if self.args.end_caps { 0 } else { 1 }
    }

    pub fn array_column_offset(&self) -> usize {
        self.base_col() + self.args.budget.left_rbl.len()
    }

    pub fn extra_rows(&self) -> usize {
        self.args.budget.extra_rows(self.args.end_caps)
    }

    pub fn extra_cols(&self) -> usize {
        self.args.budget.extra_cols(self.args.end_caps)
    }

    /// Supply row of the dummy row carrying the replica wordline of `port`.
    pub fn replica_row(&self, port: usize) -> usize {
        let rbl = self.args.budget.rbl;
        if port < rbl[0] {
            self.base_row() + port
        } else {
            self.base_row() + self.args.rows + port
        }
    }

    /// Physical row `r`, counted from the bottom dummy or cap row, is flipped when
    /// `mirror_phase(r)` is 1, i.e. on odd supply rows. Both rows of a supply group
    /// then face the rail they share.
    pub fn mirror_phase(&self, physical_row: usize) -> usize {
        // a bottom cap sits one row below supply row 0
        (physical_row + usize::from(self.args.end_caps)) % 2
    }

    /// `rbl_bl_{q}_{port}`, `rbl_br_{q}_{port}` for every port `q`.
    pub fn rbl_bitline_names(&self, port: usize) -> Vec<ShrString> {
        (0..self.args.port_size)
            .flat_map(|q| [Self::replica_bitline_pn(q, port), Self::replica_bitline_bar_pn(q, port)])
            .collect()
    }

    /// `rbl_wl_{q}_{bit}` for every port `q`.
    pub fn rbl_wordline_names(&self, bit: usize) -> Vec<ShrString> {
        (0..self.args.port_size).map(|q| Self::replica_wordline_pn(q, bit)).collect()
    }

    /// Wordlines of the dummy row at replica row `bit`: only the true replica wordline
    /// survives, every other port is grounded.
    pub fn replica_row_wordline_names(&self, bit: usize) -> Vec<ShrString> {
        (0..self.args.port_size)
            .map(|q| if q == bit { Self::replica_wordline_pn(q, bit) } else { Self::gnd_pn() })
            .collect()
    }

    /// Wordlines of a full-height column, bottom to top: grounded dummy row padding,
    /// lower replica rows, the regular rows, upper replica rows, padding again.
    pub fn replica_array_wordline_names(&self) -> Vec<ShrString> {
        let ReplicaBitcellArrayArg { port_size, rows, budget, end_caps, .. } = &self.args;
        let padding = if *end_caps { 0 } else { *port_size };
        let rbl = budget.rbl;

        let mut names = vec![Self::gnd_pn(); padding];
        for bit in 0..rbl[0] {
            names.extend(self.replica_row_wordline_names(bit));
        }
        names.extend(array::wordline_names(*port_size, *rows));
        for bit in rbl[0]..rbl[0] + rbl[1] {
            names.extend(self.replica_row_wordline_names(bit));
        }
        names.extend(std::iter::repeat(Self::gnd_pn()).take(padding));
        names
    }

    pub fn all_bitline_names(&self) -> Vec<ShrString> {
        let budget = &self.args.budget;
        let mut names = Vec::new();
        for port in budget.left_rbl.iter().unique() {
            names.extend(self.rbl_bitline_names(*port));
        }
        names.extend(array::bitline_names(self.args.port_size, self.args.cols));
        for port in budget.right_rbl.iter().unique() {
            if !budget.left_rbl.contains(port) {
                names.extend(self.rbl_bitline_names(*port));
            }
        }
        names
    }

    pub fn all_wordline_names(&self) -> Vec<ShrString> {
        let rbl = self.args.budget.rbl;
        (0..rbl[0]).map(|port| Self::replica_wordline_pn(port, port))
            .chain(array::wordline_names(self.args.port_size, self.args.rows))
            .chain((rbl[0]..rbl[0] + rbl[1]).map(|port| Self::replica_wordline_pn(port, port)))
            .collect()
    }

    pub fn all_vdd_names(&self) -> Vec<ShrString> {
        array::vdd_names(array::supply_group_count(self.args.rows + self.extra_rows()))
    }
}

struct Frame {
    array: Shr<Instance>,
    left_cols: Vec<Shr<Instance>>,
    right_cols: Vec<Shr<Instance>>,
    dummy_rows: Vec<(usize, Shr<Instance>)>,
    edge_rows: Vec<Shr<Instance>>,
    side_cols: Vec<Shr<Instance>>,
}

fn extent(instance: &Shr<Instance>) -> Result<(Coord, Coord), LayoutError> {
    template_extent(instance).map(|(width, height, _)| (width, height))
}

#[cfg(test)]
mod test {
    use super::*;

    fn frame(port_size: usize, rows: usize, budget: ReplicaBudget, end_caps: bool) -> ReplicaBitcellArray {
        let arg = ReplicaBitcellArrayArg::new(port_size, rows, 2, budget, end_caps);
        ReplicaBitcellArray::new("frame", arg)
    }

    fn strings(names: Vec<ShrString>) -> Vec<String> {
        names.into_iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_column_wordlines_without_caps() {
        let array = frame(2, 1, ReplicaBudget::default_for(2), false);
        assert_eq!(strings(array.replica_array_wordline_names()), vec![
            "gnd", "gnd",
            "rbl_wl_0_0", "gnd",
            "wl_0_0", "wl_1_0",
            "gnd", "rbl_wl_1_1",
            "gnd", "gnd",
        ]);
        assert_eq!(strings(array.all_wordline_names()), vec!["rbl_wl_0_0", "wl_0_0", "wl_1_0", "rbl_wl_1_1"]);
    }

    #[test]
    fn test_column_wordlines_with_caps() {
        let array = frame(1, 2, ReplicaBudget::default_for(1), true);
        assert_eq!(strings(array.replica_array_wordline_names()), vec!["rbl_wl_0_0", "wl_0_0", "wl_0_1"]);
        assert_eq!(strings(array.all_vdd_names()), vec!["vdd_0", "vdd_1"]);
    }

    #[test]
    fn test_replica_rows_and_mirroring() {
        let array = frame(2, 4, ReplicaBudget::default_for(2), false);
        assert_eq!(array.replica_row(0), 1);
        assert_eq!(array.replica_row(1), 6);
        // without caps the physical row is the supply row
        assert_eq!(array.mirror_phase(2), 0);
        assert_eq!(array.mirror_phase(1), 1);

        let array = frame(2, 4, ReplicaBudget::new([2, 0], vec![0], vec![]), true);
        assert_eq!(array.replica_row(1), 1);
        // physical row 3 is supply row 2, the bottom cap is flipped
        assert_eq!(array.mirror_phase(3), 0);
        assert_eq!(array.mirror_phase(0), 1);
        assert_eq!(strings(array.rbl_bitline_names(0)), vec!["rbl_bl_0_0", "rbl_br_0_0", "rbl_bl_1_0", "rbl_br_1_0"]);
    }

    #[test]
    fn test_bitline_ports_wrap_the_array() {
        let array = frame(1, 2, ReplicaBudget::new([1, 0], vec![0], vec![]), false);
        assert_eq!(strings(array.all_bitline_names()), vec![
            "rbl_bl_0_0", "rbl_br_0_0", "bl_0_0", "br_0_0", "bl_0_1", "br_0_1",
        ]);
    }
}
