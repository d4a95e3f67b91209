use derive_builder::Builder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use crate::circuit::{CircuitError, NameSegment};

/// Port counts the replica array composer knows how to lay out.
pub const SUPPORTED_PORT_SIZES: [usize; 2] = [1, 2];

/// How many replica wordline rows each port gets and which ports get a replica column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplicaBudget {
    /// Replica wordline rows below (`rbl[0]`) and above (`rbl[1]`) the array.
    pub rbl: [usize; 2],
    /// Ports whose replica column sits left of the array.
    pub left_rbl: Vec<usize>,
    /// Ports whose replica column sits right of the array.
    pub right_rbl: Vec<usize>,
}

impl ReplicaBudget {
    pub fn new(rbl: [usize; 2], left_rbl: Vec<usize>, right_rbl: Vec<usize>) -> Self {
        Self { rbl, left_rbl, right_rbl }
    }

    /// One replica row below the array, and one above it plus a right column for the second port.
    pub fn default_for(port_size: usize) -> Self {
        let multi_port = port_size > 1;
        Self {
            rbl: [1, if multi_port { 1 } else { 0 }],
            left_rbl: vec![0],
            right_rbl: if multi_port { vec![1] } else { vec![] },
        }
    }

    /// Fills whatever is not given with the defaults for `port_size`.
    pub fn resolve(port_size: usize, rbl: Option<[usize; 2]>, left_rbl: Option<Vec<usize>>, right_rbl: Option<Vec<usize>>) -> Self {
        let default = Self::default_for(port_size);
        Self {
            rbl: rbl.unwrap_or(default.rbl),
            left_rbl: left_rbl.unwrap_or(default.left_rbl),
            right_rbl: right_rbl.unwrap_or(default.right_rbl),
        }
    }

    pub fn total(&self) -> usize {
        self.rbl[0] + self.rbl[1]
    }

    pub fn replica_column_count(&self) -> usize {
        self.left_rbl.len() + self.right_rbl.len()
    }

    /// Rows added around the regular array: replica rows, plus a dummy row top and
    /// bottom when the cells have no end caps.
    pub fn extra_rows(&self, end_caps: bool) -> usize {
        self.total() + if end_caps { 0 } else { 2 }
    }

    /// Columns added around the regular array: replica columns, plus a dummy column
    /// left and right when the cells have no end caps.
    pub fn extra_cols(&self, end_caps: bool) -> usize {
        self.replica_column_count() + if end_caps { 0 } else { 2 }
    }

    pub fn validate(&self, port_size: usize) -> Result<(), CircuitError> {
        if !SUPPORTED_PORT_SIZES.contains(&port_size) {
            return Err(CircuitError::configuration(format!(
                "{} port(s) not supported, expected one of {:?}", port_size, SUPPORTED_PORT_SIZES)));
        }
        if self.total() != port_size {
            return Err(CircuitError::configuration(format!(
                "invalid number of replica bitlines {:?} for {} port(s)", self.rbl, port_size)));
        }
        if self.total() < self.replica_column_count() {
            return Err(CircuitError::configuration(format!(
                "{} replica bitline(s) cannot feed {} replica column(s)", self.total(), self.replica_column_count())));
        }
        for port in self.left_rbl.iter().chain(self.right_rbl.iter()) {
            if *port >= port_size {
                return Err(CircuitError::configuration(format!(
                    "replica column port {} out of range for {} port(s)", port, port_size)));
            }
        }
        if let Some(port) = self.left_rbl.iter().chain(self.right_rbl.iter()).duplicates().next() {
            return Err(CircuitError::configuration(format!(
                "port {} is assigned more than one replica column", port)));
        }
        Ok(())
    }
}

impl NameSegment for ReplicaBudget {
    fn name_segment(&self) -> String {
        format!("{}_{}_{}", self.rbl.name_segment(), self.left_rbl.name_segment(), self.right_rbl.name_segment())
    }
}

/// User-facing request for a replica array. Unset budget fields take the defaults of the port count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
pub struct ReplicaArraySpec {
    #[builder(default = "1")]
    #[serde(default = "default_port_size")]
    pub port_size: usize,
    pub rows: usize,
    pub cols: usize,
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub rbl: Option<[usize; 2]>,
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub left_rbl: Option<Vec<usize>>,
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub right_rbl: Option<Vec<usize>>,
}

fn default_port_size() -> usize {
    1
}

impl ReplicaArraySpec {
    pub fn builder() -> ReplicaArraySpecBuilder {
        ReplicaArraySpecBuilder::default()
    }

    pub fn budget(&self) -> ReplicaBudget {
        ReplicaBudget::resolve(self.port_size, self.rbl, self.left_rbl.clone(), self.right_rbl.clone())
    }
}
