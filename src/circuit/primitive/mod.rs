mod leafcell;

pub use leafcell::*;
