mod spice;
mod layout;

pub use spice::*;
pub use layout::*;
