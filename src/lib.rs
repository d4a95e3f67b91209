pub mod circuit;
pub mod layout;
pub mod pdk;
pub mod export;
pub mod error;
pub use error::*;

pub use derive_new;
