mod instance;
mod net;
mod pin;
mod port;

pub use instance::*;
pub use net::*;
pub use pin::*;
pub use port::*;
