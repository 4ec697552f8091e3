mod codec;
mod local;
mod remote;

pub use codec::*;
pub use local::*;
pub use remote::*;
