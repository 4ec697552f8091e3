mod access;
mod addr;
mod entry;
mod id;
mod path;
mod serialization;

pub use access::*;
pub use addr::*;
pub use entry::*;
pub use id::*;
pub use path::*;
