//! Fixed-width scalars, length-prefixed modified UTF-8 strings and arrays
//! in either byte order.

mod endian;
mod read;
mod write;

pub use endian::*;
pub use read::*;
pub use write::*;
