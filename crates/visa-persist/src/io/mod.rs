//! Framed object files and hashing.

mod hash;
mod load;
mod save;

pub use hash::compute_file_hash;
pub use load::{decode_object, load_array, load_object};
pub use save::{save_array, save_object, write_atomic};

/// File identification prefix.
pub const MAGIC_BYTES: [u8; 4] = *b"VISA";

/// Current on-disk format version.
pub const CURRENT_FORMAT_VERSION: u32 = 1;

/// Magic plus version.
const HEADER_LEN: usize = 8;
