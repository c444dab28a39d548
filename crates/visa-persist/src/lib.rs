//! Binary persistence for pipeline objects.
//!
//! Fitted preprocessors, trained models and transformed train/test arrays are
//! written with the same framed format:
//!
//! ```text
//! +------------------+
//! | Magic: "VISA"    | 4 bytes - file identification
//! +------------------+
//! | Version: 1       | 4 bytes - u32 little-endian format version
//! +------------------+
//! | rkyv Payload     | Variable
//! +------------------+
//! ```
//!
//! Writes go to a temp file which is synced and then renamed over the target,
//! so a reader never observes a partially written object.

mod error;
mod io;

pub use error::{PersistError, Result};
pub use io::{
    CURRENT_FORMAT_VERSION, MAGIC_BYTES, compute_file_hash, decode_object, load_array, load_object,
    save_array, save_object, write_atomic,
};
