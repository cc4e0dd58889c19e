//! Bounded, scoped document reads

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{Error, Result};

/// Default upper bound on a single configuration document.
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 1024 * 1024;

/// Read a whole file, refusing files larger than `max_bytes`.
///
/// The handle lives only inside this call and is closed on every return path,
/// including size and read failures.
pub fn read_bounded(path: &Path, max_bytes: u64) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;

    let size = file.metadata().map_err(|e| Error::io(path, e))?.len();
    if size > max_bytes {
        return Err(Error::TooLarge {
            path: path.to_path_buf(),
            size,
            max: max_bytes,
        });
    }

    let mut buffer = Vec::with_capacity(size as usize);
    // take() guards against the file growing between metadata() and read
    file.by_ref()
        .take(max_bytes + 1)
        .read_to_end(&mut buffer)
        .map_err(|e| Error::io(path, e))?;

    if buffer.len() as u64 > max_bytes {
        return Err(Error::TooLarge {
            path: path.to_path_buf(),
            size: buffer.len() as u64,
            max: max_bytes,
        });
    }

    Ok(buffer)
}
