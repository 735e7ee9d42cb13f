pub mod judge;
pub mod render;

use std::path::Path;

/// Read an auxiliary text file such as a taxonomy.
pub fn read_text(path: &Path) -> Result<String, trajmod_core::Error> {
    std::fs::read_to_string(path).map_err(|source| trajmod_core::Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
