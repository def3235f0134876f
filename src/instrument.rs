use crate::{enums::Convention, error::BatchError};

use std::{fs, path::Path};
use tracing::info;

/// Extension of the Olympus initiator files that mark a vendor-A root.
pub const VENDOR_A_EXTENSION: &str = "oif";

/// Suffix of the Olympus companion directories holding the image planes.
pub const VENDOR_A_SCAN_SUFFIX: &str = ".oif.files";

/// Decide which layout convention a root directory follows.
///
/// Only the immediate entries' extensions are looked at. File contents are
/// never opened.
pub fn detect(root: &Path) -> Result<Convention, BatchError> {
    let entries = fs::read_dir(root).map_err(|source| BatchError::Filesystem {
        path: root.to_path_buf(),
        source,
    })?;

    let has_initiator = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .any(|path| {
            path.extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext == VENDOR_A_EXTENSION)
        });

    let convention = if has_initiator {
        Convention::VendorA
    } else {
        Convention::VendorB
    };
    info!("Detected {} layout in {}", convention, root.display());
    Ok(convention)
}
