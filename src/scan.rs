use crate::{enums::Convention, error::BatchError, instrument::VENDOR_A_SCAN_SUFFIX};

use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// One scan directory found under the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRef {
    pub path: PathBuf,
    /// Final path segment, e.g. `scan1` or `sample.oif.files`.
    pub id: String,
}

/// List the scans of a root directory in name order.
pub fn enumerate(root: &Path, convention: Convention) -> Result<Vec<ScanRef>, BatchError> {
    enumerate_excluding(root, convention, &[])
}

/// Like [`enumerate`], but never returns any of the `excluded` paths (such as
/// an output directory living under the root). Paths are compared after
/// resolving them on disk, so `exp/processed` and `/data/exp/processed`
/// name the same directory.
pub fn enumerate_excluding(
    root: &Path,
    convention: Convention,
    excluded: &[PathBuf],
) -> Result<Vec<ScanRef>, BatchError> {
    let mut entries: Vec<_> = fs::read_dir(root)
        .map_err(|source| BatchError::Filesystem {
            path: root.to_path_buf(),
            source,
        })?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    let excluded: Vec<PathBuf> = excluded.iter().map(|path| resolved(path)).collect();
    let scans: Vec<_> = entries
        .into_iter()
        .filter(|path| !excluded.contains(&resolved(path)))
        .filter_map(|path| {
            let Some(id) = path.file_name()?.to_str().map(str::to_string) else {
                warn!("Skipping {}: name is not valid UTF-8", path.display());
                return None;
            };
            let is_scan = match convention {
                Convention::VendorB => path.is_dir(),
                Convention::VendorA => id.ends_with(VENDOR_A_SCAN_SUFFIX),
            };
            is_scan.then_some(ScanRef { path, id })
        })
        .collect();

    for scan in &scans {
        debug!("Scan directory {}", scan.path.display());
    }
    Ok(scans)
}

fn resolved(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
