//! Locating the file that seeds stack reconstruction, and classifying the
//! scan from the metadata embedded in its plane file names.

use crate::{
    enums::{Convention, ImageClassification},
    error::ScanError,
    instrument::{VENDOR_A_EXTENSION, VENDOR_A_SCAN_SUFFIX},
    scan::ScanRef,
};

use glob::Pattern;
use std::{
    fs,
    path::{MAIN_SEPARATOR, Path, PathBuf},
};
use tracing::{debug, info};

/// Token Olympus writes into plane names of time-lapse acquisitions only.
///
/// This is a plain substring test: a file name that happens to contain the
/// token is read as a time series.
pub const TIME_MARKER: &str = "T001";

/// The file handed to the engine, plus the scan name used for output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiatorFile {
    pub path: PathBuf,
    pub basename: String,
}

pub fn resolve(
    root: &Path,
    scan: &ScanRef,
    convention: Convention,
) -> Result<(InitiatorFile, ImageClassification), ScanError> {
    let (initiator, classification) = match convention {
        Convention::VendorA => resolve_vendor_a(root, scan)?,
        Convention::VendorB => resolve_vendor_b(scan)?,
    };
    info!(
        "Initiator for {} is {} ({})",
        initiator.basename,
        initiator.path.display(),
        classification
    );
    Ok((initiator, classification))
}

fn resolve_vendor_a(
    root: &Path,
    scan: &ScanRef,
) -> Result<(InitiatorFile, ImageClassification), ScanError> {
    let basename = scan
        .id
        .strip_suffix(VENDOR_A_SCAN_SUFFIX)
        .ok_or_else(|| ScanError::Resolution {
            pattern: format!("{}{}", scan.id, VENDOR_A_SCAN_SUFFIX),
        })?
        .to_string();

    let path = root.join(format!("{basename}.{VENDOR_A_EXTENSION}"));
    if !path.is_file() {
        return Err(ScanError::Resolution {
            pattern: path.display().to_string(),
        });
    }

    let listing = image_listing(&scan.path)?;
    let classification = classify_by_marker(listing.iter().map(String::as_str)).ok_or_else(|| {
        ScanError::Classification {
            scan: scan.id.clone(),
            reason: "no reference image found to classify scan".to_string(),
        }
    })?;

    Ok((InitiatorFile { path, basename }, classification))
}

fn image_listing(dir: &Path) -> Result<Vec<String>, ScanError> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map_err(|source| ScanError::Io {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("tif"))
        })
        .filter_map(|path| Some(path.file_name()?.to_str()?.to_string()))
        .collect();
    names.sort();
    Ok(names)
}

/// `None` when there is nothing to look at.
pub fn classify_by_marker<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Option<ImageClassification> {
    let mut seen = false;
    for name in names {
        if name.contains(TIME_MARKER) {
            return Some(ImageClassification::TimeSeries);
        }
        seen = true;
    }
    seen.then_some(ImageClassification::DepthStack)
}

fn resolve_vendor_b(scan: &ScanRef) -> Result<(InitiatorFile, ImageClassification), ScanError> {
    let basename = scan.id.clone();
    let dir = Pattern::escape(&scan.path.to_string_lossy());
    let base = Pattern::escape(&basename);

    // Channel numbering does not always start at 1, hence the wildcard.
    let initiator_pattern = format!("{dir}{MAIN_SEPARATOR}{base}_Cycle00001_Ch?_000001.ome.tif");
    let path = glob_sorted(&initiator_pattern)?
        .into_iter()
        .next()
        .ok_or(ScanError::Resolution {
            pattern: initiator_pattern,
        })?;

    let listing_pattern = format!("{dir}{MAIN_SEPARATOR}{base}_Cycle*_Ch?_*.ome.tif");
    let last = glob_sorted(&listing_pattern)?
        .pop()
        .and_then(|p| Some(p.file_name()?.to_str()?.to_string()))
        .ok_or_else(|| ScanError::Classification {
            scan: scan.id.clone(),
            reason: "no reference image found to classify scan".to_string(),
        })?;
    debug!("Classifying {} from {}", basename, last);

    let classification = classify_by_cycle(&last, &basename).map_err(|reason| {
        ScanError::Classification {
            scan: scan.id.clone(),
            reason,
        }
    })?;

    Ok((InitiatorFile { path, basename }, classification))
}

/// Read the cycle index out of `<basename>_Cycle#####_...` and classify.
pub fn classify_by_cycle(file_name: &str, basename: &str) -> Result<ImageClassification, String> {
    let rest = file_name
        .strip_prefix(basename)
        .and_then(|rest| rest.strip_prefix("_Cycle"))
        .ok_or_else(|| format!("{file_name} has no cycle token"))?;
    let token = rest.split('_').next().unwrap_or_default();
    let cycle: u32 = token
        .parse()
        .map_err(|_| format!("cycle index `{token}` in {file_name} is not an integer"))?;

    Ok(if cycle == 1 {
        ImageClassification::DepthStack
    } else {
        ImageClassification::TimeSeries
    })
}

fn glob_sorted(pattern: &str) -> Result<Vec<PathBuf>, ScanError> {
    let mut paths: Vec<PathBuf> = glob::glob(pattern)
        .map_err(|_| ScanError::Resolution {
            pattern: pattern.to_string(),
        })?
        .filter_map(Result::ok)
        .collect();
    paths.sort();
    Ok(paths)
}
