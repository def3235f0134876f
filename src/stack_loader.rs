use crate::{enums::AxisOrder, hyperstack::Hyperstack};

use ndarray::{Array2, Array5, s};
use rayon::prelude::*;
use regex::Regex;
use std::{
    collections::{BTreeMap, BTreeSet},
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use thiserror::Error;
use tracing::{debug, warn};

static OLYMPUS_PLANE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)C(\d+)(?:Z(\d+))?(?:T(\d+))?\.tiff?$").expect("valid plane pattern")
});

static BRUKER_PLANE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)_Cycle(\d+)_Ch(\d+)_(\d+)\.ome\.tif$").expect("valid plane pattern")
});

#[derive(Debug, Error)]
pub enum StackLoaderError {
    #[error("No valid image planes found for {0}")]
    NoValidImages(PathBuf),

    #[error("Unsupported initiator file {0}")]
    UnsupportedInitiator(PathBuf),

    #[error("Inconsistent plane dimensions in series {0}")]
    InconsistentDimensions(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// One plane file and its raw (vendor-numbered) coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlaneRef {
    series: String,
    frame: u32,
    slice: u32,
    channel: u32,
    path: PathBuf,
}

pub struct StackLoader;

impl StackLoader {
    /// Load every series reachable from an initiator file.
    ///
    /// An Olympus `.oif` initiator pulls its planes from the sibling
    /// `<initiator>.files` directory. A Bruker `.ome.tif` initiator pulls
    /// every cycle/channel/plane file next to it. Each distinct file prefix
    /// becomes one returned stack, so stray files from another acquisition
    /// in the same folder come back as extra results.
    ///
    /// # Errors
    ///
    /// Returns error if the initiator type is unknown, no planes are found,
    /// a plane fails to decode, or planes of one series differ in size.
    pub fn load_series(
        initiator: impl AsRef<Path>,
        order: AxisOrder,
    ) -> Result<Vec<Hyperstack>, StackLoaderError> {
        let initiator = initiator.as_ref();
        let planes = Self::plane_refs(initiator)?;
        if planes.is_empty() {
            return Err(StackLoaderError::NoValidImages(initiator.to_path_buf()));
        }

        let groups = Self::group_series(planes);
        let single = groups.len() == 1;
        let initiator_name = initiator
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        groups
            .into_iter()
            .map(|(series, planes)| {
                let title = if Self::is_olympus(initiator) {
                    if single {
                        initiator_name.clone()
                    } else {
                        format!("{initiator_name} - {series}")
                    }
                } else {
                    series
                };
                Self::build_series(title, &planes, order)
            })
            .collect()
    }

    fn is_olympus(initiator: &Path) -> bool {
        initiator
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("oif"))
    }

    fn is_bruker(initiator: &Path) -> bool {
        initiator
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|name| name.ends_with(".ome.tif"))
    }

    fn plane_refs(initiator: &Path) -> Result<Vec<PlaneRef>, StackLoaderError> {
        type ParseFn = fn(&Path) -> Option<PlaneRef>;
        let (dir, parse): (PathBuf, ParseFn) = if Self::is_olympus(initiator) {
            let mut companion = OsString::from(initiator.as_os_str());
            companion.push(".files");
            (PathBuf::from(companion), Self::parse_olympus_plane)
        } else if Self::is_bruker(initiator) {
            let parent = initiator.parent().unwrap_or(Path::new("."));
            (parent.to_path_buf(), Self::parse_bruker_plane)
        } else {
            return Err(StackLoaderError::UnsupportedInitiator(
                initiator.to_path_buf(),
            ));
        };

        let mut planes: Vec<_> = fs::read_dir(&dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| parse(&path))
            .collect();
        planes.sort_by(|a, b| a.path.cmp(&b.path));

        debug!("Found {} planes in {}", planes.len(), dir.display());
        Ok(planes)
    }

    fn parse_olympus_plane(path: &Path) -> Option<PlaneRef> {
        let name = path.file_name()?.to_str()?;
        let caps = OLYMPUS_PLANE.captures(name)?;
        let index = |i: usize| -> Option<u32> {
            caps.get(i).map_or(Some(1), |m| m.as_str().parse().ok())
        };
        Some(PlaneRef {
            series: caps[1].to_string(),
            channel: caps[2].parse().ok()?,
            slice: index(3)?,
            frame: index(4)?,
            path: path.to_path_buf(),
        })
    }

    fn parse_bruker_plane(path: &Path) -> Option<PlaneRef> {
        let name = path.file_name()?.to_str()?;
        let caps = BRUKER_PLANE.captures(name)?;
        Some(PlaneRef {
            series: caps[1].to_string(),
            frame: caps[2].parse().ok()?,
            channel: caps[3].parse().ok()?,
            slice: caps[4].parse().ok()?,
            path: path.to_path_buf(),
        })
    }

    fn group_series(planes: Vec<PlaneRef>) -> BTreeMap<String, Vec<PlaneRef>> {
        let mut groups: BTreeMap<String, Vec<PlaneRef>> = BTreeMap::new();
        for plane in planes {
            groups.entry(plane.series.clone()).or_default().push(plane);
        }
        groups
    }

    /// Map vendor numbering (which may start anywhere, e.g. only `Ch2`) to dense indices.
    fn dense_index(values: impl Iterator<Item = u32>) -> BTreeMap<u32, usize> {
        values
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(i, v)| (v, i))
            .collect()
    }

    fn build_series(
        title: String,
        planes: &[PlaneRef],
        order: AxisOrder,
    ) -> Result<Hyperstack, StackLoaderError> {
        let frames = Self::dense_index(planes.iter().map(|p| p.frame));
        let slices = Self::dense_index(planes.iter().map(|p| p.slice));
        let channels = Self::dense_index(planes.iter().map(|p| p.channel));

        let images: Vec<Array2<u16>> = planes
            .par_iter()
            .map(|plane| Self::decode_plane(&plane.path))
            .collect::<Result<_, _>>()?;

        Self::validate_dimensions(&title, &images)?;

        let (height, width) = images[0].dim();
        let shape = (frames.len(), slices.len(), channels.len(), height, width);
        let expected = shape.0 * shape.1 * shape.2;
        if expected != images.len() {
            warn!(
                "Series {} is incomplete: {} of {} planes present, missing planes are left black",
                title,
                images.len(),
                expected
            );
        }

        let mut data = Array5::<u16>::zeros(shape);
        for (plane, image) in planes.iter().zip(&images) {
            let (t, z, c) = (frames[&plane.frame], slices[&plane.slice], channels[&plane.channel]);
            data.slice_mut(s![t, z, c, .., ..]).assign(image);
        }

        debug!(
            "Assembled {} with {} frames, {} slices, {} channels",
            title, shape.0, shape.1, shape.2
        );
        Ok(Hyperstack::new(data, title, order))
    }

    fn decode_plane(path: &Path) -> Result<Array2<u16>, StackLoaderError> {
        let image = image::open(path)?.into_luma16();
        let (width, height) = image.dimensions();
        Ok(Array2::from_shape_vec(
            (height as usize, width as usize),
            image.into_raw(),
        )?)
    }

    fn validate_dimensions(title: &str, images: &[Array2<u16>]) -> Result<(), StackLoaderError> {
        let first_dim = images[0].dim();
        if images.iter().any(|img| img.dim() != first_dim) {
            return Err(StackLoaderError::InconsistentDimensions(title.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_olympus_plane_names() {
        let plane = StackLoader::parse_olympus_plane(Path::new("/x/s_C002Z003T004.tif")).unwrap();
        assert_eq!(plane.series, "s_");
        assert_eq!((plane.channel, plane.slice, plane.frame), (2, 3, 4));

        let plane = StackLoader::parse_olympus_plane(Path::new("/x/s_C001Z010.tif")).unwrap();
        assert_eq!((plane.channel, plane.slice, plane.frame), (1, 10, 1));

        assert!(StackLoader::parse_olympus_plane(Path::new("/x/s_C001.roi")).is_none());
    }

    #[test]
    fn parses_bruker_plane_names() {
        let path = Path::new("/x/scan1_Cycle00003_Ch2_000005.ome.tif");
        let plane = StackLoader::parse_bruker_plane(path).unwrap();
        assert_eq!(plane.series, "scan1");
        assert_eq!((plane.frame, plane.channel, plane.slice), (3, 2, 5));

        assert!(StackLoader::parse_bruker_plane(Path::new("/x/scan1.xml")).is_none());
    }

    #[test]
    fn dense_index_starts_at_zero() {
        let index = StackLoader::dense_index([2, 4, 2].into_iter());
        assert_eq!(index[&2], 0);
        assert_eq!(index[&4], 1);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn unknown_initiator_is_rejected() {
        let err = StackLoader::load_series("/nowhere/scan.xml", AxisOrder::Xyczt).unwrap_err();
        assert!(matches!(err, StackLoaderError::UnsupportedInitiator(_)));
    }
}
