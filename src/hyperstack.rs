use crate::enums::AxisOrder;

use ndarray::{Array4, Array5, ArrayView2, Axis, Zip, s};
use std::{fs::File, io::BufWriter, path::Path};
use tiff::{
    TiffError,
    encoder::{TiffEncoder, colortype},
};

/// An assembled multi-dimensional acquisition.
///
/// Pixel data is stored as `(frames, slices, channels, height, width)`
/// regardless of the axis order it was requested in. The axis order only
/// decides how planes are laid out when the stack is written to disk.
#[derive(Debug, Clone)]
pub struct Hyperstack {
    pub data: Array5<u16>,
    pub title: String,
    pub axis_order: AxisOrder,
}

impl Hyperstack {
    pub fn new(data: Array5<u16>, title: impl Into<String>, axis_order: AxisOrder) -> Self {
        Self {
            data,
            title: title.into(),
            axis_order,
        }
    }

    /// Get the dimensions of the stack (frames, slices, channels, height, width)
    pub fn dim(&self) -> (usize, usize, usize, usize, usize) {
        self.data.dim()
    }

    pub fn n_frames(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn n_slices(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn n_channels(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    #[cfg(test)]
    fn plane(&self, frame: usize, slice: usize, channel: usize) -> Option<ArrayView2<'_, u16>> {
        let (frames, slices, channels, _, _) = self.dim();
        if frame >= frames || slice >= slices || channel >= channels {
            return None;
        }
        Some(self.data.slice(s![frame, slice, channel, .., ..]))
    }

    /// Maximum-intensity projection over the slice axis, for every frame and channel.
    pub fn max_project(&self) -> Hyperstack {
        let (frames, _, channels, height, width) = self.dim();
        let mut projected = Array4::<u16>::zeros((frames, channels, height, width));

        Zip::from(&mut projected)
            .and(self.data.lanes(Axis(1)))
            .par_for_each(|out, lane| *out = lane.iter().copied().max().unwrap_or(0));

        Hyperstack {
            data: projected.insert_axis(Axis(1)),
            title: format!("MAX_{}", self.title),
            axis_order: self.axis_order,
        }
    }

    fn planes_in_order(&self) -> Vec<ArrayView2<'_, u16>> {
        let (frames, slices, channels, _, _) = self.dim();
        let mut planes = Vec::with_capacity(frames * slices * channels);

        match self.axis_order {
            AxisOrder::Xyczt => {
                for t in 0..frames {
                    for z in 0..slices {
                        for c in 0..channels {
                            planes.push(self.data.slice(s![t, z, c, .., ..]));
                        }
                    }
                }
            }
            AxisOrder::Xyctz => {
                for z in 0..slices {
                    for t in 0..frames {
                        for c in 0..channels {
                            planes.push(self.data.slice(s![t, z, c, .., ..]));
                        }
                    }
                }
            }
        }
        planes
    }

    /// Write every plane as one page of a 16-bit grayscale TIFF.
    pub fn save_tiff(&self, path: &Path) -> Result<(), TiffError> {
        let (_, _, _, height, width) = self.dim();
        let file = BufWriter::new(File::create(path)?);
        let mut encoder = TiffEncoder::new(file)?;

        for plane in self.planes_in_order() {
            let pixels: Vec<u16> = plane.iter().copied().collect();
            encoder.write_image::<colortype::Gray16>(width as u32, height as u32, &pixels)?;
        }
        Ok(())
    }
}
