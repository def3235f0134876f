#![allow(dead_code)]

use anilyze::{
    engine::{EngineError, ImagingEngine, StackHandle, StackId, StackShape},
    enums::AxisOrder,
};
use image::{ImageBuffer, Luma};
use std::{
    collections::BTreeMap,
    fs::{self, File},
    path::{Path, PathBuf},
};
use tiff::decoder::{Decoder, DecodingResult};

pub const WIDTH: u32 = 4;
pub const HEIGHT: u32 = 3;

/// Uniform 16-bit plane.
pub fn write_plane(path: &Path, value: u16) {
    let plane: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_fn(WIDTH, HEIGHT, |_, _| Luma([value]));
    plane.save(path).unwrap();
}

/// Bruker scan whose plane values encode their position: `cycle*100 + plane*10 + channel`.
pub fn bruker_scan(root: &Path, name: &str, cycles: u32, planes: u32, channels: &[u32]) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    for cycle in 1..=cycles {
        for plane in 1..=planes {
            for &channel in channels {
                let file = format!("{name}_Cycle{cycle:05}_Ch{channel}_{plane:06}.ome.tif");
                write_plane(&dir.join(file), (cycle * 100 + plane * 10 + channel) as u16);
            }
        }
    }
    fs::write(dir.join(format!("{name}.xml")), "<PVScan/>").unwrap();
    dir
}

/// Olympus scan: `<base>.oif` plus `<base>.oif.files` with `s_C001Z###[T###].tif` planes.
pub fn olympus_scan(root: &Path, base: &str, slices: u32, frames: Option<u32>) -> PathBuf {
    fs::write(root.join(format!("{base}.oif")), "[ProfileSaveInfo]").unwrap();
    let dir = root.join(format!("{base}.oif.files"));
    fs::create_dir_all(&dir).unwrap();
    for z in 1..=slices {
        match frames {
            Some(frames) => {
                for t in 1..=frames {
                    let name = format!("s_C001Z{z:03}T{t:03}.tif");
                    write_plane(&dir.join(name), (t * 100 + z * 10) as u16);
                }
            }
            None => write_plane(&dir.join(format!("s_C001Z{z:03}.tif")), (z * 10) as u16),
        }
    }
    fs::write(dir.join("s_C001.roi"), "").unwrap();
    dir
}

/// Every page of a TIFF as 16-bit pixels.
pub fn tiff_pages(path: &Path) -> Vec<Vec<u16>> {
    let mut decoder = Decoder::new(File::open(path).unwrap()).unwrap();
    let mut pages = Vec::new();
    loop {
        match decoder.read_image().unwrap() {
            DecodingResult::U16(pixels) => pages.push(pixels),
            _ => panic!("expected 16-bit pages"),
        }
        if !decoder.more_images() {
            break;
        }
        decoder.next_image().unwrap();
    }
    pages
}

/// Engine double that returns scripted stacks and records what the pipeline asks of it.
#[derive(Default)]
pub struct FakeEngine {
    /// Shapes handed back by every import.
    pub results: Vec<StackShape>,
    pub fail_import: bool,
    open: BTreeMap<StackId, StackHandle>,
    next_id: u64,
    pub imports: Vec<(PathBuf, AxisOrder)>,
    pub open_at_import: Vec<usize>,
    pub projections: usize,
    pub saved: Vec<PathBuf>,
    pub closed: Vec<String>,
    pub close_all_calls: usize,
    pub free_memory_calls: usize,
}

impl FakeEngine {
    pub fn returning(results: Vec<StackShape>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_import: true,
            ..Self::default()
        }
    }

    fn open(&mut self, title: String, shape: StackShape) -> StackHandle {
        self.next_id += 1;
        let handle = StackHandle {
            id: StackId(self.next_id),
            title,
            shape,
        };
        self.open.insert(handle.id, handle.clone());
        handle
    }
}

pub fn shape(frames: usize, slices: usize, channels: usize) -> StackShape {
    StackShape {
        frames,
        slices,
        channels,
    }
}

impl ImagingEngine for FakeEngine {
    fn import(
        &mut self,
        initiator: &Path,
        order: AxisOrder,
    ) -> Result<Vec<StackHandle>, EngineError> {
        self.imports.push((initiator.to_path_buf(), order));
        self.open_at_import.push(self.open.len());
        if self.fail_import {
            return Err(EngineError::Other("importer crashed".to_string()));
        }
        let name = initiator
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let results = self.results.clone();
        Ok(results
            .into_iter()
            .enumerate()
            .map(|(i, shape)| self.open(format!("{name} #{i}"), shape))
            .collect())
    }

    fn rename(&mut self, stack: &mut StackHandle, title: &str) -> Result<(), EngineError> {
        let open = self
            .open
            .get_mut(&stack.id)
            .ok_or(EngineError::UnknownStack(stack.id))?;
        open.title = title.to_string();
        stack.title = title.to_string();
        Ok(())
    }

    fn shape(&self, stack: &StackHandle) -> Result<StackShape, EngineError> {
        self.open
            .get(&stack.id)
            .map(|s| s.shape)
            .ok_or(EngineError::UnknownStack(stack.id))
    }

    fn max_project(&mut self, stack: &StackHandle) -> Result<StackHandle, EngineError> {
        let source = self.shape(stack)?;
        self.projections += 1;
        Ok(self.open(
            format!("MAX_{}", stack.title),
            StackShape {
                slices: 1,
                ..source
            },
        ))
    }

    fn save_tiff(&mut self, stack: &StackHandle, path: &Path) -> Result<(), EngineError> {
        self.shape(stack)?;
        fs::write(path, b"").map_err(|e| EngineError::Other(e.to_string()))?;
        self.saved.push(path.to_path_buf());
        Ok(())
    }

    fn close(&mut self, stack: StackHandle) {
        if let Some(closed) = self.open.remove(&stack.id) {
            self.closed.push(closed.title);
        }
    }

    fn open_stacks(&self) -> Vec<StackId> {
        self.open.keys().copied().collect()
    }

    fn close_all(&mut self) {
        self.close_all_calls += 1;
        self.open.clear();
    }

    fn free_memory(&mut self) {
        self.free_memory_calls += 1;
    }
}
