//! Boundary to the imaging engine that imports, projects and saves stacks.
//!
//! The engine owns every open stack; the pipeline only holds
//! [`StackHandle`]s. [`EngineSession`] scopes one scan's use of the engine
//! and drains all open stacks when it is dropped, on success and failure
//! alike, so nothing a scan opened can leak into the next scan.

use crate::{
    enums::AxisOrder,
    hyperstack::Hyperstack,
    stack_loader::{StackLoader, StackLoaderError},
};

use std::{
    collections::BTreeMap,
    fmt,
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StackId(pub u64);

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Extent of an open stack along its non-spatial axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackShape {
    pub frames: usize,
    pub slices: usize,
    pub channels: usize,
}

impl StackShape {
    pub fn is_single_depth_plane(&self) -> bool {
        self.slices == 1
    }
}

/// A stack currently open in the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackHandle {
    pub id: StackId,
    pub title: String,
    pub shape: StackShape,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("import of {path} failed: {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: StackLoaderError,
    },

    #[error("stack {0} is not open")]
    UnknownStack(StackId),

    #[error("cannot save {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("{0}")]
    Other(String),
}

pub trait ImagingEngine {
    /// Import every series reachable from `initiator`, laid out in `order`.
    fn import(
        &mut self,
        initiator: &Path,
        order: AxisOrder,
    ) -> Result<Vec<StackHandle>, EngineError>;

    fn rename(&mut self, stack: &mut StackHandle, title: &str) -> Result<(), EngineError>;

    /// Re-read the shape of an open stack.
    fn shape(&self, stack: &StackHandle) -> Result<StackShape, EngineError>;

    /// Max-intensity projection over depth for every frame. Opens a new stack.
    fn max_project(&mut self, stack: &StackHandle) -> Result<StackHandle, EngineError>;

    fn save_tiff(&mut self, stack: &StackHandle, path: &Path) -> Result<(), EngineError>;

    fn close(&mut self, stack: StackHandle);

    fn open_stacks(&self) -> Vec<StackId>;

    fn close_all(&mut self);

    fn free_memory(&mut self) {}
}

/// Scoped use of an engine for one scan. Dropping it closes everything.
pub struct EngineSession<'e, E: ImagingEngine + ?Sized> {
    engine: &'e mut E,
}

impl<'e, E: ImagingEngine + ?Sized> EngineSession<'e, E> {
    pub fn new(engine: &'e mut E) -> Self {
        Self { engine }
    }
}

impl<E: ImagingEngine + ?Sized> Deref for EngineSession<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        self.engine
    }
}

impl<E: ImagingEngine + ?Sized> DerefMut for EngineSession<'_, E> {
    fn deref_mut(&mut self) -> &mut E {
        self.engine
    }
}

impl<E: ImagingEngine + ?Sized> Drop for EngineSession<'_, E> {
    fn drop(&mut self) {
        let open = self.engine.open_stacks().len();
        if open > 0 {
            debug!("Closing {} open stack(s)", open);
        }
        self.engine.close_all();
        self.engine.free_memory();
    }
}

/// In-process engine backed by [`StackLoader`] and [`Hyperstack`].
#[derive(Default)]
pub struct NativeEngine {
    stacks: BTreeMap<StackId, Hyperstack>,
    next_id: u64,
}

impl NativeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn open(&mut self, stack: Hyperstack) -> StackHandle {
        self.next_id += 1;
        let id = StackId(self.next_id);
        let handle = StackHandle {
            id,
            title: stack.title.clone(),
            shape: Self::shape_of(&stack),
        };
        self.stacks.insert(id, stack);
        handle
    }

    fn shape_of(stack: &Hyperstack) -> StackShape {
        StackShape {
            frames: stack.n_frames(),
            slices: stack.n_slices(),
            channels: stack.n_channels(),
        }
    }

    fn get(&self, id: StackId) -> Result<&Hyperstack, EngineError> {
        self.stacks.get(&id).ok_or(EngineError::UnknownStack(id))
    }

    #[cfg(test)]
    fn stack(&self, handle: &StackHandle) -> Option<&Hyperstack> {
        self.stacks.get(&handle.id)
    }
}

impl ImagingEngine for NativeEngine {
    fn import(
        &mut self,
        initiator: &Path,
        order: AxisOrder,
    ) -> Result<Vec<StackHandle>, EngineError> {
        let series =
            StackLoader::load_series(initiator, order).map_err(|source| EngineError::Import {
                path: initiator.to_path_buf(),
                source,
            })?;
        Ok(series.into_iter().map(|stack| self.open(stack)).collect())
    }

    fn rename(&mut self, stack: &mut StackHandle, title: &str) -> Result<(), EngineError> {
        let open = self
            .stacks
            .get_mut(&stack.id)
            .ok_or(EngineError::UnknownStack(stack.id))?;
        open.title = title.to_string();
        stack.title = title.to_string();
        Ok(())
    }

    fn shape(&self, stack: &StackHandle) -> Result<StackShape, EngineError> {
        Ok(Self::shape_of(self.get(stack.id)?))
    }

    fn max_project(&mut self, stack: &StackHandle) -> Result<StackHandle, EngineError> {
        let projected = self.get(stack.id)?.max_project();
        Ok(self.open(projected))
    }

    fn save_tiff(&mut self, stack: &StackHandle, path: &Path) -> Result<(), EngineError> {
        self.get(stack.id)?
            .save_tiff(path)
            .map_err(|source| EngineError::Save {
                path: path.to_path_buf(),
                source,
            })
    }

    fn close(&mut self, stack: StackHandle) {
        self.stacks.remove(&stack.id);
    }

    fn open_stacks(&self) -> Vec<StackId> {
        self.stacks.keys().copied().collect()
    }

    fn close_all(&mut self) {
        self.stacks.clear();
    }
}
