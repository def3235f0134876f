//! # anilyze
//!
//! Batch processing of microscopy acquisitions into hyperstacks and
//! max-intensity projections.
//!
//! A root directory holds the scans of one experiment, written by one of two
//! microscope families:
//!  - Olympus: `<base>.oif` initiator files, each with a `<base>.oif.files`
//!    directory of `s_C###Z###[T###].tif` planes
//!  - Bruker: one directory per scan holding
//!    `<scan>_Cycle#####_Ch#_######.ome.tif` planes
//!
//! For every scan the batch driver finds the initiator file, decides from
//! the plane file names whether the scan is a time series or a single depth
//! stack, has the imaging engine assemble the hyperstack, and then either
//! saves it unchanged, saves its max projection over depth, or skips it.
//! A scan that fails is written to the run log (`errorFile.txt` in the
//! root) and the batch carries on with the next one.
//!
//! The engine sits behind the [`engine::ImagingEngine`] trait. The bundled
//! [`engine::NativeEngine`] decodes planes with `image`, assembles them with
//! `ndarray` and writes multi-page 16-bit TIFFs.
//!
//! # Examples
//!
//! ## Processing an experiment folder
//!
//! ```no_run
//! # use anilyze::{batch::BatchDriver, config::BatchConfig, engine::NativeEngine};
//! let mut driver = BatchDriver::new("experiment", BatchConfig::default(), NativeEngine::new());
//! let summary = driver.run().expect("should have set up the batch");
//! println!("{}", summary.summary());
//! ```

pub mod batch;
pub mod builder;
pub mod config;
pub mod engine;
pub mod enums;
pub mod error;
pub mod hyperstack;
pub mod initiator;
pub mod instrument;
pub mod projection;
pub mod run_log;
pub mod scan;
pub mod stack_loader;
