//! Data backend for a motor-vehicle-collision dashboard.
//!
//! The crate loads the NYC collision export once, normalizes it into an
//! immutable [`data::model::CrashDataset`], and answers the pure
//! filter/aggregation queries that drive the dashboard's views: a point
//! map, an hour-filtered density map, a per-minute histogram, and a
//! ranked table of dangerous streets. Rendering lives in the hosting UI;
//! this crate only supplies the data those views consume.

pub mod data;
pub mod error;

pub use data::cache::DatasetCache;
pub use data::loader::{load_file, load_file_with, TimestampPolicy};
pub use data::model::{CrashDataset, CrashRecord, InjuryCategory};
pub use error::{LoadError, QueryError};
