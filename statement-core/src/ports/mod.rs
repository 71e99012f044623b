//! Port definitions (hexagonal architecture).
//!
//! The core domain and services depend only on these traits, not on concrete
//! reader implementations.

pub mod cell_source;

pub use cell_source::{CellTextSource, MergeAware, NeverMerged};
