//! statement-core - a declarative, configuration-driven bank-statement
//! parsing engine.
//!
//! This crate implements the core parsing pipeline following hexagonal
//! architecture:
//!
//! - **domain**: profile schema, semantic fields, the error taxonomy, and
//!   the `ParsedRow` output type.
//! - **ports**: the minimal source-capability traits (`CellTextSource`,
//!   `MergeAware`) the header resolver and row materializer are written
//!   against.
//! - **services**: format detection, profile resolution, header resolution,
//!   row materialization, and the `EngineService` facade that ties them
//!   together.
//! - **adapters**: concrete document readers (`csv`, `calamine`,
//!   `pdf-extract`) implementing those ports.
//! - **config**: loading the YAML bank-profile file into a compiled,
//!   immutable `ProfileBook`.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

pub use domain::{
    BankProfile, EngineError, EngineResult, FormatKind, FormatProfile, ParsedRow, ProfileBook,
    SemanticField,
};
pub use services::EngineService;
