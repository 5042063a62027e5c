//! Device definitions, definition files and the validated catalog
//!
//! This module contains the definition model, the file loader (YAML, TOML,
//! JSON) and the catalog that validates and compiles the definitions.

pub mod catalog;
pub mod loader;
pub mod model;

// Re-export key types for convenience
pub use catalog::{CatalogStats, DefinitionCatalog, DuplicatePolicy};
pub use loader::{load_definition_file, load_definition_path, DEFAULT_DEFINITION_PATH};
pub use model::{
    Definition, Device, DeviceDefinition, DeviceType, DeviceTypeDefinition, FormatSpec,
    NamedDefinition,
};
