pub mod config;
pub mod pipeline;

pub use config::{GqlmapConfig, DEFAULT_CONFIG_FILE};
pub use pipeline::{analyze, classify, load_schema, schema_report, SchemaReport};
