//! # gqlmap graph
//!
//! Turns schema nodes and classified resolvers into typed connections, and
//! answers questions over the result.
//!
//! ## Architecture
//!
//! ```text
//! SchemaNode[] + ResolverInfo[]
//!     │
//!     ├──> synthesize (static mode)
//!     │      ├─ resolver → declaring type        (resolves)
//!     │      ├─ resolver → DB:<model> / API:<..> (calls)
//!     │      ├─ resolver → dependency resolver   (calls)
//!     │      └─ type → field type                (references)
//!     │
//!     └──> ConnectionGraph (petgraph)
//!            ├─ resolvers of a type
//!            ├─ data sources reachable through calls
//!            └─ GraphSummary
//! ```

mod error;
mod graph;
mod summary;
mod synthesizer;
mod types;

pub use error::{GraphError, Result};
pub use summary::GraphSummary;
pub use synthesizer::{
    build_service_graph, data_source_id, is_data_source_id, synthesize, API_PREFIX,
    DATABASE_PREFIX,
};
pub use types::{ConnectionGraph, GraphEdge, Vertex, VertexKind};
