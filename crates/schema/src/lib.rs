//! # gqlmap schema
//!
//! Schema model builder: SDL in, ordered [`SchemaNode`]s out.
//!
//! ```text
//! SDL text / file
//!     │
//!     ├──> strip `extend schema @link(...)` (federation metadata)
//!     ├──> graphql-parser → Document
//!     ├──> merge definitions + `extend type` blocks, validate references
//!     │
//!     ├──> nodes()              SchemaNode[] with unwrapped field types
//!     └──> type_dependencies()  type → referenced non-builtin types
//! ```
//!
//! ## Example
//!
//! ```rust
//! use gqlmap_schema::SchemaAnalyzer;
//!
//! let analyzer = SchemaAnalyzer::from_sdl("type Query { posts: [Post!]! } type Post { id: ID! }").unwrap();
//! let nodes = analyzer.nodes().unwrap();
//! assert_eq!(nodes[0].fields[0].declared_type, "Post");
//! assert!(nodes[0].fields[0].is_list);
//! ```
//!
//! [`SchemaNode`]: gqlmap_protocol::SchemaNode

mod builder;
mod error;
mod model;
mod sdl;

pub use builder::{SchemaAnalyzer, SchemaSource};
pub use error::{Result, SchemaError};
pub use model::{TypeRef, UnwrappedType};
pub use sdl::strip_schema_extensions;
