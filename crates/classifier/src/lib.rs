//! # gqlmap classifier
//!
//! Locates GraphQL resolver implementations in JavaScript/TypeScript sources
//! and labels each with the data-access pattern its body suggests.
//!
//! ## Pipeline
//!
//! ```text
//! files / directories
//!     │
//!     ├──> SourceScanner (extension, .gitignore, path filters, size limit)
//!     │
//!     ├──> CandidateDetector (tree-sitter) → Candidate { path, source }
//!     │
//!     └──> rules::classify (first matching rule wins)
//!          + rules::extract_dependencies
//!          → ResolverInfo
//! ```
//!
//! ## Example
//!
//! ```rust
//! use gqlmap_classifier::{ClassifierConfig, ResolverClassifier};
//! use gqlmap_protocol::SourceKind;
//!
//! let classifier = ResolverClassifier::new(ClassifierConfig::default()).unwrap();
//! let resolvers = classifier
//!     .classify_source(
//!         "export const resolvers = { Query: { users: () => prisma.user.findMany() } };",
//!         "resolvers.ts",
//!     )
//!     .unwrap();
//!
//! assert_eq!(resolvers[0].path, "Query.users");
//! assert_eq!(resolvers[0].source_kind(), SourceKind::Database);
//! ```

mod classifier;
mod config;
mod detector;
mod error;
mod executable;
mod language;
pub mod rules;
mod scanner;
mod types;

pub use classifier::{classify_text, extract_dependencies, ResolverClassifier};
pub use config::{ClassifierConfig, DEFAULT_MAX_FILE_SIZE_BYTES};
pub use detector::CandidateDetector;
pub use error::{ClassifierError, Result};
pub use executable::{ExecutableSchema, StaticBindings};
pub use language::{Language, DEFAULT_EXTENSIONS};
pub use scanner::{Discovery, SourceScanner};
pub use types::{Candidate, FileFailure, ScanReport};
