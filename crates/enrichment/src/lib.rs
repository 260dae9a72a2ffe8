//! # gqlmap enrichment
//!
//! Optional post-pass that asks a remote model about resolvers the static
//! classifier left `unknown`, and merges the answer without losing anything
//! the static pass already knew.
//!
//! Merge rules:
//! - a known classification is never replaced
//! - an `unknown` resolver adopts the suggested classification and detail
//! - dependencies are unioned
//! - a response without a well-formed payload changes nothing
//!
//! Any failure on the way (missing key, transport error, timeout, malformed
//! payload) degrades to the static result.

mod client;
mod config;
mod error;
mod merge;
mod payload;
mod prompt;

pub use client::{EnrichmentOracle, HttpOracle};
pub use config::{ConnectionMode, EnrichmentConfig, Provider};
pub use error::{EnrichmentError, Result};
pub use merge::{merge_insights, merge_payload, merge_response, MergeOutcome};
pub use payload::{first_json_block, EnrichmentPayload, InsightDetail, ResolverInsight};
pub use prompt::{build_prompt, SYSTEM_PROMPT};

use gqlmap_protocol::{ResolverInfo, SchemaNode};

/// One enrichment round trip. Never fails: an unavailable oracle yields
/// [`MergeOutcome::unchanged`].
pub async fn enrich(
    oracle: &dyn EnrichmentOracle,
    schema: &[SchemaNode],
    resolvers: Vec<ResolverInfo>,
) -> MergeOutcome {
    let prompt = match build_prompt(schema, &resolvers) {
        Ok(prompt) => prompt,
        Err(e) => {
            log::warn!("Enrichment skipped: {e}");
            return MergeOutcome::unchanged(resolvers);
        }
    };

    match oracle.complete(SYSTEM_PROMPT, &prompt).await {
        Ok(response) => merge_response(resolvers, &response),
        Err(e) => {
            log::warn!("{e}; keeping static classifications");
            MergeOutcome::unchanged(resolvers)
        }
    }
}
