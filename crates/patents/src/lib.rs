//! Patents - Cluster Explorer for Pre-computed Patent Data
//!
//! Loads a static patent clustering dataset, normalizes its records and
//! derives the projections every view renders: cluster groupings, keyword
//! frequencies, filter facets, similar-patent rankings and a mock cluster
//! prediction for new abstracts.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod predict;
pub mod record;
pub mod similarity;
pub mod source;
pub mod theme;
pub mod view;

pub use error::{PatentError, Result};
pub use record::{Enrichment, RawRecord, Record, SimilarityVector};
