//! Fashion trend extraction and cross-source aggregation.
//!
//! Documents from a discussion feed and a web-search feed are cleaned,
//! filtered for relevance, tagged against a fixed taxonomy, counted per
//! source, and compared across sources. See [`pipeline::Pipeline`] for the
//! end-to-end driver and [`ops`] for the JSON-level entry points.

pub mod algo;
pub mod config;
pub mod corpus;
pub mod error;
pub mod model;
pub mod ops;
pub mod pipeline;
pub mod prompt;
pub mod stats;

pub use config::PipelineConfig;
pub use error::{TrendError, TrendResult};
