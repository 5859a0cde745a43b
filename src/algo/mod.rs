pub mod aggregate;
pub mod compare;
pub mod domains;
pub mod normalizer;
pub mod relevance;
pub mod report;
pub mod tagger;
pub mod taxonomy;
