use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::algo::taxonomy::{validate_term, RegionMap, Taxonomy};
use crate::error::{TrendError, TrendResult};

/// Embedded default config, compiled from `taxonomies/default.json`.
/// Users override by placing a file at `$XDG_DATA_HOME/trends/config.json`
/// or `$TRENDS_CONFIG` env var, or passing `--config <path>`.
const EMBEDDED_DEFAULT: &str = include_str!("../taxonomies/default.json");

const DEFAULT_TOP_N: usize = 15;

/// Read-only configuration injected into every pipeline component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub taxonomy: Taxonomy,
    pub region_map: RegionMap,
    #[serde(default = "default_generic_terms")]
    pub generic_relevance_terms: Vec<String>,
    /// Presentation cut-off; aggregation itself never truncates.
    #[serde(default = "default_top_n")]
    pub top_n_per_facet: usize,
    /// Fail on malformed documents instead of dropping them.
    #[serde(default)]
    pub strict: bool,
}

fn default_generic_terms() -> Vec<String> {
    ["fashion", "style", "outfit", "clothing", "dress", "wear", "look"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl PipelineConfig {
    pub fn new(taxonomy: Taxonomy, region_map: RegionMap) -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            taxonomy,
            region_map,
            generic_relevance_terms: default_generic_terms(),
            top_n_per_facet: DEFAULT_TOP_N,
            strict: false,
        }
    }

    /// The compiled-in default config.
    pub fn embedded() -> Self {
        parse_config(EMBEDDED_DEFAULT).expect("embedded default config is invalid")
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_generic_terms(mut self, terms: Vec<String>) -> Self {
        self.generic_relevance_terms = terms;
        self
    }

    fn validate(&self) -> TrendResult<()> {
        for term in &self.generic_relevance_terms {
            validate_term(term, "generic_relevance_terms")?;
        }
        for conflict in self.region_map.conflicts() {
            warn!(
                place = %conflict.place,
                kept = %conflict.kept,
                shadowed = %conflict.shadowed,
                "place listed under two regions; first declaration wins"
            );
        }
        Ok(())
    }
}

/// Parse a config from a JSON string.
pub fn parse_config(json: &str) -> TrendResult<PipelineConfig> {
    let config: PipelineConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Load config from a file path.
pub fn load_config(path: &Path) -> TrendResult<PipelineConfig> {
    let json = std::fs::read_to_string(path).map_err(|source| TrendError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&json)
}

/// Resolve the config using this order:
///
/// 1. `explicit` path (errors are returned, not skipped)
/// 2. `$TRENDS_CONFIG` env var (path to JSON file)
/// 3. `$XDG_DATA_HOME/trends/config.json` (or `~/.local/share/trends/config.json`)
/// 4. Embedded compile-time default from `taxonomies/default.json`
///
/// Steps 2 and 3 fall through to the next one on failure, with a warning.
pub fn resolve_config(explicit: Option<&Path>) -> TrendResult<PipelineConfig> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading config from explicit path");
        return load_config(path);
    }

    if let Ok(path) = std::env::var("TRENDS_CONFIG") {
        match load_config(Path::new(&path)) {
            Ok(config) => return Ok(config),
            Err(e) => warn!(error = %e, "ignoring $TRENDS_CONFIG"),
        }
    }

    if let Some(path) = xdg_config_path() {
        if path.exists() {
            match load_config(&path) {
                Ok(config) => return Ok(config),
                Err(e) => warn!(error = %e, path = %path.display(), "ignoring user config"),
            }
        }
    }

    Ok(PipelineConfig::embedded())
}

/// Return the XDG data path for the trends config.
fn xdg_config_path() -> Option<PathBuf> {
    let data_home = std::env::var("XDG_DATA_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".local/share"))
        })?;
    Some(data_home.join("trends/config.json"))
}

/// Return the embedded default config as a JSON string.
/// Useful for exporting/seeding user-customizable files.
pub fn embedded_default_json() -> &'static str {
    EMBEDDED_DEFAULT
}
