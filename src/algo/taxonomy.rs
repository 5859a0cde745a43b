use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TrendError;

/// Macro-region a document is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "North_India")]
    NorthIndia,
    #[serde(rename = "South_India")]
    SouthIndia,
    #[serde(rename = "East_India")]
    EastIndia,
    #[serde(rename = "West_India")]
    WestIndia,
    #[serde(rename = "Central_India")]
    CentralIndia,
    #[serde(rename = "Northeast_India")]
    NortheastIndia,
    Unknown,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::NorthIndia => "North_India",
            Region::SouthIndia => "South_India",
            Region::EastIndia => "East_India",
            Region::WestIndia => "West_India",
            Region::CentralIndia => "Central_India",
            Region::NortheastIndia => "Northeast_India",
            Region::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One taxonomy category and its canonical terms, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    pub name: String,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaxonomyDef {
    facets: Vec<Facet>,
}

/// The fixed reference set of domain terms.
///
/// Facet order and term order are significant: they are the tie-break order
/// for every frequency table built from this taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TaxonomyDef", into = "TaxonomyDef")]
pub struct Taxonomy {
    facets: Vec<Facet>,
    ranks: HashMap<String, usize>,
}

impl Taxonomy {
    pub fn new(facets: Vec<Facet>) -> Result<Self, TrendError> {
        let mut seen_facets = HashSet::new();
        let mut ranks = HashMap::new();
        let mut position = 0;

        for facet in &facets {
            if facet.name.trim().is_empty() {
                return Err(TrendError::Config("facet with an empty name".into()));
            }
            if !seen_facets.insert(facet.name.as_str()) {
                return Err(TrendError::Config(format!(
                    "facet '{}' is declared twice",
                    facet.name
                )));
            }
            if facet.terms.is_empty() {
                return Err(TrendError::Config(format!(
                    "facet '{}' has no terms",
                    facet.name
                )));
            }
            let mut seen_terms = HashSet::new();
            for term in &facet.terms {
                validate_term(term, &facet.name)?;
                if !seen_terms.insert(term.as_str()) {
                    return Err(TrendError::Config(format!(
                        "term '{term}' is listed twice in facet '{}'",
                        facet.name
                    )));
                }
                ranks.entry(term.clone()).or_insert(position);
                position += 1;
            }
        }

        Ok(Self { facets, ranks })
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    pub fn facet(&self, name: &str) -> Option<&Facet> {
        self.facets.iter().find(|f| f.name == name)
    }

    pub fn facet_names(&self) -> Vec<String> {
        self.facets.iter().map(|f| f.name.clone()).collect()
    }

    /// All terms across facets in declaration order. A term listed under two
    /// facets is yielded twice.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.facets
            .iter()
            .flat_map(|f| f.terms.iter().map(String::as_str))
    }

    /// Position of the first declaration of `term` across all facets.
    pub fn term_rank(&self, term: &str) -> Option<usize> {
        self.ranks.get(term).copied()
    }
}

impl TryFrom<TaxonomyDef> for Taxonomy {
    type Error = TrendError;

    fn try_from(def: TaxonomyDef) -> Result<Self, Self::Error> {
        Taxonomy::new(def.facets)
    }
}

impl From<Taxonomy> for TaxonomyDef {
    fn from(t: Taxonomy) -> Self {
        TaxonomyDef { facets: t.facets }
    }
}

/// A macro-region and the sub-region names that identify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionEntry {
    pub region: Region,
    pub places: Vec<String>,
}

/// A sub-region declared under more than one macro-region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionConflict {
    pub place: String,
    /// The first declaration, which decides tagging.
    pub kept: Region,
    pub shadowed: Region,
}

/// Ordered macro-region → sub-region mapping. The first region (in declared
/// order) listing a matching place wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<RegionEntry>", into = "Vec<RegionEntry>")]
pub struct RegionMap {
    entries: Vec<RegionEntry>,
}

impl RegionMap {
    pub fn new(entries: Vec<RegionEntry>) -> Result<Self, TrendError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if entry.region == Region::Unknown {
                return Err(TrendError::Config(
                    "'Unknown' cannot be declared in the region map".into(),
                ));
            }
            if !seen.insert(entry.region) {
                return Err(TrendError::Config(format!(
                    "region '{}' is declared twice",
                    entry.region
                )));
            }
            if entry.places.is_empty() {
                return Err(TrendError::Config(format!(
                    "region '{}' has no places",
                    entry.region
                )));
            }
            for place in &entry.places {
                validate_term(place, entry.region.as_str())?;
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RegionEntry] {
        &self.entries
    }

    /// Declared position of `region`; `Unknown` sorts after every declared region.
    pub fn region_rank(&self, region: Region) -> usize {
        self.entries
            .iter()
            .position(|e| e.region == region)
            .unwrap_or(self.entries.len())
    }

    /// The macro-region that owns `place` under the first-match rule.
    pub fn owner(&self, place: &str) -> Option<Region> {
        self.entries
            .iter()
            .find(|e| e.places.iter().any(|p| p == place))
            .map(|e| e.region)
    }

    /// Places declared under more than one macro-region.
    pub fn conflicts(&self) -> Vec<RegionConflict> {
        let mut owners: HashMap<&str, Region> = HashMap::new();
        let mut conflicts = Vec::new();
        for entry in &self.entries {
            for place in &entry.places {
                match owners.get(place.as_str()) {
                    Some(&kept) if kept != entry.region => conflicts.push(RegionConflict {
                        place: place.clone(),
                        kept,
                        shadowed: entry.region,
                    }),
                    Some(_) => {}
                    None => {
                        owners.insert(place, entry.region);
                    }
                }
            }
        }
        conflicts
    }
}

impl TryFrom<Vec<RegionEntry>> for RegionMap {
    type Error = TrendError;

    fn try_from(entries: Vec<RegionEntry>) -> Result<Self, Self::Error> {
        RegionMap::new(entries)
    }
}

impl From<RegionMap> for Vec<RegionEntry> {
    fn from(m: RegionMap) -> Self {
        m.entries
    }
}

/// A term must survive normalization unchanged, otherwise it can never match.
pub(crate) fn validate_term(term: &str, context: &str) -> Result<(), TrendError> {
    let well_formed = !term.is_empty()
        && term == term.to_lowercase()
        && term.trim() == term
        && !term.contains("  ")
        && term.chars().all(|c| c.is_alphanumeric() || c == ' ');
    if well_formed {
        Ok(())
    } else {
        Err(TrendError::Config(format!(
            "term '{term}' in '{context}' must be lowercase alphanumeric words separated by single spaces"
        )))
    }
}
