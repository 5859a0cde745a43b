use std::collections::BTreeSet;

use crate::algo::taxonomy::Region;
use crate::config::PipelineConfig;
use crate::model::{matching_text, NormalizedDocument, TaggedDocument};

/// Matches taxonomy terms and infers the macro-region of a document.
#[derive(Debug, Clone, Copy)]
pub struct TaxonomyTagger<'a> {
    config: &'a PipelineConfig,
}

impl<'a> TaxonomyTagger<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    pub fn tag(&self, clean_title: &str, clean_body: &str) -> (BTreeSet<String>, Region) {
        let text = matching_text(clean_title, clean_body);
        (self.keywords_in(&text), self.region_in(&text))
    }

    pub fn tag_document(&self, normalized: NormalizedDocument) -> TaggedDocument {
        let (keywords, region) = self.tag(&normalized.clean_title, &normalized.clean_body);
        TaggedDocument {
            normalized,
            keywords,
            region,
        }
    }

    /// Every taxonomy term that is a substring of `text` (already lowercased).
    /// Terms shared by several facets collapse to one entry.
    pub fn keywords_in(&self, text: &str) -> BTreeSet<String> {
        self.config
            .taxonomy
            .terms()
            .filter(|term| text.contains(term))
            .map(str::to_string)
            .collect()
    }

    /// Region of the first declared place found in `text`.
    ///
    /// Regions are scanned in declared order and places in declared order, so
    /// a text naming both "kerala" and "punjab" lands in whichever region is
    /// declared first, regardless of where each word sits in the text.
    pub fn region_in(&self, text: &str) -> Region {
        self.config
            .region_map
            .entries()
            .iter()
            .find(|entry| entry.places.iter().any(|place| text.contains(place.as_str())))
            .map(|entry| entry.region)
            .unwrap_or(Region::Unknown)
    }
}
