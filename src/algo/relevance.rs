use crate::config::PipelineConfig;
use crate::model::matching_text;

/// Decides whether a normalized document belongs in the corpus.
///
/// Matching is plain substring search over the lowercased text, so "kurta"
/// matches inside "kurtain". Use [`RelevanceClassifier::is_relevant_strict`]
/// when whole-word matches are required.
#[derive(Debug, Clone, Copy)]
pub struct RelevanceClassifier<'a> {
    config: &'a PipelineConfig,
}

impl<'a> RelevanceClassifier<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    pub fn is_relevant(&self, clean_title: &str, clean_body: &str) -> bool {
        let text = matching_text(clean_title, clean_body);
        self.candidate_terms().any(|term| text.contains(term))
    }

    /// Whole-word variant: a term only counts when it is not glued to other
    /// alphanumeric characters.
    pub fn is_relevant_strict(&self, clean_title: &str, clean_body: &str) -> bool {
        let text = matching_text(clean_title, clean_body);
        self.candidate_terms().any(|term| contains_word(&text, term))
    }

    fn candidate_terms(&self) -> impl Iterator<Item = &'a str> + 'a {
        let config = self.config;
        config
            .taxonomy
            .terms()
            .chain(config.generic_relevance_terms.iter().map(String::as_str))
    }
}

/// True when `term` occurs in `text` bounded by non-alphanumerics or the
/// string edges.
pub fn contains_word(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    text.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::taxonomy::{Facet, RegionMap, Taxonomy};

    fn config() -> PipelineConfig {
        let taxonomy = Taxonomy::new(vec![Facet {
            name: "traditional_wear".into(),
            terms: vec!["saree".into(), "kurta".into(), "lehenga".into()],
        }])
        .unwrap();
        PipelineConfig::new(taxonomy, RegionMap::new(vec![]).unwrap())
    }

    #[test]
    fn taxonomy_term_makes_relevant() {
        let c = config();
        let classifier = RelevanceClassifier::new(&c);
        assert!(classifier.is_relevant("Red Saree", ""));
        assert!(classifier.is_relevant("", "where to buy a LEHENGA"));
    }

    #[test]
    fn generic_term_makes_relevant() {
        let c = config();
        let classifier = RelevanceClassifier::new(&c);
        assert!(classifier.is_relevant("Office outfit help", ""));
    }

    #[test]
    fn substring_policy_accepts_kurtain() {
        let c = config();
        let classifier = RelevanceClassifier::new(&c);
        assert!(classifier.is_relevant("I bought a new kurtain", ""));
    }

    #[test]
    fn strict_variant_rejects_kurtain() {
        let c = config();
        let classifier = RelevanceClassifier::new(&c);
        assert!(!classifier.is_relevant_strict("I bought a new kurtain", ""));
        assert!(classifier.is_relevant_strict("I bought a new kurta", ""));
    }

    #[test]
    fn unrelated_text_is_not_relevant() {
        let c = config();
        let classifier = RelevanceClassifier::new(&c);
        assert!(!classifier.is_relevant("Cricket scores today", "India won"));
        assert!(!classifier.is_relevant("", ""));
    }

    #[test]
    fn title_and_body_are_joined_with_space() {
        let c = config().with_generic_terms(vec![]);
        let classifier = RelevanceClassifier::new(&c);
        // "sar" + "ee" must not be glued into "saree".
        assert!(!classifier.is_relevant("sar", "ee"));
    }

    #[test]
    fn contains_word_boundaries() {
        assert!(contains_word("a saree here", "saree"));
        assert!(contains_word("saree", "saree"));
        assert!(!contains_word("sarees", "saree"));
        assert!(contains_word("sarees and saree", "saree"));
        assert!(!contains_word("anything", ""));
    }
}
