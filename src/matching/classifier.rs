use super::dictionary::{plain_stem, EquivalenceDictionary};
use super::normalize::normalize;
use crate::types::MatchKind;

/// Minimum stem length accepted by the dictionary-less fallback
const FALLBACK_MIN_STEM: usize = 3;

fn is_gender_vowel(c: char) -> bool {
    matches!(c, 'A' | 'E' | 'O')
}

/// A normalized form reads as plural when it carries a trailing S or a
/// diminutive suffix.
fn looks_plural(form: &str) -> bool {
    form.ends_with('S')
        || ["CITO", "CITA", "ITO", "ITA"]
            .iter()
            .any(|suffix| form.len() > suffix.len() + 2 && form.ends_with(suffix))
}

/// Decides whether and how two raw answers are equivalent.
///
/// Borrows the round's dictionary; [`MatchClassifier::detached`] builds the
/// dictionary-less variant used when no round context is loaded, which only
/// accepts plain stem equality.
#[derive(Debug, Clone, Copy)]
pub struct MatchClassifier<'a> {
    dict: Option<&'a EquivalenceDictionary>,
}

impl<'a> MatchClassifier<'a> {
    pub fn new(dict: &'a EquivalenceDictionary) -> Self {
        Self { dict: Some(dict) }
    }

    pub fn detached() -> MatchClassifier<'static> {
        MatchClassifier { dict: None }
    }

    /// Classify a pair of raw answers. `None` means no match. The relation
    /// is symmetric but deliberately not transitive (pairwise semantics).
    pub fn classify(&self, a: &str, b: &str) -> Option<MatchKind> {
        let norm_a = normalize(a);
        let norm_b = normalize(b);
        if norm_a.is_empty() || norm_b.is_empty() {
            return None;
        }
        if norm_a == norm_b {
            return Some(MatchKind::Exact);
        }

        let Some(dict) = self.dict else {
            // no round context: pure stem equality, short stems rejected
            let stem_a = plain_stem(&norm_a);
            return (stem_a.len() >= FALLBACK_MIN_STEM && stem_a == plain_stem(&norm_b))
                .then_some(MatchKind::StemSimilar);
        };

        let stem_a = dict.stem(&norm_a);
        let stem_b = dict.stem(&norm_b);

        if stem_a != stem_b {
            // declared synonym groups bridge differing stems; nothing else does
            return match (dict.canonical_id(&norm_a), dict.canonical_id(&norm_b)) {
                (Some(ca), Some(cb)) if ca == cb => Some(MatchKind::Synonym),
                _ => None,
            };
        }

        if looks_plural(&norm_a) || looks_plural(&norm_b) {
            return Some(MatchKind::Plural);
        }

        let last_a = norm_a.chars().last()?;
        let last_b = norm_b.chars().last()?;
        if is_gender_vowel(last_a) && is_gender_vowel(last_b) && last_a != last_b {
            return Some(MatchKind::Gender);
        }

        if let (Some(ca), Some(cb)) = (dict.canonical_id(&norm_a), dict.canonical_id(&norm_b)) {
            if ca == cb {
                return Some(MatchKind::Synonym);
            }
        }

        // stems agree but no stronger explanation applies
        Some(MatchKind::StemSimilar)
    }

    pub fn is_match(&self, a: &str, b: &str) -> bool {
        self.classify(a, b).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoundContext;

    fn dict(answers: &[&str]) -> EquivalenceDictionary {
        EquivalenceDictionary::build(&RoundContext {
            prompt_id: "prompt".into(),
            question: "test".into(),
            canonical_answers: answers.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn exact_is_reflexive() {
        let d = dict(&["GATO"]);
        let c = MatchClassifier::new(&d);
        for word in ["GATO", "gato", "Camión", "x"] {
            assert_eq!(c.classify(word, word), Some(MatchKind::Exact));
        }
    }

    #[test]
    fn empty_input_never_matches() {
        let d = dict(&["GATO"]);
        let c = MatchClassifier::new(&d);
        assert_eq!(c.classify("", "GATO"), None);
        assert_eq!(c.classify("¡!", "GATO"), None);
        assert_eq!(c.classify("", ""), None);
    }

    #[test]
    fn plural_pair() {
        let d = dict(&["GATO"]);
        let c = MatchClassifier::new(&d);
        assert_eq!(c.classify("gato", "gatos"), Some(MatchKind::Plural));
        assert_eq!(c.classify("gatito", "gato"), Some(MatchKind::Plural));
    }

    #[test]
    fn gender_pair() {
        let d = dict(&["GATO"]);
        let c = MatchClassifier::new(&d);
        assert_eq!(c.classify("gato", "gata"), Some(MatchKind::Gender));
    }

    #[test]
    fn declared_synonyms_match_across_stems() {
        let d = dict(&["AUTO|CARRO"]);
        let c = MatchClassifier::new(&d);
        assert_eq!(c.classify("auto", "carro"), Some(MatchKind::Synonym));
        assert_eq!(c.classify("autos", "carro"), Some(MatchKind::Synonym));
    }

    #[test]
    fn unrelated_words_do_not_match() {
        let d = dict(&["SOL", "LUNA"]);
        let c = MatchClassifier::new(&d);
        assert_eq!(c.classify("sol", "luna"), None);
    }

    #[test]
    fn strict_form_still_matches_its_plural() {
        let d = dict(&["PENA."]);
        let c = MatchClassifier::new(&d);
        assert_eq!(c.classify("PENA", "PENAS"), Some(MatchKind::Plural));
        assert_eq!(d.stem("PENAS"), "PENA");
    }

    #[test]
    fn symmetry() {
        let d = dict(&["AUTO|CARRO", "GATO", "PENA."]);
        let c = MatchClassifier::new(&d);
        let words = ["auto", "carro", "gato", "gatos", "gata", "pena", "penas", "sol", ""];
        for a in words {
            for b in words {
                assert_eq!(c.classify(a, b), c.classify(b, a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn detached_fallback_uses_plain_stems_only() {
        let c = MatchClassifier::detached();
        assert_eq!(c.classify("gato", "gatos"), Some(MatchKind::StemSimilar));
        assert_eq!(c.classify("auto", "carro"), None);
        // stems at or below two chars are rejected
        assert_eq!(c.classify("osa", "oso"), None);
        assert!(c.is_match("perro", "perros"));
    }
}
