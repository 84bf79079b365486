use std::collections::{HashMap, HashSet};

use super::normalize::normalize;
use crate::types::{RoundContext, GROUP_DELIMITER, STRICT_MARKER};

/// Suffixes stripped as diminutives during stemming, longest first
const DIMINUTIVE_SUFFIXES: &[&str] = &[
    "CITOS", "CITAS", "CITO", "CITA", "ITOS", "ITAS", "ITO", "ITA",
];

fn is_vowel(c: char) -> bool {
    matches!(c, 'A' | 'E' | 'I' | 'O' | 'U')
}

fn is_gender_vowel(c: char) -> bool {
    matches!(c, 'A' | 'E' | 'O')
}

/// Strip plural and diminutive suffixes from a normalized form. All forms
/// here are ASCII, so byte indexing is safe.
fn strip_number_suffixes(form: &str) -> String {
    if let Some(stem) = form.strip_suffix("CES") {
        if !stem.is_empty() {
            return format!("{stem}Z");
        }
    }

    let mut word = form.to_string();
    if word.len() > 4 && word.ends_with("ES") {
        let stem = &word[..word.len() - 2];
        // consonant+ES plural (SOLES -> SOL); vowel-ending stems keep the E
        if !stem.ends_with(is_vowel) {
            word = stem.to_string();
        } else {
            // vowel+S plural that happens to end in ES (SERIES -> SERIE)
            word.truncate(word.len() - 1);
        }
    } else if word.len() > 3 && word.ends_with('S') {
        word.truncate(word.len() - 1);
    }

    for suffix in DIMINUTIVE_SUFFIXES {
        if word.len() > suffix.len() + 2 && word.ends_with(suffix) {
            word.truncate(word.len() - suffix.len());
            break;
        }
    }

    word
}

fn strip_gender_vowel(mut word: String) -> String {
    if word.len() > 1 && word.ends_with(is_gender_vowel) {
        word.pop();
    }
    word
}

/// Stem with no strict set in play; the fallback used when no round
/// dictionary is loaded.
pub fn plain_stem(form: &str) -> String {
    strip_gender_vowel(strip_number_suffixes(form))
}

/// Plural/singular readings of a normalized form: vowel+S, consonant+ES,
/// Z<->CES, plus the reverse strips for members that are already plural.
fn plural_variants(form: &str) -> Vec<String> {
    let mut out = Vec::new();
    let Some(last) = form.chars().last() else {
        return out;
    };

    if last == 'Z' {
        out.push(format!("{}CES", &form[..form.len() - 1]));
    } else if is_vowel(last) {
        out.push(format!("{form}S"));
    } else {
        out.push(format!("{form}ES"));
    }

    if let Some(stem) = form.strip_suffix("CES") {
        if !stem.is_empty() {
            out.push(format!("{stem}Z"));
        }
    }
    if let Some(stem) = form.strip_suffix("ES") {
        if stem.len() > 2 {
            out.push(stem.to_string());
        }
    }
    if let Some(stem) = form.strip_suffix('S') {
        if stem.len() > 2 {
            out.push(stem.to_string());
        }
    }

    out
}

/// Gender inflections of a normalized form. Specific suffix pairs take
/// precedence over the generic O<->A swap.
fn gender_variants(form: &str) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(stem) = form.strip_suffix("TOR") {
        out.push(format!("{stem}TRIZ"));
    } else if let Some(stem) = form.strip_suffix("TRIZ") {
        out.push(format!("{stem}TOR"));
    } else if let Some(stem) = form.strip_suffix("ONA") {
        out.push(format!("{stem}ON"));
    } else if form.ends_with("ON") {
        out.push(format!("{form}A"));
    } else if let Some(stem) = form.strip_suffix("INA") {
        out.push(format!("{stem}IN"));
    } else if form.ends_with("IN") {
        out.push(format!("{form}A"));
    } else if let Some(stem) = form.strip_suffix('O') {
        out.push(format!("{stem}A"));
    } else if let Some(stem) = form.strip_suffix('A') {
        out.push(format!("{stem}O"));
    }

    out
}

/// Round-scoped mapping from normalized word forms to canonical answer ids.
///
/// Derived deterministically from a [`RoundContext`] and rebuilt whenever the
/// context changes; never persisted.
#[derive(Debug, Clone, Default)]
pub struct EquivalenceDictionary {
    entries: HashMap<String, String>,
    strict: HashSet<String>,
}

impl EquivalenceDictionary {
    pub fn build(ctx: &RoundContext) -> Self {
        let mut dict = Self::default();
        for group in &ctx.canonical_answers {
            dict.add_group(group);
        }
        dict
    }

    fn add_group(&mut self, group: &str) {
        let members: Vec<&str> = group
            .split(GROUP_DELIMITER)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .collect();

        let canonical = match members.first() {
            Some(first) => normalize(first.trim_end_matches(STRICT_MARKER)),
            None => return,
        };
        if canonical.is_empty() {
            return;
        }

        for raw in members {
            let strict = raw.ends_with(STRICT_MARKER);
            let form = normalize(raw.trim_end_matches(STRICT_MARKER));
            if form.is_empty() {
                continue;
            }

            // The strict set must be populated before derived variants are
            // computed so stemming of those variants respects it.
            if strict {
                self.strict.insert(form.clone());
            }

            self.register(&form, &canonical);
            for variant in plural_variants(&form) {
                self.register(&variant, &canonical);
            }
            for gendered in gender_variants(&form) {
                self.register(&gendered, &canonical);
                for variant in plural_variants(&gendered) {
                    self.register(&variant, &canonical);
                }
            }
        }
    }

    /// First registration wins; generated variants never overwrite explicit
    /// entries, and later groups never steal forms from earlier ones.
    fn register(&mut self, form: &str, canonical: &str) {
        self.entries
            .entry(form.to_string())
            .or_insert_with(|| canonical.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_strict(&self, form: &str) -> bool {
        self.strict.contains(form)
    }

    /// Canonical id for a normalized form, trying the form itself first and
    /// falling back to its stem.
    pub fn canonical_id(&self, form: &str) -> Option<&str> {
        self.entries
            .get(form)
            .or_else(|| self.entries.get(&self.stem(form)))
            .map(String::as_str)
    }

    /// Stem a normalized form: strip plural/diminutive suffixes, then strip
    /// a trailing gender vowel. If the partially-stemmed form is marked
    /// strict it is returned untouched: plural stripping is always safe,
    /// vowel stripping would corrupt some canonical nouns.
    pub fn stem(&self, form: &str) -> String {
        let stripped = strip_number_suffixes(form);
        if self.strict.contains(&stripped) {
            return stripped;
        }
        strip_gender_vowel(stripped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoundContext;

    fn ctx(answers: &[&str]) -> RoundContext {
        RoundContext {
            prompt_id: "prompt".into(),
            question: "test".into(),
            canonical_answers: answers.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn members_map_to_first_members_form() {
        let dict = EquivalenceDictionary::build(&ctx(&["AUTO|CARRO|COCHE"]));
        assert_eq!(dict.canonical_id("AUTO"), Some("AUTO"));
        assert_eq!(dict.canonical_id("CARRO"), Some("AUTO"));
        assert_eq!(dict.canonical_id("COCHE"), Some("AUTO"));
    }

    #[test]
    fn plural_variants_are_registered() {
        let dict = EquivalenceDictionary::build(&ctx(&["GATO", "SOL", "PEZ"]));
        assert_eq!(dict.canonical_id("GATOS"), Some("GATO"));
        assert_eq!(dict.canonical_id("SOLES"), Some("SOL"));
        assert_eq!(dict.canonical_id("PECES"), Some("PEZ"));
    }

    #[test]
    fn gender_variants_are_registered_and_repluralized() {
        let dict = EquivalenceDictionary::build(&ctx(&["GATO", "ACTOR", "LEON"]));
        assert_eq!(dict.canonical_id("GATA"), Some("GATO"));
        assert_eq!(dict.canonical_id("GATAS"), Some("GATO"));
        assert_eq!(dict.canonical_id("ACTRIZ"), Some("ACTOR"));
        assert_eq!(dict.canonical_id("LEONA"), Some("LEON"));
        assert_eq!(dict.canonical_id("LEONAS"), Some("LEON"));
    }

    #[test]
    fn first_registration_wins() {
        // GATA appears explicitly in the second group but was already
        // generated as a gender variant of the first; the explicit entry of
        // an earlier group is never overwritten either.
        let dict = EquivalenceDictionary::build(&ctx(&["GATO", "GATA|MICHI"]));
        assert_eq!(dict.canonical_id("GATA"), Some("GATO"));
        assert_eq!(dict.canonical_id("MICHI"), Some("GATA"));
    }

    #[test]
    fn strict_marker_is_recorded_and_stripped() {
        let dict = EquivalenceDictionary::build(&ctx(&["PENA."]));
        assert!(dict.is_strict("PENA"));
        assert_eq!(dict.canonical_id("PENA"), Some("PENA"));
    }

    #[test]
    fn strict_form_keeps_its_vowel_when_stemmed() {
        let dict = EquivalenceDictionary::build(&ctx(&["PENA."]));
        assert_eq!(dict.stem("PENA"), "PENA");
        assert_eq!(dict.stem("PENAS"), "PENA");
        // without the marker the gender vowel is stripped
        let loose = EquivalenceDictionary::build(&ctx(&["PENA"]));
        assert_eq!(loose.stem("PENA"), "PEN");
    }

    #[test]
    fn stem_strips_plurals_then_gender_vowel() {
        let dict = EquivalenceDictionary::default();
        assert_eq!(dict.stem("GATOS"), "GAT");
        assert_eq!(dict.stem("GATO"), "GAT");
        assert_eq!(dict.stem("SOLES"), "SOL");
        assert_eq!(dict.stem("PECES"), "PEZ");
        assert_eq!(dict.stem("GATITO"), "GAT");
        assert_eq!(dict.stem("GATITAS"), "GAT");
    }

    #[test]
    fn plain_stem_matches_dictionaryless_stemming() {
        assert_eq!(plain_stem("PERROS"), "PERR");
        assert_eq!(plain_stem("CAMION"), "CAMION");
    }

    #[test]
    fn empty_and_blank_groups_are_ignored() {
        let dict = EquivalenceDictionary::build(&ctx(&["", "   ", "|", "¡!|  "]));
        assert!(dict.is_empty());
    }
}
