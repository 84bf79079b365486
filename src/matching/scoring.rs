use std::collections::HashMap;

use super::classifier::MatchClassifier;
use super::dictionary::EquivalenceDictionary;
use crate::types::{AnswerMatch, PlayerId, ScoredAnswer};

/// One player's outcome of the scoring pass
#[derive(Debug, Clone, PartialEq)]
pub struct RoundScore {
    pub answers: Vec<ScoredAnswer>,
    /// One point per own answer that matched at least one opponent,
    /// regardless of how many opponents matched it
    pub delta: u32,
}

/// Run the pairwise scoring pass over all active players' answers.
///
/// Brute force over every unordered player pair and every answer pair:
/// P and W are small bounded constants, so an indexed join would buy
/// nothing. Players are visited in sorted-id order so annotation order is
/// deterministic.
pub fn score_round(
    answers: &HashMap<PlayerId, Vec<String>>,
    dict: &EquivalenceDictionary,
) -> HashMap<PlayerId, RoundScore> {
    let classifier = MatchClassifier::new(dict);

    let mut ids: Vec<&PlayerId> = answers.keys().collect();
    ids.sort();

    let mut scored: HashMap<PlayerId, Vec<ScoredAnswer>> = answers
        .iter()
        .map(|(id, words)| {
            (
                id.clone(),
                words.iter().map(ScoredAnswer::unmatched).collect(),
            )
        })
        .collect();

    for (i, a_id) in ids.iter().enumerate() {
        for b_id in &ids[i + 1..] {
            for (a_idx, a_word) in answers[*a_id].iter().enumerate() {
                for (b_idx, b_word) in answers[*b_id].iter().enumerate() {
                    let Some(kind) = classifier.classify(a_word, b_word) else {
                        continue;
                    };
                    if let Some(entry) = scored.get_mut(*a_id).and_then(|l| l.get_mut(a_idx)) {
                        entry.matches.push(AnswerMatch {
                            player_id: (*b_id).clone(),
                            word: b_word.clone(),
                            kind,
                        });
                    }
                    if let Some(entry) = scored.get_mut(*b_id).and_then(|l| l.get_mut(b_idx)) {
                        entry.matches.push(AnswerMatch {
                            player_id: (*a_id).clone(),
                            word: a_word.clone(),
                            kind,
                        });
                    }
                }
            }
        }
    }

    scored
        .into_iter()
        .map(|(id, answers)| {
            let delta = answers.iter().filter(|a| !a.matches.is_empty()).count() as u32;
            (id, RoundScore { answers, delta })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MatchKind, RoundContext};

    fn dict(answers: &[&str]) -> EquivalenceDictionary {
        EquivalenceDictionary::build(&RoundContext {
            prompt_id: "prompt".into(),
            question: "test".into(),
            canonical_answers: answers.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn submissions(entries: &[(&str, &[&str])]) -> HashMap<PlayerId, Vec<String>> {
        entries
            .iter()
            .map(|(id, words)| {
                (
                    id.to_string(),
                    words.iter().map(|w| w.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn plural_pair_scores_both_sides() {
        let results = score_round(
            &submissions(&[("ana", &["GATO"]), ("beto", &["GATOS"])]),
            &dict(&["GATO"]),
        );

        assert_eq!(results["ana"].delta, 1);
        assert_eq!(results["beto"].delta, 1);
        assert_eq!(results["ana"].answers[0].matches[0].kind, MatchKind::Plural);
        assert_eq!(results["beto"].answers[0].matches[0].word, "GATO");
    }

    #[test]
    fn declared_synonyms_score_both_sides() {
        let results = score_round(
            &submissions(&[("ana", &["AUTO"]), ("beto", &["CARRO"])]),
            &dict(&["AUTO|CARRO"]),
        );

        assert_eq!(results["ana"].delta, 1);
        assert_eq!(results["beto"].delta, 1);
        assert_eq!(
            results["ana"].answers[0].matches[0].kind,
            MatchKind::Synonym
        );
    }

    #[test]
    fn unrelated_answers_score_zero() {
        let results = score_round(
            &submissions(&[("ana", &["SOL"]), ("beto", &["LUNA"])]),
            &dict(&["SOL", "LUNA"]),
        );

        assert_eq!(results["ana"].delta, 0);
        assert_eq!(results["beto"].delta, 0);
        assert!(results["ana"].answers[0].matches.is_empty());
    }

    #[test]
    fn one_point_per_answer_not_per_match() {
        // ana's single GATO matches both opponents but yields one point
        let results = score_round(
            &submissions(&[
                ("ana", &["GATO"]),
                ("beto", &["GATOS"]),
                ("carla", &["GATA"]),
            ]),
            &dict(&["GATO"]),
        );

        assert_eq!(results["ana"].delta, 1);
        assert_eq!(results["ana"].answers[0].matches.len(), 2);
    }

    #[test]
    fn delta_is_bounded_by_answer_count() {
        let results = score_round(
            &submissions(&[
                ("ana", &["GATO", "PERRO", "SOL"]),
                ("beto", &["GATOS", "PERROS", "GATA"]),
            ]),
            &dict(&["GATO", "PERRO", "SOL"]),
        );

        for score in results.values() {
            assert!(score.delta as usize <= score.answers.len());
        }
        assert_eq!(results["ana"].delta, 2);
    }

    #[test]
    fn annotation_order_is_deterministic() {
        let answers = submissions(&[
            ("ana", &["GATO"]),
            ("beto", &["GATO"]),
            ("carla", &["GATO"]),
        ]);
        let d = dict(&["GATO"]);

        let first = score_round(&answers, &d);
        for _ in 0..10 {
            assert_eq!(score_round(&answers, &d), first);
        }
        let opponents: Vec<_> = first["ana"].answers[0]
            .matches
            .iter()
            .map(|m| m.player_id.as_str())
            .collect();
        assert_eq!(opponents, ["beto", "carla"]);
    }

    #[test]
    fn empty_answer_lists_are_harmless() {
        let results = score_round(
            &submissions(&[("ana", &[]), ("beto", &["GATO"])]),
            &dict(&["GATO"]),
        );
        assert_eq!(results["ana"].delta, 0);
        assert_eq!(results["beto"].delta, 0);
    }
}
