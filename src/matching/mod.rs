//! The answer-equivalence engine.
//!
//! A round's canonical answer set is compiled into an [`EquivalenceDictionary`];
//! the [`MatchClassifier`] decides whether two free-text answers mean the same
//! thing and how, and the scoring pass turns pairwise matches into score
//! deltas. Everything here is pure and holds no session state.

mod classifier;
mod dictionary;
mod normalize;
mod scoring;

pub use classifier::MatchClassifier;
pub use dictionary::{plain_stem, EquivalenceDictionary};
pub use normalize::normalize;
pub use scoring::{score_round, RoundScore};
