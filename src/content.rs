//! Content collaborator: the category/prompt corpus.
//!
//! The core never manages the corpus itself; it resolves categories and
//! draws prompts through [`ContentSource`]. The in-memory implementation
//! ships a small Spanish sample pack for the demo binary and tests.

use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;

use crate::error::{GameError, GameResult};
use crate::types::{CategoryId, PromptId};

/// A drawable prompt: the question players see plus the canonical answer
/// groups that seed the round's equivalence dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptCard {
    pub id: PromptId,
    pub question: String,
    pub canonical_answers: Vec<String>,
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Case-insensitive category lookup; `None` for unknown names.
    async fn resolve_category(&self, name: &str) -> GameResult<Option<CategoryId>>;

    /// Any available category, uniformly at random.
    async fn random_category(&self) -> GameResult<CategoryId>;

    /// Draw a prompt from a category; `None` when the category has no
    /// prompts.
    async fn draw_prompt(&self, category: &str) -> GameResult<Option<PromptCard>>;
}

/// In-memory corpus keyed by upper-cased category id
#[derive(Default)]
pub struct MemoryContent {
    categories: HashMap<CategoryId, Vec<PromptCard>>,
}

impl MemoryContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_prompt(
        &mut self,
        category: &str,
        question: &str,
        canonical_answers: &[&str],
    ) -> &mut Self {
        let card = PromptCard {
            id: ulid::Ulid::new().to_string(),
            question: question.to_string(),
            canonical_answers: canonical_answers.iter().map(|s| s.to_string()).collect(),
        };
        self.categories
            .entry(category.trim().to_uppercase())
            .or_default()
            .push(card);
        self
    }

    /// Small built-in pack so the server is playable out of the box.
    pub fn sample_pack() -> Self {
        let mut content = Self::new();
        content
            .add_prompt(
                "animales",
                "Un animal que vive en tu casa",
                &["GATO|MICHI", "PERRO|CAN", "PEZ|PESCADO", "LORO|COTORRA"],
            )
            .add_prompt(
                "animales",
                "Un animal de la granja",
                &["VACA", "GALLINA|GALLO", "CERDO|CHANCHO|PUERCO", "CABALLO"],
            )
            .add_prompt(
                "cosas",
                "Algo que usas para ir al trabajo",
                &["AUTO|CARRO|COCHE", "BICICLETA|BICI", "TREN", "AUTOBUS|BUS|COLECTIVO"],
            )
            .add_prompt(
                "cielo",
                "Algo que ves al mirar arriba de noche",
                &["LUNA", "ESTRELLA|ASTRO", "NUBE", "PENA."],
            );
        content
    }
}

#[async_trait]
impl ContentSource for MemoryContent {
    async fn resolve_category(&self, name: &str) -> GameResult<Option<CategoryId>> {
        let key = name.trim().to_uppercase();
        Ok(self.categories.contains_key(&key).then_some(key))
    }

    async fn random_category(&self) -> GameResult<CategoryId> {
        let mut ids: Vec<&CategoryId> = self.categories.keys().collect();
        if ids.is_empty() {
            return Err(GameError::NotFound("no categories available".to_string()));
        }
        ids.sort();
        let pick = rand::rng().random_range(0..ids.len());
        Ok(ids[pick].clone())
    }

    async fn draw_prompt(&self, category: &str) -> GameResult<Option<PromptCard>> {
        let Some(cards) = self.categories.get(category) else {
            return Ok(None);
        };
        if cards.is_empty() {
            return Ok(None);
        }
        let pick = rand::rng().random_range(0..cards.len());
        Ok(Some(cards[pick].clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_categories_case_insensitively() {
        let content = MemoryContent::sample_pack();
        assert_eq!(
            content.resolve_category("Animales").await.unwrap(),
            Some("ANIMALES".to_string())
        );
        assert_eq!(content.resolve_category("quesos").await.unwrap(), None);
    }

    #[tokio::test]
    async fn draws_from_known_category_only() {
        let content = MemoryContent::sample_pack();
        let card = content.draw_prompt("CIELO").await.unwrap().unwrap();
        assert!(!card.question.is_empty());
        assert!(!card.canonical_answers.is_empty());
        assert!(content.draw_prompt("QUESOS").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn random_category_comes_from_the_pack() {
        let content = MemoryContent::sample_pack();
        let id = content.random_category().await.unwrap();
        assert!(content.resolve_category(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_corpus_has_no_random_category() {
        let content = MemoryContent::new();
        assert!(matches!(
            content.random_category().await,
            Err(GameError::NotFound(_))
        ));
    }
}
