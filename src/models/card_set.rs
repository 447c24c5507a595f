//! Flashcard sets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single flashcard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardSet {
    pub id: i64,
    /// Informal reference to the owning user; not enforced by the database
    pub owner_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public: bool,
    pub cards: Vec<Card>,
    pub view_count: i64,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCardSetInput {
    pub title: String,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCardSetInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
    pub cards: Option<Vec<Card>>,
}

impl CardSet {
    pub fn from_input(input: CreateCardSetInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            owner_id: input.owner_id,
            title: input.title.trim().to_string(),
            description: input.description,
            category: input.category.filter(|c| !c.trim().is_empty()),
            is_public: input.is_public,
            cards: input.cards,
            view_count: 0,
            like_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: UpdateCardSetInput) {
        if let Some(title) = input.title {
            self.title = title.trim().to_string();
        }
        super::merge_optional(&mut self.description, input.description);
        super::merge_optional(&mut self.category, input.category);
        if let Some(is_public) = input.is_public {
            self.is_public = is_public;
        }
        if let Some(cards) = input.cards {
            self.cards = cards;
        }
        self.updated_at = Utc::now();
    }
}
