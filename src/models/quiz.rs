//! Tests (quizzes)
//!
//! Stored in the `tests` table and exposed under `/tests`; named `Quiz` in
//! code to stay clear of the test harness vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Difficulty;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    pub answer_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl Question {
    /// The answer must point at one of at least two options
    pub fn is_well_formed(&self) -> bool {
        !self.prompt.trim().is_empty()
            && self.options.len() >= 2
            && self.answer_index < self.options.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty: Difficulty,
    pub questions: Vec<Question>,
    pub attempt_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuizInput {
    pub title: String,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateQuizInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub questions: Option<Vec<Question>>,
}

impl Quiz {
    pub fn from_input(input: CreateQuizInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            owner_id: input.owner_id,
            title: input.title.trim().to_string(),
            description: input.description,
            category: input.category.filter(|c| !c.trim().is_empty()),
            difficulty: input.difficulty,
            questions: input.questions,
            attempt_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: UpdateQuizInput) {
        if let Some(title) = input.title {
            self.title = title.trim().to_string();
        }
        super::merge_optional(&mut self.description, input.description);
        super::merge_optional(&mut self.category, input.category);
        if let Some(difficulty) = input.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(questions) = input.questions {
            self.questions = questions;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_well_formed() {
        let question = Question {
            prompt: "2 + 2?".to_string(),
            options: vec!["3".to_string(), "4".to_string()],
            answer_index: 1,
            explanation: None,
        };
        assert!(question.is_well_formed());

        let out_of_range = Question {
            answer_index: 2,
            ..question.clone()
        };
        assert!(!out_of_range.is_well_formed());

        let single_option = Question {
            options: vec!["4".to_string()],
            answer_index: 0,
            ..question
        };
        assert!(!single_option.is_well_formed());
    }
}
