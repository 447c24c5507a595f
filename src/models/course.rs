use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    pub enum Difficulty {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
    default = Beginner;
}

string_enum! {
    pub enum CourseStatus {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
    }
    default = Draft;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty: Difficulty,
    pub status: CourseStatus,
    pub instructor: Option<String>,
    pub price_cents: i64,
    pub enrolled_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourseInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub status: CourseStatus,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub price_cents: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCourseInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub status: Option<CourseStatus>,
    pub instructor: Option<String>,
    pub price_cents: Option<i64>,
    pub enrolled_count: Option<i64>,
}

impl Course {
    pub fn from_input(input: CreateCourseInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            title: input.title.trim().to_string(),
            description: input.description,
            category: input.category.filter(|c| !c.trim().is_empty()),
            difficulty: input.difficulty,
            status: input.status,
            instructor: input.instructor,
            price_cents: input.price_cents,
            enrolled_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: UpdateCourseInput) {
        if let Some(title) = input.title {
            self.title = title.trim().to_string();
        }
        super::merge_optional(&mut self.description, input.description);
        super::merge_optional(&mut self.category, input.category);
        super::merge_optional(&mut self.instructor, input.instructor);
        if let Some(difficulty) = input.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        if let Some(price_cents) = input.price_cents {
            self.price_cents = price_cents;
        }
        if let Some(enrolled_count) = input.enrolled_count {
            self.enrolled_count = enrolled_count;
        }
        self.updated_at = Utc::now();
    }
}
