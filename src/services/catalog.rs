//! Learning content: courses, flashcard sets and tests

use std::sync::Arc;

use super::validation::{require, require_non_negative};
use super::{ServiceError, ServiceResult};
use crate::db::repositories::{CardSetRepository, CourseRepository, QuizRepository};
use crate::models::{
    Card, CardSet, Course, CreateCardSetInput, CreateCourseInput, CreateQuizInput, ListParams,
    PagedResult, Question, Quiz, UpdateCardSetInput, UpdateCourseInput, UpdateQuizInput,
};

pub struct CourseService {
    repo: Arc<dyn CourseRepository>,
}

impl CourseService {
    pub fn new(repo: Arc<dyn CourseRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, params: ListParams) -> ServiceResult<PagedResult<Course>> {
        Ok(self.repo.list(&params.normalized()).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Course> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Course"))
    }

    pub async fn create(&self, input: CreateCourseInput) -> ServiceResult<Course> {
        require("Title", &input.title)?;
        require_non_negative("Price", input.price_cents)?;

        let course = self.repo.create(&Course::from_input(input)).await?;
        tracing::info!(course_id = course.id, "Course created");
        Ok(course)
    }

    pub async fn update(&self, id: i64, input: UpdateCourseInput) -> ServiceResult<Course> {
        if let Some(title) = &input.title {
            require("Title", title)?;
        }
        if let Some(price) = input.price_cents {
            require_non_negative("Price", price)?;
        }
        if let Some(enrolled) = input.enrolled_count {
            require_non_negative("Enrolled count", enrolled)?;
        }

        let mut course = self.get(id).await?;
        course.apply(input);
        Ok(self.repo.update(&course).await?)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::NotFound("Course"));
        }
        tracing::info!(course_id = id, "Course deleted");
        Ok(())
    }
}

fn validate_cards(cards: &[Card]) -> ServiceResult<()> {
    if cards
        .iter()
        .any(|card| card.front.trim().is_empty() || card.back.trim().is_empty())
    {
        return Err(ServiceError::validation("Every card needs a front and a back"));
    }
    Ok(())
}

pub struct CardSetService {
    repo: Arc<dyn CardSetRepository>,
}

impl CardSetService {
    pub fn new(repo: Arc<dyn CardSetRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, params: ListParams) -> ServiceResult<PagedResult<CardSet>> {
        Ok(self.repo.list(&params.normalized()).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<CardSet> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Flashcard set"))
    }

    pub async fn create(&self, input: CreateCardSetInput) -> ServiceResult<CardSet> {
        require("Title", &input.title)?;
        validate_cards(&input.cards)?;

        let set = self.repo.create(&CardSet::from_input(input)).await?;
        tracing::info!(card_set_id = set.id, cards = set.cards.len(), "Flashcard set created");
        Ok(set)
    }

    pub async fn update(&self, id: i64, input: UpdateCardSetInput) -> ServiceResult<CardSet> {
        if let Some(title) = &input.title {
            require("Title", title)?;
        }
        if let Some(cards) = &input.cards {
            validate_cards(cards)?;
        }

        let mut set = self.get(id).await?;
        set.apply(input);
        Ok(self.repo.update(&set).await?)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::NotFound("Flashcard set"));
        }
        tracing::info!(card_set_id = id, "Flashcard set deleted");
        Ok(())
    }
}

fn validate_questions(questions: &[Question]) -> ServiceResult<()> {
    if let Some(index) = questions.iter().position(|q| !q.is_well_formed()) {
        return Err(ServiceError::Validation(format!(
            "Question {} needs a prompt, at least two options and a valid answer",
            index + 1
        )));
    }
    Ok(())
}

pub struct QuizService {
    repo: Arc<dyn QuizRepository>,
}

impl QuizService {
    pub fn new(repo: Arc<dyn QuizRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, params: ListParams) -> ServiceResult<PagedResult<Quiz>> {
        Ok(self.repo.list(&params.normalized()).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Quiz> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Test"))
    }

    pub async fn create(&self, input: CreateQuizInput) -> ServiceResult<Quiz> {
        require("Title", &input.title)?;
        validate_questions(&input.questions)?;

        let quiz = self.repo.create(&Quiz::from_input(input)).await?;
        tracing::info!(test_id = quiz.id, questions = quiz.questions.len(), "Test created");
        Ok(quiz)
    }

    pub async fn update(&self, id: i64, input: UpdateQuizInput) -> ServiceResult<Quiz> {
        if let Some(title) = &input.title {
            require("Title", title)?;
        }
        if let Some(questions) = &input.questions {
            validate_questions(questions)?;
        }

        let mut quiz = self.get(id).await?;
        quiz.apply(input);
        Ok(self.repo.update(&quiz).await?)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::NotFound("Test"));
        }
        tracing::info!(test_id = id, "Test deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxCardSetRepository, SqlxCourseRepository, SqlxQuizRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{CourseStatus, Difficulty};
    use serde_json::json;

    async fn pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    #[tokio::test]
    async fn test_course_lifecycle() {
        let service = CourseService::new(SqlxCourseRepository::boxed(pool().await));

        assert!(matches!(
            service
                .create(serde_json::from_value(json!({ "title": "" })).unwrap())
                .await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service
                .create(serde_json::from_value(json!({ "title": "Rust", "price_cents": -1 })).unwrap())
                .await,
            Err(ServiceError::Validation(_))
        ));

        let course = service
            .create(
                serde_json::from_value(json!({
                    "title": "Rust",
                    "category": "Programming",
                    "difficulty": "advanced"
                }))
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(course.difficulty, Difficulty::Advanced);
        assert_eq!(course.status, CourseStatus::Draft);

        let updated = service
            .update(
                course.id,
                UpdateCourseInput {
                    status: Some(CourseStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, CourseStatus::Published);
        assert_eq!(updated.category.as_deref(), Some("Programming"));

        service.delete(course.id).await.unwrap();
        assert!(matches!(service.get(course.id).await, Err(ServiceError::NotFound("Course"))));
    }

    #[tokio::test]
    async fn test_card_set_rejects_blank_cards() {
        let service = CardSetService::new(SqlxCardSetRepository::boxed(pool().await));

        let err = service
            .create(
                serde_json::from_value(json!({
                    "title": "Verbs",
                    "cards": [{ "front": "ser", "back": "" }]
                }))
                .unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let set = service
            .create(
                serde_json::from_value(json!({
                    "title": "Verbs",
                    "cards": [{ "front": "ser", "back": "to be" }]
                }))
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(set.cards.len(), 1);
    }

    #[tokio::test]
    async fn test_quiz_rejects_bad_answer_index() {
        let service = QuizService::new(SqlxQuizRepository::boxed(pool().await));

        let err = service
            .create(
                serde_json::from_value(json!({
                    "title": "Math",
                    "questions": [{ "prompt": "1+1", "options": ["2", "3"], "answer_index": 2 }]
                }))
                .unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("Question 1")));

        let quiz = service
            .create(
                serde_json::from_value(json!({
                    "title": "Math",
                    "questions": [{ "prompt": "1+1", "options": ["2", "3"], "answer_index": 0 }]
                }))
                .unwrap(),
            )
            .await
            .unwrap();
        assert!(matches!(service.delete(quiz.id + 1).await, Err(ServiceError::NotFound("Test"))));
    }
}
