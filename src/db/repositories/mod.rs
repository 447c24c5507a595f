//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod admin;
pub mod analytics;
pub mod billing;
pub mod card_set;
pub mod comment;
pub mod contact;
pub mod course;
pub mod notification;
pub mod post;
pub(crate) mod query;
pub mod quiz;
pub mod settings;
pub mod user;

pub use admin::{
    AdminRepository, AdminTokenRepository, SqlxAdminRepository, SqlxAdminTokenRepository,
};
pub use analytics::{
    AnalyticsRepository, Dimension, EntityTotals, EventSource, SqlxAnalyticsRepository, TopPost,
};
pub use billing::{BillingRepository, SqlxBillingRepository, StatusTotal};
pub use card_set::{CardSetRepository, SqlxCardSetRepository};
pub use comment::{
    CommentRepository, InteractionRepository, SqlxCommentRepository, SqlxInteractionRepository,
};
pub use contact::{ContactRepository, SqlxContactRepository};
pub use course::{CourseRepository, SqlxCourseRepository};
pub use notification::{NotificationRepository, SqlxNotificationRepository};
pub use post::{CounterSnapshot, PostRepository, SqlxPostRepository};
pub use query::is_unique_violation;
pub use quiz::{QuizRepository, SqlxQuizRepository};
pub use settings::{SettingsRepository, SqlxSettingsRepository};
pub use user::{SqlxUserRepository, UserRepository};
