//! Data models
//!
//! Database entities, their enum-valued fields and the input types used to
//! create and partially update them.

/// Declare a string-backed enum stored as TEXT and exchanged as JSON strings.
///
/// Generates `as_str`, `ALL`, `Default`, `Display` and `FromStr`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
        default = $default:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == normalized)
                    .ok_or_else(|| anyhow::anyhow!("Invalid {}: {}", stringify!($name), s))
            }
        }
    };
}

mod admin;
mod billing;
mod card_set;
mod common;
mod contact;
mod course;
mod notification;
mod post;
mod quiz;
mod settings;
mod user;

pub use admin::{Admin, AdminRole, AdminToken, TokenPurpose, UpdateAdminInput};
pub use billing::{BillingStatus, BillingTransaction, CreateBillingInput, UpdateBillingInput};
pub use card_set::{Card, CardSet, CreateCardSetInput, UpdateCardSetInput};
pub use common::{merge_optional, ListParams, PagedResult};
pub use contact::{Contact, ContactStatus, CreateContactInput, UpdateContactInput};
pub use course::{Course, CourseStatus, CreateCourseInput, Difficulty, UpdateCourseInput};
pub use notification::{
    Audience, CreateNotificationInput, Notification, NotificationKind, UpdateNotificationInput,
};
pub use post::{
    Comment, CreateCommentInput, CreatePostInput, Interaction, InteractionKind, Post,
    PostCounters, PostStatus, UpdatePostInput,
};
pub use quiz::{CreateQuizInput, Question, Quiz, UpdateQuizInput};
pub use settings::PlatformSettings;
pub use user::{
    CreateUserInput, SubscriptionStatus, UpdateUserInput, User, UserPlan, UserStats, UserStatus,
};
