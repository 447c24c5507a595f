//! Server-rendered admin pages
//!
//! Templates live in `templates/` and are embedded into the binary. Pages
//! are thin shells: the browser fetches data from the JSON API after load.

mod error;

pub use error::ViewError;

use rust_embed::RustEmbed;
use serde::Serialize;
use std::error::Error as StdError;
use tera::{Context as TeraContext, Tera};

use crate::api::system::APP_VERSION;
use crate::models::Admin;

pub type Result<T> = std::result::Result<T, ViewError>;

#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct EmbeddedTemplates;

/// A table page under `/admin/{slug}`
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Section {
    pub slug: &'static str,
    pub title: &'static str,
    /// JSON endpoint the page fetches on load
    pub endpoint: &'static str,
    /// Record fields shown as table columns
    pub columns: &'static [&'static str],
    /// Settings is a single document rather than a paged list
    pub singleton: bool,
}

const fn section(
    slug: &'static str,
    title: &'static str,
    endpoint: &'static str,
    columns: &'static [&'static str],
) -> Section {
    Section {
        slug,
        title,
        endpoint,
        columns,
        singleton: false,
    }
}

pub const SECTIONS: &[Section] = &[
    section(
        "users",
        "Users",
        "/api/admin/users",
        &["id", "name", "email", "plan", "status", "created_at"],
    ),
    section(
        "courses",
        "Courses",
        "/api/admin/courses",
        &["id", "title", "instructor", "category", "difficulty", "status"],
    ),
    section(
        "flashcards",
        "Flashcard sets",
        "/api/admin/flashcards",
        &["id", "title", "category", "is_public", "view_count"],
    ),
    section(
        "tests",
        "Tests",
        "/api/admin/tests",
        &["id", "title", "category", "difficulty", "attempt_count"],
    ),
    section(
        "blogs",
        "Blog posts",
        "/api/admin/blogs",
        &["id", "title", "author", "status", "view_count", "comment_count"],
    ),
    section(
        "contacts",
        "Contacts",
        "/api/admin/contacts",
        &["id", "name", "email", "subject", "status", "created_at"],
    ),
    section(
        "notifications",
        "Notifications",
        "/api/admin/notifications",
        &["id", "title", "kind", "audience", "is_read", "sent_at"],
    ),
    section(
        "billing",
        "Billing",
        "/api/admin/billing",
        &["id", "user_id", "amount_cents", "currency", "status", "created_at"],
    ),
    section(
        "admins",
        "Admins",
        "/api/admin/admins",
        &["id", "name", "email", "role", "is_verified", "is_approved"],
    ),
    Section {
        slug: "settings",
        title: "Settings",
        endpoint: "/api/admin/settings",
        columns: &[],
        singleton: true,
    },
];

/// Look up a table page by its URL segment.
pub fn find_section(slug: &str) -> Option<&'static Section> {
    SECTIONS.iter().find(|s| s.slug == slug)
}

/// Tera instance over the embedded templates
pub struct ViewEngine {
    tera: Tera,
}

impl ViewEngine {
    pub fn new() -> Result<Self> {
        let mut templates = Vec::new();
        for name in EmbeddedTemplates::iter() {
            let file = EmbeddedTemplates::get(&name)
                .ok_or_else(|| ViewError::NotFound(name.to_string()))?;
            let content = String::from_utf8(file.data.into_owned())?;
            templates.push((name.to_string(), content));
        }

        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html"]);
        tera.add_raw_templates(templates)
            .map_err(|e| ViewError::TemplateError(error_chain("Failed to load templates", &e)))?;

        tracing::debug!("Loaded {} view templates", tera.get_template_names().count());
        Ok(Self { tera })
    }

    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            ViewError::TemplateError(error_chain(&format!("Failed to render '{}'", template), &e))
        })
    }

    /// Sign-in form, or the new-password form when a reset token is given
    pub fn login_page(&self, next: Option<&str>, reset: Option<&str>) -> Result<String> {
        let mut context = base_context();
        context.insert("next", &safe_next(next));
        context.insert("reset", &safe_reset_token(reset));
        self.render("login.html", &context)
    }

    pub fn dashboard_page(&self, admin: &Admin) -> Result<String> {
        let mut context = base_context();
        context.insert("admin", admin);
        context.insert("active", "dashboard");
        self.render("dashboard.html", &context)
    }

    pub fn section_page(&self, section: &Section, admin: &Admin) -> Result<String> {
        let mut context = base_context();
        context.insert("admin", admin);
        context.insert("active", section.slug);
        context.insert("section", section);
        self.render("resource.html", &context)
    }
}

fn base_context() -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("version", APP_VERSION);
    context.insert("sections", SECTIONS);
    context
}

fn error_chain(prefix: &str, err: &tera::Error) -> String {
    let mut message = format!("{}: {}", prefix, err);
    let mut source = err.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

/// Post-login target. Only same-site absolute paths of plain URL characters
/// are honored; the value is embedded in a script block.
pub fn safe_next(next: Option<&str>) -> String {
    let plain = |c: char| c.is_ascii_alphanumeric() || "/-_.?=&%".contains(c);
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && path.chars().all(plain) => {
            path.to_string()
        }
        _ => "/admin".to_string(),
    }
}

/// Reset secrets are plain alphanumeric; anything else is dropped before it
/// reaches the script block.
pub fn safe_reset_token(token: Option<&str>) -> Option<String> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty() && t.len() <= 128 && t.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_string)
}
