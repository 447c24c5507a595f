//! Learnboard - admin dashboard backend for an ed-tech learning platform
//!
//! Entity CRUD, cookie-based admin auth and the analytics behind the
//! dashboard charts, served over axum with a SQLite store.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod views;
