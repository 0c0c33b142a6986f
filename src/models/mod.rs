//! Core data model for the study-resource sharing service.
//!
//! A `Resource` describes one uploaded file and its descriptive fields.
//! It maps to a database row via `sqlx::FromRow` and serializes naturally
//! as JSON via `serde`.

pub mod resource;
