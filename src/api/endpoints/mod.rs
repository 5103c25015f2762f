//! HTTP endpoint handlers, one module per resource.

pub mod auth;
pub mod content;
pub mod dashboard;
pub mod export;
pub mod files;
pub mod health;
pub mod patients;
pub mod records;
