//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Access log: timing, status, viewer
//! 2. Session: bearer token to `Viewer`
//! 3. Role gate: patient or professional route groups

pub mod audit;
pub mod auth;
