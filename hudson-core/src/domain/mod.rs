//! Core domain types
//!
//! The build record is the only entity: it is built once per extraction,
//! handed to the host and then dropped.

pub mod build;
