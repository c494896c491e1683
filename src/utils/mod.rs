//! Utility functions.
//!
//! Collection of text helpers shared by config loading and the resolver.

pub mod parser;

pub use parser::{id_from_value, parse_group_templates, sanitize_nickname, unescape_newlines};
