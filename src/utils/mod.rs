//! Shared helpers: git queries, tool lookup and terminal output

pub mod git;
pub mod terminal;
pub mod tools;
