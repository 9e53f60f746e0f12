//! Please Do: a single-user task list with local persistence, filtered
//! views and completion analytics.

pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod infrastructure;
