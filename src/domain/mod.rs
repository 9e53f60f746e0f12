pub mod analytics;
pub mod mutations;
pub mod repository;
pub mod todo;
pub mod view;
