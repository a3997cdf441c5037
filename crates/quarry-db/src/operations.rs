//! Database CRUD operations.

pub mod chunks;
pub mod settings;
pub mod sources;
