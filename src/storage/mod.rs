//! Durable storage of crawled item records

pub mod item_repository;

pub use item_repository::{ItemFilter, ItemRepository, ItemSummary, OrderColumn};
