//! Custom Search JSON API client.

pub mod client;
pub mod types;

pub use client::{GoogleClient, SearchClient, SearchError};
pub use types::SearchItem;
