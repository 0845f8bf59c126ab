//! Recommendation-feed client and dashboard view model.
//!
//! Fetches ranked batches from the recommendation backend, derives the lists a
//! dashboard renders (search, hidden items, saved items, rows and board
//! columns), keeps liked/saved/hidden preferences on disk, and logs clicks with
//! dwell time against the impression that displayed them.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
