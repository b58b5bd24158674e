pub mod alignment;
pub mod cache;
pub mod chunking;
pub mod clips;
pub mod config;
pub mod context;
pub mod error;
pub mod filters;
pub mod highlights;
pub mod model;
pub mod pipeline;
pub mod retry;
pub mod transcript;
pub mod types;
