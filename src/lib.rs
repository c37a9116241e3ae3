pub mod config;
pub mod error;
pub mod pose;
pub mod tracker;

pub use error::{ReconstructError, Result};
