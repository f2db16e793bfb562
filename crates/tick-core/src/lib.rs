pub mod cache;
pub mod config;
pub mod error;
pub mod git;
pub mod hosting;
pub mod io;
pub mod json_path;
pub mod paths;
pub mod rules;
pub mod session;
pub mod store;
pub mod task;
pub mod tracker;
pub mod types;

pub use error::{Result, TickError};
