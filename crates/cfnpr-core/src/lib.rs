pub mod client;
pub mod comment;
pub mod error;
pub mod orchestrator;
pub mod render;
pub mod stacks;
pub mod types;

pub use error::{CoreError, Result};
