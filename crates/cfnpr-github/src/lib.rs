pub mod api;
pub mod comments;
pub mod error;
pub mod pr;

pub use api::GithubClient;
pub use error::{GithubError, Result};
