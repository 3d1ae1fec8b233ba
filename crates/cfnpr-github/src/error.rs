use thiserror::Error;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("github api {status} for {url}: {body}")]
    Api {
        status: u16,
        url: String,
        body: String,
    },

    #[error("no pull request found: {0}")]
    NoPullRequest(String),

    #[error("the {0} event doesn't relate to a pull request")]
    UnrelatedEvent(String),

    #[error("missing environment variable {0}")]
    MissingEnv(String),

    #[error("unexpected response shape from {url}: {detail}")]
    Shape { url: String, detail: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, GithubError>;
