use crate::error::{GithubError, Result};
use serde_json::Value;
use tracing::debug;

const PAGE_SIZE: usize = 100;

// ---------------------------------------------------------------------------
// GithubClient
// ---------------------------------------------------------------------------

/// Thin wrapper over the GitHub REST and GraphQL APIs: bearer auth, JSON,
/// page-following GETs. Any non-2xx response is surfaced as an error; the
/// caller decides whether it is fatal.
pub struct GithubClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl GithubClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base(token, "https://api.github.com")
    }

    /// Point the client at a different API root. Used by tests.
    pub fn with_base(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            api_base: api_base.into(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "cfnpr")
            .header("Accept", "application/vnd.github+json")
    }

    /// GET every page of a list endpoint, in order, until a short page.
    pub async fn paged_get(&self, url: &str, extra: &[(&str, &str)]) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        for page in 1.. {
            let page_param = page.to_string();
            let mut params: Vec<(&str, &str)> = vec![
                ("per_page", "100"),
                ("page", page_param.as_str()),
            ];
            params.extend_from_slice(extra);

            let resp = self.headers(self.http.get(url).query(&params)).send().await?;
            let resp = check(resp, url).await?;
            let batch: Vec<Value> = resp.json().await?;
            debug!("GET {url} page {page}: {} items", batch.len());

            let len = batch.len();
            items.extend(batch);
            if len < PAGE_SIZE {
                break;
            }
        }
        Ok(items)
    }

    pub async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        let resp = self.headers(self.http.post(url).json(body)).send().await?;
        Ok(check(resp, url).await?.json().await?)
    }

    pub async fn patch(&self, url: &str, body: &Value) -> Result<Value> {
        let resp = self.headers(self.http.patch(url).json(body)).send().await?;
        Ok(check(resp, url).await?.json().await?)
    }

    /// Resolve the authenticated user's login. GraphQL `viewer` is preferred;
    /// tokens without GraphQL scope fall back to REST `/user`.
    pub async fn current_user(&self) -> Result<String> {
        let graphql_url = format!("{}/graphql", self.api_base);
        let query = serde_json::json!({ "query": "query { viewer { login } }" });

        if let Ok(resp) = self.post(&graphql_url, &query).await {
            if let Some(login) = resp
                .pointer("/data/viewer/login")
                .and_then(Value::as_str)
            {
                return Ok(login.to_string());
            }
            debug!("graphql viewer response carried no login, falling back to /user");
        }

        let user_url = format!("{}/user", self.api_base);
        let resp = self.headers(self.http.get(&user_url)).send().await?;
        let user: Value = check(resp, &user_url).await?.json().await?;
        user.get("login")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GithubError::Shape {
                url: user_url,
                detail: "no login field".to_string(),
            })
    }
}

async fn check(resp: reqwest::Response, url: &str) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(GithubError::Api {
        status,
        url: url.to_string(),
        body,
    })
}
