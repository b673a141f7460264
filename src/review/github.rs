//! GitHub pull-request comments

use anyhow::Result;
use serde_json::json;
use std::env;
use std::fmt;

use super::ReviewSurface;
use crate::coverage::Evaluation;

const DEFAULT_API_URL: &str = "https://api.github.com";

/// Posts the rendered report as a comment on a pull request
#[derive(Clone)]
pub struct GithubCommentSurface {
    pub pull_request: u64,
    pub token: Option<String>,
    pub repository: Option<String>,
    pub api_url: String,
}

impl fmt::Debug for GithubCommentSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubCommentSurface")
            .field("pull_request", &self.pull_request)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("repository", &self.repository)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl GithubCommentSurface {
    pub fn new(pull_request: u64) -> Self {
        Self {
            pull_request,
            token: None,
            repository: None,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    fn token(&self) -> Result<String> {
        self.token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .ok_or_else(|| anyhow::anyhow!("GitHub token not found"))
    }

    fn repository(&self) -> Result<String> {
        self.repository
            .clone()
            .or_else(|| env::var("GITHUB_REPOSITORY").ok())
            .ok_or_else(|| anyhow::anyhow!("GITHUB_REPOSITORY not set"))
    }

    pub fn comment_url(&self, repository: &str) -> String {
        format!(
            "{}/repos/{}/issues/{}/comments",
            self.api_url.trim_end_matches('/'),
            repository,
            self.pull_request
        )
    }

    async fn post_comment(&self, body: &str) -> Result<()> {
        let token = self.token()?;
        let url = self.comment_url(&self.repository()?);

        let payload = json!({ "body": body });

        let client = reqwest::Client::new();
        let response = client
            .post(&url)
            .header("Authorization", format!("token {}", token))
            .header("User-Agent", "shroud")
            .header("Accept", "application/vnd.github.v3+json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("GitHub comment failed: {} - {}", status, text);
        }

        Ok(())
    }
}

impl ReviewSurface for GithubCommentSurface {
    fn publish(&mut self, evaluation: &Evaluation) -> Result<()> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.post_comment(&evaluation.rendered_text))?;
        log::info!("Posted coverage report to pull request #{}", self.pull_request);
        Ok(())
    }
}
