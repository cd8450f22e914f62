use std::time::Duration;

use api::{ModuleSpec, OutputSnapshot, RunRequest, RunResponse};

/// Thin client for the backend's console surface.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: normalize_base_url(base_url),
            request_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_modules(&self) -> Result<Vec<ModuleSpec>, reqwest::Error> {
        self.http
            .get(format!("{}/modules", self.base_url))
            .timeout(self.request_timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn submit_run(&self, request: &RunRequest) -> Result<RunResponse, reqwest::Error> {
        self.http
            .post(format!("{}/run", self.base_url))
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn fetch_output(&self, exec_id: &str) -> Result<OutputSnapshot, reqwest::Error> {
        self.http
            .get(format!("{}/output/{exec_id}", self.base_url))
            .timeout(self.request_timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
