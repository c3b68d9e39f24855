//! Article verifier form state and the clients it submits through.

use std::future::Future;

use reqwest::Client;
use tracing::{error, warn};

use crate::analysis::{analyze_url, AnalysisResult};
use crate::api::models::{AnalyzeRequest, AnalyzeResponse};
use crate::error::ErrorResponse;
use crate::session::SessionSubscription;
use crate::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The endpoint answered with an `{ "error": ... }` body.
    #[error("{0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),
}

pub trait AnalysisClient {
    fn analyze(&self, url: &str) -> impl Future<Output = Result<AnalysisResult, ClientError>> + Send;
}

/// Calls a remote analysis endpoint over HTTP.
pub struct HttpAnalysisClient {
    http: Client,
    endpoint: String,
    session: Option<SessionSubscription>,
}

impl HttpAnalysisClient {
    pub fn new(http: Client, endpoint: impl Into<String>) -> Self {
        Self { http, endpoint: endpoint.into(), session: None }
    }

    /// Sends the subscribed session's access token with every request.
    pub fn with_session(mut self, session: SessionSubscription) -> Self {
        self.session = Some(session);
        self
    }
}

impl AnalysisClient for HttpAnalysisClient {
    fn analyze(&self, url: &str) -> impl Future<Output = Result<AnalysisResult, ClientError>> + Send {
        let mut request = self.http.post(&self.endpoint).json(&AnalyzeRequest {
            url: Some(url.to_string()),
        });
        if let Some(session) = self.session.as_ref().and_then(|s| s.latest()) {
            request = request.bearer_auth(session.access_token);
        }

        async move {
            let res = request
                .send()
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?;

            let status = res.status();
            let bytes = res
                .bytes()
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?;

            if status.is_success() {
                let body: AnalyzeResponse = serde_json::from_slice(&bytes)
                    .map_err(|e| ClientError::Transport(e.to_string()))?;
                return serde_json::from_value(serde_json::Value::Object(body.analysis))
                    .map_err(|e| ClientError::Transport(e.to_string()));
            }

            match serde_json::from_slice::<ErrorResponse>(&bytes) {
                Ok(body) => Err(ClientError::Rejected(body.error)),
                Err(_) => Err(ClientError::Transport(format!("endpoint returned {}", status))),
            }
        }
    }
}

/// Runs the analysis pipeline in-process, for the server-rendered form.
#[derive(Clone)]
pub struct LocalAnalysisClient {
    state: AppState,
}

impl LocalAnalysisClient {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl AnalysisClient for LocalAnalysisClient {
    fn analyze(&self, url: &str) -> impl Future<Output = Result<AnalysisResult, ClientError>> + Send {
        let state = self.state.clone();
        let url = url.to_string();
        async move {
            analyze_url(&state, &url)
                .await
                .map(|analysis| analysis.result)
                .map_err(|e| ClientError::Rejected(e.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub is_error: bool,
}

impl Notice {
    fn error(title: &str, description: impl Into<String>) -> Self {
        Self { title: title.to_string(), description: description.into(), is_error: true }
    }

    fn info(title: &str, description: &str) -> Self {
        Self { title: title.to_string(), description: description.to_string(), is_error: false }
    }
}

pub struct Verifier<C> {
    client: C,
    url: String,
    loading: bool,
    analysis: Option<AnalysisResult>,
    notice: Option<Notice>,
}

impl<C: AnalysisClient> Verifier<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            url: String::new(),
            loading: false,
            analysis: None,
            notice: None,
        }
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub async fn submit(&mut self) {
        if self.url.trim().is_empty() {
            self.notice = Some(Notice::error("Error", "Please enter a valid URL"));
            return;
        }

        self.loading = true;
        self.analysis = None;
        self.notice = None;

        match self.client.analyze(&self.url).await {
            Ok(analysis) => {
                self.analysis = Some(analysis);
                self.notice = Some(Notice::info("Analysis Complete", "Article has been analyzed successfully"));
            }
            Err(ClientError::Rejected(message)) => {
                warn!(url = %self.url, %message, "analysis rejected");
                self.notice = Some(Notice::error("Analysis Failed", message));
            }
            Err(ClientError::Transport(detail)) => {
                error!(url = %self.url, %detail, "Error analyzing article");
                self.notice = Some(Notice::error("Error", "Failed to analyze article. Please try again."));
            }
        }

        self.loading = false;
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> VerifierView {
        VerifierView {
            url: self.url.clone(),
            loading: self.loading,
            notice: self.notice.clone(),
            analysis: self.analysis.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerifierView {
    pub url: String,
    pub loading: bool,
    pub notice: Option<Notice>,
    pub analysis: Option<AnalysisResult>,
}
