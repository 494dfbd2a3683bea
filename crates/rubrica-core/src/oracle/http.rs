//! Model-backed oracle reached over HTTP.
//!
//! The request is POSTed as JSON (`item_id`, `description`, `snippets`).
//! The service answers with
//! `{"verdict": "pass|fail|partial|unknown", "justification": "...", "suggested_fix": "..."}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Judgment, JudgmentOracle, JudgmentRequest, Verdict};
use crate::domain::OracleError;

/// HTTP oracle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpOracleConfig {
    /// Endpoint receiving judgment requests.
    pub endpoint: String,
    /// Bearer token, if the service requires one.
    pub token: Option<String>,
    /// Per-request timeout enforced by the HTTP client.
    pub request_timeout: Duration,
}

impl HttpOracleConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: std::env::var("RUBRICA_ORACLE_TOKEN").ok(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum WireVerdict {
    Pass,
    Fail,
    Partial,
    Unknown,
}

#[derive(Debug, Deserialize)]
struct WireAnswer {
    verdict: WireVerdict,
    #[serde(default)]
    justification: String,
    #[serde(default)]
    suggested_fix: Option<String>,
}

impl From<WireAnswer> for Judgment {
    fn from(answer: WireAnswer) -> Self {
        let verdict = match answer.verdict {
            WireVerdict::Pass => Verdict::Pass,
            WireVerdict::Fail => Verdict::Fail,
            WireVerdict::Partial => Verdict::Partial,
            WireVerdict::Unknown => {
                let reason = if answer.justification.is_empty() {
                    "model could not decide".to_string()
                } else {
                    answer.justification
                };
                return Judgment::undecided(reason);
            }
        };
        Judgment::Decided {
            verdict,
            justification: answer.justification,
            suggested_fix: answer.suggested_fix.filter(|f| !f.trim().is_empty()),
        }
    }
}

/// Oracle delegating to a model-backed judgment service.
pub struct HttpOracle {
    config: HttpOracleConfig,
    http_client: reqwest::Client,
}

impl HttpOracle {
    pub fn new(config: HttpOracleConfig) -> Result<Self, OracleError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("rubrica/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| OracleError::Transport(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

fn classify_reqwest_error(e: reqwest::Error, timeout: Duration) -> OracleError {
    if e.is_timeout() {
        OracleError::Timeout {
            elapsed_ms: timeout.as_millis() as u64,
        }
    } else if e.is_decode() {
        OracleError::Malformed(e.to_string())
    } else {
        OracleError::Transport(e.to_string())
    }
}

/// Map a non-success status to an oracle error.
///
/// Server errors, 408 and 429 are worth retrying; any other refusal is final.
fn status_error(status: reqwest::StatusCode) -> Option<OracleError> {
    if status.is_success() {
        return None;
    }
    let message = format!("server returned {status}");
    let transient = status.is_server_error()
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status == reqwest::StatusCode::TOO_MANY_REQUESTS;
    Some(if transient {
        OracleError::Transport(message)
    } else {
        OracleError::Rejected(message)
    })
}

#[async_trait]
impl JudgmentOracle for HttpOracle {
    async fn judge(&self, request: &JudgmentRequest) -> Result<Judgment, OracleError> {
        debug!(item_id = %request.item_id, endpoint = %self.config.endpoint, "http judgment");

        let mut builder = self.http_client.post(&self.config.endpoint).json(request);
        if let Some(token) = &self.config.token {
            builder = builder.bearer_auth(token);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, self.config.request_timeout))?;

        if let Some(err) = status_error(response.status()) {
            return Err(err);
        }

        let answer: WireAnswer = response
            .json()
            .await
            .map_err(|e| classify_reqwest_error(e, self.config.request_timeout))?;
        Ok(answer.into())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_answer_decided() {
        let answer: WireAnswer = serde_json::from_str(
            r#"{"verdict":"fail","justification":"no focus ring","suggested_fix":"add :focus-visible"}"#,
        )
        .unwrap();
        assert_eq!(
            Judgment::from(answer),
            Judgment::Decided {
                verdict: Verdict::Fail,
                justification: "no focus ring".to_string(),
                suggested_fix: Some("add :focus-visible".to_string()),
            }
        );
    }

    #[test]
    fn test_wire_answer_unknown_is_undecided() {
        let answer: WireAnswer = serde_json::from_str(r#"{"verdict":"unknown"}"#).unwrap();
        assert_eq!(
            Judgment::from(answer),
            Judgment::undecided("model could not decide")
        );
    }

    #[test]
    fn test_request_body_shape() {
        let req = JudgmentRequest {
            item_id: "x".to_string(),
            description: "d".to_string(),
            snippets: vec!["s".to_string()],
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["item_id"], "x");
        assert_eq!(v["snippets"][0], "s");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transient() {
        let mut config = HttpOracleConfig::new("http://127.0.0.1:9/judge");
        config.request_timeout = Duration::from_millis(500);
        let oracle = HttpOracle::new(config).unwrap();
        let req = JudgmentRequest {
            item_id: "x".to_string(),
            description: "d".to_string(),
            snippets: vec![],
        };
        let err = oracle.judge(&req).await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err:?}");
    }

    #[test]
    fn test_status_error_transient_codes() {
        use reqwest::StatusCode;

        assert!(status_error(StatusCode::OK).is_none());
        for code in [
            StatusCode::REQUEST_TIMEOUT,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::BAD_GATEWAY,
        ] {
            let err = status_error(code).unwrap();
            assert!(matches!(err, OracleError::Transport(_)), "{code}");
            assert!(err.is_transient());
        }
        for code in [StatusCode::BAD_REQUEST, StatusCode::UNAUTHORIZED, StatusCode::NOT_FOUND] {
            let err = status_error(code).unwrap();
            assert!(matches!(err, OracleError::Rejected(_)), "{code}");
            assert!(!err.is_transient());
        }
    }
}
