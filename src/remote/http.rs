// src/remote/http.rs
//! Reqwest-backed [`QuoteService`] for the Hitokoto REST API. Response
//! interpretation is split into pure helpers so the envelope handling is
//! testable without a live endpoint.

use metrics::{counter, histogram};
use serde::Deserialize;
use tracing::error;

use crate::remote::types::{
    ClientError, QuoteService, RatingAnnotation, RemoteQuote, SessionToken,
};

pub const DEFAULT_BASE_URL: &str = "https://hitokoto.cn/api/restful/v1";
/// Public permalink prefix used as the `cite` reference of remote quotes.
pub const PERMALINK_BASE: &str = "https://hitokoto.cn/?uuid=";

/// Success body reporting that the sentence has no rating yet. Normalized
/// to the zero rating, not treated as a failure.
const SCORE_MISSING_STATUS: i64 = -1;
const SCORE_MISSING_MESSAGE: &str = "很抱歉，句子不存在或评分未创建";

pub struct HttpQuoteService {
    base: String,
    client: reqwest::Client,
}

impl Default for HttpQuoteService {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpQuoteService {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at a different endpoint root (staging, local relay).
    pub fn with_base_url(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginEnvelope {
    #[serde(default)]
    data: Vec<CredentialRecord>,
}

#[derive(Debug, Deserialize)]
struct CredentialRecord {
    token: String,
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(default)]
    data: Vec<QuoteRecord>,
}

#[derive(Debug, Deserialize)]
struct QuoteRecord {
    hitokoto: String,
    uuid: String,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    from_who: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScoreEnvelope {
    status: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// The first credential record's token is the only field the exchange uses.
fn token_from_login(body: &str) -> Result<SessionToken, ClientError> {
    let envelope: LoginEnvelope = serde_json::from_str(body)
        .map_err(|e| ClientError::Malformed(format!("login body: {e}")))?;
    let record = envelope
        .data
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::Malformed("login body carries no credential record".into()))?;
    Ok(SessionToken::new(record.token))
}

fn quote_from_body(id: &str, body: &str) -> Result<RemoteQuote, ClientError> {
    let envelope: QuoteEnvelope = serde_json::from_str(body)
        .map_err(|e| ClientError::Malformed(format!("quote body for {id:?}: {e}")))?;
    let record = envelope
        .data
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::Malformed(format!("quote body for {id:?} carries no record")))?;
    Ok(RemoteQuote {
        id: record.uuid,
        text: record.hitokoto,
        from: record.from.filter(|s| !s.is_empty()),
        attributed_to: record.from_who.filter(|s| !s.is_empty()),
    })
}

/// Interpret a successful score body. The `data` field arrives either as a
/// record array or as an object keyed `"0"`; both carry the rating under
/// `score`. Anything unusable is logged and dropped (rating omitted).
fn rating_from_score_body(id: &str, body: &str) -> Option<RatingAnnotation> {
    let envelope: ScoreEnvelope = match serde_json::from_str(body) {
        Ok(e) => e,
        Err(e) => {
            error!(id, error = %e, "undecodable score body");
            return None;
        }
    };

    let record = envelope.data.get(0).or_else(|| envelope.data.get("0"));
    if let Some(score) = record.and_then(|r| r.get("score")) {
        match serde_json::from_value::<RatingAnnotation>(score.clone()) {
            Ok(rating) => return Some(rating),
            Err(e) => {
                error!(id, error = %e, "unusable score record");
                return None;
            }
        }
    }

    if envelope.status == SCORE_MISSING_STATUS && envelope.message == SCORE_MISSING_MESSAGE {
        return Some(RatingAnnotation::zero());
    }

    error!(id, status = envelope.status, message = %envelope.message, "unexpected score response");
    None
}

#[async_trait::async_trait]
impl QuoteService for HttpQuoteService {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionToken, ClientError> {
        let resp = self
            .client
            .post(format!("{}/auth/login", self.base))
            .form(&[("email", email), ("password", password)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            counter!("embed_auth_failures_total").increment(1);
            return Err(ClientError::Auth {
                status: status.as_u16(),
            });
        }
        token_from_login(&resp.text().await?)
    }

    async fn fetch_quote(
        &self,
        id: &str,
        token: &SessionToken,
    ) -> Result<RemoteQuote, ClientError> {
        let t0 = std::time::Instant::now();
        let resp = self
            .client
            .get(format!("{}/hitokoto/{id}", self.base))
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(token.as_str())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            counter!("embed_fetch_errors_total").increment(1);
            return Err(ClientError::Fetch {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;
        histogram!("embed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        quote_from_body(id, &body)
    }

    async fn fetch_rating(
        &self,
        id: &str,
        token: &SessionToken,
    ) -> Result<Option<RatingAnnotation>, ClientError> {
        let resp = self
            .client
            .get(format!("{}/hitokoto/{id}/score", self.base))
            .header(reqwest::header::ACCEPT, "application/json")
            .bearer_auth(token.as_str())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            counter!("embed_fetch_errors_total").increment(1);
            return Err(ClientError::Fetch {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(rating_from_score_body(id, &resp.text().await?))
    }

    fn permalink(&self, id: &str) -> Option<String> {
        Some(format!("{PERMALINK_BASE}{id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_extracts_first_token_only() {
        let body = r#"{"status":200,"message":"","data":[
            {"id":1,"name":"n","email":"e","token":"tok-a"},
            {"id":2,"name":"m","email":"f","token":"tok-b"}
        ],"ts":0}"#;
        let token = token_from_login(body).unwrap();
        assert_eq!(token.as_str(), "tok-a");
    }

    #[test]
    fn login_without_records_is_malformed() {
        let err = token_from_login(r#"{"status":200,"data":[]}"#).unwrap_err();
        assert!(matches!(err, ClientError::Malformed(_)));
    }

    #[test]
    fn quote_body_maps_to_domain_shape() {
        let body = r#"{"status":200,"message":"","data":[{
            "hitokoto":"生きているだけで、丸儲け。",
            "uuid":"abc-123","type":"a","from":"明石家さんま","from_who":null,
            "creator":"c","creator_uid":1,"reviewer":1,"commit_from":"web",
            "created_at":"0","status":"ok"
        }],"ts":0}"#;
        let q = quote_from_body("abc-123", body).unwrap();
        assert_eq!(q.id, "abc-123");
        assert_eq!(q.from.as_deref(), Some("明石家さんま"));
        assert_eq!(q.attributed_to, None);
    }

    #[test]
    fn score_decodes_array_and_keyed_object_shapes() {
        let array = r#"{"status":200,"message":"","data":[
            {"id":1,"sentence_uuid":"u","score":{"total":9,"participants":2,"average":4.5},"logs":[]}
        ],"ts":0}"#;
        let keyed = r#"{"status":200,"message":"","data":{
            "0":{"id":1,"sentence_uuid":"u","score":{"total":9,"participants":2,"average":4.5},"logs":[]}
        },"ts":0}"#;
        let expect = RatingAnnotation {
            average: 4.5,
            total: 9,
            participants: 2,
        };
        assert_eq!(rating_from_score_body("u", array), Some(expect));
        assert_eq!(rating_from_score_body("u", keyed), Some(expect));
    }

    #[test]
    fn missing_score_sentinel_normalizes_to_zero() {
        let body = format!(
            r#"{{"status":{SCORE_MISSING_STATUS},"message":"{SCORE_MISSING_MESSAGE}","data":[],"ts":0}}"#
        );
        assert_eq!(
            rating_from_score_body("u", &body),
            Some(RatingAnnotation::zero())
        );
    }

    #[test]
    fn anomalous_score_body_omits_rating() {
        assert_eq!(
            rating_from_score_body("u", r#"{"status":500,"message":"boom","data":[]}"#),
            None
        );
        assert_eq!(rating_from_score_body("u", "not json"), None);
    }
}
