use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use ringline_core::types::{
    CallReceipt, CallRequest, CallStatus, IssuedToken, MessageReceipt, SmsRequest, TokenRequest,
};
use ringline_core::{Config, GatewayError, ProviderGateway};

use crate::token::{self, Claims, API_TOKEN_LIFETIME_SECS};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Maximum call length in seconds.
const CALL_LENGTH_TIMER: u32 = 7200;
/// Seconds to wait for the callee to answer.
const CALL_RINGING_TIMER: u32 = 60;

/// [`ProviderGateway`] backed by the Vonage Messages and Voice APIs.
///
/// The private key is read on every call so that a rotated key file takes
/// effect without a restart.
#[derive(Clone)]
pub struct VonageGateway {
    config: Arc<Config>,
    client: Client,
}

#[derive(Deserialize)]
struct MessageAccepted {
    message_uuid: String,
}

#[derive(Deserialize)]
struct CallCreated {
    uuid: String,
}

#[derive(Deserialize)]
struct CallDetail {
    status: String,
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    rate: Option<Value>,
    #[serde(default)]
    duration: Option<Value>,
    #[serde(default)]
    start_time: Option<String>,
}

/// RFC 7807 problem body returned by Vonage on failure.
#[derive(Deserialize, Default)]
struct Problem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl VonageGateway {
    /// Create a gateway that talks to `config.api_base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: Arc<Config>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base_url.trim_end_matches('/'))
    }

    /// Detail URL for one call. The id is percent-encoded as a single path
    /// segment so it can never reach another endpoint.
    fn call_url(&self, call_id: &str) -> Result<Url, GatewayError> {
        // Dot segments are dropped by the URL builder and would address the
        // collection itself.
        if matches!(call_id, "." | "..") {
            return Err(GatewayError::NotFound(call_id.to_string()));
        }

        let mut url = Url::parse(&self.url("/v1/calls"))
            .map_err(|e| GatewayError::Transport(format!("invalid API base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| GatewayError::Transport("API base URL cannot have a path".to_string()))?
            .push(call_id);
        Ok(url)
    }

    /// Sign `claims` with the configured application key.
    async fn sign(&self, claims: &Claims) -> Result<String, GatewayError> {
        let credentials = self
            .config
            .credentials()
            .map_err(|e| GatewayError::Unauthorized(e.to_string()))?;
        let key = token::load_key(credentials.private_key_path).await?;
        token::sign(claims, &key)
    }

    /// Short-lived application token for authenticating our own requests.
    async fn bearer(&self) -> Result<String, GatewayError> {
        let application_id = self
            .config
            .credentials()
            .map_err(|e| GatewayError::Unauthorized(e.to_string()))?
            .application_id;
        let claims = Claims::new(application_id, Utc::now(), API_TOKEN_LIFETIME_SECS)?;
        self.sign(&claims).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let bearer = self.bearer().await?;
        let response = request
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("request failed: {e}")))?;

        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Transport(format!("unexpected response body: {e}")))
    }
}

async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let problem = response.json::<Problem>().await.unwrap_or_default();
    let message = describe(status, &problem);
    tracing::warn!(%status, "provider rejected request: {message}");

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Unauthorized(message),
        StatusCode::NOT_FOUND => GatewayError::NotFound(message),
        _ => GatewayError::Transport(message),
    })
}

/// Render a problem body as `title - detail (type)`, skipping absent parts.
fn describe(status: StatusCode, problem: &Problem) -> String {
    let mut message = match (&problem.title, &problem.detail) {
        (Some(title), Some(detail)) => format!("{title} - {detail}"),
        (Some(text), None) | (None, Some(text)) => text.clone(),
        (None, None) => format!("HTTP {status}"),
    };
    if let Some(kind) = &problem.kind {
        message.push_str(&format!(" ({kind})"));
    }
    message
}

/// Vonage reports money and durations as either strings or numbers.
fn scalar_to_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_duration(value: Option<Value>) -> Option<u64> {
    match value? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

#[async_trait]
impl ProviderGateway for VonageGateway {
    async fn send_message(&self, request: SmsRequest) -> Result<MessageReceipt, GatewayError> {
        tracing::debug!(to = %request.to, from = %request.from, "sending SMS");
        let body = serde_json::json!({
            "message_type": "text",
            "channel": "sms",
            "to": request.to.digits(),
            "from": request.from,
            "text": request.text,
        });

        let accepted: MessageAccepted = self
            .execute(self.client.post(self.url("/v1/messages")).json(&body))
            .await?;

        tracing::info!(message_id = %accepted.message_uuid, "SMS accepted");
        Ok(MessageReceipt {
            message_id: accepted.message_uuid,
        })
    }

    async fn place_call(&self, request: CallRequest) -> Result<CallReceipt, GatewayError> {
        tracing::debug!(to = %request.to, voice = %request.voice, "placing call");
        let body = serde_json::json!({
            "to": [{ "type": "phone", "number": request.to.digits() }],
            "from": { "type": "phone", "number": request.from.trim_start_matches('+') },
            "ncco": request.script,
            "machine_detection": "continue",
            "length_timer": CALL_LENGTH_TIMER,
            "ringing_timer": CALL_RINGING_TIMER,
        });

        let created: CallCreated = self
            .execute(self.client.post(self.url("/v1/calls")).json(&body))
            .await?;

        tracing::info!(call_id = %created.uuid, "call placed");
        Ok(CallReceipt {
            call_id: created.uuid,
        })
    }

    async fn call_status(&self, call_id: &str) -> Result<CallStatus, GatewayError> {
        let detail: CallDetail = self
            .execute(self.client.get(self.call_url(call_id)?))
            .await?;

        Ok(CallStatus {
            status: detail.status,
            price: scalar_to_string(detail.price),
            rate: scalar_to_string(detail.rate),
            duration_secs: parse_duration(detail.duration),
            start_time: detail.start_time,
        })
    }

    async fn issue_token(&self, request: TokenRequest) -> Result<IssuedToken, GatewayError> {
        let application_id = self
            .config
            .credentials()
            .map_err(|e| GatewayError::Unauthorized(e.to_string()))?
            .application_id;

        let claims = Claims::new(application_id, Utc::now(), request.expires_in_secs)?
            .with_subject(request.subject)
            .with_acl(&request.acl_paths);
        let expires_at = claims.expires_at()?;
        let token = self.sign(&claims).await?;

        tracing::info!(jti = %claims.jti, %expires_at, "issued client token");
        Ok(IssuedToken { token, expires_at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_description_includes_all_parts() {
        let problem = Problem {
            title: Some("Invalid params".to_string()),
            detail: Some("The value of `to` is invalid".to_string()),
            kind: Some("https://developer.vonage.com/api-errors#invalid-params".to_string()),
        };
        assert_eq!(
            describe(StatusCode::UNPROCESSABLE_ENTITY, &problem),
            "Invalid params - The value of `to` is invalid (https://developer.vonage.com/api-errors#invalid-params)"
        );
    }

    #[test]
    fn empty_problem_falls_back_to_status() {
        assert_eq!(
            describe(StatusCode::BAD_GATEWAY, &Problem::default()),
            "HTTP 502 Bad Gateway"
        );
    }

    #[test]
    fn scalars_accept_strings_and_numbers() {
        assert_eq!(
            scalar_to_string(Some(serde_json::json!("0.0628"))),
            Some("0.0628".to_string())
        );
        assert_eq!(
            scalar_to_string(Some(serde_json::json!(0.5))),
            Some("0.5".to_string())
        );
        assert_eq!(scalar_to_string(Some(serde_json::json!(""))), None);
        assert_eq!(scalar_to_string(None), None);

        assert_eq!(parse_duration(Some(serde_json::json!("27"))), Some(27));
        assert_eq!(parse_duration(Some(serde_json::json!(27))), Some(27));
        assert_eq!(parse_duration(Some(serde_json::json!("n/a"))), None);
    }

    #[test]
    fn url_joins_without_double_slash() {
        let config = Config {
            api_base_url: "http://localhost:9000/".to_string(),
            ..Config::default()
        };
        let gateway = VonageGateway::new(Arc::new(config)).unwrap();
        assert_eq!(gateway.url("/v1/calls"), "http://localhost:9000/v1/calls");
    }

    #[test]
    fn call_url_keeps_id_in_one_segment() {
        let config = Config {
            api_base_url: "http://localhost:9000/".to_string(),
            ..Config::default()
        };
        let gateway = VonageGateway::new(Arc::new(config)).unwrap();

        let url = gateway.call_url("63f61863-4a51-4f6b-86e1-46edebcf9356").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/v1/calls/63f61863-4a51-4f6b-86e1-46edebcf9356"
        );

        let url = gateway.call_url("../v2/applications?page_size=100#x").unwrap();
        assert_eq!(url.path_segments().unwrap().count(), 3);
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
        assert!(url.path().starts_with("/v1/calls/..%2Fv2%2Fapplications%3F"));

        assert!(matches!(gateway.call_url(".."), Err(GatewayError::NotFound(_))));
        assert!(matches!(gateway.call_url("."), Err(GatewayError::NotFound(_))));
    }
}
