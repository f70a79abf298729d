use std::fmt::Write as _;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use ringline_core::types::{
    estimate_call_duration, CallRequest, SmsRequest, TalkAction, TokenRequest, Voice,
};
use ringline_core::validation::{validate_message, validate_sender};
use ringline_core::{
    summarize, BatchValidator, Config, GatewayError, Normalizer, ProviderGateway,
};

use crate::tools::ToolName;

const INVALID_PHONE_MESSAGE: &str = "invalid phone number format. Please enter a valid number.";

/// The result of one tool invocation, identical across transports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutcome {
    pub success: bool,
    pub text: String,
    /// Structured fields for programmatic clients.
    pub data: Value,
}

impl ToolOutcome {
    pub fn success(text: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            text: text.into(),
            data,
        }
    }

    pub fn failure(text: impl Into<String>, data: Value) -> Self {
        Self {
            success: false,
            text: text.into(),
            data,
        }
    }

    /// Render as an MCP `tools/call` result.
    ///
    /// Failures stay inside the result (`isError: true`) so that JSON-RPC
    /// errors only ever signal protocol problems.
    pub fn to_call_result(&self) -> Value {
        serde_json::json!({
            "content": [{
                "type": "text",
                "text": self.text,
            }],
            "isError": !self.success,
            "structuredContent": self.data,
        })
    }
}

/// Why a tool handler refused or failed a request.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: ToolName, reason: String },

    #[error("invalid phone number format. Please enter a valid number.")]
    InvalidPhone,

    #[error("invalid sender name '{0}' (3-11 alphanumeric characters, not all digits, must not start with a digit)")]
    InvalidSender(String),

    #[error("message is empty")]
    EmptyMessage,

    #[error("invalid voice '{0}'. Available: female (Mizuki), male (Takumi)")]
    InvalidVoice(String),

    #[error("{0}")]
    Csv(ringline_core::Error),

    #[error("no valid rows to send.\n\n{0}")]
    NothingToSend(String),

    #[error("Call ID is required.")]
    MissingCallId,

    #[error("Call ID ({0}) was not found.")]
    CallNotFound(String),

    #[error("configuration error: {0}")]
    Configuration(ringline_core::Error),

    #[error("{action} failed: {source}")]
    Gateway {
        action: &'static str,
        source: GatewayError,
    },
}

impl ToolError {
    /// Stable machine-readable code for the structured payload.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ToolNotFound(_) => "tool_not_found",
            Self::InvalidArguments { .. } => "invalid_arguments",
            Self::InvalidPhone => "invalid_phone",
            Self::InvalidSender(_) => "invalid_sender",
            Self::EmptyMessage => "empty_message",
            Self::InvalidVoice(_) => "invalid_voice",
            Self::Csv(_) => "invalid_csv",
            Self::NothingToSend(_) => "nothing_to_send",
            Self::MissingCallId => "missing_call_id",
            Self::CallNotFound(_) => "call_not_found",
            Self::Configuration(_) => "configuration",
            Self::Gateway { .. } => "gateway",
        }
    }
}

impl From<ToolError> for ToolOutcome {
    fn from(err: ToolError) -> Self {
        ToolOutcome::failure(
            format!("Error: {err}"),
            serde_json::json!({ "error": err.code() }),
        )
    }
}

impl From<ringline_core::Error> for ToolError {
    fn from(err: ringline_core::Error) -> Self {
        match err {
            ringline_core::Error::Csv(_) => Self::Csv(err),
            ringline_core::Error::Gateway(source) => Self::Gateway {
                action: "provider call",
                source,
            },
            ringline_core::Error::MissingConfig(_) => Self::Configuration(err),
        }
    }
}

#[derive(Deserialize)]
struct SendSmsArgs {
    to: String,
    message: String,
    #[serde(default)]
    from: Option<String>,
}

#[derive(Deserialize)]
struct VoiceCallArgs {
    to: String,
    message: String,
    #[serde(default)]
    voice: Option<String>,
}

#[derive(Deserialize)]
struct BulkSmsArgs {
    csv_content: String,
}

#[derive(Deserialize)]
struct CallStatusArgs {
    call_id: String,
}

#[derive(Deserialize)]
struct TokenArgs {
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    subject: Option<String>,
}

/// Outcome of one row of a bulk send.
#[derive(Debug, Clone, Serialize)]
struct RowSend {
    to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Routes tool calls to their handlers.
///
/// Every path returns a [`ToolOutcome`]; nothing a handler does escapes as a
/// transport-level fault.
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<Config>,
    gateway: Arc<dyn ProviderGateway>,
    normalizer: Normalizer,
    batch: BatchValidator,
}

impl Dispatcher {
    pub fn new(config: Arc<Config>, gateway: Arc<dyn ProviderGateway>) -> Self {
        let normalizer = Normalizer::from_config(&config);
        Self {
            batch: BatchValidator::new(normalizer.clone()),
            normalizer,
            config,
            gateway,
        }
    }

    /// Invoke the tool `name` with `arguments`.
    pub async fn call(&self, name: &str, arguments: Value) -> ToolOutcome {
        let Some(tool) = ToolName::parse(name) else {
            tracing::warn!(tool = name, "unknown tool requested");
            return ToolError::ToolNotFound(name.to_string()).into();
        };

        tracing::info!(tool = %tool, "invoking tool");
        let result = match tool {
            ToolName::SendSms => self.send_sms(arguments).await,
            ToolName::MakeVoiceCall => self.make_voice_call(arguments).await,
            ToolName::BulkSmsFromCsv => self.bulk_sms_from_csv(arguments).await,
            ToolName::GetCallStatus => self.get_call_status(arguments).await,
            ToolName::GenerateJwt => self.generate_jwt(arguments).await,
        };

        result.unwrap_or_else(|err| {
            tracing::warn!(tool = %tool, code = err.code(), "tool failed: {err}");
            err.into()
        })
    }

    async fn send_sms(&self, arguments: Value) -> Result<ToolOutcome, ToolError> {
        let args: SendSmsArgs = decode(ToolName::SendSms, arguments)?;
        let to = self
            .normalizer
            .parse(&args.to)
            .ok_or(ToolError::InvalidPhone)?;

        let check = validate_message(&args.message);
        if !check.valid {
            return Err(ToolError::EmptyMessage);
        }

        let from = match args.from.filter(|f| !f.trim().is_empty()) {
            Some(from) if !validate_sender(from.trim()) => {
                return Err(ToolError::InvalidSender(from));
            }
            Some(from) => from.trim().to_string(),
            None => self.config.default_sender.clone(),
        };

        self.config.credentials()?;

        let receipt = self
            .gateway
            .send_message(SmsRequest {
                to: to.clone(),
                text: args.message,
                from,
            })
            .await
            .map_err(|source| ToolError::Gateway {
                action: "SMS sending",
                source,
            })?;

        let mut text = format!(
            "SMS sent successfully!\nTo: {to}\nMessage ID: {}",
            receipt.message_id
        );
        if let Some(warning) = &check.warning {
            let _ = write!(text, "\nWarning: {warning}");
        }

        Ok(ToolOutcome::success(
            text,
            serde_json::json!({
                "to": to,
                "message_id": receipt.message_id,
                "warning": check.warning,
            }),
        ))
    }

    async fn make_voice_call(&self, arguments: Value) -> Result<ToolOutcome, ToolError> {
        let args: VoiceCallArgs = decode(ToolName::MakeVoiceCall, arguments)?;
        let to = self
            .normalizer
            .parse(&args.to)
            .ok_or(ToolError::InvalidPhone)?;

        let voice = match args.voice.as_deref().map(str::trim) {
            None | Some("") => Voice::default(),
            Some(name) => Voice::parse(name).ok_or_else(|| ToolError::InvalidVoice(name.to_string()))?,
        };

        if !validate_message(&args.message).valid {
            return Err(ToolError::EmptyMessage);
        }

        self.config.credentials()?;
        let from = self.config.voice_from()?.to_string();

        let estimated_secs = estimate_call_duration(&args.message);
        let receipt = self
            .gateway
            .place_call(CallRequest {
                to: to.clone(),
                from,
                script: vec![TalkAction::new(args.message.clone(), voice)],
                voice,
            })
            .await
            .map_err(|source| ToolError::Gateway {
                action: "Voice call",
                source,
            })?;

        Ok(ToolOutcome::success(
            format!(
                "Voice call started!\nTo: {to}\nCall ID: {}\nMessage: {}\nVoice: {voice}\nEstimated duration: {estimated_secs} seconds",
                receipt.call_id, args.message
            ),
            serde_json::json!({
                "to": to,
                "call_id": receipt.call_id,
                "voice": voice.id(),
                "estimated_duration_secs": estimated_secs,
            }),
        ))
    }

    async fn bulk_sms_from_csv(&self, arguments: Value) -> Result<ToolOutcome, ToolError> {
        let args: BulkSmsArgs = decode(ToolName::BulkSmsFromCsv, arguments)?;
        let batch = self.batch.parse_and_validate(&args.csv_content)?;
        let summary = summarize(&batch);

        if batch.valid_rows.is_empty() {
            return Err(ToolError::NothingToSend(summary));
        }

        self.config.credentials()?;

        let mut sends = Vec::with_capacity(batch.valid_rows.len());
        for row in &batch.valid_rows {
            let Some(to) = self.normalizer.parse(&row.phone) else {
                sends.push(RowSend {
                    to: row.phone.clone(),
                    message_id: None,
                    error: Some(INVALID_PHONE_MESSAGE.to_string()),
                });
                continue;
            };

            let request = SmsRequest {
                to: to.clone(),
                text: row.message.clone(),
                from: row.from.clone(),
            };
            let send = match self.gateway.send_message(request).await {
                Ok(receipt) => RowSend {
                    to: to.to_string(),
                    message_id: Some(receipt.message_id),
                    error: None,
                },
                Err(err) => {
                    tracing::warn!(to = %to, "bulk send failed: {err}");
                    RowSend {
                        to: to.to_string(),
                        message_id: None,
                        error: Some(err.to_string()),
                    }
                }
            };
            sends.push(send);
        }

        let failed = sends.iter().filter(|s| s.error.is_some()).count();
        let sent = sends.len() - failed;

        let mut text = format!("Bulk SMS sending complete!\n\n{summary}\nSend results:\n");
        let _ = writeln!(text, "- Sent: {sent}");
        let _ = writeln!(text, "- Failed: {failed}");
        if failed > 0 {
            text.push_str("\nFailed sends:\n");
            for send in &sends {
                if let Some(error) = &send.error {
                    let _ = writeln!(text, "- {}: {error}", send.to);
                }
            }
        }

        let data = serde_json::json!({
            "total_rows": batch.total_rows,
            "valid_rows": batch.valid_rows.len(),
            "invalid_rows": batch.invalid_rows,
            "sent": sent,
            "failed": failed,
            "results": sends,
        });

        Ok(if sent > 0 {
            ToolOutcome::success(text, data)
        } else {
            ToolOutcome::failure(text, data)
        })
    }

    async fn get_call_status(&self, arguments: Value) -> Result<ToolOutcome, ToolError> {
        let args: CallStatusArgs = decode(ToolName::GetCallStatus, arguments)?;
        let call_id = args.call_id.trim();
        if call_id.is_empty() {
            return Err(ToolError::MissingCallId);
        }

        self.config.credentials()?;

        let status = self
            .gateway
            .call_status(call_id)
            .await
            .map_err(|source| match source {
                GatewayError::NotFound(_) => ToolError::CallNotFound(call_id.to_string()),
                source => ToolError::Gateway {
                    action: "Call status lookup",
                    source,
                },
            })?;

        let or_dash = |value: Option<&str>| value.unwrap_or("-").to_string();
        let duration = status
            .duration_secs
            .map_or_else(|| "-".to_string(), |secs| format!("{secs} seconds"));

        Ok(ToolOutcome::success(
            format!(
                "Call status:\nCall ID: {call_id}\nStatus: {}\nPrice: {}\nRate: {}\nDuration: {duration}\nStart time: {}",
                status.status,
                or_dash(status.price.as_deref()),
                or_dash(status.rate.as_deref()),
                or_dash(status.start_time.as_deref()),
            ),
            serde_json::json!({
                "call_id": call_id,
                "status": status.status,
                "price": status.price,
                "rate": status.rate,
                "duration_secs": status.duration_secs,
                "start_time": status.start_time,
            }),
        ))
    }

    async fn generate_jwt(&self, arguments: Value) -> Result<ToolOutcome, ToolError> {
        let args: TokenArgs = decode(ToolName::GenerateJwt, arguments)?;
        let expires_in = args
            .expires_in
            .unwrap_or(TokenRequest::DEFAULT_EXPIRES_IN_SECS);
        if expires_in == 0 {
            return Err(ToolError::InvalidArguments {
                tool: ToolName::GenerateJwt,
                reason: "expires_in must be positive".to_string(),
            });
        }
        let subject = args
            .subject
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.config.default_sender.clone());

        self.config.credentials()?;

        let issued = self
            .gateway
            .issue_token(TokenRequest::new(expires_in, subject.clone()))
            .await
            .map_err(|source| ToolError::Gateway {
                action: "JWT generation",
                source,
            })?;

        let expires_at = issued.expires_at.to_rfc3339();
        Ok(ToolOutcome::success(
            format!(
                "JWT generated!\nSubject: {subject}\nExpires at: {expires_at}\nToken: {}",
                issued.token
            ),
            serde_json::json!({
                "token": issued.token,
                "expires_at": expires_at,
                "subject": subject,
            }),
        ))
    }
}

fn decode<T: DeserializeOwned>(tool: ToolName, arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool,
        reason: e.to_string(),
    })
}
