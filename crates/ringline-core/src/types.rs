use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::phone::PhoneNumber;

/// Supported text-to-speech voices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Voice {
    #[default]
    Female,
    Male,
}

impl Voice {
    /// Resolve a user-supplied voice name or alias.
    ///
    /// Matching is ASCII case-insensitive and ignores surrounding whitespace.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "female" | "woman" | "mizuki" | "女性" => Some(Self::Female),
            "male" | "man" | "takumi" | "男性" => Some(Self::Male),
            _ => None,
        }
    }

    /// Canonical provider voice identifier.
    pub fn id(self) -> &'static str {
        match self {
            Self::Female => "Mizuki",
            Self::Male => "Takumi",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
        }
    }
}

impl std::fmt::Display for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id(), self.label())
    }
}

/// The spoken script of an outbound call, in provider NCCO form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkAction {
    pub action: String,
    pub text: String,
    pub language: String,
    pub premium: bool,
    #[serde(rename = "voiceName")]
    pub voice_name: String,
}

impl TalkAction {
    pub const LANGUAGE: &'static str = "ja-JP";

    #[must_use]
    pub fn new(text: impl Into<String>, voice: Voice) -> Self {
        Self {
            action: "talk".to_string(),
            text: text.into(),
            language: Self::LANGUAGE.to_string(),
            premium: true,
            voice_name: voice.id().to_string(),
        }
    }
}

/// Parameters for sending one SMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsRequest {
    pub to: PhoneNumber,
    pub text: String,
    pub from: String,
}

/// Provider acknowledgement of an accepted SMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReceipt {
    pub message_id: String,
}

/// Parameters for placing one outbound voice call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub to: PhoneNumber,
    pub from: String,
    pub script: Vec<TalkAction>,
    pub voice: Voice,
}

/// Provider acknowledgement of a placed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReceipt {
    pub call_id: String,
}

/// Current state of a call as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStatus {
    pub status: String,
    pub price: Option<String>,
    pub rate: Option<String>,
    pub duration_secs: Option<u64>,
    pub start_time: Option<String>,
}

/// Parameters for minting a client token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub expires_in_secs: u64,
    pub subject: String,
    pub acl_paths: Vec<String>,
}

impl TokenRequest {
    pub const DEFAULT_EXPIRES_IN_SECS: u64 = 86_400;

    /// Paths granted to Voice and Client SDK sessions.
    pub const DEFAULT_ACL_PATHS: [&'static str; 10] = [
        "/*/users/**",
        "/*/conversations/**",
        "/*/sessions/**",
        "/*/devices/**",
        "/*/image/**",
        "/*/media/**",
        "/*/applications/**",
        "/*/push/**",
        "/*/knocking/**",
        "/*/legs/**",
    ];

    #[must_use]
    pub fn new(expires_in_secs: u64, subject: impl Into<String>) -> Self {
        Self {
            expires_in_secs,
            subject: subject.into(),
            acl_paths: Self::DEFAULT_ACL_PATHS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// A signed token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Rough spoken length of `message`, in seconds.
///
/// Assumes 300 characters per minute, clamped to 10..=300 seconds.
pub fn estimate_call_duration(message: &str) -> u64 {
    const CHARS_PER_MINUTE: u64 = 300;
    let chars = message.chars().count() as u64;
    (chars * 60).div_ceil(CHARS_PER_MINUTE).clamp(10, 300)
}
