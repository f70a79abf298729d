use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Definition of an MCP tool exposed to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// The fixed set of callable tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    SendSms,
    MakeVoiceCall,
    BulkSmsFromCsv,
    GetCallStatus,
    GenerateJwt,
}

impl ToolName {
    pub const ALL: [ToolName; 5] = [
        ToolName::SendSms,
        ToolName::MakeVoiceCall,
        ToolName::BulkSmsFromCsv,
        ToolName::GetCallStatus,
        ToolName::GenerateJwt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SendSms => "send_sms",
            Self::MakeVoiceCall => "make_voice_call",
            Self::BulkSmsFromCsv => "bulk_sms_from_csv",
            Self::GetCallStatus => "get_call_status",
            Self::GenerateJwt => "generate_jwt",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry of all MCP tools.
pub struct ToolRegistry;

impl ToolRegistry {
    /// Return the list of tool definitions for the MCP `tools/list` method.
    #[must_use]
    pub fn definitions() -> Vec<ToolDefinition> {
        ToolName::ALL.into_iter().map(Self::definition).collect()
    }

    /// Look up a single definition by name.
    pub fn get(name: &str) -> Option<ToolDefinition> {
        ToolName::parse(name).map(Self::definition)
    }

    #[allow(clippy::too_many_lines)]
    fn definition(tool: ToolName) -> ToolDefinition {
        let (description, input_schema) = match tool {
            ToolName::SendSms => (
                "Send an SMS. Local numbers starting with 0 are converted to E.164 using the default country code.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "to": {
                            "type": "string",
                            "description": "Destination phone number"
                        },
                        "message": {
                            "type": "string",
                            "description": "Message text to send"
                        },
                        "from": {
                            "type": "string",
                            "description": "Alphanumeric sender name (defaults to VonageMCP)"
                        }
                    },
                    "required": ["to", "message"]
                }),
            ),
            ToolName::MakeVoiceCall => (
                "Call a number and read a message aloud. Local numbers starting with 0 are converted to E.164 using the default country code.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "to": {
                            "type": "string",
                            "description": "Destination phone number"
                        },
                        "message": {
                            "type": "string",
                            "description": "Message to read aloud"
                        },
                        "voice": {
                            "type": "string",
                            "description": "Voice: female (Mizuki, default) or male (Takumi)"
                        }
                    },
                    "required": ["to", "message"]
                }),
            ),
            ToolName::BulkSmsFromCsv => (
                "Send SMS in bulk from CSV content with a phone,from,message header. Invalid rows are skipped and reported with the results.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "csv_content": {
                            "type": "string",
                            "description": "CSV text including the phone,from,message header row"
                        }
                    },
                    "required": ["csv_content"]
                }),
            ),
            ToolName::GetCallStatus => (
                "Get the status, price and duration of a voice call.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "call_id": {
                            "type": "string",
                            "description": "Call UUID returned by make_voice_call"
                        }
                    },
                    "required": ["call_id"]
                }),
            ),
            ToolName::GenerateJwt => (
                "Generate a signed JWT for the Voice and Client SDKs.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "expires_in": {
                            "type": "integer",
                            "description": "Lifetime in seconds (defaults to 86400)"
                        },
                        "subject": {
                            "type": "string",
                            "description": "Token subject (defaults to VonageMCP)"
                        }
                    },
                    "required": []
                }),
            ),
        };

        ToolDefinition {
            name: tool.as_str().to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}
