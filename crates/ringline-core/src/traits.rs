use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{
    CallReceipt, CallRequest, CallStatus, IssuedToken, MessageReceipt, SmsRequest, TokenRequest,
};

/// The telephony provider: every remote side effect goes through here.
///
/// Implementations read credentials from the shared configuration; callers
/// check that the configuration is complete before invoking.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Send one SMS.
    async fn send_message(&self, request: SmsRequest) -> Result<MessageReceipt, GatewayError>;

    /// Place an outbound call that plays `request.script`.
    async fn place_call(&self, request: CallRequest) -> Result<CallReceipt, GatewayError>;

    /// Look up a call by id. Unknown ids yield [`GatewayError::NotFound`].
    async fn call_status(&self, call_id: &str) -> Result<CallStatus, GatewayError>;

    /// Mint a signed client token.
    async fn issue_token(&self, request: TokenRequest) -> Result<IssuedToken, GatewayError>;
}
