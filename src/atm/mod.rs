//! Client interface of the ATM cash-code service.
//!
//! The service locates ATMs and issues cash codes that are redeemed at an
//! ATM after the matching amount of coins has been sent. Implementations
//! provide the transport; this module defines the calls and wire models.

pub mod models;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

pub use models::{
    AtmListResponse, AtmMachine, CashCodeResponse, CashCodeStatusResponse,
    SendVerificationCodeResponse,
};

/// Errors returned by the cash-code service.
#[derive(Debug, thiserror::Error)]
pub enum AtmError {
    /// No session has been created yet.
    #[error("no session, call create_session first")]
    NoSession,

    #[error("session could not be created: {0}")]
    Session(String),

    /// The service rejected the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// A verification request needs a phone number or an email address.
    #[error("verification request needs a phone number or an email address")]
    MissingContact,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Network the service issues cash codes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BtcServer {
    MainNet,
    TestNet,
}

impl BtcServer {
    pub fn as_str(&self) -> &'static str {
        match self {
            BtcServer::MainNet => "main_net",
            BtcServer::TestNet => "test_net",
        }
    }
}

/// Key identifying a session with the service.
pub type SessionKey = String;

/// Who a verification code is sent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl VerificationRequest {
    /// Builds a request. Empty contact fields count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`AtmError::MissingContact`] when neither a phone number nor
    /// an email address is given.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone_number: Option<String>,
        email: Option<String>,
    ) -> Result<Self, AtmError> {
        let phone_number = phone_number.filter(|s| !s.trim().is_empty());
        let email = email.filter(|s| !s.trim().is_empty());
        if phone_number.is_none() && email.is_none() {
            return Err(AtmError::MissingContact);
        }
        Ok(Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone_number,
            email,
        })
    }
}

/// Calls offered by the cash-code service.
#[async_trait]
pub trait CashCodeApi: Send + Sync {
    /// Opens a session. Every other call needs one.
    async fn create_session(&self, server: BtcServer) -> Result<SessionKey, AtmError>;

    fn is_session_created(&self) -> bool;

    async fn atm_list(&self) -> Result<AtmListResponse, AtmError>;

    async fn atm_list_by_location(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<AtmListResponse, AtmError>;

    async fn check_cash_code_status(&self, code: &str)
    -> Result<CashCodeStatusResponse, AtmError>;

    /// Requests a cash code worth `amount` in fiat at the given ATM.
    async fn create_cash_code(
        &self,
        atm_id: &str,
        amount: Decimal,
        verification_code: &str,
    ) -> Result<CashCodeResponse, AtmError>;

    async fn send_verification_code(
        &self,
        request: &VerificationRequest,
    ) -> Result<SendVerificationCodeResponse, AtmError>;
}

/// Creates a session unless one already exists.
///
/// Returns the new session key, or `None` if a session was already open.
///
/// # Errors
///
/// Propagates the error of [`CashCodeApi::create_session`].
pub async fn ensure_session(
    api: &dyn CashCodeApi,
    server: BtcServer,
) -> Result<Option<SessionKey>, AtmError> {
    if api.is_session_created() {
        return Ok(None);
    }
    let key = api.create_session(server).await?;
    info!(server = server.as_str(), "cash code session created");
    Ok(Some(key))
}
