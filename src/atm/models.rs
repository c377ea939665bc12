//! Wire models of the cash-code service.
//!
//! Field names follow the service's camelCase JSON. Amounts are decimal
//! strings on the wire.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response to an ATM list query.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AtmListResponse {
    pub result: String,
    #[serde(default)]
    pub error: Option<String>,
    pub data: AtmList,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AtmList {
    #[serde(default)]
    pub items: Vec<AtmMachine>,
}

/// An ATM that can redeem cash codes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AtmMachine {
    pub atm_id: String,
    #[serde(default)]
    pub address_desc: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Smallest withdrawal in fiat.
    pub min: Decimal,
    /// Largest withdrawal in fiat.
    pub max: Decimal,
    /// Whether the ATM can redeem codes right now.
    #[serde(default)]
    pub redemption: bool,
}

/// A newly created cash code.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CashCodeResponse {
    pub result: String,
    #[serde(default)]
    pub error: Option<String>,
    pub data: CashCodeItems<CashCode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct CashCodeItems<T> {
    #[serde(default)]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashCode {
    pub secure_code: String,
    /// Address the coins must be sent to.
    pub address: String,
    pub usd_amount: Decimal,
    pub btc_amount: Decimal,
    pub btc_whole_unit_price: Decimal,
    /// Expiry as reported by the service.
    pub expiration: String,
}

/// Status of an existing cash code.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CashCodeStatusResponse {
    pub result: String,
    #[serde(default)]
    pub error: Option<String>,
    pub data: CashCodeItems<CashCodeStatus>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashCodeStatus {
    /// Service status code, e.g. `"A"` awaiting funds or `"V"` verified.
    pub status: String,
    pub address: String,
    pub usd_amount: Decimal,
    pub btc_amount: Decimal,
    pub expiration: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SendVerificationCodeResponse {
    pub result: String,
    #[serde(default)]
    pub error: Option<String>,
}
