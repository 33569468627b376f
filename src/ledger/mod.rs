//! Ledger actions returned by the swap node
//!
//! Executing a Siren action against the node yields a ledger-specific
//! instruction serialized as `{ "type": <kind>, "payload": {...} }`. The set of
//! kinds is closed; anything else is reported as unsupported.

pub mod dispatch;

pub use dispatch::dispatch;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::wallet::BitcoinNetwork;

use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum LedgerAction {
    BitcoinSendAmountToAddress(SendAmountToAddress),
    BitcoinBroadcastSignedTransaction(BroadcastSignedTransaction),
    EthereumDeployContract(DeployContract),
    EthereumCallContract(CallContract),
    LndSendPayment(SendPayment),
    LndAddHoldInvoice(AddHoldInvoice),
    LndSettleInvoice(SettleInvoice),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendAmountToAddress {
    pub to: String,
    #[serde(with = "sats_as_string")]
    pub amount: u64,
    pub network: BitcoinNetwork,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastSignedTransaction {
    pub hex: String,
    pub network: BitcoinNetwork,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_median_block_time: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployContract {
    pub data: Bytes,
    #[serde(with = "wei_as_decimal_string")]
    pub amount: U256,
    pub gas_limit: U256,
    pub chain_id: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallContract {
    pub contract_address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    pub gas_limit: U256,
    pub chain_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_block_timestamp: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendPayment {
    pub to_public_key: String,
    #[serde(with = "sats_as_string")]
    pub amount: u64,
    pub secret_hash: String,
    pub final_cltv_delta: u32,
    pub chain: String,
    pub network: String,
    pub self_public_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddHoldInvoice {
    #[serde(with = "sats_as_string")]
    pub amount: u64,
    pub secret_hash: String,
    pub expiry: u32,
    pub cltv_expiry: u32,
    pub chain: String,
    pub network: String,
    pub self_public_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettleInvoice {
    pub secret: String,
    pub chain: String,
    pub network: String,
    pub self_public_key: String,
}

impl LedgerAction {
    /// Every `type` tag this crate knows how to execute
    pub const KINDS: [&'static str; 7] = [
        "bitcoin-send-amount-to-address",
        "bitcoin-broadcast-signed-transaction",
        "ethereum-deploy-contract",
        "ethereum-call-contract",
        "lnd-send-payment",
        "lnd-add-hold-invoice",
        "lnd-settle-invoice",
    ];

    /// The `type` tag of this action
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerAction::BitcoinSendAmountToAddress(_) => Self::KINDS[0],
            LedgerAction::BitcoinBroadcastSignedTransaction(_) => Self::KINDS[1],
            LedgerAction::EthereumDeployContract(_) => Self::KINDS[2],
            LedgerAction::EthereumCallContract(_) => Self::KINDS[3],
            LedgerAction::LndSendPayment(_) => Self::KINDS[4],
            LedgerAction::LndAddHoldInvoice(_) => Self::KINDS[5],
            LedgerAction::LndSettleInvoice(_) => Self::KINDS[6],
        }
    }

    /// Interpret the body returned by executing a Siren action.
    ///
    /// Bodies without a `type` tag, and the explicit `none` kind, carry no
    /// ledger instruction.
    pub fn from_response_body(body: &[u8]) -> OrchestratorResult<Option<Self>> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let value: serde_json::Value = serde_json::from_slice(body)?;
        let kind = match value.get("type").and_then(|t| t.as_str()) {
            Some(kind) => kind.to_string(),
            None => return Ok(None),
        };

        if kind == "none" {
            return Ok(None);
        }
        if !Self::KINDS.contains(&kind.as_str()) {
            return Err(OrchestratorError::UnsupportedActionKind(kind));
        }

        serde_json::from_value(value).map(Some).map_err(|e| {
            OrchestratorError::ProtocolViolation(format!("malformed {} payload: {}", kind, e))
        })
    }
}

/// Satoshi amounts travel as decimal strings
mod sats_as_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(sats: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&sats.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = String::deserialize(deserializer)?;
        value
            .parse()
            .map_err(|e| D::Error::custom(format!("invalid satoshi amount '{}': {}", value, e)))
    }
}

/// Ether amounts travel as wei in a decimal string
mod wei_as_decimal_string {
    use ethers::types::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(wei: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&wei.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let value = String::deserialize(deserializer)?;
        U256::from_dec_str(&value)
            .map_err(|e| D::Error::custom(format!("invalid wei amount '{}': {}", value, e)))
    }
}
