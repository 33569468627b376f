//! Execution of ledger actions against the actor's wallets
//!
//! Each branch selects the wallet for its ledger, checks the wallet is on the
//! network the swap node expects, performs exactly one wallet call and wraps
//! any failure together with the parameters it was called with. Nothing here
//! is retried: a repeated ledger mutation could pay twice.

use super::{
    AddHoldInvoice, BroadcastSignedTransaction, CallContract, DeployContract, LedgerAction,
    SendAmountToAddress, SendPayment, SettleInvoice,
};
use crate::error::{OrchestratorResult, WalletError};
use crate::wallet::Wallets;

use serde_json::json;
use tracing::{debug, info};

/// Execute a ledger action and return the resulting transaction id, payment
/// hash, invoice or secret.
pub async fn dispatch(action: &LedgerAction, wallets: &Wallets) -> OrchestratorResult<String> {
    let kind = action.kind();
    debug!("Dispatching {} with {:?}", kind, wallets);

    let id = match action {
        LedgerAction::BitcoinSendAmountToAddress(SendAmountToAddress {
            to,
            amount,
            network,
        }) => {
            let wallet = wallets.bitcoin()?;
            wallet
                .send_to_address(to, *amount, *network)
                .await
                .map_err(|e| {
                    WalletError::new(
                        kind,
                        e,
                        json!({ "to": to, "sats": amount, "network": network }),
                    )
                })?
        }

        LedgerAction::BitcoinBroadcastSignedTransaction(BroadcastSignedTransaction {
            hex,
            network,
            ..
        }) => {
            let wallet = wallets.bitcoin()?;
            wallet
                .broadcast_transaction(hex, *network)
                .await
                .map_err(|e| WalletError::new(kind, e, json!({ "hex": hex, "network": network })))?
        }

        LedgerAction::EthereumDeployContract(DeployContract {
            data,
            amount,
            gas_limit,
            chain_id,
        }) => {
            let wallet = wallets.ethereum()?;
            let params = json!({
                "data": data,
                "value": amount.to_string(),
                "gas_limit": gas_limit,
                "chain_id": chain_id,
            });

            wallet
                .assert_network(*chain_id)
                .await
                .map_err(|e| WalletError::new(kind, e, params.clone()))?;

            let tx_hash = wallet
                .deploy_contract(data.clone(), *amount, *gas_limit, *chain_id)
                .await
                .map_err(|e| WalletError::new(kind, e, params))?;
            format!("{:?}", tx_hash)
        }

        LedgerAction::EthereumCallContract(CallContract {
            contract_address,
            data,
            gas_limit,
            chain_id,
            ..
        }) => {
            let wallet = wallets.ethereum()?;
            let params = json!({
                "data": data,
                "contract_address": contract_address,
                "gas_limit": gas_limit,
                "chain_id": chain_id,
            });

            wallet
                .assert_network(*chain_id)
                .await
                .map_err(|e| WalletError::new(kind, e, params.clone()))?;

            let tx_hash = wallet
                .call_contract(data.clone(), *contract_address, *gas_limit, *chain_id)
                .await
                .map_err(|e| WalletError::new(kind, e, params))?;
            format!("{:?}", tx_hash)
        }

        LedgerAction::LndSendPayment(payment) => {
            let SendPayment {
                to_public_key,
                amount,
                secret_hash,
                final_cltv_delta,
                chain,
                network,
                self_public_key,
            } = payment;
            let channel = wallets.lightning()?;
            let params = || serde_json::to_value(payment).unwrap_or_default();

            channel
                .assert_lnd_details(self_public_key, chain, network)
                .await
                .map_err(|e| WalletError::new(kind, e, params()))?;

            channel
                .send_payment(to_public_key, *amount, secret_hash, *final_cltv_delta)
                .await
                .map_err(|e| WalletError::new(kind, e, params()))?;
            secret_hash.clone()
        }

        LedgerAction::LndAddHoldInvoice(invoice) => {
            let AddHoldInvoice {
                amount,
                secret_hash,
                expiry,
                cltv_expiry,
                chain,
                network,
                self_public_key,
            } = invoice;
            let channel = wallets.lightning()?;
            let params = || serde_json::to_value(invoice).unwrap_or_default();

            channel
                .assert_lnd_details(self_public_key, chain, network)
                .await
                .map_err(|e| WalletError::new(kind, e, params()))?;

            channel
                .add_hold_invoice(*amount, secret_hash, *expiry, *cltv_expiry)
                .await
                .map_err(|e| WalletError::new(kind, e, params()))?
        }

        LedgerAction::LndSettleInvoice(settle) => {
            let SettleInvoice {
                secret,
                chain,
                network,
                self_public_key,
            } = settle;
            let channel = wallets.lightning()?;
            let params = || serde_json::to_value(settle).unwrap_or_default();

            channel
                .assert_lnd_details(self_public_key, chain, network)
                .await
                .map_err(|e| WalletError::new(kind, e, params()))?;

            channel
                .settle_invoice(secret)
                .await
                .map_err(|e| WalletError::new(kind, e, params()))?;
            secret.clone()
        }
    };

    info!("{} executed: {}", kind, id);
    Ok(id)
}
