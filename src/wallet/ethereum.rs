//! Ethereum wallet capability

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};

/// Account-based Ethereum wallet able to deploy and call HTLC contracts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EthereumWallet: Send + Sync {
    fn get_account(&self) -> Address;

    /// Returns the deployment transaction hash
    async fn deploy_contract(
        &self,
        data: Bytes,
        amount: U256,
        gas_limit: U256,
        chain_id: u32,
    ) -> anyhow::Result<H256>;

    /// Returns the call transaction hash
    async fn call_contract(
        &self,
        data: Option<Bytes>,
        contract_address: Address,
        gas_limit: U256,
        chain_id: u32,
    ) -> anyhow::Result<H256>;

    /// Fails unless the connected node serves `chain_id`
    async fn assert_network(&self, chain_id: u32) -> anyhow::Result<()>;

    async fn get_erc20_balance(&self, token_contract: Address) -> anyhow::Result<U256>;

    async fn mint_erc20(&self, quantity: U256, token_contract: Address) -> anyhow::Result<()>;
}
