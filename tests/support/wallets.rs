use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};
use std::sync::Mutex;
use swap_orchestrator::wallet::{BitcoinNetwork, BitcoinWallet, EthereumWallet};

/// Bitcoin wallet that records every mutating call
#[derive(Default)]
pub struct FakeBitcoinWallet {
    pub calls: Mutex<Vec<String>>,
}

impl FakeBitcoinWallet {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BitcoinWallet for FakeBitcoinWallet {
    async fn get_address(&self) -> anyhow::Result<String> {
        Ok("bcrt1qredeem".to_string())
    }

    async fn get_balance(&self) -> anyhow::Result<u64> {
        Ok(0)
    }

    async fn send_to_address(
        &self,
        address: &str,
        sats: u64,
        network: BitcoinNetwork,
    ) -> anyhow::Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("send {} {} {}", address, sats, network));
        Ok("fundtxid".to_string())
    }

    async fn broadcast_transaction(
        &self,
        transaction_hex: &str,
        network: BitcoinNetwork,
    ) -> anyhow::Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("broadcast {} {}", transaction_hex, network));
        Ok("redeemtxid".to_string())
    }

    fn get_fee(&self) -> String {
        "150".to_string()
    }

    async fn mint(&self, _sats: u64) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Ethereum wallet on chain 1337 that records every mutating call
#[derive(Default)]
pub struct FakeEthereumWallet {
    pub calls: Mutex<Vec<String>>,
}

impl FakeEthereumWallet {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EthereumWallet for FakeEthereumWallet {
    fn get_account(&self) -> Address {
        Address::repeat_byte(0x22)
    }

    async fn deploy_contract(
        &self,
        _data: Bytes,
        amount: U256,
        _gas_limit: U256,
        chain_id: u32,
    ) -> anyhow::Result<H256> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("deploy {} {}", amount, chain_id));
        Ok(H256::repeat_byte(0x01))
    }

    async fn call_contract(
        &self,
        _data: Option<Bytes>,
        contract_address: Address,
        _gas_limit: U256,
        chain_id: u32,
    ) -> anyhow::Result<H256> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("call {:?} {}", contract_address, chain_id));
        Ok(H256::repeat_byte(0x02))
    }

    async fn assert_network(&self, chain_id: u32) -> anyhow::Result<()> {
        anyhow::ensure!(chain_id == 1337, "wallet is connected to chain 1337, not {}", chain_id);
        Ok(())
    }

    async fn get_erc20_balance(&self, _token_contract: Address) -> anyhow::Result<U256> {
        Ok(U256::zero())
    }

    async fn mint_erc20(&self, _quantity: U256, _token_contract: Address) -> anyhow::Result<()> {
        Ok(())
    }
}
