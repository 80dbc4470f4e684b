use alloy::providers::{
    DynProvider,
    Provider,
    ProviderBuilder,
};
use std::{
    collections::HashMap,
    future::Future,
};
use tracing::{
    info,
    warn,
};
use url::Url;

pub const VICTION_CHAIN_ID: u64 = 88;
pub const VICTION_RPC_URL: &str = "https://rpc.viction.xyz";
pub const VICTION_EXPLORER_URL: &str = "https://www.vicscan.xyz";

/// Everything a wallet needs to register a network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainParams {
    pub chain_id: u64,
    pub name: String,
    pub currency_name: String,
    pub currency_symbol: String,
    pub currency_decimals: u8,
    pub rpc_url: Url,
    pub explorer_url: String,
}

impl ChainParams {
    pub fn viction() -> Self {
        Self {
            chain_id: VICTION_CHAIN_ID,
            name: "Viction".to_string(),
            currency_name: "VIC".to_string(),
            currency_symbol: "VIC".to_string(),
            currency_decimals: 18,
            rpc_url: Url::parse(VICTION_RPC_URL).unwrap_or_else(|_| unreachable!()),
            explorer_url: VICTION_EXPLORER_URL.to_string(),
        }
    }

    /// Chain id in the `0x`-prefixed form wallets exchange.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    pub fn tx_url(&self, tx_hash: impl std::fmt::Display) -> String {
        format!("{}/tx/{tx_hash}", self.explorer_url.trim_end_matches('/'))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("No wallet connected. Please connect your wallet first.")]
    NetworkUnavailable,
    #[error("Wallet does not know chain {0:#x}.")]
    UnknownChain(u64),
    #[error("Wrong network: expected chain {expected}, wallet is on {actual}.")]
    WrongChain { expected: u64, actual: u64 },
    #[error("User rejected the request.")]
    UserRejected,
    #[error("RPC unavailable: {0}")]
    RpcUnavailable(String),
    #[error("RPC error: {0}")]
    Rpc(String),
}

/// The network-management surface of a wallet.
pub trait ChainWallet {
    fn chain_id(&mut self) -> impl Future<Output = Result<u64, NetworkError>> + Send;

    /// Fails with `UnknownChain` when the wallet has no parameters for `chain_id`.
    fn switch_chain(
        &mut self,
        chain_id: u64,
    ) -> impl Future<Output = Result<(), NetworkError>> + Send;

    fn add_chain(
        &mut self,
        params: &ChainParams,
    ) -> impl Future<Output = Result<(), NetworkError>> + Send;
}

/// Makes sure `wallet` is on `params.chain_id`, registering the network first
/// when the wallet does not know it.
pub async fn ensure_network<W: ChainWallet>(
    wallet: Option<&mut W>,
    params: &ChainParams,
) -> Result<(), NetworkError> {
    let wallet = wallet.ok_or(NetworkError::NetworkUnavailable)?;
    let current = wallet.chain_id().await?;
    if current == params.chain_id {
        return Ok(());
    }

    info!(
        current,
        wanted = params.chain_id,
        "wallet is on another network, switching"
    );
    match wallet.switch_chain(params.chain_id).await {
        Ok(()) => {}
        Err(NetworkError::UnknownChain(_)) => {
            info!(network = %params.name, "registering network with wallet");
            wallet.add_chain(params).await?;
            wallet.switch_chain(params.chain_id).await?;
        }
        Err(err) => return Err(err),
    }

    let actual = wallet.chain_id().await?;
    if actual != params.chain_id {
        warn!(expected = params.chain_id, actual, "network switch did not take effect");
        return Err(NetworkError::WrongChain {
            expected: params.chain_id,
            actual,
        });
    }
    Ok(())
}

/// A wallet backed by JSON-RPC endpoints. Switching chains reconnects to the
/// RPC endpoint registered for that chain.
pub struct RpcWallet {
    rpc_url: Url,
    provider: DynProvider,
    networks: HashMap<u64, ChainParams>,
}

impl RpcWallet {
    pub fn connect(rpc_url: Url) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url.clone()).erased();
        Self {
            rpc_url,
            provider,
            networks: HashMap::new(),
        }
    }

    /// Endpoint of the network the wallet is currently on.
    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }
}

impl ChainWallet for RpcWallet {
    async fn chain_id(&mut self) -> Result<u64, NetworkError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|err| NetworkError::RpcUnavailable(err.to_string()))
    }

    async fn switch_chain(&mut self, chain_id: u64) -> Result<(), NetworkError> {
        let params = self
            .networks
            .get(&chain_id)
            .ok_or(NetworkError::UnknownChain(chain_id))?;
        let rpc_url = params.rpc_url.clone();
        info!(%rpc_url, chain_id, "reconnecting wallet");
        self.provider = ProviderBuilder::new().connect_http(rpc_url.clone()).erased();
        self.rpc_url = rpc_url;
        Ok(())
    }

    async fn add_chain(&mut self, params: &ChainParams) -> Result<(), NetworkError> {
        self.networks.insert(params.chain_id, params.clone());
        Ok(())
    }
}
