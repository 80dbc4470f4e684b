use crate::network::{
    ChainParams,
    VICTION_CHAIN_ID,
    VICTION_EXPLORER_URL,
    VICTION_RPC_URL,
};
use alloy::primitives::{
    Address,
    address,
};
use chrono::Utc;
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use serde::{
    Deserialize,
    Serialize,
};
use sha2::{
    Digest,
    Sha256,
};
use std::{
    fs,
    path::Path,
};
use url::Url;

pub const FROLL_TOKEN: Address = address!("0xB4d562A8f811CE7F134a1982992Bd153902290BC");
pub const LOTTO_CONTRACT: Address = address!("0xC05707443554fc1BAFD371085159aB0c381cCF01");

fn default_chain_id() -> u64 {
    VICTION_CHAIN_ID
}

fn default_rpc_url() -> String {
    VICTION_RPC_URL.to_string()
}

fn default_explorer_url() -> String {
    VICTION_EXPLORER_URL.to_string()
}

fn default_token() -> Address {
    FROLL_TOKEN
}

fn default_lotto() -> Address {
    LOTTO_CONTRACT
}

/// On-disk deployment parameters. Every field falls back to the Viction
/// deployment, so `{}` is a valid record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,
    #[serde(default = "default_token")]
    pub token_address: Address,
    #[serde(default = "default_lotto")]
    pub lotto_address: Address,
    /// sha256 of the lottery's deployed code, hex.
    #[serde(default)]
    pub bytecode_hash: Option<String>,
    #[serde(default)]
    pub recorded_at: Option<String>,
}

impl Default for DeploymentRecord {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            rpc_url: default_rpc_url(),
            explorer_url: default_explorer_url(),
            token_address: default_token(),
            lotto_address: default_lotto(),
            bytecode_hash: None,
            recorded_at: None,
        }
    }
}

impl DeploymentRecord {
    pub fn is_compatible_with_hash(&self, hash: &str) -> bool {
        match &self.bytecode_hash {
            Some(pinned) => pinned.eq_ignore_ascii_case(hash),
            None => true,
        }
    }

    /// Pins `code` as the expected lottery bytecode.
    pub fn pinned(mut self, code: &[u8]) -> Self {
        self.bytecode_hash = Some(compute_bytecode_hash(code));
        self.recorded_at = Some(Utc::now().to_rfc3339());
        self
    }

    pub fn resolve(&self) -> Result<Deployment> {
        let rpc_url = Url::parse(&self.rpc_url)
            .wrap_err_with(|| format!("Invalid RPC url '{}'", self.rpc_url))?;
        let chain = ChainParams {
            chain_id: self.chain_id,
            rpc_url,
            explorer_url: self.explorer_url.clone(),
            ..ChainParams::viction()
        };
        Ok(Deployment {
            chain,
            token: self.token_address,
            lotto: self.lotto_address,
            bytecode_hash: self.bytecode_hash.clone(),
        })
    }
}

/// Resolved parameters the client runs against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deployment {
    pub chain: ChainParams,
    pub token: Address,
    pub lotto: Address,
    pub bytecode_hash: Option<String>,
}

impl Deployment {
    pub fn viction() -> Self {
        Self {
            chain: ChainParams::viction(),
            token: FROLL_TOKEN,
            lotto: LOTTO_CONTRACT,
            bytecode_hash: None,
        }
    }

    pub fn with_rpc_url(mut self, rpc_url: Url) -> Self {
        self.chain.rpc_url = rpc_url;
        self
    }
}

pub fn load_record(path: &Path) -> Result<DeploymentRecord> {
    let raw = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read deployment file {}", path.display()))?;
    serde_json::from_str(&raw)
        .wrap_err_with(|| format!("Failed to parse deployment file {}", path.display()))
}

pub fn write_record(path: &Path, record: &DeploymentRecord) -> Result<()> {
    let serialized =
        serde_json::to_string_pretty(record).wrap_err("Failed to serialize deployment record")?;
    fs::write(path, serialized)
        .wrap_err_with(|| format!("Failed to write deployment file {}", path.display()))
}

/// The built-in Viction deployment, or the record at `path` when given.
pub fn resolve(path: Option<&Path>) -> Result<Deployment> {
    match path {
        Some(path) => load_record(path)?.resolve(),
        None => Ok(Deployment::viction()),
    }
}

pub fn compute_bytecode_hash(code: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code);
    format!("{:x}", hasher.finalize())
}
