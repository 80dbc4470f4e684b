use crate::{
    bet_form::BetKind,
    fees::{
        FeeQuote,
        FeeSnapshot,
    },
    session::{
        PayoutConstants,
        Sourced,
    },
    units::format_amount,
};
use alloy::{
    primitives::{
        Address,
        Bytes,
        TxHash,
        U256,
    },
    sol_types::{
        Revert,
        SolError,
    },
};
use lotto_abi::ILotto;
use std::future::Future;

pub use crate::events::{
    LogRecord,
    decode_log,
};

pub mod rpc;

/// The six custom errors the lottery contract reverts with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevertKind {
    Paused,
    InvalidInput,
    DuplicateNumber,
    BelowMinBet,
    InsufficientAllowance,
    InsufficientLiquidity,
}

impl RevertKind {
    pub fn message(self, min_stake: U256) -> String {
        match self {
            RevertKind::Paused => "Game is currently paused.".to_string(),
            RevertKind::InvalidInput => "Invalid input (check numbers & stakes).".to_string(),
            RevertKind::DuplicateNumber => "Duplicate numbers are not allowed.".to_string(),
            RevertKind::BelowMinBet => format!(
                "Each stake must be ≥ {} FROLL.",
                format_amount(min_stake, 18)
            ),
            RevertKind::InsufficientAllowance => {
                "Allowance is insufficient. Please approve enough FROLL and try again."
                    .to_string()
            }
            RevertKind::InsufficientLiquidity => {
                "Contract pool cannot cover worst-case payout. Try lowering your max stake."
                    .to_string()
            }
        }
    }
}

/// Maps a revert payload to one of the contract's custom errors by selector.
pub fn decode_error(data: &[u8]) -> Option<RevertKind> {
    let selector: [u8; 4] = data.get(..4)?.try_into().ok()?;
    let kinds = [
        (ILotto::PausedError::SELECTOR, RevertKind::Paused),
        (ILotto::InvalidInput::SELECTOR, RevertKind::InvalidInput),
        (ILotto::DuplicateNumber::SELECTOR, RevertKind::DuplicateNumber),
        (ILotto::BelowMinBet::SELECTOR, RevertKind::BelowMinBet),
        (
            ILotto::InsufficientAllowance::SELECTOR,
            RevertKind::InsufficientAllowance,
        ),
        (
            ILotto::InsufficientLiquidity::SELECTOR,
            RevertKind::InsufficientLiquidity,
        ),
    ];
    kinds
        .into_iter()
        .find(|(known, _)| *known == selector)
        .map(|(_, kind)| kind)
}

/// Name for a revert payload that is not one of the custom errors: the
/// `Error(string)` reason, or the raw selector.
pub fn revert_name(data: &[u8]) -> Option<String> {
    if let Ok(revert) = Revert::abi_decode(data) {
        return Some(revert.reason);
    }
    data.get(..4).map(|selector| format!("0x{}", hex::encode(selector)))
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("RPC unavailable: {0}")]
    RpcUnavailable(String),
    #[error("{message}")]
    Reverted {
        data: Option<Bytes>,
        message: String,
    },
    #[error("User rejected the request.")]
    UserRejected,
    #[error("{0}")]
    Rpc(String),
}

/// Fee and gas settings attached to a write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TxOverrides {
    pub fee: Option<FeeQuote>,
    pub gas_limit: Option<u64>,
}

/// A confirmed transaction and the logs it emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub logs: Vec<LogRecord>,
}

pub trait PendingTransaction {
    fn tx_hash(&self) -> TxHash;
}

/// Typed access to the FROLL token and the lottery contract. Every method is a
/// single contract or node call; retries are the caller's business.
pub trait LottoGateway {
    type Pending: PendingTransaction + Send;

    fn token_address(&self) -> Address;

    fn lotto_address(&self) -> Address;

    fn min_stake(&self) -> impl Future<Output = Result<U256, GatewayError>> + Send;

    /// FROLL held by the lottery contract.
    fn pool_balance(&self) -> impl Future<Output = Result<U256, GatewayError>> + Send;

    fn payout_constants(&self) -> impl Future<Output = Sourced<PayoutConstants>> + Send;

    fn token_balance(
        &self,
        owner: Address,
    ) -> impl Future<Output = Result<U256, GatewayError>> + Send;

    fn native_balance(
        &self,
        owner: Address,
    ) -> impl Future<Output = Result<U256, GatewayError>> + Send;

    fn allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> impl Future<Output = Result<U256, GatewayError>> + Send;

    fn approve(
        &self,
        spender: Address,
        amount: U256,
        fee: FeeQuote,
    ) -> impl Future<Output = Result<Self::Pending, GatewayError>> + Send;

    fn estimate_bet_gas(
        &self,
        kind: BetKind,
        numbers: &[u8],
        stakes: &[U256],
        fee: Option<FeeQuote>,
    ) -> impl Future<Output = Result<u64, GatewayError>> + Send;

    fn submit_bet(
        &self,
        kind: BetKind,
        numbers: &[u8],
        stakes: &[U256],
        overrides: TxOverrides,
    ) -> impl Future<Output = Result<Self::Pending, GatewayError>> + Send;

    fn fee_snapshot(&self) -> impl Future<Output = Result<FeeSnapshot, GatewayError>> + Send;

    /// Waits for the transaction to be mined. A failed receipt is a revert.
    fn confirm(
        &self,
        pending: Self::Pending,
    ) -> impl Future<Output = Result<Confirmation, GatewayError>> + Send;

    fn receipt_by_hash(
        &self,
        hash: TxHash,
    ) -> impl Future<Output = Result<Option<Confirmation>, GatewayError>> + Send;
}
