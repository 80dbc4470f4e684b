//! In-memory `LottoGateway` for flow tests. State sits behind an
//! `Arc<Mutex<_>>` so a test keeps a handle while the flow owns a clone.

use crate::{
    bet_form::BetKind,
    events::{
        Draws,
        LogRecord,
    },
    fees::{
        FeeQuote,
        FeeSnapshot,
        ONE_GWEI,
    },
    gateway::{
        Confirmation,
        GatewayError,
        LottoGateway,
        PendingTransaction,
        TxOverrides,
    },
    network::{
        ChainParams,
        ChainWallet,
        NetworkError,
    },
    session::{
        PayoutConstants,
        Sourced,
    },
};
use alloy::primitives::{
    Address,
    B256,
    TxHash,
    U256,
};
use lotto_abi::test_helpers::{
    LogParts,
    de_played_log,
    de_settled_log,
    lo_played_log,
    lo_settled_log,
};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
    },
};

pub const FAKE_TOKEN: Address = Address::repeat_byte(0xf0);
pub const FAKE_LOTTO: Address = Address::repeat_byte(0xc0);
pub const FAKE_PLAYER: Address = Address::repeat_byte(0xaa);
pub const DEFAULT_GAS_ESTIMATE: u64 = 150_000;

/// A write the fake accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SentTx {
    Approve {
        spender: Address,
        amount: U256,
        fee: FeeQuote,
    },
    Bet {
        kind: BetKind,
        numbers: Vec<u8>,
        stakes: Vec<U256>,
        overrides: TxOverrides,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FakePending {
    tx_hash: TxHash,
    sent: SentTx,
}

impl PendingTransaction for FakePending {
    fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }
}

struct FakeState {
    constants: Sourced<PayoutConstants>,
    min_stake: Result<U256, GatewayError>,
    pool: Result<U256, GatewayError>,
    token_balances: HashMap<Address, U256>,
    native_balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    fee_snapshot: Result<FeeSnapshot, GatewayError>,
    gas_with_fee: Result<u64, GatewayError>,
    gas_without_fee: Result<u64, GatewayError>,
    submit_error: Option<GatewayError>,
    approve_error: Option<GatewayError>,
    confirm_error: Option<GatewayError>,
    settlement: Option<(Draws, U256)>,
    emit_played: bool,
    receipts: HashMap<TxHash, Confirmation>,
    calls: Vec<&'static str>,
    sent: Vec<SentTx>,
    next_block: u64,
}

impl Default for FakeState {
    fn default() -> Self {
        let constants = PayoutConstants::default();
        Self {
            min_stake: Ok(constants.minimum_stake),
            constants: Sourced::Live(constants),
            pool: Ok(U256::ZERO),
            token_balances: HashMap::new(),
            native_balances: HashMap::new(),
            allowances: HashMap::new(),
            fee_snapshot: Ok(FeeSnapshot {
                max_fee_per_gas: Some(10 * ONE_GWEI),
                max_priority_fee_per_gas: Some(ONE_GWEI),
                gas_price: None,
            }),
            gas_with_fee: Ok(DEFAULT_GAS_ESTIMATE),
            gas_without_fee: Ok(DEFAULT_GAS_ESTIMATE),
            submit_error: None,
            approve_error: None,
            confirm_error: None,
            settlement: None,
            emit_played: true,
            receipts: HashMap::new(),
            calls: Vec::new(),
            sent: Vec::new(),
            next_block: 100,
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<FakeState>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn record(&self, call: &'static str) {
        self.state().calls.push(call);
    }

    pub fn set_constants(&self, constants: Sourced<PayoutConstants>) {
        self.state().constants = constants;
    }

    pub fn set_min_stake(&self, min_stake: Result<U256, GatewayError>) {
        self.state().min_stake = min_stake;
    }

    pub fn set_pool(&self, pool: Result<U256, GatewayError>) {
        self.state().pool = pool;
    }

    pub fn set_token_balance(&self, owner: Address, balance: U256) {
        self.state().token_balances.insert(owner, balance);
    }

    pub fn set_native_balance(&self, owner: Address, balance: U256) {
        self.state().native_balances.insert(owner, balance);
    }

    pub fn set_allowance(&self, owner: Address, spender: Address, amount: U256) {
        self.state().allowances.insert((owner, spender), amount);
    }

    pub fn set_fee_snapshot(&self, snapshot: Result<FeeSnapshot, GatewayError>) {
        self.state().fee_snapshot = snapshot;
    }

    /// Estimates returned when the caller passes a fee quote and when it does not.
    pub fn set_gas_estimates(
        &self,
        with_fee: Result<u64, GatewayError>,
        without_fee: Result<u64, GatewayError>,
    ) {
        let mut state = self.state();
        state.gas_with_fee = with_fee;
        state.gas_without_fee = without_fee;
    }

    pub fn fail_submit(&self, err: GatewayError) {
        self.state().submit_error = Some(err);
    }

    pub fn fail_approve(&self, err: GatewayError) {
        self.state().approve_error = Some(err);
    }

    pub fn fail_confirm(&self, err: GatewayError) {
        self.state().confirm_error = Some(err);
    }

    /// Confirmed bets will carry a settlement log with these draws and payout.
    pub fn settle_with(&self, draws: Draws, gross_payout: U256) {
        self.state().settlement = Some((draws, gross_payout));
    }

    pub fn omit_played_log(&self) {
        self.state().emit_played = false;
    }

    pub fn insert_receipt(&self, confirmation: Confirmation) {
        self.state()
            .receipts
            .insert(confirmation.tx_hash, confirmation);
    }

    /// Names of every gateway method called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.state().sent.clone()
    }

    pub fn approvals(&self) -> Vec<SentTx> {
        self.sent()
            .into_iter()
            .filter(|tx| matches!(tx, SentTx::Approve { .. }))
            .collect()
    }

    pub fn allowance_of(&self, owner: Address, spender: Address) -> U256 {
        self.state()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn pending(&self, sent: SentTx) -> FakePending {
        let mut state = self.state();
        state.sent.push(sent.clone());
        let nonce = state.sent.len() as u64;
        FakePending {
            tx_hash: B256::left_padding_from(&nonce.to_be_bytes()),
            sent,
        }
    }

    fn bet_logs(state: &FakeState, kind: BetKind, numbers: &[u8], stakes: &[U256]) -> Vec<LogRecord> {
        let total = stakes.iter().fold(U256::ZERO, |acc, s| acc + *s);
        let mut parts: Vec<LogParts> = Vec::new();
        if state.emit_played {
            parts.push(match kind {
                BetKind::MultiDraw => lo_played_log(FAKE_PLAYER, numbers, stakes),
                BetKind::SingleDraw => de_played_log(FAKE_PLAYER, numbers, stakes),
            });
        }
        if let Some((draws, gross)) = &state.settlement {
            let net = gross.saturating_sub(total);
            parts.push(match draws {
                Draws::Multi(draws) => lo_settled_log(FAKE_PLAYER, draws, *gross, net),
                Draws::Single(draw) => de_settled_log(FAKE_PLAYER, *draw, *gross, net),
            });
        }
        parts
            .into_iter()
            .map(|part| LogRecord {
                address: FAKE_LOTTO,
                topics: part.topics,
                data: part.data,
            })
            .collect()
    }
}

impl LottoGateway for FakeGateway {
    type Pending = FakePending;

    fn token_address(&self) -> Address {
        FAKE_TOKEN
    }

    fn lotto_address(&self) -> Address {
        FAKE_LOTTO
    }

    async fn min_stake(&self) -> Result<U256, GatewayError> {
        self.record("min_stake");
        self.state().min_stake.clone()
    }

    async fn pool_balance(&self) -> Result<U256, GatewayError> {
        self.record("pool_balance");
        self.state().pool.clone()
    }

    async fn payout_constants(&self) -> Sourced<PayoutConstants> {
        self.record("payout_constants");
        self.state().constants.clone()
    }

    async fn token_balance(&self, owner: Address) -> Result<U256, GatewayError> {
        self.record("token_balance");
        Ok(self
            .state()
            .token_balances
            .get(&owner)
            .copied()
            .unwrap_or_default())
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, GatewayError> {
        self.record("native_balance");
        Ok(self
            .state()
            .native_balances
            .get(&owner)
            .copied()
            .unwrap_or_default())
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, GatewayError> {
        self.record("allowance");
        Ok(self.allowance_of(owner, spender))
    }

    async fn approve(
        &self,
        spender: Address,
        amount: U256,
        fee: FeeQuote,
    ) -> Result<FakePending, GatewayError> {
        self.record("approve");
        if let Some(err) = self.state().approve_error.clone() {
            return Err(err);
        }
        Ok(self.pending(SentTx::Approve {
            spender,
            amount,
            fee,
        }))
    }

    async fn estimate_bet_gas(
        &self,
        _kind: BetKind,
        _numbers: &[u8],
        _stakes: &[U256],
        fee: Option<FeeQuote>,
    ) -> Result<u64, GatewayError> {
        self.record("estimate_bet_gas");
        let state = self.state();
        match fee {
            Some(_) => state.gas_with_fee.clone(),
            None => state.gas_without_fee.clone(),
        }
    }

    async fn submit_bet(
        &self,
        kind: BetKind,
        numbers: &[u8],
        stakes: &[U256],
        overrides: TxOverrides,
    ) -> Result<FakePending, GatewayError> {
        self.record("submit_bet");
        if let Some(err) = self.state().submit_error.clone() {
            return Err(err);
        }
        Ok(self.pending(SentTx::Bet {
            kind,
            numbers: numbers.to_vec(),
            stakes: stakes.to_vec(),
            overrides,
        }))
    }

    async fn fee_snapshot(&self) -> Result<FeeSnapshot, GatewayError> {
        self.record("fee_snapshot");
        self.state().fee_snapshot.clone()
    }

    async fn confirm(&self, pending: FakePending) -> Result<Confirmation, GatewayError> {
        self.record("confirm");
        let mut state = self.state();
        if let Some(err) = state.confirm_error.clone() {
            return Err(err);
        }
        let logs = match &pending.sent {
            SentTx::Approve {
                spender, amount, ..
            } => {
                state.allowances.insert((FAKE_PLAYER, *spender), *amount);
                Vec::new()
            }
            SentTx::Bet {
                kind,
                numbers,
                stakes,
                ..
            } => Self::bet_logs(&state, *kind, numbers, stakes),
        };
        let block_number = state.next_block;
        state.next_block += 1;
        let confirmation = Confirmation {
            tx_hash: pending.tx_hash,
            block_number: Some(block_number),
            logs,
        };
        state
            .receipts
            .insert(confirmation.tx_hash, confirmation.clone());
        Ok(confirmation)
    }

    async fn receipt_by_hash(&self, hash: TxHash) -> Result<Option<Confirmation>, GatewayError> {
        self.record("receipt_by_hash");
        Ok(self.state().receipts.get(&hash).cloned())
    }
}

/// A wallet that switches instantly to any chain it has been told about.
#[derive(Clone, Debug, Default)]
pub struct FakeChainWallet {
    chain_id: u64,
    known: Vec<u64>,
}

impl FakeChainWallet {
    pub fn on_chain(chain_id: u64) -> Self {
        Self {
            chain_id,
            known: vec![chain_id],
        }
    }
}

impl ChainWallet for FakeChainWallet {
    async fn chain_id(&mut self) -> Result<u64, NetworkError> {
        Ok(self.chain_id)
    }

    async fn switch_chain(&mut self, chain_id: u64) -> Result<(), NetworkError> {
        if !self.known.contains(&chain_id) {
            return Err(NetworkError::UnknownChain(chain_id));
        }
        self.chain_id = chain_id;
        Ok(())
    }

    async fn add_chain(&mut self, params: &ChainParams) -> Result<(), NetworkError> {
        self.known.push(params.chain_id);
        Ok(())
    }
}
