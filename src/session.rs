use crate::{
    bet_form::SubmittedBet,
    gateway::LottoGateway,
    units::format_amount,
};
use alloy::primitives::{
    Address,
    U256,
};
use tracing::{
    info,
    warn,
};

pub const DEFAULT_DRAW_COUNT: u64 = 27;
pub const DEFAULT_MULTI_DRAW_MULTIPLIER: u64 = 4;
pub const DEFAULT_SINGLE_DRAW_MULTIPLIER: u64 = 70;
/// 0.001 FROLL.
pub const DEFAULT_MINIMUM_STAKE: u64 = 1_000_000_000_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayoutConstants {
    pub draw_count: U256,
    pub multi_draw_multiplier: U256,
    pub single_draw_multiplier: U256,
    pub minimum_stake: U256,
}

impl Default for PayoutConstants {
    fn default() -> Self {
        Self {
            draw_count: U256::from(DEFAULT_DRAW_COUNT),
            multi_draw_multiplier: U256::from(DEFAULT_MULTI_DRAW_MULTIPLIER),
            single_draw_multiplier: U256::from(DEFAULT_SINGLE_DRAW_MULTIPLIER),
            minimum_stake: U256::from(DEFAULT_MINIMUM_STAKE),
        }
    }
}

impl PayoutConstants {
    pub fn describe(&self) -> String {
        format!(
            "Lo: {} draws x{} | De: x{} | Min stake: {} FROLL",
            self.draw_count,
            self.multi_draw_multiplier,
            self.single_draw_multiplier,
            format_amount(self.minimum_stake, 18)
        )
    }
}

/// A best-effort read: either the live value or a default with the reason the
/// live read was not used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sourced<T> {
    Live(T),
    Default { value: T, reason: String },
}

impl<T> Sourced<T> {
    pub fn value(&self) -> &T {
        match self {
            Sourced::Live(value) => value,
            Sourced::Default { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Sourced::Live(value) => value,
            Sourced::Default { value, .. } => value,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Sourced::Live(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Sourced::Live(_) => None,
            Sourced::Default { reason, .. } => Some(reason),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalletSession {
    pub address: Address,
    pub chain_id: u64,
}

/// Per-connection state. A reconnect builds a fresh `Session`, which is the
/// only way cached constants are invalidated.
#[derive(Clone, Debug)]
pub struct Session {
    wallet: WalletSession,
    constants: Sourced<PayoutConstants>,
    last_bet: Option<SubmittedBet>,
}

impl Session {
    pub fn new(wallet: WalletSession) -> Self {
        Self {
            wallet,
            constants: Sourced::Default {
                value: PayoutConstants::default(),
                reason: "not yet read from the contract".to_string(),
            },
            last_bet: None,
        }
    }

    pub fn wallet(&self) -> &WalletSession {
        &self.wallet
    }

    pub fn constants(&self) -> &Sourced<PayoutConstants> {
        &self.constants
    }

    /// Replaces the cached constants wholesale with a fresh read. A read that
    /// fell back to defaults does not overwrite an earlier live value.
    pub async fn refresh_constants<G: LottoGateway>(&mut self, gateway: &G) {
        let fresh = gateway.payout_constants().await;
        match (&fresh, &self.constants) {
            (Sourced::Default { reason, .. }, Sourced::Live(_)) => {
                warn!(%reason, "keeping previously read payout constants");
            }
            (Sourced::Default { reason, .. }, _) => {
                warn!(%reason, "using default payout constants");
                self.constants = fresh;
            }
            (Sourced::Live(constants), _) => {
                info!(constants = %constants.describe(), "payout constants loaded");
                self.constants = fresh;
            }
        }
    }

    pub fn last_bet(&self) -> Option<&SubmittedBet> {
        self.last_bet.as_ref()
    }

    pub fn record_submission(&mut self, bet: SubmittedBet) {
        self.last_bet = Some(bet);
    }
}
