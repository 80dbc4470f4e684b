//! The bet submission state machine.

use crate::{
    allowance::{
        AllowanceOutcome,
        ensure_allowance,
    },
    bet_form::{
        BetForm,
        BetKind,
        BetSet,
        SubmittedBet,
        describe_entries,
    },
    error::ClientError,
    events::{
        DecodedEvent,
        SettledEvent,
        decode_log,
    },
    fees::{
        FeeQuote,
        compute_fast_fee,
    },
    gateway::{
        Confirmation,
        GatewayError,
        LottoGateway,
        PendingTransaction,
        TxOverrides,
    },
    preflight,
    session::PayoutConstants,
    units::format_amount,
};
use alloy::primitives::{
    Address,
    U256,
};
use tracing::{
    error,
    info,
    warn,
};

/// How the gas limit for the bet was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GasPlan {
    /// Estimated with the fast-fee quote attached.
    WithFeeQuote(u64),
    /// The fee-aware estimate failed; estimated without fee fields.
    WithoutFeeQuote(u64),
    /// Both estimates failed; the node picks the limit.
    Unbounded,
}

impl GasPlan {
    /// Estimate plus 20%.
    pub fn gas_limit(&self) -> Option<u64> {
        match self {
            GasPlan::WithFeeQuote(gas) | GasPlan::WithoutFeeQuote(gas) => {
                Some(gas.saturating_mul(12) / 10)
            }
            GasPlan::Unbounded => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BetOutcome {
    Win(SettledEvent),
    Lose(SettledEvent),
    /// Mined, but no settlement log of the submitted kind could be read.
    NoDecodableResult { block_number: Option<u64> },
}

impl BetOutcome {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            BetOutcome::Win(_) => Some("WIN"),
            BetOutcome::Lose(_) => Some("LOSE"),
            BetOutcome::NoDecodableResult { .. } => None,
        }
    }

    /// "Draws: 01, 02 | Payout: 0 FROLL", or the bare confirmation line.
    pub fn result_line(&self) -> String {
        match self {
            BetOutcome::Win(settled) | BetOutcome::Lose(settled) => {
                format!("{} | {}", settled.draws.describe(), settled.payout_line())
            }
            BetOutcome::NoDecodableResult {
                block_number: Some(block),
            } => format!("Confirmed in block {block}."),
            BetOutcome::NoDecodableResult { block_number: None } => {
                "Confirmed.".to_string()
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionReport {
    pub bet: SubmittedBet,
    pub block_number: Option<u64>,
    pub outcome: BetOutcome,
}

impl SubmissionReport {
    pub fn bets_line(&self) -> String {
        describe_entries(&self.bet.entries)
    }

    pub fn total_line(&self) -> String {
        format!("{} FROLL", format_amount(self.bet.total_stake, 6))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionStage {
    Idle,
    Validated { total_stake: U256 },
    PreflightPassed { pool: U256, worst_case: U256 },
    AllowanceReady(AllowanceOutcome),
    /// Sent; `bet` is what "repeat" replays even if confirmation fails.
    Submitted { bet: SubmittedBet, gas_plan: GasPlan },
    Confirmed(SubmissionReport),
    Failed(ClientError),
}

impl SubmissionStage {
    /// Status line for the stage, as shown while a bet is in flight.
    pub fn describe(&self) -> String {
        match self {
            SubmissionStage::Idle => "Ready.".to_string(),
            SubmissionStage::Validated { total_stake } => {
                format!("Total stake {} FROLL. Checking pool...", format_amount(*total_stake, 6))
            }
            SubmissionStage::PreflightPassed { .. } => "Checking allowance...".to_string(),
            SubmissionStage::AllowanceReady(_) => "Sending bet transaction...".to_string(),
            SubmissionStage::Submitted { .. } => "Waiting for confirmation...".to_string(),
            SubmissionStage::Confirmed(report) => report.outcome.result_line(),
            SubmissionStage::Failed(err) => err.user_message(),
        }
    }
}

/// Validates `form`, checks pool liquidity, tops up the allowance, sends the
/// bet at the fast fee and waits for its receipt. Every stage is reported to
/// `observer`; a failure is reported as `Failed` and returned.
pub async fn submit_bet<G, F>(
    gateway: &G,
    owner: Address,
    form: &BetForm,
    kind: BetKind,
    constants: &PayoutConstants,
    mut observer: F,
) -> Result<SubmissionReport, ClientError>
where
    G: LottoGateway,
    F: FnMut(&SubmissionStage),
{
    observer(&SubmissionStage::Idle);
    match run(gateway, owner, form, kind, constants, &mut observer).await {
        Ok(report) => {
            observer(&SubmissionStage::Confirmed(report.clone()));
            Ok(report)
        }
        Err(err) => {
            error!(%err, "bet failed");
            observer(&SubmissionStage::Failed(err.clone()));
            Err(err)
        }
    }
}

async fn run<G, F>(
    gateway: &G,
    owner: Address,
    form: &BetForm,
    kind: BetKind,
    constants: &PayoutConstants,
    observer: &mut F,
) -> Result<SubmissionReport, ClientError>
where
    G: LottoGateway,
    F: FnMut(&SubmissionStage),
{
    let min_stake = constants.minimum_stake;
    let lift = |err: GatewayError| ClientError::from_gateway(err, min_stake);

    let bet = form.collect(min_stake, kind)?;
    let total_stake = bet.total_stake();
    observer(&SubmissionStage::Validated { total_stake });

    let pool = gateway.pool_balance().await.map_err(lift)?;
    let worst_case = preflight::check(&bet, pool, constants)?;
    observer(&SubmissionStage::PreflightPassed { pool, worst_case });

    let allowance = ensure_allowance(gateway, owner, gateway.lotto_address(), total_stake)
        .await
        .map_err(lift)?;
    observer(&SubmissionStage::AllowanceReady(allowance));

    let fee = compute_fast_fee(&gateway.fee_snapshot().await.map_err(lift)?);
    let gas_plan = plan_gas(gateway, &bet, fee).await;
    let overrides = TxOverrides {
        fee: Some(fee),
        gas_limit: gas_plan.gas_limit(),
    };
    info!(
        method = kind.method_name(),
        entries = bet.entries.len(),
        %total_stake,
        fee = %fee.describe(),
        ?gas_plan,
        "Sending bet transaction..."
    );
    let pending = gateway
        .submit_bet(kind, &bet.numbers(), &bet.stakes(), overrides)
        .await
        .map_err(lift)?;
    let tx_hash = pending.tx_hash();
    let submitted = SubmittedBet::new(&bet, tx_hash);
    observer(&SubmissionStage::Submitted {
        bet: submitted.clone(),
        gas_plan,
    });

    let confirmation = gateway.confirm(pending).await.map_err(lift)?;
    let outcome = outcome_from(&confirmation, gateway.lotto_address(), kind);
    info!(%tx_hash, block = ?confirmation.block_number, outcome = ?outcome.label(), "bet confirmed");

    Ok(SubmissionReport {
        bet: submitted,
        block_number: confirmation.block_number,
        outcome,
    })
}

async fn plan_gas<G: LottoGateway>(gateway: &G, bet: &BetSet, fee: FeeQuote) -> GasPlan {
    let numbers = bet.numbers();
    let stakes = bet.stakes();
    match gateway
        .estimate_bet_gas(bet.kind, &numbers, &stakes, Some(fee))
        .await
    {
        Ok(gas) => return GasPlan::WithFeeQuote(gas),
        Err(err) => warn!(%err, "gas estimate with fee quote failed"),
    }
    match gateway
        .estimate_bet_gas(bet.kind, &numbers, &stakes, None)
        .await
    {
        Ok(gas) => GasPlan::WithoutFeeQuote(gas),
        Err(err) => {
            warn!(%err, "gas estimate failed, sending without a gas limit");
            GasPlan::Unbounded
        }
    }
}

/// Reads the settlement of the submitted kind from the lottery's logs. The last
/// matching log wins.
fn outcome_from(confirmation: &Confirmation, lotto: Address, kind: BetKind) -> BetOutcome {
    let settled = confirmation
        .logs
        .iter()
        .filter(|log| log.address == lotto)
        .filter_map(decode_log)
        .filter_map(|event| match event {
            DecodedEvent::Settled(settled) if settled.draws.kind() == kind => Some(settled),
            _ => None,
        })
        .last();
    match settled {
        Some(settled) if settled.is_win() => BetOutcome::Win(settled),
        Some(settled) => BetOutcome::Lose(settled),
        None => BetOutcome::NoDecodableResult {
            block_number: confirmation.block_number,
        },
    }
}
