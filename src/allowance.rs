use crate::{
    fees::compute_fast_fee,
    gateway::{
        GatewayError,
        LottoGateway,
        PendingTransaction,
    },
};
use alloy::primitives::{
    Address,
    TxHash,
    U256,
};
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllowanceOutcome {
    AlreadySufficient { current: U256 },
    Approved { tx_hash: TxHash },
}

/// Makes `spender`'s allowance over `owner`'s FROLL at least `needed`. When it
/// is short, approves exactly `needed` at the fast fee and waits for the
/// approval to be mined.
pub async fn ensure_allowance<G: LottoGateway>(
    gateway: &G,
    owner: Address,
    spender: Address,
    needed: U256,
) -> Result<AllowanceOutcome, GatewayError> {
    let current = gateway.allowance(owner, spender).await?;
    if current >= needed {
        return Ok(AllowanceOutcome::AlreadySufficient { current });
    }

    let fee = compute_fast_fee(&gateway.fee_snapshot().await?);
    info!(%owner, %spender, %current, %needed, fee = %fee.describe(), "Approving FROLL...");
    let pending = gateway.approve(spender, needed, fee).await?;
    let tx_hash = pending.tx_hash();
    let confirmation = gateway.confirm(pending).await?;
    info!(%tx_hash, block = ?confirmation.block_number, "approval confirmed");
    Ok(AllowanceOutcome::Approved { tx_hash })
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::{
        fees::{
            FeeQuote,
            ONE_GWEI,
        },
        test_helpers::{
            FAKE_LOTTO,
            FAKE_PLAYER,
            FakeGateway,
            SentTx,
        },
    };

    #[tokio::test]
    async fn ensure_allowance__sends_nothing_when_already_sufficient() {
        // given
        let gateway = FakeGateway::new();
        gateway.set_allowance(FAKE_PLAYER, FAKE_LOTTO, U256::from(500u64));

        // when
        let outcome = ensure_allowance(&gateway, FAKE_PLAYER, FAKE_LOTTO, U256::from(500u64))
            .await
            .unwrap();

        // then
        assert_eq!(
            outcome,
            AllowanceOutcome::AlreadySufficient {
                current: U256::from(500u64)
            }
        );
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn ensure_allowance__approves_exactly_the_needed_amount_at_fast_fee() {
        // given
        let gateway = FakeGateway::new();
        gateway.set_allowance(FAKE_PLAYER, FAKE_LOTTO, U256::from(10u64));

        // when
        let outcome = ensure_allowance(&gateway, FAKE_PLAYER, FAKE_LOTTO, U256::from(300u64))
            .await
            .unwrap();

        // then
        assert!(matches!(outcome, AllowanceOutcome::Approved { .. }));
        assert_eq!(
            gateway.approvals(),
            vec![SentTx::Approve {
                spender: FAKE_LOTTO,
                amount: U256::from(300u64),
                fee: FeeQuote::Dynamic {
                    max_fee_per_gas: 12 * ONE_GWEI,
                    max_priority_fee_per_gas: 2 * ONE_GWEI,
                },
            }]
        );
        assert_eq!(
            gateway.allowance_of(FAKE_PLAYER, FAKE_LOTTO),
            U256::from(300u64)
        );
    }

    #[tokio::test]
    async fn ensure_allowance__propagates_rejection_without_retry() {
        let gateway = FakeGateway::new();
        gateway.fail_approve(GatewayError::UserRejected);

        let result = ensure_allowance(&gateway, FAKE_PLAYER, FAKE_LOTTO, U256::from(1u64)).await;

        assert_eq!(result, Err(GatewayError::UserRejected));
        assert_eq!(
            gateway.calls().iter().filter(|c| **c == "approve").count(),
            1
        );
    }
}
