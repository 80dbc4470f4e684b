use crate::{
    bet_form::{
        BetKind,
        BetSet,
    },
    session::PayoutConstants,
    units::format_amount,
};
use alloy::primitives::U256;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LiquidityError {
    #[error(
        "Pool insufficient for worst-case payout. Needs ≥ {} FROLL (your total + pool is lower).",
        display_amount(.required)
    )]
    InsufficientLiquidity { required: U256, available: U256 },
}

fn display_amount(amount: &U256) -> String {
    format_amount(*amount, 6)
}

/// Largest amount the contract could owe for `bet`, by the contract's own rule.
pub fn worst_case_payout(bet: &BetSet, constants: &PayoutConstants) -> U256 {
    let max_stake = bet.max_stake();
    match bet.kind {
        BetKind::MultiDraw => constants
            .draw_count
            .saturating_mul(constants.multi_draw_multiplier)
            .saturating_mul(max_stake),
        BetKind::SingleDraw => constants.single_draw_multiplier.saturating_mul(max_stake),
    }
}

/// Fails iff `pool + total stake < worst-case payout`.
pub fn check(
    bet: &BetSet,
    pool: U256,
    constants: &PayoutConstants,
) -> Result<U256, LiquidityError> {
    let worst = worst_case_payout(bet, constants);
    let available = pool.saturating_add(bet.total_stake());
    if available < worst {
        return Err(LiquidityError::InsufficientLiquidity {
            required: worst,
            available,
        });
    }
    Ok(worst)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::bet_form::BetEntry;
    use proptest::prelude::*;

    fn bet(kind: BetKind, stakes: &[u64]) -> BetSet {
        BetSet {
            entries: stakes
                .iter()
                .enumerate()
                .map(|(i, s)| BetEntry {
                    number: i as u8,
                    stake: U256::from(*s),
                })
                .collect(),
            kind,
        }
    }

    #[test]
    fn worst_case_payout__uses_draw_count_times_multiplier_for_multi_draw() {
        let bet = bet(BetKind::MultiDraw, &[1, 5, 2]);

        let worst = worst_case_payout(&bet, &PayoutConstants::default());

        assert_eq!(worst, U256::from(27u64 * 4 * 5));
    }

    #[test]
    fn worst_case_payout__uses_single_multiplier_for_single_draw() {
        let bet = bet(BetKind::SingleDraw, &[3, 10]);

        let worst = worst_case_payout(&bet, &PayoutConstants::default());

        assert_eq!(worst, U256::from(700u64));
    }

    #[test]
    fn check__passes_when_pool_plus_total_covers_worst_case() {
        // given
        let bet = bet(BetKind::SingleDraw, &[10, 5]);

        // when
        let exact = check(&bet, U256::from(685u64), &PayoutConstants::default());
        let short = check(&bet, U256::from(684u64), &PayoutConstants::default());

        // then
        assert_eq!(exact, Ok(U256::from(700u64)));
        assert_eq!(
            short,
            Err(LiquidityError::InsufficientLiquidity {
                required: U256::from(700u64),
                available: U256::from(699u64),
            })
        );
    }

    proptest! {
        #[test]
        fn check__is_deterministic_and_matches_formula(
            stakes in proptest::collection::vec(1u64..1_000_000, 1..10),
            pool in 0u64..1_000_000_000,
            multi in any::<bool>(),
        ) {
            let kind = if multi { BetKind::MultiDraw } else { BetKind::SingleDraw };
            let bet = bet(kind, &stakes);
            let constants = PayoutConstants::default();
            let max = *stakes.iter().max().unwrap();
            let total: u64 = stakes.iter().sum();
            let worst = if multi { 108 * max } else { 70 * max };

            let first = check(&bet, U256::from(pool), &constants);
            let second = check(&bet, U256::from(pool), &constants);

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.is_err(), pool + total < worst);
        }
    }
}
