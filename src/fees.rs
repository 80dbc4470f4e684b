//! Fast-fee policy applied to every write the client sends.

pub const ONE_GWEI: u128 = 1_000_000_000;

/// Fee data reported by the node. Dynamic pricing is available only when both
/// the cap and the tip are present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeeSnapshot {
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub gas_price: Option<u128>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeeQuote {
    Dynamic {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    },
    Legacy {
        gas_price: u128,
    },
}

impl FeeQuote {
    pub fn describe(&self) -> String {
        match self {
            FeeQuote::Dynamic {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => format!(
                "max fee {} gwei, tip {} gwei",
                gwei(*max_fee_per_gas),
                gwei(*max_priority_fee_per_gas)
            ),
            FeeQuote::Legacy { gas_price } => format!("gas price {} gwei", gwei(*gas_price)),
        }
    }
}

fn gwei(wei: u128) -> String {
    let whole = wei / ONE_GWEI;
    let fraction = wei % ONE_GWEI;
    if fraction == 0 {
        whole.to_string()
    } else {
        let fraction = format!("{fraction:09}");
        format!("{whole}.{}", fraction.trim_end_matches('0'))
    }
}

pub fn compute_fast_fee(snapshot: &FeeSnapshot) -> FeeQuote {
    match (snapshot.max_fee_per_gas, snapshot.max_priority_fee_per_gas) {
        (Some(cap), Some(tip)) if cap > 0 && tip > 0 => {
            let tip = tip.saturating_mul(2).max(ONE_GWEI);
            let mut cap = cap.saturating_mul(12) / 10;
            if cap <= tip {
                cap = tip.saturating_add(ONE_GWEI);
            }
            FeeQuote::Dynamic {
                max_fee_per_gas: cap,
                max_priority_fee_per_gas: tip,
            }
        }
        _ => match snapshot.gas_price {
            Some(price) if price > 0 => FeeQuote::Legacy {
                gas_price: price.saturating_mul(125) / 100,
            },
            _ => FeeQuote::Legacy {
                gas_price: ONE_GWEI,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn compute_fast_fee__doubles_tip_and_lifts_cap() {
        // given
        let snapshot = FeeSnapshot {
            max_fee_per_gas: Some(10 * ONE_GWEI),
            max_priority_fee_per_gas: Some(ONE_GWEI),
            gas_price: None,
        };

        // when
        let quote = compute_fast_fee(&snapshot);

        // then
        assert_eq!(
            quote,
            FeeQuote::Dynamic {
                max_fee_per_gas: 12 * ONE_GWEI,
                max_priority_fee_per_gas: 2 * ONE_GWEI,
            }
        );
    }

    #[test]
    fn compute_fast_fee__floors_tip_at_one_gwei() {
        let snapshot = FeeSnapshot {
            max_fee_per_gas: Some(10 * ONE_GWEI),
            max_priority_fee_per_gas: Some(ONE_GWEI * 3 / 10),
            gas_price: None,
        };

        let quote = compute_fast_fee(&snapshot);

        assert_eq!(
            quote,
            FeeQuote::Dynamic {
                max_fee_per_gas: 12 * ONE_GWEI,
                max_priority_fee_per_gas: ONE_GWEI,
            }
        );
    }

    #[test]
    fn compute_fast_fee__raises_cap_above_tip() {
        // given
        let snapshot = FeeSnapshot {
            max_fee_per_gas: Some(ONE_GWEI),
            max_priority_fee_per_gas: Some(ONE_GWEI),
            gas_price: Some(ONE_GWEI),
        };

        // when
        let quote = compute_fast_fee(&snapshot);

        // then
        assert_eq!(
            quote,
            FeeQuote::Dynamic {
                max_fee_per_gas: 3 * ONE_GWEI,
                max_priority_fee_per_gas: 2 * ONE_GWEI,
            }
        );
    }

    #[test]
    fn compute_fast_fee__bumps_legacy_price_by_a_quarter() {
        let snapshot = FeeSnapshot {
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
            gas_price: Some(4 * ONE_GWEI),
        };

        assert_eq!(
            compute_fast_fee(&snapshot),
            FeeQuote::Legacy {
                gas_price: 5 * ONE_GWEI
            }
        );
    }

    #[test]
    fn compute_fast_fee__falls_back_to_one_gwei_without_data() {
        assert_eq!(
            compute_fast_fee(&FeeSnapshot::default()),
            FeeQuote::Legacy {
                gas_price: ONE_GWEI
            }
        );
    }

    #[test]
    fn describe__renders_fractional_gwei() {
        let quote = FeeQuote::Legacy {
            gas_price: ONE_GWEI * 5 / 4,
        };
        assert_eq!(quote.describe(), "gas price 1.25 gwei");
    }
}
