//! Lottery events as the client sees them, decoded from log data.

use crate::{
    bet_form::{
        BetEntry,
        BetKind,
        MAX_NUMBER,
        describe_entries,
    },
    units::format_amount,
};
use alloy::{
    primitives::{
        Address,
        B256,
        Bytes,
        U256,
    },
    sol_types::SolEvent,
};
use lotto_abi::{
    ILotto,
    decode_multi_settled_payload,
    decode_played_payload,
    decode_single_settled_payload,
};
use tracing::debug;

/// A log emitted by a confirmed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayedEvent {
    pub kind: Option<BetKind>,
    pub player: Option<Address>,
    pub numbers: Vec<u8>,
    pub stakes: Vec<U256>,
    pub total_stake: U256,
}

impl PlayedEvent {
    pub fn entries(&self) -> Vec<BetEntry> {
        self.numbers
            .iter()
            .zip(&self.stakes)
            .map(|(number, stake)| BetEntry {
                number: *number,
                stake: *stake,
            })
            .collect()
    }

    pub fn bets_line(&self) -> String {
        format!("Bets: {}", describe_entries(&self.entries()))
    }

    pub fn total_line(&self) -> String {
        format!("Total Stake: {} FROLL", format_amount(self.total_stake, 6))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Draws {
    Multi(Vec<u8>),
    Single(u8),
}

impl Draws {
    pub fn kind(&self) -> BetKind {
        match self {
            Draws::Multi(_) => BetKind::MultiDraw,
            Draws::Single(_) => BetKind::SingleDraw,
        }
    }

    /// "Draws: 01, 02" or "Draw: 07".
    pub fn describe(&self) -> String {
        match self {
            Draws::Multi(draws) => format!(
                "Draws: {}",
                draws
                    .iter()
                    .map(|d| format!("{d:02}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Draws::Single(draw) => format!("Draw: {draw:02}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettledEvent {
    pub player: Option<Address>,
    pub draws: Draws,
    pub gross_payout: U256,
    pub net_difference: U256,
}

impl SettledEvent {
    pub fn is_win(&self) -> bool {
        !self.gross_payout.is_zero()
    }

    pub fn outcome_label(&self) -> &'static str {
        if self.is_win() { "WIN" } else { "LOSE" }
    }

    pub fn payout_line(&self) -> String {
        format!("Payout: {} FROLL", format_amount(self.gross_payout, 6))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedEvent {
    Played(PlayedEvent),
    Settled(SettledEvent),
}

/// Strict `Played` decode: canonical encoding, parallel arrays of equal
/// length, numbers within 00-99 and a total equal to the sum of stakes.
pub fn played_from_data(data: &[u8]) -> Option<PlayedEvent> {
    let (numbers, stakes, total_stake) = decode_played_payload(data)?;
    if numbers.is_empty() || numbers.len() != stakes.len() {
        return None;
    }
    if numbers.iter().any(|n| *n > MAX_NUMBER) {
        return None;
    }
    let sum = stakes
        .iter()
        .try_fold(U256::ZERO, |acc, s| acc.checked_add(*s))?;
    if sum != total_stake {
        return None;
    }
    Some(PlayedEvent {
        kind: None,
        player: None,
        numbers,
        stakes,
        total_stake,
    })
}

pub fn multi_settled_from_data(data: &[u8]) -> Option<SettledEvent> {
    let (draws, gross_payout, net_difference) = decode_multi_settled_payload(data)?;
    if draws.is_empty() || draws.iter().any(|d| *d > MAX_NUMBER) {
        return None;
    }
    Some(SettledEvent {
        player: None,
        draws: Draws::Multi(draws),
        gross_payout,
        net_difference,
    })
}

pub fn single_settled_from_data(data: &[u8]) -> Option<SettledEvent> {
    let (draw, gross_payout, net_difference) = decode_single_settled_payload(data)?;
    if draw > MAX_NUMBER {
        return None;
    }
    Some(SettledEvent {
        player: None,
        draws: Draws::Single(draw),
        gross_payout,
        net_difference,
    })
}

/// Decodes a lottery log by its event signature. Logs of other events, or
/// whose data does not match the signature's payload, yield `None`.
pub fn decode_log(log: &LogRecord) -> Option<DecodedEvent> {
    let signature = *log.topics.first()?;
    let player = log.topics.get(1).map(|word| Address::from_word(*word));

    let decoded = if signature == ILotto::BetLoPlayed::SIGNATURE_HASH {
        played_from_data(&log.data).map(|event| {
            DecodedEvent::Played(PlayedEvent {
                kind: Some(BetKind::MultiDraw),
                player,
                ..event
            })
        })
    } else if signature == ILotto::BetDePlayed::SIGNATURE_HASH {
        played_from_data(&log.data).map(|event| {
            DecodedEvent::Played(PlayedEvent {
                kind: Some(BetKind::SingleDraw),
                player,
                ..event
            })
        })
    } else if signature == ILotto::BetLoSettled::SIGNATURE_HASH {
        multi_settled_from_data(&log.data)
            .map(|event| DecodedEvent::Settled(SettledEvent { player, ..event }))
    } else if signature == ILotto::BetDeSettled::SIGNATURE_HASH {
        single_settled_from_data(&log.data)
            .map(|event| DecodedEvent::Settled(SettledEvent { player, ..event }))
    } else {
        return None;
    };

    if decoded.is_none() {
        debug!(
            address = %log.address,
            topic = %signature,
            "skipping lottery log with undecodable data"
        );
    }
    decoded
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use alloy::sol_types::SolType;
    use lotto_abi::test_helpers::{
        de_settled_log,
        lo_played_log,
        lo_settled_log,
        multi_settled_data,
        played_data,
        tokens,
    };

    fn record(parts: lotto_abi::test_helpers::LogParts) -> LogRecord {
        LogRecord {
            address: Address::repeat_byte(0x11),
            topics: parts.topics,
            data: parts.data,
        }
    }

    #[test]
    fn decode_log__reads_played_event_with_player_and_kind() {
        // given
        let player = Address::repeat_byte(0x42);
        let log = record(lo_played_log(player, &[5, 17], &[tokens(1), tokens(2)]));

        // when
        let decoded = decode_log(&log);

        // then
        assert_eq!(
            decoded,
            Some(DecodedEvent::Played(PlayedEvent {
                kind: Some(BetKind::MultiDraw),
                player: Some(player),
                numbers: vec![5, 17],
                stakes: vec![tokens(1), tokens(2)],
                total_stake: tokens(3),
            }))
        );
    }

    #[test]
    fn decode_log__reads_single_draw_settlement() {
        let player = Address::repeat_byte(0x42);
        let log = record(de_settled_log(player, 7, tokens(70), tokens(69)));

        let Some(DecodedEvent::Settled(settled)) = decode_log(&log) else {
            panic!("expected a settlement");
        };

        assert_eq!(settled.draws, Draws::Single(7));
        assert_eq!(settled.player, Some(player));
        assert!(settled.is_win());
    }

    #[test]
    fn decode_log__skips_mismatched_data_and_unknown_topics() {
        // given
        let player = Address::repeat_byte(0x42);
        let mut wrong_shape = lo_settled_log(player, &[1, 2], U256::ZERO, U256::ZERO);
        wrong_shape.data = played_data(&[1], &[tokens(1)]);
        let mut unknown = lo_settled_log(player, &[1, 2], U256::ZERO, U256::ZERO);
        unknown.topics[0] = B256::repeat_byte(0x99);

        // when / then
        assert_eq!(decode_log(&record(wrong_shape)), None);
        assert_eq!(decode_log(&record(unknown)), None);
    }

    #[test]
    fn played_from_data__rejects_total_that_is_not_the_sum() {
        let data = lotto_abi::PlayedPayload::abi_encode_params(&(
            vec![1u8, 2],
            vec![tokens(1), tokens(1)],
            tokens(3),
        ));

        assert_eq!(played_from_data(&data), None);
    }

    #[test]
    fn multi_settled_from_data__rejects_draws_above_99() {
        let data = multi_settled_data(&[1, 100], U256::ZERO, U256::ZERO);

        assert_eq!(multi_settled_from_data(&data), None);
    }

    #[test]
    fn draws_describe__pads_two_digits() {
        assert_eq!(Draws::Multi(vec![1, 2, 30]).describe(), "Draws: 01, 02, 30");
        assert_eq!(Draws::Single(7).describe(), "Draw: 07");
    }
}
