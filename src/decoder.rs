//! Turns a pasted transaction hash, explorer link or raw event `data` into a
//! readable bet summary.

use crate::{
    events::{
        DecodedEvent,
        Draws,
        PlayedEvent,
        SettledEvent,
        decode_log,
        multi_settled_from_data,
        played_from_data,
        single_settled_from_data,
    },
    gateway::{
        GatewayError,
        LottoGateway,
    },
};
use alloy::primitives::{
    Bytes,
    TxHash,
};
use std::fmt::Write as _;
use tracing::debug;

/// Inputs longer than this are never treated as a hash or link.
pub const MAX_HASH_INPUT_LEN: usize = 200;
const HASH_HEX_LEN: usize = 64;

const PLAYED_TIP: &str =
    "Tip: For draws & payout, paste the tx hash or the data from BetLoSettled/BetDeSettled.";
const SETTLED_TIP: &str =
    "For bet breakdown (per number), paste the tx hash or Played event data.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeInput {
    TxHash(TxHash),
    RawPayload(Bytes),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Please paste data or a tx hash / link.")]
    EmptyInput,
    #[error("Please paste hex data starting with 0x, or a tx hash / link.")]
    NotHex,
    #[error("Transaction not found. Please check the hash/link.")]
    TransactionNotFound(TxHash),
    #[error(
        "Unrecognized input. Paste a tx hash/link, or hex `data` from one of: BetLoPlayed/BetDePlayed/BetLoSettled/BetDeSettled."
    )]
    UnrecognizedPayload,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Finds the first `0x` followed by exactly 64 hex digits. A longer hex run is
/// payload data, not a hash.
fn find_tx_hash(input: &str) -> Option<TxHash> {
    let bytes = input.as_bytes();
    let mut start = 0;
    while let Some(offset) = input[start..].find("0x") {
        let digits = start + offset + 2;
        let run = bytes[digits..]
            .iter()
            .take_while(|b| b.is_ascii_hexdigit())
            .count();
        if run == HASH_HEX_LEN {
            return input[digits - 2..digits + HASH_HEX_LEN].parse().ok();
        }
        start = digits + run;
    }
    None
}

/// Decides whether `raw` names a transaction or carries event data.
pub fn classify_input(raw: &str) -> Result<DecodeInput, DecodeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DecodeError::EmptyInput);
    }
    if raw.len() <= MAX_HASH_INPUT_LEN {
        if let Some(hash) = find_tx_hash(raw) {
            return Ok(DecodeInput::TxHash(hash));
        }
    }
    let digits = raw.strip_prefix("0x").ok_or(DecodeError::NotHex)?;
    let payload = hex::decode(digits).map_err(|_| DecodeError::NotHex)?;
    Ok(DecodeInput::RawPayload(payload.into()))
}

/// Tries `Played`, then multi-draw `Settled`, then single-draw `Settled`.
pub fn decode_raw_payload(data: &[u8]) -> Result<DecodedEvent, DecodeError> {
    played_from_data(data)
        .map(DecodedEvent::Played)
        .or_else(|| multi_settled_from_data(data).map(DecodedEvent::Settled))
        .or_else(|| single_settled_from_data(data).map(DecodedEvent::Settled))
        .ok_or(DecodeError::UnrecognizedPayload)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeReport {
    FromTransaction {
        tx_hash: TxHash,
        explorer_url: String,
        played: Option<PlayedEvent>,
        settled: Option<SettledEvent>,
    },
    Raw(DecodedEvent),
}

fn push_settled(out: &mut String, settled: &SettledEvent) {
    let _ = writeln!(out, "{}", settled.draws.describe());
    let _ = writeln!(out, "{}", settled.payout_line());
    let _ = write!(out, "Outcome: {}", settled.outcome_label());
}

impl DecodeReport {
    pub fn render(&self) -> String {
        let mut out = String::new();
        match self {
            DecodeReport::FromTransaction {
                tx_hash,
                explorer_url,
                played,
                settled,
            } => {
                let _ = writeln!(out, "Decoded (From Tx)");
                let _ = writeln!(
                    out,
                    "Tx: {}/tx/{tx_hash}",
                    explorer_url.trim_end_matches('/')
                );
                match played {
                    Some(played) => {
                        let _ = writeln!(out, "{}", played.bets_line());
                        let _ = writeln!(out, "{}", played.total_line());
                    }
                    None => {
                        let _ = writeln!(out, "No \"Played\" event found in this tx.");
                    }
                }
                match settled {
                    Some(settled) => push_settled(&mut out, settled),
                    None => {
                        let _ = write!(
                            out,
                            "No \"Settled\" event found in this tx (maybe you pasted a different tx)."
                        );
                    }
                }
            }
            DecodeReport::Raw(DecodedEvent::Played(played)) => {
                let _ = writeln!(out, "Decoded (Played)");
                let _ = writeln!(out, "{}", played.bets_line());
                let _ = writeln!(out, "{}", played.total_line());
                let _ = write!(out, "{PLAYED_TIP}");
            }
            DecodeReport::Raw(DecodedEvent::Settled(settled)) => {
                let header = match settled.draws {
                    Draws::Multi(_) => "Decoded (Lo Settled)",
                    Draws::Single(_) => "Decoded (De Settled)",
                };
                let _ = writeln!(out, "{header}");
                push_settled(&mut out, settled);
                let _ = write!(out, "\n{SETTLED_TIP}");
            }
        }
        out
    }
}

/// Decodes `raw`, fetching the receipt through `gateway` when it names a
/// transaction. Only logs emitted by the lottery contract are considered; the
/// last `Played` and the last `Settled` log are reported.
pub async fn decode_input<G: LottoGateway>(
    gateway: &G,
    explorer_url: &str,
    raw: &str,
) -> Result<DecodeReport, DecodeError> {
    let tx_hash = match classify_input(raw)? {
        DecodeInput::RawPayload(data) => return decode_raw_payload(&data).map(DecodeReport::Raw),
        DecodeInput::TxHash(tx_hash) => tx_hash,
    };

    let confirmation = gateway
        .receipt_by_hash(tx_hash)
        .await?
        .ok_or(DecodeError::TransactionNotFound(tx_hash))?;

    let lotto = gateway.lotto_address();
    let mut played = None;
    let mut settled = None;
    for log in confirmation.logs.iter().filter(|log| log.address == lotto) {
        match decode_log(log) {
            Some(DecodedEvent::Played(event)) => played = Some(event),
            Some(DecodedEvent::Settled(event)) => settled = Some(event),
            None => debug!(%tx_hash, "ignoring unrecognized lottery log"),
        }
    }

    Ok(DecodeReport::FromTransaction {
        tx_hash,
        explorer_url: explorer_url.to_string(),
        played,
        settled,
    })
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::{
        bet_form::BetKind,
        events::LogRecord,
        gateway::Confirmation,
        test_helpers::{
            FAKE_LOTTO,
            FakeGateway,
        },
    };
    use alloy::primitives::{
        Address,
        U256,
    };
    use lotto_abi::test_helpers::{
        de_played_log,
        lo_settled_log,
        multi_settled_data,
        played_data,
        single_settled_data,
        tokens,
    };

    const EXPLORER: &str = "https://www.vicscan.xyz";

    fn hash_text() -> String {
        format!("0x{}", "ab".repeat(32))
    }

    fn as_hex(data: &[u8]) -> String {
        format!("0x{}", hex::encode(data))
    }

    #[test]
    fn classify_input__reads_hash_from_explorer_link() {
        let link = format!("{EXPLORER}/tx/{}", hash_text());

        let input = classify_input(&link).unwrap();

        assert_eq!(input, DecodeInput::TxHash(hash_text().parse().unwrap()));
    }

    #[test]
    fn classify_input__treats_three_word_payload_as_data_not_hash() {
        // given
        let data = single_settled_data(7, tokens(70), tokens(69));
        let text = as_hex(&data);
        assert!(text.len() <= MAX_HASH_INPUT_LEN);

        // when
        let input = classify_input(&text).unwrap();

        // then
        assert_eq!(input, DecodeInput::RawPayload(data));
    }

    #[test]
    fn classify_input__rejects_empty_and_non_hex() {
        assert_eq!(classify_input("   "), Err(DecodeError::EmptyInput));
        assert_eq!(classify_input("hello"), Err(DecodeError::NotHex));
        assert_eq!(classify_input("0xzz"), Err(DecodeError::NotHex));
    }

    #[test]
    fn decode_raw_payload__reads_multi_draw_loss() {
        // given
        let data = multi_settled_data(&[1, 2, 3], U256::ZERO, U256::ZERO);

        // when
        let report = DecodeReport::Raw(decode_raw_payload(&data).unwrap());

        // then
        assert_eq!(
            report.render(),
            "Decoded (Lo Settled)\n\
             Draws: 01, 02, 03\n\
             Payout: 0 FROLL\n\
             Outcome: LOSE\n\
             For bet breakdown (per number), paste the tx hash or Played event data."
        );
    }

    #[test]
    fn decode_raw_payload__prefers_played_and_keeps_order() {
        let data = played_data(&[17, 5], &[tokens(2), tokens(1)]);

        let decoded = decode_raw_payload(&data).unwrap();

        let DecodedEvent::Played(played) = &decoded else {
            panic!("expected played, got {decoded:?}");
        };
        assert_eq!(played.numbers, vec![17, 5]);
        assert_eq!(played.bets_line(), "Bets: 17: 2 FROLL; 05: 1 FROLL");
        assert_eq!(decode_raw_payload(&data).unwrap(), decoded);
    }

    #[test]
    fn decode_raw_payload__reads_single_draw_settlement() {
        let data = single_settled_data(42, tokens(70), tokens(69));

        let decoded = decode_raw_payload(&data).unwrap();

        assert!(matches!(
            decoded,
            DecodedEvent::Settled(SettledEvent {
                draws: Draws::Single(42),
                ..
            })
        ));
    }

    #[test]
    fn decode_raw_payload__rejects_garbage() {
        assert_eq!(
            decode_raw_payload(&[0x01, 0x02]),
            Err(DecodeError::UnrecognizedPayload)
        );
    }

    #[tokio::test]
    async fn decode_input__reports_both_halves_from_receipt() {
        // given
        let gateway = FakeGateway::new();
        let tx_hash: TxHash = hash_text().parse().unwrap();
        let player = Address::repeat_byte(0x42);
        let played = de_played_log(player, &[7], &[tokens(1)]);
        let settled = lo_settled_log(player, &[7, 8], tokens(4), tokens(3));
        let foreign = lo_settled_log(player, &[9], tokens(100), tokens(99));
        gateway.insert_receipt(Confirmation {
            tx_hash,
            block_number: Some(12),
            logs: vec![
                LogRecord {
                    address: FAKE_LOTTO,
                    topics: played.topics,
                    data: played.data,
                },
                LogRecord {
                    address: FAKE_LOTTO,
                    topics: settled.topics,
                    data: settled.data,
                },
                LogRecord {
                    address: Address::repeat_byte(0x01),
                    topics: foreign.topics,
                    data: foreign.data,
                },
            ],
        });

        // when
        let report = decode_input(&gateway, EXPLORER, &hash_text()).await.unwrap();

        // then
        let DecodeReport::FromTransaction {
            played, settled, ..
        } = &report
        else {
            panic!("expected a transaction report");
        };
        assert_eq!(played.as_ref().and_then(|p| p.kind), Some(BetKind::SingleDraw));
        assert_eq!(settled.as_ref().map(|s| s.draws.clone()), Some(Draws::Multi(vec![7, 8])));
        assert_eq!(
            report.render(),
            format!(
                "Decoded (From Tx)\n\
                 Tx: {EXPLORER}/tx/{}\n\
                 Bets: 07: 1 FROLL\n\
                 Total Stake: 1 FROLL\n\
                 Draws: 07, 08\n\
                 Payout: 4 FROLL\n\
                 Outcome: WIN",
                hash_text()
            )
        );
    }

    #[tokio::test]
    async fn decode_input__reports_missing_halves() {
        let gateway = FakeGateway::new();
        let tx_hash: TxHash = hash_text().parse().unwrap();
        gateway.insert_receipt(Confirmation {
            tx_hash,
            block_number: Some(1),
            logs: vec![],
        });

        let report = decode_input(&gateway, EXPLORER, &hash_text()).await.unwrap();

        let rendered = report.render();
        assert!(rendered.contains("No \"Played\" event found in this tx."));
        assert!(rendered.ends_with(
            "No \"Settled\" event found in this tx (maybe you pasted a different tx)."
        ));
    }

    #[tokio::test]
    async fn decode_input__fails_for_unknown_transaction() {
        let gateway = FakeGateway::new();
        let tx_hash: TxHash = hash_text().parse().unwrap();

        let result = decode_input(&gateway, EXPLORER, &hash_text()).await;

        assert_eq!(result, Err(DecodeError::TransactionNotFound(tx_hash)));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Transaction not found. Please check the hash/link."
        );
    }
}
