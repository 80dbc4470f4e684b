use alloy::{
    primitives::{
        Address,
        B256,
        Bytes,
        U256,
    },
    sol_types::{
        SolError,
        SolEvent,
        SolType,
    },
};

use crate::{
    ILotto,
    MultiSettledPayload,
    PlayedPayload,
    SingleSettledPayload,
};

/// Topics and data of a synthesized lottery log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogParts {
    pub topics: Vec<B256>,
    pub data: Bytes,
}

pub fn player_topic(player: Address) -> B256 {
    player.into_word()
}

pub fn played_data(numbers: &[u8], stakes: &[U256]) -> Bytes {
    let total = stakes.iter().fold(U256::ZERO, |acc, s| acc + *s);
    PlayedPayload::abi_encode_params(&(numbers.to_vec(), stakes.to_vec(), total)).into()
}

pub fn multi_settled_data(draws: &[u8], gross: U256, net: U256) -> Bytes {
    MultiSettledPayload::abi_encode_params(&(draws.to_vec(), gross, net)).into()
}

pub fn single_settled_data(draw: u8, gross: U256, net: U256) -> Bytes {
    SingleSettledPayload::abi_encode_params(&(draw, gross, net)).into()
}

pub fn lo_played_log(player: Address, numbers: &[u8], stakes: &[U256]) -> LogParts {
    LogParts {
        topics: vec![ILotto::BetLoPlayed::SIGNATURE_HASH, player_topic(player)],
        data: played_data(numbers, stakes),
    }
}

pub fn de_played_log(player: Address, numbers: &[u8], stakes: &[U256]) -> LogParts {
    LogParts {
        topics: vec![ILotto::BetDePlayed::SIGNATURE_HASH, player_topic(player)],
        data: played_data(numbers, stakes),
    }
}

pub fn lo_settled_log(player: Address, draws: &[u8], gross: U256, net: U256) -> LogParts {
    LogParts {
        topics: vec![ILotto::BetLoSettled::SIGNATURE_HASH, player_topic(player)],
        data: multi_settled_data(draws, gross, net),
    }
}

pub fn de_settled_log(player: Address, draw: u8, gross: U256, net: U256) -> LogParts {
    LogParts {
        topics: vec![ILotto::BetDeSettled::SIGNATURE_HASH, player_topic(player)],
        data: single_settled_data(draw, gross, net),
    }
}

/// Revert payload of a parameterless custom error: its 4-byte selector.
pub fn revert_data<E: SolError>() -> Bytes {
    Bytes::copy_from_slice(&E::SELECTOR)
}

/// Whole-token amount at 18 decimals.
pub fn tokens(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(18u64))
}
