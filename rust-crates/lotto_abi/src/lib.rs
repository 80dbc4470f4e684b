use alloy::{
    primitives::U256,
    sol,
    sol_types::{
        SolType,
        sol_data::{
            Array,
            Uint,
        },
    },
};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IFroll {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface ILotto {
        function minBet() external view returns (uint256);
        function contractBalance() external view returns (uint256);
        function LO_DRAWS() external view returns (uint256);
        function LO_PAYOUT_X() external view returns (uint256);
        function DE_PAYOUT_X() external view returns (uint256);

        function betLo(uint8[] numbers, uint256[] stakes) external;
        function betDe(uint8[] numbers, uint256[] stakes) external;

        event BetLoPlayed(address indexed player, uint8[] numbers, uint256[] stakes, uint256 totalStake);
        event BetLoSettled(address indexed player, uint8[] draws, uint256 grossPayout, uint256 netDiff);
        event BetDePlayed(address indexed player, uint8[] numbers, uint256[] stakes, uint256 totalStake);
        event BetDeSettled(address indexed player, uint8 draw, uint256 grossPayout, uint256 netDiff);

        error PausedError();
        error InvalidInput();
        error DuplicateNumber();
        error BelowMinBet();
        error InsufficientAllowance();
        error InsufficientLiquidity();
    }
}

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

/// Non-indexed data of `BetLoPlayed` / `BetDePlayed`: `(numbers, stakes, totalStake)`.
pub type PlayedPayload = (Array<Uint<8>>, Array<Uint<256>>, Uint<256>);

/// Non-indexed data of `BetLoSettled`: `(draws, grossPayout, netDiff)`.
pub type MultiSettledPayload = (Array<Uint<8>>, Uint<256>, Uint<256>);

/// Non-indexed data of `BetDeSettled`: `(draw, grossPayout, netDiff)`.
pub type SingleSettledPayload = (Uint<8>, Uint<256>, Uint<256>);

/// Decodes a `Played` data section. Only canonical encodings are accepted: the
/// decoded value must re-encode to exactly the input bytes.
pub fn decode_played_payload(data: &[u8]) -> Option<(Vec<u8>, Vec<U256>, U256)> {
    let value = PlayedPayload::abi_decode_params(data).ok()?;
    (PlayedPayload::abi_encode_params(&value) == data).then_some(value)
}

pub fn decode_multi_settled_payload(data: &[u8]) -> Option<(Vec<u8>, U256, U256)> {
    let value = MultiSettledPayload::abi_decode_params(data).ok()?;
    (MultiSettledPayload::abi_encode_params(&value) == data).then_some(value)
}

pub fn decode_single_settled_payload(data: &[u8]) -> Option<(u8, U256, U256)> {
    let value = SingleSettledPayload::abi_decode_params(data).ok()?;
    (SingleSettledPayload::abi_encode_params(&value) == data).then_some(value)
}
