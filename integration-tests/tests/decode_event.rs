#![allow(non_snake_case)]

use alloy::primitives::hex;
use lodefroll::{
    bet_form::{
        BetForm,
        BetKind,
    },
    decoder::{
        DecodeError,
        DecodeReport,
        decode_input,
    },
    events::{
        DecodedEvent,
        Draws,
    },
    network::VICTION_EXPLORER_URL,
    session::PayoutConstants,
    submission::submit_bet,
    test_helpers::{
        FAKE_LOTTO,
        FAKE_PLAYER,
        FakeGateway,
    },
};
use lotto_abi::test_helpers::{
    played_data,
    tokens,
};

#[tokio::test]
async fn decode_input__reads_back_a_confirmed_bet_by_explorer_link() {
    // given
    let gateway = FakeGateway::new();
    gateway.set_pool(Ok(tokens(10_000)));
    gateway.set_allowance(FAKE_PLAYER, FAKE_LOTTO, tokens(10));
    gateway.settle_with(Draws::Single(9), tokens(70));
    let mut form = BetForm::new();
    form.set_number(0, "9");
    form.set_stake(0, "1");
    let report = submit_bet(
        &gateway,
        FAKE_PLAYER,
        &form,
        BetKind::SingleDraw,
        &PayoutConstants::default(),
        |_| {},
    )
    .await
    .unwrap();
    let link = format!("{VICTION_EXPLORER_URL}/tx/{}", report.bet.tx_hash);

    // when
    let decoded = decode_input(&gateway, VICTION_EXPLORER_URL, &link)
        .await
        .unwrap();

    // then
    assert_eq!(
        decoded.render(),
        format!(
            "Decoded (From Tx)\n\
             Tx: {VICTION_EXPLORER_URL}/tx/{}\n\
             Bets: 09: 1 FROLL\n\
             Total Stake: 1 FROLL\n\
             Draw: 09\n\
             Payout: 70 FROLL\n\
             Outcome: WIN",
            report.bet.tx_hash
        )
    );
}

#[tokio::test]
async fn decode_input__raw_played_data_needs_no_network() {
    // given
    let gateway = FakeGateway::new();
    let data = played_data(&[3, 96], &[tokens(5), tokens(1)]);
    let input = format!("  0x{}\n", hex::encode(&data));

    // when
    let decoded = decode_input(&gateway, VICTION_EXPLORER_URL, &input)
        .await
        .unwrap();

    // then
    let DecodeReport::Raw(DecodedEvent::Played(played)) = &decoded else {
        panic!("expected a raw Played report");
    };
    assert_eq!(played.numbers, vec![3, 96]);
    assert_eq!(played.kind, None);
    assert_eq!(played.total_line(), "Total Stake: 6 FROLL");
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn decode_input__rejects_text_that_is_neither_hash_nor_hex() {
    let gateway = FakeGateway::new();

    let err = decode_input(&gateway, VICTION_EXPLORER_URL, "my lucky numbers")
        .await
        .unwrap_err();

    assert_eq!(err, DecodeError::NotHex);
    assert_eq!(
        err.to_string(),
        "Please paste hex data starting with 0x, or a tx hash / link."
    );
}

#[tokio::test]
async fn decode_input__rejects_hex_that_matches_no_event() {
    let gateway = FakeGateway::new();

    let err = decode_input(&gateway, VICTION_EXPLORER_URL, "0xdeadbeef")
        .await
        .unwrap_err();

    assert_eq!(err, DecodeError::UnrecognizedPayload);
}
