#![allow(non_snake_case)]

use alloy::primitives::U256;
use lodefroll::{
    bet_form::{
        BetForm,
        BetKind,
    },
    error::{
        ClientError,
        RevertReason,
    },
    events::Draws,
    gateway::{
        GatewayError,
        RevertKind,
    },
    preflight,
    session::PayoutConstants,
    submission::{
        BetOutcome,
        SubmissionStage,
        submit_bet,
    },
    test_helpers::{
        FAKE_LOTTO,
        FAKE_PLAYER,
        FakeGateway,
        SentTx,
    },
};
use lotto_abi::{
    ILotto,
    test_helpers::{
        revert_data,
        tokens,
    },
};
use proptest::prelude::*;

fn form_with(rows: &[(&str, &str)]) -> BetForm {
    let mut form = BetForm::new();
    for (index, (number, stake)) in rows.iter().enumerate() {
        if index > 0 {
            form.add_row().unwrap();
        }
        form.set_number(index, *number);
        form.set_stake(index, *stake);
    }
    form
}

#[tokio::test]
async fn place_bet__single_draw_loss_reports_draw_and_zero_payout() {
    // given
    let gateway = FakeGateway::new();
    gateway.set_pool(Ok(tokens(10_000)));
    gateway.set_allowance(FAKE_PLAYER, FAKE_LOTTO, tokens(100));
    gateway.settle_with(Draws::Single(31), U256::ZERO);
    let form = form_with(&[("7", "3"), ("70", "2")]);

    // when
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

    // then
    assert_eq!(report.outcome.label(), Some("LOSE"));
    assert_eq!(report.outcome.result_line(), "Draw: 31 | Payout: 0 FROLL");
    assert_eq!(report.bets_line(), "07: 3 FROLL; 70: 2 FROLL");
    assert_eq!(report.total_line(), "5 FROLL");
    assert!(gateway.approvals().is_empty());
    let sent = gateway.sent();
    let Some(SentTx::Bet {
        kind,
        numbers,
        stakes,
        ..
    }) = sent.last()
    else {
        panic!("expected a bet transaction");
    };
    assert_eq!(*kind, BetKind::SingleDraw);
    assert_eq!(numbers, &vec![7, 70]);
    assert_eq!(stakes, &vec![tokens(3), tokens(2)]);
}

#[tokio::test]
async fn place_bet__approves_shortfall_then_bets() {
    // given
    let gateway = FakeGateway::new();
    gateway.set_pool(Ok(tokens(10_000)));
    gateway.set_allowance(FAKE_PLAYER, FAKE_LOTTO, tokens(1));
    let form = form_with(&[("12", "4")]);

    // when
    let report = submit_bet(
        &gateway,
        FAKE_PLAYER,
        &form,
        BetKind::MultiDraw,
        &PayoutConstants::default(),
        |_| {},
    )
    .await
    .unwrap();

    // then
    assert_eq!(
        report.outcome,
        BetOutcome::NoDecodableResult {
            block_number: report.block_number
        }
    );
    assert_eq!(gateway.allowance_of(FAKE_PLAYER, FAKE_LOTTO), tokens(4));
    let sent = gateway.sent();
    assert!(matches!(sent[0], SentTx::Approve { .. }));
    assert!(matches!(sent[1], SentTx::Bet { .. }));
}

#[tokio::test]
async fn place_bet__thin_pool_fails_before_any_write() {
    // given
    let gateway = FakeGateway::new();
    gateway.set_pool(Ok(tokens(50)));
    let form = form_with(&[("1", "1")]);
    let mut stages = Vec::new();

    // when
    let err = submit_bet(
        &gateway,
        FAKE_PLAYER,
        &form,
        BetKind::MultiDraw,
        &PayoutConstants::default(),
        |stage| stages.push(stage.clone()),
    )
    .await
    .unwrap_err();

    // then
    assert!(matches!(err, ClientError::Liquidity(_)));
    assert!(gateway.sent().is_empty());
    assert!(matches!(stages.last(), Some(SubmissionStage::Failed(_))));
}

#[tokio::test]
async fn place_bet__contract_revert_maps_to_friendly_message() {
    // given
    let gateway = FakeGateway::new();
    gateway.set_pool(Ok(tokens(10_000)));
    gateway.set_allowance(FAKE_PLAYER, FAKE_LOTTO, tokens(100));
    gateway.fail_submit(GatewayError::Reverted {
        data: Some(revert_data::<ILotto::PausedError>()),
        message: "execution reverted".to_string(),
    });
    let form = form_with(&[("44", "1")]);

    // when
    let err = submit_bet(
        &gateway,
        FAKE_PLAYER,
        &form,
        BetKind::SingleDraw,
        &PayoutConstants::default(),
        |_| {},
    )
    .await
    .unwrap_err();

    // then
    assert_eq!(
        err,
        ClientError::Reverted(RevertReason::Known {
            kind: RevertKind::Paused,
            min_stake: PayoutConstants::default().minimum_stake,
        })
    );
    assert_eq!(err.user_message(), "Game is currently paused.");
}

#[tokio::test]
async fn place_bet__invalid_form_touches_no_gateway_method() {
    let gateway = FakeGateway::new();
    let form = form_with(&[("5", "1"), ("05", "2")]);

    let err = submit_bet(
        &gateway,
        FAKE_PLAYER,
        &form,
        BetKind::MultiDraw,
        &PayoutConstants::default(),
        |_| {},
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
    assert!(gateway.calls().is_empty());
}

proptest! {
    #[test]
    fn preflight__passes_exactly_when_pool_plus_total_covers_worst_case(
        stakes in proptest::collection::vec(1u64..=1_000, 1..10),
        pool in 0u64..2_000_000,
        single in any::<bool>(),
    ) {
        let kind = if single { BetKind::SingleDraw } else { BetKind::MultiDraw };
        let rows: Vec<(String, String)> = stakes
            .iter()
            .enumerate()
            .map(|(number, stake)| (number.to_string(), stake.to_string()))
            .collect();
        let rows: Vec<(&str, &str)> = rows
            .iter()
            .map(|(number, stake)| (number.as_str(), stake.as_str()))
            .collect();
        let constants = PayoutConstants::default();
        let bet = form_with(&rows).collect(constants.minimum_stake, kind).unwrap();

        let result = preflight::check(&bet, tokens(pool), &constants);

        let worst = preflight::worst_case_payout(&bet, &constants);
        let covered = tokens(pool) + bet.total_stake() >= worst;
        prop_assert_eq!(result.is_ok(), covered);
    }
}
