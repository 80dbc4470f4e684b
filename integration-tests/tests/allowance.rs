#![allow(non_snake_case)]

use lodefroll::{
    allowance::{
        AllowanceOutcome,
        ensure_allowance,
    },
    client::AppController,
    error::ClientError,
    fees::{
        FeeQuote,
        ONE_GWEI,
    },
    gateway::GatewayError,
    network::ChainParams,
    test_helpers::{
        FAKE_LOTTO,
        FAKE_PLAYER,
        FakeChainWallet,
        FakeGateway,
        SentTx,
    },
    ui::{
        Field,
        FormAction,
    },
};
use lotto_abi::test_helpers::tokens;

#[tokio::test]
async fn ensure_allowance__second_call_reuses_first_approval() {
    // given
    let gateway = FakeGateway::new();

    // when
    let first = ensure_allowance(&gateway, FAKE_PLAYER, FAKE_LOTTO, tokens(3))
        .await
        .unwrap();
    let second = ensure_allowance(&gateway, FAKE_PLAYER, FAKE_LOTTO, tokens(2))
        .await
        .unwrap();

    // then
    assert!(matches!(first, AllowanceOutcome::Approved { .. }));
    assert_eq!(
        second,
        AllowanceOutcome::AlreadySufficient {
            current: tokens(3)
        }
    );
    assert_eq!(
        gateway.approvals(),
        vec![SentTx::Approve {
            spender: FAKE_LOTTO,
            amount: tokens(3),
            fee: FeeQuote::Dynamic {
                max_fee_per_gas: 12 * ONE_GWEI,
                max_priority_fee_per_gas: 2 * ONE_GWEI,
            },
        }]
    );
}

#[tokio::test]
async fn place_bet__rejected_approval_surfaces_and_sends_no_bet() {
    // given
    let gateway = FakeGateway::new();
    gateway.set_pool(Ok(tokens(10_000)));
    gateway.fail_approve(GatewayError::UserRejected);
    let mut controller = AppController::connect(
        gateway.clone(),
        FakeChainWallet::on_chain(88),
        ChainParams::viction(),
        FAKE_PLAYER,
    )
    .await
    .unwrap();
    for (field, ch) in [(Field::Number, '8'), (Field::Stake, '1')] {
        controller.apply_form_action(FormAction::Push { row: 0, field, ch });
    }

    // when
    let err = controller.place_bet(|_| {}).await.unwrap_err();

    // then
    assert_eq!(err, ClientError::UserRejected);
    assert_eq!(controller.errors(), [err.user_message()]);
    assert!(
        gateway
            .sent()
            .iter()
            .all(|tx| !matches!(tx, SentTx::Bet { .. }))
    );
    assert!(controller.session().last_bet().is_none());
}
