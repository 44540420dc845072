//! Transfers: validation, submission, follow-up refresh, fee preview, broadcast.

use std::time::Duration;

use ii_kaspa_wallet::{
    domain::{
        error::WalletError, session::SessionEvent, status::StatusKind, wallet::PendingTransfer,
    },
    workflow::BusyGuard,
};

use super::{
    TestEnv,
    mocks::{RECIPIENT, WALLET_ADDRESS},
};

async fn logged_in() -> TestEnv {
    let mut env = TestEnv::new();
    assert!(env.login().await);
    assert!(env.session.is_wallet_ready());
    env
}

#[tokio::test]
async fn test_send_without_recipient_makes_no_remote_call() {
    let mut env = logged_in().await;
    env.fill_transfer("   ", "1.5");
    let pending = env.session.pending.clone();

    let err = env.send(&pending).await.unwrap_err();

    assert_eq!(err, WalletError::Validation("Please fill in all fields".to_string()));
    assert_eq!(env.ledger.send_calls(), 0);
    assert_eq!(env.status_text(), Some("Please fill in all fields"));
    assert_eq!(env.status_kind(), Some(StatusKind::Error));
    assert_eq!(env.session.pending.amount, "1.5");
}

#[tokio::test]
async fn test_send_without_wallet_is_rejected_locally() {
    let mut env = TestEnv::new();

    let err = env
        .send(&PendingTransfer::new(RECIPIENT, "1"))
        .await
        .unwrap_err();

    assert!(matches!(err, WalletError::Validation(_)));
    assert_eq!(env.ledger.remote_calls(), 0);
}

#[tokio::test]
async fn test_zero_amount_is_rejected_locally() {
    let mut env = logged_in().await;

    let err = env
        .send(&PendingTransfer::new(RECIPIENT, "0.000000001"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        WalletError::Validation("Amount must be greater than 0".to_string())
    );
    assert_eq!(env.ledger.send_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_send_success_schedules_one_refresh() {
    let mut env = logged_in().await;
    let balance_calls = env.ledger.balance_calls();
    env.fill_transfer(&format!("  {}  ", RECIPIENT), "1.5");
    env.ledger.set_balance(100_000_000);

    let pending = env.session.pending.clone();
    let receipt = env.send(&pending).await.unwrap();

    assert_eq!(
        *env.ledger.sent.lock().unwrap(),
        vec![(WALLET_ADDRESS.to_string(), RECIPIENT.to_string(), 150_000_000)]
    );
    assert_eq!(env.session.last_receipt.as_ref(), Some(&receipt));
    assert!(env.session.pending.to_address.is_empty());
    assert!(env.session.pending.amount.is_empty());
    assert_eq!(env.status_text(), Some("Transaction sent successfully!"));

    // Nothing before the delay.
    tokio::time::sleep(Duration::from_millis(1_900)).await;
    assert_eq!(env.ledger.balance_calls(), balance_calls);

    tokio::time::sleep(Duration::from_millis(200)).await;
    env.drain();
    assert_eq!(env.ledger.balance_calls(), balance_calls + 1);
    assert_eq!(env.session.balance.map(|b| b.total), Some(100_000_000));
    assert_eq!(env.status_text(), Some("Balance updated!"));

    // Exactly one follow-up.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(env.ledger.balance_calls(), balance_calls + 1);
}

#[tokio::test]
async fn test_send_failure_keeps_pending_transfer() {
    let mut env = logged_in().await;
    env.ledger
        .set_send(Err("Insufficient funds: need 150002036, have 250000000".to_string()));
    env.fill_transfer(RECIPIENT, "1.5");

    let pending = env.session.pending.clone();
    let err = env.send(&pending).await.unwrap_err();

    assert!(matches!(err, WalletError::Transaction(_)));
    assert_eq!(
        env.status_text(),
        Some("Transaction failed: Insufficient funds: need 150002036, have 250000000")
    );
    assert_eq!(env.session.pending, PendingTransfer::new(RECIPIENT, "1.5"));
    assert!(env.session.last_receipt.is_none());
}

#[tokio::test]
async fn test_fee_preview_does_not_send() {
    let mut env = logged_in().await;
    env.fill_transfer(RECIPIENT, "2");

    let pending = env.session.pending.clone();
    let built = env.preview(&pending).await.unwrap();

    assert_eq!(built.fee_paid, 2_036);
    assert_eq!(env.session.fee_preview.as_ref(), Some(&built));
    assert_eq!(env.ledger.send_calls(), 0);
    assert_eq!(env.status_text(), Some("Estimated fee: 0.00002036 KAS"));

    // Editing the form invalidates the estimate.
    env.fill_transfer(RECIPIENT, "3");
    assert!(env.session.fee_preview.is_none());
}

#[tokio::test]
async fn test_broadcast_returns_canister_id() {
    let mut env = logged_in().await;
    let handle = env.session.handle.clone().unwrap();

    let tx_id = env.client.broadcast(&handle, " 0100deadbeef\n").await.unwrap();
    env.drain();

    assert_eq!(tx_id, "b7e1f00d");
    assert_eq!(*env.ledger.broadcasts.lock().unwrap(), vec!["0100deadbeef"]);
    assert_eq!(env.status_text(), Some("Transaction broadcast: b7e1f00d"));

    let err = env.client.broadcast(&handle, "  ").await.unwrap_err();
    assert!(matches!(err, WalletError::Validation(_)));
    assert_eq!(env.ledger.broadcasts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_busy_flag_blocks_overlapping_operations() {
    let mut env = logged_in().await;

    assert!(env.session.try_begin());
    assert!(!env.session.try_begin());

    let guard = BusyGuard::new(env.client.events().clone());
    let task = tokio::spawn(async move {
        let _guard = guard;
        panic!("operation aborted");
    });
    assert!(task.await.is_err());

    env.drain();
    assert!(!env.session.is_busy());
    assert!(env.session.try_begin());
    assert!(env.session.apply(SessionEvent::Idle));
}
