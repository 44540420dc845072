//! Login, session restore and wallet bootstrap.

use std::sync::atomic::Ordering;

use ii_kaspa_wallet::{
    domain::{
        session::{Phase, WalletPhase},
        status::StatusKind,
    },
    infra::identity::now_ns,
};

use super::{
    TestEnv,
    mocks::{MockLedger, MockProvider, PRINCIPAL, WALLET_ADDRESS, identity},
};

#[tokio::test]
async fn test_fresh_client_offers_login_only() {
    let mut env = TestEnv::new();

    assert!(!env.start().await);

    assert_eq!(env.session.phase, Phase::LoggedOut);
    assert!(!env.session.is_authenticated());
    assert!(env.session.handle.is_none());
    assert_eq!(env.ledger.remote_calls(), 0);
    assert_eq!(env.root_key_fetch_count(), 0);
}

#[tokio::test]
async fn test_login_bootstraps_wallet() {
    let mut env = TestEnv::new();
    env.start().await;

    assert!(env.login().await);

    assert_eq!(env.session.phase, Phase::LoggedIn(WalletPhase::Ready));
    assert_eq!(
        env.session.address.as_ref().map(|a| a.address.as_str()),
        Some(WALLET_ADDRESS)
    );
    assert_eq!(env.session.balance.map(|b| b.total), Some(250_000_000));
    assert_eq!(env.ledger.address_calls(), 1);
    assert_eq!(env.ledger.balance_calls(), 1);

    // Local network: root key fetched exactly once before any call.
    assert_eq!(env.root_key_fetch_count(), 1);

    assert!(env.saw_notice("Connecting to Internet Identity..."));
    assert!(env.saw_notice("Successfully logged in!"));
    assert_eq!(env.status_text(), Some("Wallet ready!"));
    assert_eq!(env.status_kind(), Some(StatusKind::Success));

    assert_eq!(env.session.whoami.as_deref(), Some(PRINCIPAL));
    assert_eq!(env.session.health.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_balance_failure_keeps_address() {
    let mut env = TestEnv::builder()
        .ledger(MockLedger::failing_balance("canister is stopping"))
        .build();

    assert!(env.login().await);

    assert!(env.session.is_authenticated());
    assert_eq!(env.session.phase, Phase::LoggedIn(WalletPhase::Uninitialized));
    assert!(env.session.address.is_some());
    assert!(env.session.balance.is_none());
    assert_eq!(
        env.status_text(),
        Some("Error setting up wallet: canister is stopping")
    );
    assert_eq!(env.status_kind(), Some(StatusKind::Error));
}

#[tokio::test]
async fn test_address_failure_skips_balance() {
    let mut env = TestEnv::builder()
        .ledger(MockLedger::failing_address("key derivation failed"))
        .build();

    assert!(env.login().await);

    assert_eq!(env.session.phase, Phase::LoggedIn(WalletPhase::Uninitialized));
    assert!(env.session.address.is_none());
    assert_eq!(env.ledger.address_calls(), 1);
    assert_eq!(env.ledger.balance_calls(), 0);
    assert_eq!(
        env.status_text(),
        Some("Error setting up wallet: key derivation failed")
    );

    // Refresh needs an address and is a no-op without one.
    assert!(env.refresh().await.is_ok());
    assert_eq!(env.ledger.balance_calls(), 0);
}

#[tokio::test]
async fn test_failed_login_stays_logged_out() {
    let mut env = TestEnv::builder()
        .provider(MockProvider::failing("UserInterrupt"))
        .build();
    env.start().await;

    assert!(!env.login().await);

    assert_eq!(env.session.phase, Phase::LoggedOut);
    assert_eq!(env.status_text(), Some("Login failed: UserInterrupt"));
    assert_eq!(env.root_key_fetch_count(), 0);
    assert_eq!(env.ledger.remote_calls(), 0);
    assert!(env.store.load_identity().unwrap().is_none());
}

#[tokio::test]
async fn test_restored_session_bootstraps_once() {
    let mut env = TestEnv::builder()
        .stored_identity(identity(u64::MAX))
        .build();

    assert!(env.start().await);

    assert_eq!(env.session.phase, Phase::LoggedIn(WalletPhase::Ready));
    assert_eq!(env.ledger.address_calls(), 1);
    assert_eq!(env.authenticate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_expired_session_is_discarded() {
    let mut env = TestEnv::builder()
        .stored_identity(identity(now_ns().saturating_sub(1)))
        .build();

    assert!(!env.start().await);

    assert_eq!(env.session.phase, Phase::LoggedOut);
    assert!(env.store.load_identity().unwrap().is_none());
    assert_eq!(env.ledger.remote_calls(), 0);
}

#[tokio::test]
async fn test_trust_bootstrap_failure_yields_no_handle() {
    let mut env = TestEnv::builder().fail_trust_bootstrap().build();

    assert!(env.login().await);

    assert!(env.session.is_authenticated());
    assert!(env.session.handle.is_none());
    assert_eq!(env.session.phase, Phase::LoggedIn(WalletPhase::Uninitialized));
    assert_eq!(env.root_key_fetch_count(), 1);
    assert_eq!(env.ledger.remote_calls(), 0);
    assert_eq!(
        env.status_text(),
        Some("Could not reach replica: connection refused")
    );
}

#[tokio::test]
async fn test_mainnet_skips_trust_bootstrap() {
    let mut env = TestEnv::builder().network("ic").build();

    assert!(env.login().await);

    assert_eq!(env.root_key_fetch_count(), 0);
    assert_eq!(env.session.phase, Phase::LoggedIn(WalletPhase::Ready));
    assert_eq!(
        env.session.handle.as_ref().map(|h| h.network().to_string()),
        Some("ic".to_string())
    );
}
