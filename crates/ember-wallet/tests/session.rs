//! Session lifecycle, network switching, and balance behaviour.

mod common;

use common::*;
use ember_wallet::{
    Direction, FileStore, SecretPhrase, Session, SessionConfig, WalletError, CURRENT_NETWORK_KEY,
    WALLET_DATA_KEY,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[tokio::test]
async fn test_create_lock_unlock_round_trip() {
    let fx = Fixture::new();
    let session = fx.session();
    assert!(!session.has_account().unwrap());

    let created = session
        .create_wallet(Some(SecretPhrase::from(DEV_PHRASE)), PIN)
        .await
        .unwrap();
    assert_eq!(created.address, DEV_ADDRESS);
    assert_eq!(created.network, "sepolia");
    assert!(created.can_sign);
    assert!(session.has_account().unwrap());

    fx.chain("sepolia").set_balance(DEV_ADDRESS, 2 * ONE_ETH);
    session.lock();
    assert!(!session.is_unlocked());
    assert!(!session.can_sign());
    assert_eq!(session.address().as_deref(), Some(DEV_ADDRESS));
    assert_eq!(session.balance(), None);
    assert!(session.history().is_empty());

    let unlocked = session.unlock(PIN).await.unwrap();
    assert_eq!(unlocked.address, DEV_ADDRESS);
    assert_eq!(unlocked.network, "sepolia");
    assert_eq!(unlocked.balance, dec("2"));
    assert!(session.can_sign());

    // A brand-new session over the same store sees the same account.
    let other = fx.session();
    let again = other.unlock(PIN).await.unwrap();
    assert_eq!(again.address, DEV_ADDRESS);
    assert_eq!(again.balance, dec("2"));
}

#[tokio::test]
async fn test_generated_wallet() {
    let fx = Fixture::new();
    let session = fx.session();
    let (phrase, address) = session.generate_mnemonic().unwrap();
    assert!(!session.has_account().unwrap());

    let created = session.create_wallet(Some(phrase), PIN).await.unwrap();
    assert_eq!(created.address, address);

    let fresh = Fixture::new().session().create_wallet(None, "0000").await.unwrap();
    assert!(fresh.address.starts_with("0x"));
    assert_eq!(fresh.address.len(), 42);
}

#[tokio::test]
async fn test_wrong_pin_changes_nothing() {
    let fx = Fixture::new();
    let session = fx.session();
    session
        .create_wallet(Some(SecretPhrase::from(DEV_PHRASE)), PIN)
        .await
        .unwrap();
    session.lock();
    let before = fx.stored(WALLET_DATA_KEY);
    let calls = fx.connector.total_calls();

    let err = session.unlock("0000").await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidPin));
    assert!(!session.is_unlocked());
    assert_eq!(fx.stored(WALLET_DATA_KEY), before);
    assert_eq!(fx.connector.total_calls(), calls);
}

#[tokio::test]
async fn test_unlock_without_account() {
    let fx = Fixture::new();
    let err = fx.session().unlock(PIN).await.unwrap_err();
    assert!(matches!(err, WalletError::NoAccount));
}

#[tokio::test]
async fn test_create_rejects_bad_pin_and_phrase() {
    let fx = Fixture::new();
    let session = fx.session();
    for pin in ["123", "12345", "abcd", ""] {
        let err = session
            .create_wallet(Some(SecretPhrase::from(DEV_PHRASE)), pin)
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::InvalidPin), "pin {:?}", pin);
    }
    let err = session
        .create_wallet(Some(SecretPhrase::from("not a real phrase")), PIN)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidMnemonic(_)));
    assert!(!session.has_account().unwrap());
    assert!(!session.is_unlocked());
}

#[tokio::test]
async fn test_recover_normalizes_phrase() {
    let fx = Fixture::new();
    let session = fx.session();
    let messy = "  TEST test\ttest test  test test test test test test test JUNK\n";
    let unlocked = session.recover_wallet(messy, PIN).await.unwrap();
    assert_eq!(unlocked.address, DEV_ADDRESS);
    assert_eq!(fx.stored_json()["mnemonic"], DEV_PHRASE);
}

#[tokio::test]
async fn test_invalid_recovery_keeps_existing_record() {
    let fx = Fixture::new();
    let session = fx.session();
    session
        .create_wallet(Some(SecretPhrase::from(DEV_PHRASE)), PIN)
        .await
        .unwrap();
    let before = fx.stored(WALLET_DATA_KEY);

    let bad = ["abandon"; 12].join(" ");
    let err = session.recover_wallet(&bad, "9999").await.unwrap_err();
    match err {
        WalletError::InvalidMnemonic(msg) => assert!(!msg.is_empty()),
        other => panic!("expected InvalidMnemonic, got {:?}", other),
    }
    assert_eq!(fx.stored(WALLET_DATA_KEY), before);
    assert_eq!(session.address().as_deref(), Some(DEV_ADDRESS));

    // Valid phrase but bad PIN also persists nothing.
    let err = session.recover_wallet(DEV_PHRASE, "12").await.unwrap_err();
    assert!(matches!(err, WalletError::InvalidPin));
    assert_eq!(fx.stored(WALLET_DATA_KEY), before);
}

#[tokio::test]
async fn test_switch_to_unknown_network() {
    let fx = Fixture::new();
    let session = fx.session();
    session
        .create_wallet(Some(SecretPhrase::from(DEV_PHRASE)), PIN)
        .await
        .unwrap();

    let err = session.switch_network("atlantis").await.unwrap_err();
    assert!(matches!(err, WalletError::UnknownNetwork(ref k) if k == "atlantis"));
    assert_eq!(session.active_network().key, "sepolia");
    assert_eq!(fx.stored(CURRENT_NETWORK_KEY), None);
}

#[tokio::test]
async fn test_switch_persists_across_lock_and_restart() {
    let fx = Fixture::new();
    let session = fx.session();
    session
        .create_wallet(Some(SecretPhrase::from(DEV_PHRASE)), PIN)
        .await
        .unwrap();
    fx.chain("holesky").set_balance(DEV_ADDRESS, ONE_ETH / 4);

    session.switch_network("holesky").await.unwrap();
    assert_eq!(session.active_network().key, "holesky");
    assert_eq!(session.active_network().chain_id, 17000);
    assert_eq!(session.balance(), Some(dec("0.25")));
    assert_eq!(fx.stored(CURRENT_NETWORK_KEY).unwrap(), b"holesky");
    assert_eq!(fx.stored_json()["activeNetwork"], "holesky");

    session.lock();
    let unlocked = session.unlock(PIN).await.unwrap();
    assert_eq!(unlocked.network, "holesky");

    let restarted = fx.session();
    assert_eq!(restarted.active_network().key, "holesky");
}

#[tokio::test]
async fn test_switch_while_locked_is_persisted() {
    let fx = Fixture::new();
    let session = fx.session();
    session.switch_network("mainnet").await.unwrap();
    assert_eq!(fx.stored(CURRENT_NETWORK_KEY).unwrap(), b"mainnet");
    assert!(!session.is_unlocked());
    assert_eq!(fx.session().active_network().key, "mainnet");
}

#[tokio::test]
async fn test_switch_resets_to_starting_balance() {
    let fx = Fixture::new();
    let session = fx.session();
    session
        .create_wallet(Some(SecretPhrase::from(DEV_PHRASE)), PIN)
        .await
        .unwrap();
    fx.chain("sepolia").set_balance(DEV_ADDRESS, 3 * ONE_ETH);
    session.refresh_balance().await;
    assert_eq!(session.balance(), Some(dec("3")));

    // The simulated network has no live node; its seeded balance stands.
    fx.chain("devnet").state.lock().unwrap().fail_balance = true;
    session.switch_network("devnet").await.unwrap();
    assert_eq!(session.balance(), Some(dec("10")));
    assert_eq!(fx.stored_json()["balance"], "10");
}

#[tokio::test]
async fn test_create_on_simulated_network_seeds_balance() {
    let fx = Fixture::new();
    let session = fx.session();
    session.switch_network("devnet").await.unwrap();
    let created = session
        .create_wallet(Some(SecretPhrase::from(DEV_PHRASE)), PIN)
        .await
        .unwrap();
    assert_eq!(created.balance, dec("10"));
}

#[tokio::test]
async fn test_refresh_failure_keeps_previous_balance() {
    let fx = Fixture::new();
    let session = fx.session();
    session
        .create_wallet(Some(SecretPhrase::from(DEV_PHRASE)), PIN)
        .await
        .unwrap();
    let chain = fx.chain("sepolia");
    chain.set_balance(DEV_ADDRESS, ONE_ETH);
    assert_eq!(session.refresh_balance().await, Some(dec("1")));

    chain.state.lock().unwrap().fail_balance = true;
    assert_eq!(session.refresh_balance().await, None);
    assert_eq!(session.balance(), Some(dec("1")));

    // Unlock still succeeds while the node is down.
    session.lock();
    let unlocked = session.unlock(PIN).await.unwrap();
    assert_eq!(unlocked.balance, dec("1"));
}

#[tokio::test]
async fn test_refresh_when_locked_is_a_no_op() {
    let fx = Fixture::new();
    let session = fx.session();
    assert_eq!(session.refresh_balance().await, None);
    assert_eq!(fx.connector.total_calls(), 0);
}

#[tokio::test]
async fn test_legacy_record_unlocks() {
    let fx = Fixture::new();
    let legacy = serde_json::json!({
        "address": DEV_ADDRESS,
        "mnemonic": DEV_PHRASE,
        "pin": "1234",
        "balance": 0.5,
        "history": [
            {"hash": "0xold", "to": OTHER, "amount": 0.1, "date": "2023-05-01T10:00:00Z"}
        ]
    });
    use ember_wallet::Store;
    fx.store
        .set(WALLET_DATA_KEY, &serde_json::to_vec(&legacy).unwrap())
        .unwrap();
    fx.chain("sepolia").state.lock().unwrap().fail_balance = true;

    let session = fx.session();
    let unlocked = session.unlock("1234").await.unwrap();
    assert_eq!(unlocked.address, DEV_ADDRESS);
    assert_eq!(unlocked.balance, dec("0.5"));

    let history = session.visible_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].counterparty, OTHER);
    assert_eq!(history[0].direction, Direction::Sent);
    assert_eq!(history[0].network, None);

    // Untagged records show on every network.
    session.switch_network("mainnet").await.unwrap();
    assert_eq!(session.visible_history().len(), 1);

    // The re-saved record keeps the legacy date text.
    let stored = fx.stored_json();
    assert_eq!(stored["history"][0]["date"], "2023-05-01T10:00:00Z");
    assert_eq!(stored["history"][0]["counterparty"], OTHER);
}

#[tokio::test]
async fn test_record_network_used_when_store_has_none() {
    let fx = Fixture::new();
    let record = serde_json::json!({
        "address": DEV_ADDRESS,
        "mnemonic": DEV_PHRASE,
        "pin": PIN,
        "balance": "0",
        "history": [],
        "activeNetwork": "polygon"
    });
    use ember_wallet::Store;
    fx.store
        .set(WALLET_DATA_KEY, &serde_json::to_vec(&record).unwrap())
        .unwrap();

    let session = fx.session();
    assert_eq!(session.active_network().key, "sepolia");
    let unlocked = session.unlock(PIN).await.unwrap();
    assert_eq!(unlocked.network, "polygon");
}

#[tokio::test]
async fn test_watch_only_record_cannot_sign() {
    let fx = Fixture::new();
    let record = serde_json::json!({
        "address": OTHER,
        "pin": PIN,
        "balance": "7.5",
        "history": []
    });
    use ember_wallet::Store;
    fx.store
        .set(WALLET_DATA_KEY, &serde_json::to_vec(&record).unwrap())
        .unwrap();

    let session = fx.session();
    let unlocked = session.unlock(PIN).await.unwrap();
    assert!(!unlocked.can_sign);
    assert_eq!(unlocked.balance, dec("7.5"));
    assert!(session.is_unlocked());
    assert!(!session.can_sign());
    // No balance query for a watch-only record.
    assert_eq!(fx.connector.total_calls(), 0);

    let err = session.submit(DEV_ADDRESS, "1").await.unwrap_err();
    assert!(matches!(err, WalletError::NotUnlocked));
}

#[tokio::test]
async fn test_mismatched_stored_address_is_corrected() {
    let fx = Fixture::new();
    let record = serde_json::json!({
        "address": OTHER,
        "mnemonic": DEV_PHRASE,
        "pin": PIN,
        "balance": "0",
        "history": []
    });
    use ember_wallet::Store;
    fx.store
        .set(WALLET_DATA_KEY, &serde_json::to_vec(&record).unwrap())
        .unwrap();

    let unlocked = fx.session().unlock(PIN).await.unwrap();
    assert_eq!(unlocked.address, DEV_ADDRESS);
    assert_eq!(fx.stored_json()["address"], DEV_ADDRESS);
}

#[tokio::test]
async fn test_check_transaction() {
    let fx = Fixture::new();
    let chain = fx.chain("sepolia");
    chain.add_block(5, 100, vec![native_tx("0xfeed", OTHER, DEV_ADDRESS, 1)]);
    let session = fx.session();

    let found = session.check_transaction("0xFEED").await.unwrap();
    assert_eq!(found.unwrap().from, OTHER);
    assert!(session.check_transaction("0xbeef").await.unwrap().is_none());
}

#[tokio::test]
async fn test_file_store_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let connector = Arc::new(MockConnector::default());
    let open = || {
        Session::new(
            Arc::new(FileStore::open(dir.path()).unwrap()),
            Arc::new(ember_wallet::MnemonicKeyProvider::new()),
            connector.clone(),
            registry(),
            SessionConfig::default(),
        )
        .unwrap()
    };

    let first = open();
    first
        .create_wallet(Some(SecretPhrase::from(DEV_PHRASE)), PIN)
        .await
        .unwrap();
    first.switch_network("amoy").await.unwrap();
    drop(first);

    let second = open();
    assert_eq!(second.active_network().key, "amoy");
    let unlocked = second.unlock(PIN).await.unwrap();
    assert_eq!(unlocked.address, DEV_ADDRESS);
    assert_eq!(unlocked.network, "amoy");
}
