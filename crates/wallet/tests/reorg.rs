mod common;

use std::collections::HashSet;

use aurum_primitives::Hash256;

use common::{confirmed_tx, new_full_wallet, store_input};

#[test]
fn fork_rollback_drops_and_unspends_inputs() {
    let wallet = new_full_wallet();
    let spent_early = store_input(&wallet, 1, 100, 10);
    store_input(&wallet, 2, 200, 20);
    store_input(&wallet, 3, 300, 30);

    // The early input was spent on the section about to be orphaned.
    wallet
        .container
        .mark_input_as_spent(&spent_early, &wallet.primary_key, 25)
        .expect("spend");
    assert_eq!(
        wallet
            .container
            .get_balance(&[], true, 100)
            .expect("balance"),
        (500, 0)
    );

    wallet.container.remove_forked_transactions(20);

    // Only the height-10 input survives, and its spend is rolled back.
    assert_eq!(
        wallet
            .container
            .get_balance(&[], true, 100)
            .expect("balance"),
        (100, 0)
    );
    let (inputs, found) = wallet
        .container
        .get_transaction_inputs_for_amount(100, true, &[])
        .expect("selection");
    assert_eq!(found, 100);
    assert_eq!(inputs[0].input.key_image, Some(spent_early));
    assert_eq!(inputs[0].input.spend_height, 0);
}

#[test]
fn fork_rollback_removes_every_affected_journal_entry() {
    let wallet = new_full_wallet();
    wallet.container.add_transaction(confirmed_tx(1, 10));
    wallet.container.add_transaction(confirmed_tx(2, 20));
    wallet.container.add_transaction(confirmed_tx(3, 20));
    wallet.container.add_transaction(confirmed_tx(4, 30));

    wallet.container.remove_forked_transactions(20);

    let remaining = wallet.container.get_transactions();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].block_height, 10);
}

#[test]
fn fork_rollback_then_replay_matches_never_having_forked() {
    let wallet = new_full_wallet();
    store_input(&wallet, 1, 100, 10);
    wallet.container.add_transaction(confirmed_tx(1, 10));

    // Snapshot before anything above height 20 ever happened.
    let untouched = wallet.container.clone();

    store_input(&wallet, 2, 200, 25);
    wallet.container.add_transaction(confirmed_tx(2, 25));
    wallet.container.remove_forked_transactions(20);

    assert_eq!(
        wallet.container.get_transactions(),
        untouched.get_transactions()
    );
    assert_eq!(
        wallet.container.get_balance(&[], true, 100).expect("balance"),
        untouched.get_balance(&[], true, 100).expect("balance")
    );

    // Replaying the dropped section converges to the same state either way.
    store_input(&wallet, 2, 200, 25);
    wallet.container.add_transaction(confirmed_tx(2, 25));
    assert_eq!(
        wallet.container.get_balance(&[], true, 100).expect("balance"),
        (300, 0)
    );
    assert_eq!(wallet.container.get_transactions().len(), 2);
}

#[test]
fn cancellation_releases_exactly_the_cancelled_locks() {
    let wallet = new_full_wallet();
    let first = store_input(&wallet, 1, 100, 10);
    let second = store_input(&wallet, 2, 200, 10);

    let hash_a = Hash256::from_bytes([0xaa; 32]);
    let hash_b = Hash256::from_bytes([0xbb; 32]);

    let mut tx_a = confirmed_tx(0xaa, 0);
    tx_a.hash = hash_a;
    let mut tx_b = confirmed_tx(0xbb, 0);
    tx_b.hash = hash_b;
    wallet.container.add_unconfirmed_transaction(tx_a);
    wallet.container.add_unconfirmed_transaction(tx_b);

    wallet
        .container
        .mark_input_as_locked(&first, &wallet.primary_key, hash_a)
        .expect("lock");
    wallet
        .container
        .mark_input_as_locked(&second, &wallet.primary_key, hash_b)
        .expect("lock");
    assert_eq!(
        wallet
            .container
            .get_balance(&[], true, 100)
            .expect("balance"),
        (0, 300)
    );

    wallet
        .container
        .remove_cancelled_transactions(&HashSet::from([hash_a]))
        .expect("cancel");

    assert_eq!(
        wallet
            .container
            .get_locked_transaction_hashes()
            .expect("full wallet"),
        HashSet::from([hash_b])
    );
    assert_eq!(
        wallet
            .container
            .get_balance(&[], true, 100)
            .expect("balance"),
        (100, 200)
    );
}

#[test]
fn confirmed_spend_clears_the_lock() {
    let wallet = new_full_wallet();
    let key_image = store_input(&wallet, 1, 100, 10);
    let tx_hash = Hash256::from_bytes([0x77; 32]);

    wallet
        .container
        .mark_input_as_locked(&key_image, &wallet.primary_key, tx_hash)
        .expect("lock");
    wallet
        .container
        .mark_input_as_spent(&key_image, &wallet.primary_key, 50)
        .expect("spend");

    // Spent inputs contribute to neither balance and cannot be selected.
    assert_eq!(
        wallet
            .container
            .get_balance(&[], true, 100)
            .expect("balance"),
        (0, 0)
    );
    assert!(wallet
        .container
        .get_transaction_inputs_for_amount(1, true, &[])
        .is_err());
}

#[test]
fn reset_keeps_state_below_the_scan_height() {
    let wallet = new_full_wallet();
    let early = store_input(&wallet, 1, 100, 10);
    store_input(&wallet, 2, 200, 60);
    wallet.container.add_transaction(confirmed_tx(1, 10));
    wallet.container.add_transaction(confirmed_tx(2, 60));
    wallet
        .container
        .mark_input_as_locked(&early, &wallet.primary_key, Hash256::from_bytes([5; 32]))
        .expect("lock");

    wallet.container.reset(50);

    // The late input and journal entry are gone; the early lock released.
    assert_eq!(wallet.container.get_transactions().len(), 1);
    assert_eq!(
        wallet
            .container
            .get_balance(&[], true, 100)
            .expect("balance"),
        (100, 0)
    );
}
