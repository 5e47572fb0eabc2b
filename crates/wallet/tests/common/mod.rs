#![allow(dead_code)]

use std::collections::HashMap;

use aurum_crypto::{derive_key_image, generate_keys, private_keys_to_address};
use aurum_primitives::{
    Hash256, KeyDerivation, KeyImage, PublicKey, SecretKey, Transaction, TransactionInput,
};
use aurum_wallet::SubWalletContainer;

pub struct TestWallet {
    pub container: SubWalletContainer,
    pub primary_key: PublicKey,
    pub view_key: SecretKey,
    pub address: String,
}

pub fn new_full_wallet() -> TestWallet {
    new_full_wallet_with_scan_height(0)
}

pub fn new_full_wallet_with_scan_height(scan_height: u64) -> TestWallet {
    let (primary_key, spend_key) = generate_keys();
    let (_, view_key) = generate_keys();
    let address = private_keys_to_address(&spend_key, &view_key).expect("valid keys");
    let container =
        SubWalletContainer::new(spend_key, view_key, address.clone(), scan_height, false)
            .expect("container");
    TestWallet {
        container,
        primary_key,
        view_key,
        address,
    }
}

pub fn raw_input(tag: u8, amount: u64, block_height: u64) -> TransactionInput {
    TransactionInput {
        key_image: None,
        amount,
        block_height,
        transaction_public_key: PublicKey::from_bytes([0xcc; 32]),
        transaction_index: u64::from(tag),
        global_output_index: u64::from(tag),
        key: PublicKey::from_bytes([tag.wrapping_add(50); 32]),
        spend_height: 0,
        unlock_time: 0,
        parent_transaction_hash: Hash256::from_bytes([tag; 32]),
        is_coinbase: false,
        locked_by: None,
    }
}

/// Feed one discovered output into the primary sub-wallet and return the
/// key image the container derived for it.
pub fn store_input(wallet: &TestWallet, tag: u8, amount: u64, block_height: u64) -> KeyImage {
    store_input_for(wallet, wallet.primary_key, tag, amount, block_height)
}

pub fn store_input_for(
    wallet: &TestWallet,
    public_spend_key: PublicKey,
    tag: u8,
    amount: u64,
    block_height: u64,
) -> KeyImage {
    let derivation = KeyDerivation::from_bytes([tag; 32]);
    wallet
        .container
        .complete_and_store_transaction_input(
            public_spend_key,
            &derivation,
            0,
            raw_input(tag, amount, block_height),
        )
        .expect("input stored");

    let owner = wallet
        .container
        .get_key_image_owner(&expected_key_image(wallet, public_spend_key, tag))
        .expect("input owned after store");
    assert_eq!(owner, public_spend_key);

    expected_key_image(wallet, public_spend_key, tag)
}

fn expected_key_image(wallet: &TestWallet, public_spend_key: PublicKey, tag: u8) -> KeyImage {
    let derivation = KeyDerivation::from_bytes([tag; 32]);
    let spend_keys = wallet
        .container
        .get_private_spend_keys()
        .expect("full wallet");
    let ordered_keys = wallet.container.get_public_spend_keys();
    let position = ordered_keys
        .iter()
        .position(|key| *key == public_spend_key)
        .expect("known sub-wallet");
    derive_key_image(&derivation, 0, &public_spend_key, &spend_keys[position])
        .expect("derivable key image")
}

pub fn confirmed_tx(tag: u8, block_height: u64) -> Transaction {
    Transaction {
        transfers: HashMap::new(),
        hash: Hash256::from_bytes([tag; 32]),
        fee: 10,
        block_height,
        timestamp: 1_600_000_000,
        payment_id: String::new(),
        unlock_time: 0,
        is_coinbase: false,
    }
}
