//! The sub-wallet container.
//!
//! Owns every sub-wallet sharing one private view key, the transaction
//! journal, and the view-wallet flag. All state sits behind a single mutex:
//! the scanner thread and the sender thread call into the same container
//! concurrently, and each public operation is one critical section. Nothing
//! here performs I/O while holding the lock.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use aurum_consensus::constants::{
    FUSION_TX_MAX_SIZE, FUSION_TX_MIN_INPUT_COUNT, FUSION_TX_MIN_IN_OUT_COUNT_RATIO,
};
use aurum_consensus::currency::{
    approximate_maximum_input_count, current_adjusted_timestamp, scan_height_to_timestamp,
};
use aurum_crypto::{
    generate_keys, private_keys_to_address, public_keys_to_address, secret_key_to_public_key,
};
use aurum_log::{debug, info, warn};
use aurum_primitives::{
    address_to_keys, Hash256, KeyDerivation, KeyImage, PublicKey, SecretKey, Transaction,
    TransactionInput, TxInputAndOwner,
};
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::errors::WalletError;
use crate::journal::TransactionJournal;
use crate::sub_wallet::SubWallet;

/// Result of fusion input selection. Unlike standard selection this never
/// fails for lack of funds; the caller decides whether the haul is worth a
/// fusion transaction.
#[derive(Clone, Debug)]
pub struct FusionInputs {
    pub inputs: Vec<TxInputAndOwner>,
    pub max_input_count: u64,
    pub found_money: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ContainerState {
    /// Sub-wallets keyed by public spend key.
    sub_wallets: HashMap<PublicKey, SubWallet>,

    /// Spend keys in creation order, for "take from all" operations.
    public_spend_keys: Vec<PublicKey>,

    journal: TransactionJournal,
}

pub struct SubWalletContainer {
    state: Mutex<ContainerState>,
    private_view_key: SecretKey,
    is_view_wallet: bool,
}

impl Clone for SubWalletContainer {
    fn clone(&self) -> Self {
        Self {
            state: Mutex::new(self.state().clone()),
            private_view_key: self.private_view_key,
            is_view_wallet: self.is_view_wallet,
        }
    }
}

impl Drop for SubWalletContainer {
    fn drop(&mut self) {
        self.private_view_key.zeroize();
    }
}

impl SubWalletContainer {
    /// Create a full wallet container. The given address becomes the
    /// primary sub-wallet; a fresh wallet's sync start is stamped with the
    /// adjusted wall clock so the first scan starts just before creation.
    pub fn new(
        mut private_spend_key: SecretKey,
        private_view_key: SecretKey,
        address: String,
        scan_height: u64,
        new_wallet: bool,
    ) -> Result<Self, WalletError> {
        let public_spend_key = secret_key_to_public_key(&private_spend_key)?;
        let timestamp = if new_wallet {
            current_adjusted_timestamp()
        } else {
            0
        };

        let primary = SubWallet::new(
            public_spend_key,
            private_spend_key,
            address,
            scan_height,
            timestamp,
            true,
        );
        private_spend_key.zeroize();

        Ok(Self::from_primary(primary, private_view_key, false))
    }

    /// Create a view-only container from the private view key and the
    /// wallet's public address.
    pub fn new_view(
        private_view_key: SecretKey,
        address: String,
        scan_height: u64,
        new_wallet: bool,
    ) -> Result<Self, WalletError> {
        let (public_spend_key, _public_view_key) = address_to_keys(&address)?;
        let timestamp = if new_wallet {
            current_adjusted_timestamp()
        } else {
            0
        };

        let primary =
            SubWallet::new_view(public_spend_key, address, scan_height, timestamp, true);

        Ok(Self::from_primary(primary, private_view_key, true))
    }

    fn from_primary(
        primary: SubWallet,
        private_view_key: SecretKey,
        is_view_wallet: bool,
    ) -> Self {
        let public_spend_key = primary.public_spend_key();
        let state = ContainerState {
            sub_wallets: HashMap::from([(public_spend_key, primary)]),
            public_spend_keys: vec![public_spend_key],
            journal: TransactionJournal::new(),
        };
        Self {
            state: Mutex::new(state),
            private_view_key,
            is_view_wallet,
        }
    }

    pub fn is_view_wallet(&self) -> bool {
        self.is_view_wallet
    }

    /// The shared private view key, scrubbed when the caller drops it.
    pub fn get_private_view_key(&self) -> Zeroizing<SecretKey> {
        Zeroizing::new(self.private_view_key)
    }

    /// Generate a fresh sub-wallet. Its scan starts now: a key that never
    /// existed cannot have history.
    pub fn add_sub_wallet(&self) -> Result<String, WalletError> {
        self.require_spend_capability()?;

        let (public_spend_key, mut private_spend_key) = generate_keys();
        let address = private_keys_to_address(&private_spend_key, &self.private_view_key)?;

        let mut state = self.state();
        let sub_wallet = SubWallet::new(
            public_spend_key,
            private_spend_key,
            address.clone(),
            0,
            current_adjusted_timestamp(),
            false,
        );
        private_spend_key.zeroize();
        state.sub_wallets.insert(public_spend_key, sub_wallet);
        state.public_spend_keys.push(public_spend_key);

        debug!("created sub-wallet {public_spend_key}");
        Ok(address)
    }

    /// Import an existing spend key as a sub-wallet.
    pub fn import_sub_wallet(
        &self,
        mut private_spend_key: SecretKey,
        scan_height: u64,
        new_wallet: bool,
    ) -> Result<String, WalletError> {
        self.require_spend_capability()?;

        let public_spend_key = secret_key_to_public_key(&private_spend_key)?;
        let address = private_keys_to_address(&private_spend_key, &self.private_view_key)?;
        let timestamp = if new_wallet {
            current_adjusted_timestamp()
        } else {
            0
        };

        let mut state = self.state();
        if state.sub_wallets.contains_key(&public_spend_key) {
            private_spend_key.zeroize();
            return Err(WalletError::SubWalletAlreadyExists);
        }

        let sub_wallet = SubWallet::new(
            public_spend_key,
            private_spend_key,
            address.clone(),
            scan_height,
            timestamp,
            false,
        );
        private_spend_key.zeroize();
        state.sub_wallets.insert(public_spend_key, sub_wallet);
        state.public_spend_keys.push(public_spend_key);

        debug!("imported sub-wallet {public_spend_key}");
        Ok(address)
    }

    /// Import a watch-only sub-wallet by public spend key. Only valid on a
    /// view container; a full container must never mix in keyless wallets.
    pub fn import_view_sub_wallet(
        &self,
        public_spend_key: PublicKey,
        scan_height: u64,
        new_wallet: bool,
    ) -> Result<String, WalletError> {
        if !self.is_view_wallet {
            return Err(WalletError::IllegalNonViewWalletOperation);
        }

        let public_view_key = secret_key_to_public_key(&self.private_view_key)?;
        let address = public_keys_to_address(&public_spend_key, &public_view_key);
        let timestamp = if new_wallet {
            current_adjusted_timestamp()
        } else {
            0
        };

        let mut state = self.state();
        if state.sub_wallets.contains_key(&public_spend_key) {
            return Err(WalletError::SubWalletAlreadyExists);
        }

        let sub_wallet = SubWallet::new_view(
            public_spend_key,
            address.clone(),
            scan_height,
            timestamp,
            false,
        );
        state.sub_wallets.insert(public_spend_key, sub_wallet);
        state.public_spend_keys.push(public_spend_key);

        debug!("imported view sub-wallet {public_spend_key}");
        Ok(address)
    }

    /// The height and timestamp to begin the initial sync from; at most one
    /// of the pair is nonzero. Each sub-wallet pins its start with either a
    /// height or a timestamp, and the container must sync from the earliest
    /// point any of them needs.
    pub fn get_min_initial_sync_start(&self) -> (u64, u64) {
        let state = self.state();

        let mut min_height: Option<u64> = None;
        let mut min_timestamp: Option<u64> = None;

        for sub_wallet in state.sub_wallets.values() {
            let height = sub_wallet.sync_start_height();
            let timestamp = sub_wallet.sync_start_timestamp();

            // A sub-wallet with neither pin needs everything from genesis.
            if height == 0 && timestamp == 0 {
                return (0, 0);
            }
            if height != 0 {
                min_height = Some(min_height.map_or(height, |min| min.min(height)));
            }
            if timestamp != 0 {
                min_timestamp = Some(min_timestamp.map_or(timestamp, |min| min.min(timestamp)));
            }
        }

        match (min_height, min_timestamp) {
            (Some(height), Some(timestamp)) => {
                if scan_height_to_timestamp(height) < timestamp {
                    (height, 0)
                } else {
                    (0, timestamp)
                }
            }
            (Some(height), None) => (height, 0),
            (None, Some(timestamp)) => (0, timestamp),
            (None, None) => (0, 0),
        }
    }

    /// Record a transaction the user submitted, pending confirmation.
    pub fn add_unconfirmed_transaction(&self, transaction: Transaction) {
        self.state().journal.add_unconfirmed(transaction);
    }

    /// Record a transaction the scanner observed in a block. A matching
    /// submission in the locked list is collapsed into it atomically.
    pub fn add_transaction(&self, transaction: Transaction) {
        self.state().journal.add_confirmed(transaction);
    }

    /// Finalize an output the scanner attributed to `public_spend_key` and
    /// store it in that sub-wallet's ledger. Outputs for unknown keys are
    /// dropped: the scanner may race a rescan that removed the sub-wallet's
    /// history.
    pub fn complete_and_store_transaction_input(
        &self,
        public_spend_key: PublicKey,
        derivation: &KeyDerivation,
        output_index: u64,
        input: TransactionInput,
    ) -> Result<(), WalletError> {
        let mut state = self.state();
        match state.sub_wallets.get_mut(&public_spend_key) {
            Some(sub_wallet) => sub_wallet.complete_and_store_input(
                derivation,
                output_index,
                input,
                self.is_view_wallet,
            ),
            None => {
                warn!("discovered output for unknown sub-wallet {public_spend_key}");
                Ok(())
            }
        }
    }

    /// Which sub-wallet, if any, owns this key image. View wallets track no
    /// key images and always answer `None`.
    pub fn get_key_image_owner(&self, key_image: &KeyImage) -> Option<PublicKey> {
        if self.is_view_wallet {
            return None;
        }

        let state = self.state();
        state
            .sub_wallets
            .values()
            .find(|sub_wallet| sub_wallet.has_key_image(key_image))
            .map(|sub_wallet| sub_wallet.public_spend_key())
    }

    /// Pick inputs worth at least `amount` from the given sub-wallets (or
    /// all of them). Inputs are shuffled with OS entropy before
    /// accumulation so the selection leaks nothing about wallet structure.
    ///
    /// The caller must lock the returned inputs promptly; between this call
    /// and `mark_input_as_locked` another selection can observe them.
    pub fn get_transaction_inputs_for_amount(
        &self,
        amount: u64,
        take_from_all: bool,
        sub_wallets_to_take_from: &[PublicKey],
    ) -> Result<(Vec<TxInputAndOwner>, u64), WalletError> {
        self.require_spend_capability()?;

        let state = self.state();
        let mut available =
            self.collect_spendable_inputs(&state, take_from_all, sub_wallets_to_take_from)?;
        available.shuffle(&mut OsRng);

        let mut inputs = Vec::new();
        let mut found_money = 0u64;

        for entry in available {
            if found_money >= amount {
                break;
            }
            found_money = found_money.saturating_add(entry.input.amount);
            inputs.push(entry);
        }

        if found_money < amount {
            return Err(WalletError::NotEnoughFunds);
        }
        Ok((inputs, found_money))
    }

    /// Pick inputs for a fusion transaction: shuffle, bucket by decimal
    /// magnitude, prefer one full bucket of same-magnitude inputs, and stop
    /// at the size-derived input budget.
    pub fn get_fusion_transaction_inputs(
        &self,
        take_from_all: bool,
        sub_wallets_to_take_from: &[PublicKey],
        mixin: u64,
    ) -> Result<FusionInputs, WalletError> {
        self.require_spend_capability()?;

        let state = self.state();
        let mut available =
            self.collect_spendable_inputs(&state, take_from_all, sub_wallets_to_take_from)?;

        let max_input_count = approximate_maximum_input_count(
            FUSION_TX_MAX_SIZE,
            FUSION_TX_MIN_IN_OUT_COUNT_RATIO,
            mixin,
        );

        available.shuffle(&mut OsRng);

        let mut buckets = bucket_inputs_by_magnitude(available);
        let mut full = full_bucket_magnitudes(&buckets, FUSION_TX_MIN_INPUT_COUNT);

        let buckets_to_take_from: Vec<Vec<TxInputAndOwner>> = if full.is_empty() {
            buckets.into_values().collect()
        } else {
            full.shuffle(&mut OsRng);
            let magnitude = full[0];
            buckets.remove(&magnitude).into_iter().collect()
        };

        let mut inputs = Vec::new();
        let mut found_money = 0u64;

        'outer: for bucket in buckets_to_take_from {
            for entry in bucket {
                if inputs.len() as u64 >= max_input_count {
                    break 'outer;
                }
                found_money = found_money.saturating_add(entry.input.amount);
                inputs.push(entry);
            }
        }

        Ok(FusionInputs {
            inputs,
            max_input_count,
            found_money,
        })
    }

    /// `(unlocked, locked)` totals over the given sub-wallets at the given
    /// chain height.
    pub fn get_balance(
        &self,
        sub_wallets_to_take_from: &[PublicKey],
        take_from_all: bool,
        current_height: u64,
    ) -> Result<(u64, u64), WalletError> {
        let state = self.state();
        let targets = self.resolve_targets(&state, take_from_all, sub_wallets_to_take_from);

        let mut unlocked_total = 0u64;
        let mut locked_total = 0u64;

        for public_spend_key in &targets {
            let sub_wallet = state
                .sub_wallets
                .get(public_spend_key)
                .ok_or(WalletError::SubWalletNotFound)?;
            let (unlocked, locked) = sub_wallet.balance(current_height);
            unlocked_total = unlocked_total.saturating_add(unlocked);
            locked_total = locked_total.saturating_add(locked);
        }

        Ok((unlocked_total, locked_total))
    }

    /// The address the container was created with.
    pub fn get_primary_address(&self) -> Result<String, WalletError> {
        let state = self.state();
        state
            .sub_wallets
            .values()
            .find(|sub_wallet| sub_wallet.is_primary_address())
            .map(|sub_wallet| sub_wallet.address().to_string())
            .ok_or(WalletError::NoPrimaryAddress)
    }

    /// The primary sub-wallet's spend key, scrubbed when the caller drops
    /// it.
    pub fn get_primary_private_spend_key(&self) -> Result<Zeroizing<SecretKey>, WalletError> {
        self.require_spend_capability()?;

        let state = self.state();
        let primary = state
            .sub_wallets
            .values()
            .find(|sub_wallet| sub_wallet.is_primary_address())
            .ok_or(WalletError::NoPrimaryAddress)?;
        primary
            .private_spend_key()
            .copied()
            .map(Zeroizing::new)
            .ok_or(WalletError::IllegalViewWalletOperation)
    }

    /// Every sub-wallet's spend key in creation order, scrubbed when the
    /// caller drops the collection.
    pub fn get_private_spend_keys(&self) -> Result<Zeroizing<Vec<SecretKey>>, WalletError> {
        self.require_spend_capability()?;

        let state = self.state();
        Ok(Zeroizing::new(
            state
                .public_spend_keys
                .iter()
                .filter_map(|key| state.sub_wallets.get(key))
                .filter_map(|sub_wallet| sub_wallet.private_spend_key().copied())
                .collect(),
        ))
    }

    /// Record that a submitted transaction spends this input. The input can
    /// no longer be selected until the spend confirms or is cancelled.
    pub fn mark_input_as_locked(
        &self,
        key_image: &KeyImage,
        public_spend_key: &PublicKey,
        tx_hash: Hash256,
    ) -> Result<(), WalletError> {
        self.require_spend_capability()?;

        let mut state = self.state();
        state
            .sub_wallets
            .get_mut(public_spend_key)
            .ok_or(WalletError::SubWalletNotFound)?
            .mark_input_as_locked(key_image, tx_hash);
        Ok(())
    }

    /// Record a spend the scanner confirmed on-chain.
    pub fn mark_input_as_spent(
        &self,
        key_image: &KeyImage,
        public_spend_key: &PublicKey,
        spend_height: u64,
    ) -> Result<(), WalletError> {
        self.require_spend_capability()?;

        let mut state = self.state();
        state
            .sub_wallets
            .get_mut(public_spend_key)
            .ok_or(WalletError::SubWalletNotFound)?
            .mark_input_as_spent(key_image, spend_height);
        Ok(())
    }

    /// Roll back everything a chain reorganization at `fork_height`
    /// invalidated: confirmed journal entries and the inputs received or
    /// spent on the orphaned section.
    pub fn remove_forked_transactions(&self, fork_height: u64) {
        info!("rolling wallet state back to height {fork_height}");

        let mut state = self.state();
        state.journal.remove_forked(fork_height);
        for sub_wallet in state.sub_wallets.values_mut() {
            sub_wallet.remove_forked_inputs(fork_height);
        }
    }

    /// Drop cancelled submissions and release the inputs they had locked.
    pub fn remove_cancelled_transactions(
        &self,
        cancelled: &HashSet<Hash256>,
    ) -> Result<(), WalletError> {
        self.require_spend_capability()?;

        debug!("removing {} cancelled transaction(s)", cancelled.len());

        let mut state = self.state();
        state.journal.remove_cancelled(cancelled);
        for sub_wallet in state.sub_wallets.values_mut() {
            sub_wallet.remove_cancelled_transactions(cancelled);
        }
        Ok(())
    }

    /// Hashes of submitted transactions still awaiting confirmation.
    pub fn get_locked_transaction_hashes(&self) -> Result<HashSet<Hash256>, WalletError> {
        self.require_spend_capability()?;
        Ok(self.state().journal.locked_hashes())
    }

    /// Throw away synced state from `scan_height` upward ahead of a rescan.
    /// In-flight submissions are dropped entirely; the rescan will pick
    /// them up from the pool or a block if they still exist.
    pub fn reset(&self, scan_height: u64) {
        info!("resetting wallet state to scan height {scan_height}");

        let mut state = self.state();
        state.journal.reset(scan_height);
        for sub_wallet in state.sub_wallets.values_mut() {
            sub_wallet.reset(scan_height);
        }
    }

    pub fn get_transactions(&self) -> Vec<Transaction> {
        self.state().journal.confirmed().to_vec()
    }

    /// Outgoing transactions we submitted but have not yet seen in a
    /// block. Incoming pool transactions are not tracked here.
    pub fn get_unconfirmed_transactions(&self) -> Vec<Transaction> {
        self.state().journal.unconfirmed().to_vec()
    }

    /// All sub-wallet addresses in creation order.
    pub fn get_addresses(&self) -> Vec<String> {
        let state = self.state();
        state
            .public_spend_keys
            .iter()
            .filter_map(|key| state.sub_wallets.get(key))
            .map(|sub_wallet| sub_wallet.address().to_string())
            .collect()
    }

    /// All public spend keys in creation order.
    pub fn get_public_spend_keys(&self) -> Vec<PublicKey> {
        self.state().public_spend_keys.clone()
    }

    pub fn get_wallet_count(&self) -> usize {
        self.state().sub_wallets.len()
    }

    fn state(&self) -> MutexGuard<'_, ContainerState> {
        // No operation panics while holding the lock, so a poisoned state
        // is still consistent.
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn require_spend_capability(&self) -> Result<(), WalletError> {
        if self.is_view_wallet {
            return Err(WalletError::IllegalViewWalletOperation);
        }
        Ok(())
    }

    fn resolve_targets(
        &self,
        state: &ContainerState,
        take_from_all: bool,
        sub_wallets_to_take_from: &[PublicKey],
    ) -> Vec<PublicKey> {
        if take_from_all {
            state.public_spend_keys.clone()
        } else {
            sub_wallets_to_take_from.to_vec()
        }
    }

    fn collect_spendable_inputs(
        &self,
        state: &ContainerState,
        take_from_all: bool,
        sub_wallets_to_take_from: &[PublicKey],
    ) -> Result<Vec<TxInputAndOwner>, WalletError> {
        let targets = self.resolve_targets(state, take_from_all, sub_wallets_to_take_from);

        let mut available = Vec::new();
        for public_spend_key in &targets {
            let sub_wallet = state
                .sub_wallets
                .get(public_spend_key)
                .ok_or(WalletError::SubWalletNotFound)?;
            available.extend(sub_wallet.spendable_inputs()?);
        }
        Ok(available)
    }
}

/// Group inputs by `floor(log10(amount))`. Zero amounts cannot occur in
/// practice but would make `log10` blow up, so they land in bucket 0.
pub fn bucket_inputs_by_magnitude(
    inputs: Vec<TxInputAndOwner>,
) -> HashMap<u32, Vec<TxInputAndOwner>> {
    let mut buckets: HashMap<u32, Vec<TxInputAndOwner>> = HashMap::new();
    for entry in inputs {
        let magnitude = entry.input.amount.checked_ilog10().unwrap_or(0);
        buckets.entry(magnitude).or_default().push(entry);
    }
    buckets
}

/// The magnitudes whose buckets hold enough inputs for a fusion
/// transaction.
pub fn full_bucket_magnitudes(
    buckets: &HashMap<u32, Vec<TxInputAndOwner>>,
    min_input_count: usize,
) -> Vec<u32> {
    buckets
        .iter()
        .filter(|(_, bucket)| bucket.len() >= min_input_count)
        .map(|(magnitude, _)| *magnitude)
        .collect()
}
