//! Budget accounts behind per-account locks.
//!
//! Every state transition of an account runs inside [`AccountLedger::transact`],
//! which holds that account's lock for the whole read-compute-commit sequence.
//! Captures resolved from several threads in one batch turn therefore serialize
//! per account while touching different accounts in parallel.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use crate::budget::BudgetAccount;

/// An account together with the number of committed transitions it has seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionedAccount {
    pub version: u64,
    pub account: BudgetAccount,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("no budget account for {0}")]
    UnknownAccount(String),
    #[error("budget account {key} changed underneath: expected version {expected}, found {actual}")]
    StaleVersion {
        key: String,
        expected: u64,
        actual: u64,
    },
    #[error("budget account lock poisoned")]
    Poisoned,
}

#[derive(Debug)]
pub struct AccountLedger<K> {
    accounts: HashMap<K, Arc<Mutex<VersionedAccount>>>,
}

impl<K> Default for AccountLedger<K> {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
        }
    }
}

impl<K> AccountLedger<K>
where
    K: Eq + Hash + Copy + fmt::Debug,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account. An existing account under `key` is replaced.
    pub fn open(&mut self, key: K, account: BudgetAccount) {
        self.accounts.insert(
            key,
            Arc::new(Mutex::new(VersionedAccount {
                version: 0,
                account,
            })),
        );
    }

    pub fn snapshot(&self, key: K) -> Result<VersionedAccount, LedgerError> {
        Ok(*self.lock(key)?)
    }

    /// Run `f` against the current account under its lock.
    ///
    /// `f` returns the next account state together with its own result. The new
    /// state is committed only when `f` succeeds; on error the account is untouched.
    pub fn transact<R, E>(
        &self,
        key: K,
        f: impl FnOnce(BudgetAccount) -> Result<(BudgetAccount, R), E>,
    ) -> Result<R, E>
    where
        E: From<LedgerError>,
    {
        let mut guard = self.lock(key)?;
        let (next, result) = f(guard.account)?;
        if next != guard.account {
            guard.account = next;
            guard.version += 1;
        }
        Ok(result)
    }

    /// Optimistic commit: replace the account only if nobody committed since
    /// `expected_version` was read.
    pub fn compare_and_swap(
        &self,
        key: K,
        expected_version: u64,
        next: BudgetAccount,
    ) -> Result<VersionedAccount, LedgerError> {
        let mut guard = self.lock(key)?;
        if guard.version != expected_version {
            return Err(LedgerError::StaleVersion {
                key: format!("{key:?}"),
                expected: expected_version,
                actual: guard.version,
            });
        }
        if next != guard.account {
            guard.account = next;
            guard.version += 1;
        }
        Ok(*guard)
    }

    fn lock(&self, key: K) -> Result<MutexGuard<'_, VersionedAccount>, LedgerError> {
        let cell = self
            .accounts
            .get(&key)
            .ok_or_else(|| LedgerError::UnknownAccount(format!("{key:?}")))?;
        cell.lock().map_err(|_| LedgerError::Poisoned)
    }
}
