//! Per-account locking for read-modify-write spans
//!
//! A caller claims every account an operation touches in one step. Claims on
//! disjoint account sets proceed in parallel; overlapping claims wait for each
//! other. Because a claim is all-or-nothing there is no lock ordering to get
//! wrong, so two transfers in opposite directions cannot deadlock.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Condvar, Mutex, PoisonError};

use crate::domain::result::{Error, Result};

/// Registry of accounts currently claimed by in-flight operations
#[derive(Debug, Default)]
pub struct AccountLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until all named accounts are free, then claim them
    ///
    /// Duplicate names are claimed once. The claim is released when the
    /// returned guard is dropped.
    pub fn lock<'a, I, S>(&'a self, usernames: I) -> Result<AccountGuard<'a>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted: BTreeSet<String> = usernames
            .into_iter()
            .map(|u| u.as_ref().to_string())
            .collect();

        let mut held = self
            .held
            .lock()
            .map_err(|_| Error::database("account lock registry poisoned"))?;
        while wanted.iter().any(|u| held.contains(u)) {
            held = self
                .released
                .wait(held)
                .map_err(|_| Error::database("account lock registry poisoned"))?;
        }
        held.extend(wanted.iter().cloned());

        Ok(AccountGuard {
            locks: self,
            usernames: wanted,
        })
    }

    /// Number of accounts currently claimed
    pub fn held_count(&self) -> usize {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Claim on a set of accounts, released on drop
#[derive(Debug)]
pub struct AccountGuard<'a> {
    locks: &'a AccountLocks,
    usernames: BTreeSet<String>,
}

impl AccountGuard<'_> {
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.usernames.iter().map(String::as_str)
    }
}

impl Drop for AccountGuard<'_> {
    fn drop(&mut self) {
        // Release even if another holder panicked; the set itself stays valid
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for username in &self.usernames {
            held.remove(username);
        }
        drop(held);
        self.locks.released.notify_all();
    }
}
