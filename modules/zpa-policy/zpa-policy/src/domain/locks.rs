//! Per-scope advisory locks for remote rule lists.
//!
//! Any read-modify-write cycle on one remote rule list (a reconcile, a
//! detach sweep) holds the lock of that list's [`PolicyScope`]. Locks are
//! independent across scopes: two policy types, or the same policy type in
//! two micro-tenants, never block each other.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use zpa_policy_sdk::PolicyScope;

/// Registry of one async mutex per scope, created on first use.
#[derive(Debug, Default)]
pub struct PolicyListLocks {
    locks: DashMap<PolicyScope, Arc<Mutex<()>>>,
}

impl PolicyListLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, scope: &PolicyScope) -> Arc<Mutex<()>> {
        self.locks
            .entry(scope.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Wait for and take the lock of `scope`.
    pub async fn acquire(&self, scope: &PolicyScope) -> PolicyListGuard {
        let guard = self.slot(scope).lock_owned().await;
        PolicyListGuard {
            scope: scope.clone(),
            _guard: guard,
        }
    }

    /// Take the lock of `scope` if nobody holds it.
    #[must_use]
    pub fn try_acquire(&self, scope: &PolicyScope) -> Option<PolicyListGuard> {
        let guard = self.slot(scope).try_lock_owned().ok()?;
        Some(PolicyListGuard {
            scope: scope.clone(),
            _guard: guard,
        })
    }

    /// Number of scopes that have been locked at least once.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held lock on one scope's rule list. Released on drop.
#[derive(Debug)]
pub struct PolicyListGuard {
    scope: PolicyScope,
    _guard: OwnedMutexGuard<()>,
}

impl PolicyListGuard {
    #[must_use]
    pub fn scope(&self) -> &PolicyScope {
        &self.scope
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::time::Duration;
    use zpa_policy_sdk::PolicyType;

    #[tokio::test]
    async fn same_scope_is_exclusive() {
        let locks = PolicyListLocks::new();
        let scope = PolicyScope::new(PolicyType::AccessPolicy);

        let guard = locks.acquire(&scope).await;
        assert_eq!(guard.scope(), &scope);
        assert!(locks.try_acquire(&scope).is_none());

        drop(guard);
        assert!(locks.try_acquire(&scope).is_some());
    }

    #[tokio::test]
    async fn scopes_do_not_block_each_other() {
        let locks = PolicyListLocks::new();
        let access = PolicyScope::new(PolicyType::AccessPolicy);
        let timeout = PolicyScope::new(PolicyType::TimeoutPolicy);
        let access_mt = PolicyScope::new(PolicyType::AccessPolicy).with_microtenant(Some("mt-1"));

        let _a = locks.acquire(&access).await;
        assert!(locks.try_acquire(&timeout).is_some());
        assert!(locks.try_acquire(&access_mt).is_some());
        assert_eq!(locks.len(), 3);
    }

    #[tokio::test]
    async fn waiter_proceeds_after_release() {
        let locks = Arc::new(PolicyListLocks::new());
        let scope = PolicyScope::new(PolicyType::CredentialPolicy);
        let guard = locks.acquire(&scope).await;

        let waiter = {
            let locks = Arc::clone(&locks);
            let scope = scope.clone();
            tokio::spawn(async move {
                let _g = locks.acquire(&scope).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
