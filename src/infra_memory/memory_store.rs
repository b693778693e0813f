use crate::domain_model::*;
use crate::domain_port::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeSet<UserId>,
    entries: BTreeSet<DocKey>,
}

/// In-memory transactional store.
///
/// A transaction holds the store lock from `begin` until it is committed,
/// rolled back or dropped, so transactions are fully serialized. Writes are
/// staged on the handle and applied in one step on commit. A write into the
/// shard of an unregistered user fails, as a missing `user` row does in MySQL.
///
/// Every `DocumentStore` / `TxManager` call bumps `access_count`, which lets
/// tests prove that a rejected call never reached the store.
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    accesses: AtomicUsize,
    fail_next_commit: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            accesses: AtomicUsize::new(0),
            fail_next_commit: AtomicBool::new(false),
        }
    }

    /// Makes `user` known to `user_exists`. Not counted as an access.
    pub async fn register_user(&self, user: impl Into<UserId>) {
        self.state.lock().await.users.insert(user.into());
    }

    pub fn access_count(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    /// The next transaction to begin will fail on commit, leaving the store
    /// untouched.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Every stored projection. Not counted as an access.
    pub async fn snapshot(&self) -> BTreeSet<DocKey> {
        self.state.lock().await.entries.clone()
    }

    fn touch(&self) {
        self.accesses.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("access_count", &self.access_count())
            .finish()
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryStore {
    async fn exists(&self, key: &DocKey) -> anyhow::Result<bool> {
        self.touch();
        Ok(self.state.lock().await.entries.contains(key))
    }

    async fn list(
        &self,
        owner: &UserId,
        collection: Collection,
    ) -> anyhow::Result<BTreeSet<UserId>> {
        self.touch();
        let state = self.state.lock().await;
        Ok(state
            .entries
            .iter()
            .filter(|key| &key.owner == owner && key.collection == collection)
            .map(|key| key.member.clone())
            .collect())
    }

    async fn user_exists(&self, user: &UserId) -> anyhow::Result<bool> {
        self.touch();
        Ok(self.state.lock().await.users.contains(user))
    }
}

#[async_trait::async_trait]
impl TxManager for InMemoryStore {
    async fn begin<'t>(&'t self) -> anyhow::Result<Box<dyn StorageTx<'t> + 't>> {
        self.touch();
        let guard = self.state.clone().lock_owned().await;
        let fail_commit = self.fail_next_commit.swap(false, Ordering::SeqCst);
        Ok(Box::new(MemoryTx {
            guard,
            staged: BTreeMap::new(),
            fail_commit,
            read_only: false,
        }))
    }

    async fn begin_read_only<'t>(&'t self) -> anyhow::Result<Box<dyn StorageTx<'t> + 't>> {
        self.touch();
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryTx {
            guard,
            staged: BTreeMap::new(),
            fail_commit: false,
            read_only: true,
        }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: BTreeMap<DocKey, bool>, // true: put, false: delete
    fail_commit: bool,
    read_only: bool,
}

#[async_trait::async_trait]
impl<'t> StorageTx<'t> for MemoryTx {
    async fn exists(&mut self, key: &DocKey) -> anyhow::Result<bool> {
        Ok(match self.staged.get(key) {
            Some(present) => *present,
            None => self.guard.entries.contains(key),
        })
    }

    async fn put(&mut self, key: &DocKey) -> anyhow::Result<()> {
        anyhow::ensure!(!self.read_only, "write {key} in a read-only transaction");
        anyhow::ensure!(
            self.guard.users.contains(&key.owner),
            "write {key}: owner {} is not a user",
            key.owner
        );
        self.staged.insert(key.clone(), true);
        Ok(())
    }

    async fn delete(&mut self, key: &DocKey) -> anyhow::Result<()> {
        anyhow::ensure!(!self.read_only, "delete {key} in a read-only transaction");
        self.staged.insert(key.clone(), false);
        Ok(())
    }

    async fn user_exists(&mut self, user: &UserId) -> anyhow::Result<bool> {
        Ok(self.guard.users.contains(user))
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let MemoryTx {
            mut guard,
            staged,
            fail_commit,
            ..
        } = *self;
        if fail_commit {
            anyhow::bail!("simulated commit failure");
        }
        for (key, present) in staged {
            if present {
                guard.entries.insert(key);
            } else {
                guard.entries.remove(&key);
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }
}
