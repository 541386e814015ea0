use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// The mutating filesystem operations that go through approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Write,
    Append,
    Mkdir,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::Write => "write",
            ActionKind::Append => "append",
            ActionKind::Mkdir => "mkdir",
        };
        f.write_str(s)
    }
}

/// A queued, not-yet-executed filesystem mutation awaiting approval.
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub id: String,
    pub kind: ActionKind,
    pub target_path: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Process-wide approval queue. Ids are single-use: `take` removes the
/// action atomically, so an id cannot be approved and rejected, nor
/// approved twice. Entries older than the TTL are pruned lazily so a
/// long-running process does not accumulate stale requests forever.
pub struct PendingStore {
    actions: DashMap<String, PendingAction>,
    counter: AtomicU64,
    ttl: Duration,
}

impl Default for PendingStore {
    fn default() -> Self {
        Self::with_ttl(Duration::minutes(30))
    }
}

impl PendingStore {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            actions: DashMap::new(),
            counter: AtomicU64::new(0),
            ttl,
        }
    }

    fn next_id(&self) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("fs-{}-{}", Utc::now().timestamp_millis(), seq)
    }

    fn prune_expired(&self) {
        let cutoff = Utc::now() - self.ttl;
        self.actions.retain(|_, action| action.created_at > cutoff);
    }

    /// Queue a mutation for approval and return its descriptor.
    pub fn queue(&self, kind: ActionKind, target_path: String, content: Option<String>) -> PendingAction {
        self.prune_expired();
        let action = PendingAction {
            id: self.next_id(),
            kind,
            target_path,
            content,
            created_at: Utc::now(),
        };
        self.actions.insert(action.id.clone(), action.clone());
        action
    }

    /// Remove and return an action. Atomic: whichever caller gets the
    /// value owns the single execution or rejection of this id. Expired
    /// actions are dropped here too, so an id `list` no longer reports
    /// cannot still be approved.
    pub fn take(&self, id: &str) -> Option<PendingAction> {
        let cutoff = Utc::now() - self.ttl;
        self.actions
            .remove(id)
            .map(|(_, action)| action)
            .filter(|action| action.created_at > cutoff)
    }

    /// All pending actions ordered by creation time.
    pub fn list(&self) -> Vec<PendingAction> {
        self.prune_expired();
        let mut actions: Vec<PendingAction> =
            self.actions.iter().map(|entry| entry.value().clone()).collect();
        actions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        actions
    }
}
