//! Live host allow-list shared with the surrounding application.
//!
//! The allow-list is owned by whoever configures the server. Validators only
//! read it, taking one snapshot per decision, so updates apply to the next
//! connection without restarting anything.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

/// Hosts trusted by the application plus the debug local-bypass flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HostAllowList {
    /// Host patterns (`example.com`, `.example.com`, `*`).
    pub hosts: Vec<String>,

    /// Trust loopback origins regardless of `hosts`.
    pub local_bypass: bool,
}

impl HostAllowList {
    pub fn new(hosts: Vec<String>, local_bypass: bool) -> Self {
        Self { hosts, local_bypass }
    }
}

/// Source of the current allow-list.
pub trait AllowListSource: Send + Sync + 'static {
    /// Current allow-list. Called once per validation.
    fn snapshot(&self) -> Arc<HostAllowList>;
}

/// Atomically swappable allow-list handle. Clones share the same list.
#[derive(Clone)]
pub struct SharedAllowList {
    inner: Arc<ArcSwap<HostAllowList>>,
}

impl SharedAllowList {
    pub fn new(list: HostAllowList) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(list)),
        }
    }

    /// Replace the list. Visible to the next `snapshot`.
    pub fn store(&self, list: HostAllowList) {
        self.inner.store(Arc::new(list));
    }

    pub fn load(&self) -> Arc<HostAllowList> {
        self.inner.load_full()
    }
}

impl std::fmt::Debug for SharedAllowList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedAllowList").field(&self.load()).finish()
    }
}

impl Default for SharedAllowList {
    fn default() -> Self {
        Self::new(HostAllowList::default())
    }
}

impl AllowListSource for SharedAllowList {
    fn snapshot(&self) -> Arc<HostAllowList> {
        self.load()
    }
}

/// Allow-list computed by a closure on every call.
pub struct AllowListFn<F>(F);

/// Wrap a closure as an [`AllowListSource`].
pub fn from_fn<F>(f: F) -> AllowListFn<F>
where
    F: Fn() -> HostAllowList + Send + Sync + 'static,
{
    AllowListFn(f)
}

impl<F> AllowListSource for AllowListFn<F>
where
    F: Fn() -> HostAllowList + Send + Sync + 'static,
{
    fn snapshot(&self) -> Arc<HostAllowList> {
        Arc::new((self.0)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_shared_allow_list_store_is_visible_to_clones() {
        let shared = SharedAllowList::new(HostAllowList::new(vec!["a.com".into()], false));
        let reader = shared.clone();

        assert_eq!(reader.snapshot().hosts, vec!["a.com".to_string()]);

        shared.store(HostAllowList::new(vec!["b.com".into()], true));
        let snapshot = reader.snapshot();
        assert_eq!(snapshot.hosts, vec!["b.com".to_string()]);
        assert!(snapshot.local_bypass);
    }

    #[test]
    fn test_fn_source_called_per_snapshot() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let source = from_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            HostAllowList::default()
        });

        source.snapshot();
        source.snapshot();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_deserialize_defaults() {
        let list: HostAllowList = toml::from_str("hosts = [\".example.com\"]").unwrap();
        assert_eq!(list.hosts, vec![".example.com".to_string()]);
        assert!(!list.local_bypass);
    }
}
