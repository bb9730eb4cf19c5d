//! Hierarchy builder
//!
//! Rebuilds the subtree below a partner by asking the store for the children
//! of each node, one taxonomy tier at a time:
//!
//! ```text
//! find_by_id(root) → find_by_parent(child_role, root.key) → ... → channel-partner
//! ```
//!
//! Siblings are expanded concurrently through an order-preserving buffer, so
//! children always appear in store return order and repeated builds over
//! unchanged data are identical. A semaphore shared by the whole build caps
//! the store calls in flight at `max_concurrent_fetches`, however deep the
//! tree.
//!
//! A failed or timed-out fetch aborts the whole build. Dropping the returned
//! future abandons every in-flight fetch.

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::insights::hierarchy_depth;
use super::node::HierarchyNode;
use super::role::Role;
use super::HierarchyError;
use crate::store::{PartnerStore, StoreError};

/// Builder configuration
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Upper bound on any single store call
    pub fetch_timeout: Duration,
    /// Store calls in flight at once, across a whole build
    pub max_concurrent_fetches: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(5),
            max_concurrent_fetches: 8,
        }
    }
}

/// Builds hierarchy trees from a [`PartnerStore`]
pub struct HierarchyBuilder<S: PartnerStore + ?Sized> {
    store: Arc<S>,
    config: BuilderConfig,
}

impl<S: PartnerStore + ?Sized> HierarchyBuilder<S> {
    pub fn new(store: Arc<S>, config: BuilderConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Build the tree rooted at the partner with store id `root_id`.
    ///
    /// Fails with [`HierarchyError::NotFound`] when no partner of `root_role`
    /// has that id, and with [`HierarchyError::StoreUnavailable`] when any
    /// fetch fails or times out. Partial trees are never returned.
    pub async fn build(
        &self,
        root_role: Role,
        root_id: &str,
    ) -> Result<HierarchyNode, HierarchyError> {
        let permits = Semaphore::new(self.config.max_concurrent_fetches.max(1));

        let record = self
            .fetch(&permits, self.store.find_by_id(root_id))
            .await?
            .ok_or_else(|| HierarchyError::NotFound(root_id.to_string()))?;

        if record.role != root_role {
            debug!(
                root_id = %root_id,
                requested = %root_role,
                stored = %record.role,
                "Root role mismatch"
            );
            return Err(HierarchyError::NotFound(root_id.to_string()));
        }

        let root = self
            .expand(HierarchyNode::from_record(record), &permits)
            .await?;

        info!(
            root_id = %root_id,
            role = %root_role,
            nodes = root.node_count(),
            depth = hierarchy_depth(&root),
            "Hierarchy built"
        );

        Ok(root)
    }

    /// Attach all descendants of `node`
    fn expand<'a>(
        &'a self,
        mut node: HierarchyNode,
        permits: &'a Semaphore,
    ) -> BoxFuture<'a, Result<HierarchyNode, HierarchyError>> {
        async move {
            let Some(child_role) = node.role.child_role() else {
                return Ok(node);
            };

            let records = self
                .fetch(permits, self.store.find_by_parent(child_role, &node.linkage_key))
                .await?;
            let fetched = records.len();

            let children: Vec<HierarchyNode> = records
                .into_iter()
                .filter(|record| {
                    record.role == child_role && record.is_owned_by(node.role, &node.linkage_key)
                })
                .map(HierarchyNode::from_record)
                .collect();

            if children.len() != fetched {
                debug!(
                    parent = %node.linkage_key,
                    dropped = fetched - children.len(),
                    "Dropped records not owned by parent"
                );
            }

            debug!(
                role = %node.role,
                key = %node.linkage_key,
                children = children.len(),
                "Expanded node"
            );

            node.children = stream::iter(children)
                .map(|child| self.expand(child, permits))
                .buffered(self.config.max_concurrent_fetches.max(1))
                .try_collect()
                .await?;

            Ok(node)
        }
        .boxed()
    }

    /// Run one store call under a build permit and the fetch timeout
    async fn fetch<T>(
        &self,
        permits: &Semaphore,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, HierarchyError> {
        let _permit = permits
            .acquire()
            .await
            .map_err(|_| HierarchyError::StoreUnavailable("fetch limiter closed".into()))?;

        match tokio::time::timeout(self.config.fetch_timeout, call).await {
            Ok(result) => result.map_err(HierarchyError::from),
            Err(_) => Err(StoreError::Timeout(self.config.fetch_timeout.as_millis() as u64).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{ParentRef, PartnerRecord};
    use crate::store::InMemoryPartnerStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn builder(store: InMemoryPartnerStore) -> HierarchyBuilder<InMemoryPartnerStore> {
        HierarchyBuilder::new(Arc::new(store), BuilderConfig::default())
    }

    fn four_tier_store() -> InMemoryPartnerStore {
        InMemoryPartnerStore::with_records([
            PartnerRecord::universe_fund("uf", "Fund", "100", "UF1"),
            PartnerRecord::member("f1", "North", "101", Role::Franchise, "F1", "UF1"),
            PartnerRecord::member("f2", "South", "102", Role::Franchise, "F2", "UF1"),
            PartnerRecord::member("s1", "North-1", "103", Role::SubFranchise, "S1", "F1"),
            PartnerRecord::member("c1", "Shop A", "104", Role::ChannelPartner, "C1", "S1"),
            PartnerRecord::member("c2", "Shop B", "105", Role::ChannelPartner, "C2", "S1"),
        ])
    }

    /// Counts store calls and can fail `find_by_parent` for one parent key
    struct CountingStore {
        inner: InMemoryPartnerStore,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        fail_parent: Option<&'static str>,
        delay: Option<Duration>,
    }

    #[async_trait::async_trait]
    impl PartnerStore for CountingStore {
        async fn find_by_id(&self, id: &str) -> Result<Option<PartnerRecord>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_id(id).await
        }

        async fn find_by_parent(
            &self,
            role: Role,
            parent_key: &str,
        ) -> Result<Vec<PartnerRecord>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let result = if self.fail_parent == Some(parent_key) {
                Err(StoreError::Unavailable("connection reset".into()))
            } else {
                self.inner.find_by_parent(role, parent_key).await
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn counting(fail_parent: Option<&'static str>, delay: Option<Duration>) -> Arc<CountingStore> {
        counting_over(four_tier_store(), fail_parent, delay)
    }

    fn counting_over(
        inner: InMemoryPartnerStore,
        fail_parent: Option<&'static str>,
        delay: Option<Duration>,
    ) -> Arc<CountingStore> {
        Arc::new(CountingStore {
            inner,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            fail_parent,
            delay,
        })
    }

    #[tokio::test]
    async fn test_build_full_tree() {
        let tree = builder(four_tier_store())
            .build(Role::UniverseFund, "uf")
            .await
            .unwrap();

        assert_eq!(tree.linkage_key, "UF1");
        let franchises: Vec<&str> = tree.children.iter().map(|n| n.linkage_key.as_str()).collect();
        assert_eq!(franchises, vec!["F1", "F2"]);

        let north = &tree.children[0];
        assert_eq!(north.children.len(), 1);
        let shops: Vec<&str> = north.children[0]
            .children
            .iter()
            .map(|n| n.linkage_key.as_str())
            .collect();
        assert_eq!(shops, vec!["C1", "C2"]);
        assert!(tree.children[1].is_leaf());
        assert_eq!(tree.node_count(), 6);
    }

    #[tokio::test]
    async fn test_build_from_mid_tier_root() {
        let tree = builder(four_tier_store())
            .build(Role::Franchise, "f1")
            .await
            .unwrap();
        assert_eq!(tree.role, Role::Franchise);
        assert_eq!(tree.node_count(), 4);
    }

    #[tokio::test]
    async fn test_channel_partner_root_is_not_expanded() {
        let store = counting(None, None);
        let builder = HierarchyBuilder::new(Arc::clone(&store), BuilderConfig::default());

        let tree = builder.build(Role::ChannelPartner, "c1").await.unwrap();
        assert!(tree.is_leaf());
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_one_query_per_expanded_node() {
        let store = counting(None, None);
        let builder = HierarchyBuilder::new(Arc::clone(&store), BuilderConfig::default());

        builder.build(Role::UniverseFund, "uf").await.unwrap();

        // find_by_id + UF1, F1, F2, S1 (channel partners are never queried)
        assert_eq!(store.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_unknown_root_is_not_found() {
        let err = builder(four_tier_store())
            .build(Role::UniverseFund, "missing")
            .await
            .unwrap_err();
        assert_eq!(err, HierarchyError::NotFound("missing".into()));
    }

    #[tokio::test]
    async fn test_root_role_mismatch_is_not_found() {
        let err = builder(four_tier_store())
            .build(Role::UniverseFund, "f1")
            .await
            .unwrap_err();
        assert_eq!(err, HierarchyError::NotFound("f1".into()));
    }

    #[tokio::test]
    async fn test_level_failure_aborts_build() {
        let store = counting(Some("S1"), None);
        let builder = HierarchyBuilder::new(store, BuilderConfig::default());

        let err = builder.build(Role::UniverseFund, "uf").await.unwrap_err();
        assert!(matches!(err, HierarchyError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_store_unavailable() {
        let store = counting(None, Some(Duration::from_millis(200)));
        let builder = HierarchyBuilder::new(
            store,
            BuilderConfig {
                fetch_timeout: Duration::from_millis(20),
                ..BuilderConfig::default()
            },
        );

        let err = builder.build(Role::UniverseFund, "uf").await.unwrap_err();
        assert!(matches!(err, HierarchyError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_records_with_wrong_parent_role_are_dropped() {
        let store = four_tier_store();
        let mut stray = PartnerRecord::member("x", "Stray", "0", Role::Franchise, "FX", "UF1");
        stray.parent = Some(ParentRef {
            id: "UF1".into(),
            role: Some(Role::SubFranchise),
        });
        store.push(stray).await;

        let tree = builder(store).build(Role::UniverseFund, "uf").await.unwrap();
        assert!(tree.find("FX").is_none());
        assert_eq!(tree.children.len(), 2);
    }

    #[tokio::test]
    async fn test_sequential_fanout_matches_concurrent() {
        let concurrent = builder(four_tier_store())
            .build(Role::UniverseFund, "uf")
            .await
            .unwrap();
        let sequential = HierarchyBuilder::new(
            Arc::new(four_tier_store()),
            BuilderConfig {
                max_concurrent_fetches: 1,
                ..BuilderConfig::default()
            },
        )
        .build(Role::UniverseFund, "uf")
        .await
        .unwrap();

        assert_eq!(concurrent, sequential);
    }

    #[tokio::test]
    async fn test_fetch_limit_holds_across_tiers() {
        let mut records = vec![PartnerRecord::universe_fund("uf", "Fund", "100", "UF1")];
        for f in 0..8 {
            let franchise = format!("F{f}");
            records.push(PartnerRecord::member(
                format!("f{f}"),
                "Franchise",
                "101",
                Role::Franchise,
                franchise.clone(),
                "UF1",
            ));
            for s in 0..8 {
                records.push(PartnerRecord::member(
                    format!("s{f}-{s}"),
                    "Sub",
                    "102",
                    Role::SubFranchise,
                    format!("S{f}-{s}"),
                    franchise.clone(),
                ));
            }
        }

        let store = counting_over(
            InMemoryPartnerStore::with_records(records),
            None,
            Some(Duration::from_millis(10)),
        );
        let builder = HierarchyBuilder::new(
            Arc::clone(&store),
            BuilderConfig {
                max_concurrent_fetches: 2,
                ..BuilderConfig::default()
            },
        );

        let tree = builder.build(Role::UniverseFund, "uf").await.unwrap();

        assert_eq!(tree.node_count(), 73);
        assert!(store.max_in_flight.load(Ordering::SeqCst) <= 2);
        assert_eq!(store.in_flight.load(Ordering::SeqCst), 0);
    }
}
