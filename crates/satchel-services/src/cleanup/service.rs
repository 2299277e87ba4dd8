use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use satchel_core::constants::STAGING_DIR_NAME;
use satchel_core::token::{TokenError, TokenService};
use satchel_storage::PartitionStore;
use tokio::time::{interval, MissedTickBehavior};

/// Counters from one garbage collection sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    /// Directories considered, staging excluded.
    pub candidates: usize,
    /// Partitions deleted because their token expired.
    pub removed_expired: usize,
    /// Partitions deleted because their name is malformed or carries a bad
    /// signature.
    pub removed_invalid: usize,
    /// Partitions left in place under a currently valid token.
    pub retained: usize,
    /// Candidates whose deletion failed; they are retried on the next sweep.
    pub failed: usize,
}

enum SweepOutcome {
    RemovedExpired,
    RemovedInvalid,
    Retained,
    Failed,
}

/// Garbage collector for share partitions.
///
/// The only component that deletes partitions. Each sweep re-derives validity
/// from the partition names alone; the directory tree is the only index.
pub struct CleanupService {
    tokens: Arc<TokenService>,
    store: Arc<dyn PartitionStore>,
    sweep_interval: Duration,
    concurrency: usize,
}

impl CleanupService {
    pub fn new(
        tokens: Arc<TokenService>,
        store: Arc<dyn PartitionStore>,
        sweep_interval: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            tokens,
            store,
            sweep_interval,
            concurrency,
        }
    }

    /// Start the background sweep task on the configured interval.
    /// Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(self.sweep_interval);
            sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                sweep_interval.tick().await;

                tracing::info!("Starting scheduled sweep of share partitions");

                if let Err(e) = self.run_sweep_once().await {
                    tracing::error!(error = %e, "Sweep failed");
                }
            }
        })
    }

    /// Run one full sweep over the partitions root.
    #[tracing::instrument(skip(self), fields(sweep.operation = "expire_partitions"))]
    pub async fn run_sweep_once(&self) -> Result<SweepSummary, anyhow::Error> {
        let names = self.store.list_partitions().await?;

        let candidates: Vec<String> = names
            .into_iter()
            .filter(|name| name != STAGING_DIR_NAME)
            .collect();

        let mut summary = SweepSummary {
            candidates: candidates.len(),
            ..SweepSummary::default()
        };

        let outcomes = stream::iter(candidates)
            .map(|name| self.sweep_candidate(name))
            .buffer_unordered(self.concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        for outcome in outcomes {
            match outcome {
                SweepOutcome::RemovedExpired => summary.removed_expired += 1,
                SweepOutcome::RemovedInvalid => summary.removed_invalid += 1,
                SweepOutcome::Retained => summary.retained += 1,
                SweepOutcome::Failed => summary.failed += 1,
            }
        }

        tracing::info!(
            candidates = summary.candidates,
            removed_expired = summary.removed_expired,
            removed_invalid = summary.removed_invalid,
            retained = summary.retained,
            failed = summary.failed,
            "Sweep completed"
        );

        Ok(summary)
    }

    /// Judge one directory name and delete the partition when its token no
    /// longer verifies. Failures are contained to this candidate.
    async fn sweep_candidate(&self, name: String) -> SweepOutcome {
        let verdict = match self.tokens.verify(&name) {
            Ok(_) => return SweepOutcome::Retained,
            Err(e) => e,
        };

        let expired = matches!(verdict, TokenError::Expired { .. });
        if expired {
            tracing::info!(partition = %name, "Deleting expired share partition");
        } else {
            tracing::info!(
                partition = %name,
                reason = %verdict,
                "Deleting invalid share partition"
            );
        }

        match self.store.remove_partition(&name).await {
            Ok(()) if expired => SweepOutcome::RemovedExpired,
            Ok(()) => SweepOutcome::RemovedInvalid,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    partition = %name,
                    "Failed to delete partition, continuing sweep"
                );
                SweepOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as TokenTtl;
    use satchel_storage::{LocalPartitionStore, StagingArea, StoreError, StoreResult};
    use std::path::PathBuf;
    use tempfile::tempdir;

    const SECRET: &str = "sweep-secret-sweep-secret-sweep-secret";

    struct Fixture {
        _dir: tempfile::TempDir,
        tokens: Arc<TokenService>,
        store: Arc<LocalPartitionStore>,
        staging: StagingArea,
    }

    async fn setup() -> Fixture {
        let dir = tempdir().unwrap();
        let root = dir.path().join("uploads");
        Fixture {
            tokens: Arc::new(TokenService::new(SECRET, TokenTtl::hours(1))),
            store: Arc::new(LocalPartitionStore::new(&root).await.unwrap()),
            staging: StagingArea::new(root.join(STAGING_DIR_NAME)).await.unwrap(),
            _dir: dir,
        }
    }

    fn service(fixture: &Fixture, concurrency: usize) -> CleanupService {
        CleanupService::new(
            fixture.tokens.clone(),
            fixture.store.clone(),
            Duration::from_secs(7200),
            concurrency,
        )
    }

    #[tokio::test]
    async fn test_sweep_removes_invalid_and_retains_valid() {
        let fixture = setup().await;

        let valid = fixture.tokens.issue(vec!["a.txt".to_string()]).unwrap();
        let expired = fixture
            .tokens
            .issue_with_ttl(vec!["b.txt".to_string()], TokenTtl::zero())
            .unwrap();

        fixture.store.create_partition(&valid.token).await.unwrap();
        fixture.store.create_partition(&expired.token).await.unwrap();
        fixture.store.create_partition("garbage").await.unwrap();

        // staging content must survive every sweep
        let staged = fixture.staging.stage("inflight.bin", b"data").await.unwrap();

        let summary = service(&fixture, 4).run_sweep_once().await.unwrap();

        assert_eq!(summary.candidates, 3);
        assert_eq!(summary.removed_expired, 1);
        assert_eq!(summary.removed_invalid, 1);
        assert_eq!(summary.retained, 1);
        assert_eq!(summary.failed, 0);

        let remaining = fixture.store.list_partitions().await.unwrap();
        assert!(remaining.contains(&valid.token));
        assert!(!remaining.iter().any(|n| n == &expired.token));
        assert!(!remaining.iter().any(|n| n == "garbage"));
        assert!(staged.staged_path.exists());
    }

    #[tokio::test]
    async fn test_sweep_removes_foreign_signature() {
        let fixture = setup().await;

        let foreign = TokenService::new("other-secret-other-secret-other!", TokenTtl::hours(1))
            .issue(vec!["a.txt".to_string()])
            .unwrap();
        fixture.store.create_partition(&foreign.token).await.unwrap();

        let summary = service(&fixture, 2).run_sweep_once().await.unwrap();

        assert_eq!(summary.candidates, 1);
        assert_eq!(summary.removed_invalid, 1);
        assert_eq!(summary.removed_expired, 0);
        assert!(fixture.store.list_partitions().await.unwrap().len() == 1); // only temp
    }

    #[tokio::test]
    async fn test_sweep_empty_root() {
        let fixture = setup().await;

        let summary = service(&fixture, 8).run_sweep_once().await.unwrap();

        assert_eq!(summary, SweepSummary::default());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sweep_removes_stray_directory() {
        let fixture = setup().await;

        // Dropped under the partitions root by hand. The name is legal on
        // the filesystem but can never parse as a token, and must not
        // survive the sweep or count as a failure.
        tokio::fs::create_dir(fixture.store.root().join("stray\\dir"))
            .await
            .unwrap();

        let summary = service(&fixture, 2).run_sweep_once().await.unwrap();

        assert_eq!(summary.candidates, 1);
        assert_eq!(summary.removed_invalid, 1);
        assert_eq!(summary.failed, 0);
        assert!(!fixture.store.root().join("stray\\dir").exists());
    }

    /// Store wrapper that refuses to remove one specific partition.
    struct FlakyStore {
        inner: Arc<LocalPartitionStore>,
        fail_name: String,
    }

    #[async_trait::async_trait]
    impl PartitionStore for FlakyStore {
        async fn create_partition(&self, token: &str) -> StoreResult<PathBuf> {
            self.inner.create_partition(token).await
        }

        async fn commit_files(
            &self,
            token: &str,
            staged: &[satchel_storage::StagedFile],
        ) -> StoreResult<()> {
            self.inner.commit_files(token, staged).await
        }

        async fn list_files(&self, token: &str) -> StoreResult<Vec<String>> {
            self.inner.list_files(token).await
        }

        async fn resolve_file(&self, token: &str, filename: &str) -> StoreResult<PathBuf> {
            self.inner.resolve_file(token, filename).await
        }

        async fn list_partitions(&self) -> StoreResult<Vec<String>> {
            self.inner.list_partitions().await
        }

        async fn remove_partition(&self, token: &str) -> StoreResult<()> {
            if token == self.fail_name {
                return Err(StoreError::RemoveFailed("injected failure".to_string()));
            }
            self.inner.remove_partition(token).await
        }
    }

    #[tokio::test]
    async fn test_sweep_isolates_per_candidate_failures() {
        let fixture = setup().await;

        let doomed = fixture
            .tokens
            .issue_with_ttl(vec!["a.txt".to_string()], TokenTtl::zero())
            .unwrap();
        let removable = fixture
            .tokens
            .issue_with_ttl(vec!["b.txt".to_string()], TokenTtl::zero())
            .unwrap();

        fixture.store.create_partition(&doomed.token).await.unwrap();
        fixture.store.create_partition(&removable.token).await.unwrap();

        let flaky = Arc::new(FlakyStore {
            inner: fixture.store.clone(),
            fail_name: doomed.token.clone(),
        });
        let cleanup = CleanupService::new(
            fixture.tokens.clone(),
            flaky,
            Duration::from_secs(7200),
            2,
        );

        let summary = cleanup.run_sweep_once().await.unwrap();

        assert_eq!(summary.candidates, 2);
        assert_eq!(summary.removed_expired, 1);
        assert_eq!(summary.failed, 1);

        // the failed candidate is still there for the next sweep
        let remaining = fixture.store.list_partitions().await.unwrap();
        assert!(remaining.contains(&doomed.token));
        assert!(!remaining.iter().any(|n| n == &removable.token));
    }
}
