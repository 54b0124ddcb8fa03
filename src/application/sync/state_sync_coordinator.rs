//! Per-space serialization and versioning of concurrent writes.
//!
//! Every Builder Space gets a slot holding an async mutex and a version
//! counter. Writes admitted through [`StateSyncCoordinator::handle_concurrent_operation`]
//! run one at a time per space; writes to different spaces run in parallel.
//!
//! # State Machine (per space)
//!
//! ```text
//! Idle --[operation admitted]--> Locked
//! Locked --[transient conflict, attempts left]--> Locked (after backoff)
//! Locked --[success]--> Idle  (version + 1)
//! Locked --[permanent failure | attempts exhausted]--> Idle  (version unchanged)
//! ```
//!
//! Slots are created on first access and live for the process lifetime.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::adapters::realtime::BroadcastRouter;
use crate::domain::foundation::{DomainError, SpaceId, Timestamp, UserId};
use crate::domain::realtime::{
    BroadcastMessage, BroadcastPayload, ConflictResolutionPolicy, DeliveryReport, RetryPolicy,
    SpaceSnapshot, SpaceStateUpdate, SpaceUpdateData, SyncError,
};
use crate::ports::{FullStateProvider, Sleeper};

/// Serialization lock and version counter of one space.
#[derive(Debug, Default)]
struct SpaceSlot {
    lock: Mutex<()>,
    version: AtomicU64,
}

impl SpaceSlot {
    /// Advance the version by one and return the new value.
    fn bump(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn current(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}

/// Coordinates concurrent mutations against Builder Spaces.
///
/// # Example
///
/// ```ignore
/// let message_row = coordinator
///     .handle_concurrent_operation(&space_id, ConflictResolutionPolicy::default(), || {
///         repository.insert_message(&space_id, &draft)
///     })
///     .await?;
///
/// router
///     .broadcast_to_space_members(&space_id, &message, Some(&author_id))
///     .await;
/// ```
pub struct StateSyncCoordinator {
    router: Arc<BroadcastRouter>,
    sleeper: Arc<dyn Sleeper>,
    retry_policy: RetryPolicy,
    full_state: Option<Arc<dyn FullStateProvider>>,
    spaces: DashMap<SpaceId, Arc<SpaceSlot>>,
}

impl StateSyncCoordinator {
    /// Create a coordinator with the default retry policy (3 attempts).
    pub fn new(router: Arc<BroadcastRouter>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            router,
            sleeper,
            retry_policy: RetryPolicy::default(),
            full_state: None,
            spaces: DashMap::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_full_state_provider(mut self, provider: Arc<dyn FullStateProvider>) -> Self {
        self.full_state = Some(provider);
        self
    }

    pub fn router(&self) -> &Arc<BroadcastRouter> {
        &self.router
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    fn slot(&self, space_id: &SpaceId) -> Arc<SpaceSlot> {
        Arc::clone(self.spaces.entry(*space_id).or_default().value())
    }

    /// Current version of a space (0 if it was never written).
    pub fn get_state_version(&self, space_id: &SpaceId) -> u64 {
        self.slot(space_id).current()
    }

    /// Reset a space's version to 0. For test isolation and debugging only.
    pub fn reset_state_version(&self, space_id: &SpaceId) {
        self.slot(space_id).version.store(0, Ordering::SeqCst);
        tracing::debug!(space_id = %space_id, "Reset space version");
    }

    /// Number of spaces with a slot.
    pub fn tracked_spaces(&self) -> usize {
        self.spaces.len()
    }

    /// Run `operation` under the space's lock, retrying transient conflicts.
    ///
    /// On success the space version advances by exactly one, whatever number
    /// of attempts it took. On failure the version is unchanged:
    ///
    /// - permanent errors surface immediately as [`SyncError::Operation`];
    /// - transient conflicts under [`ConflictResolutionPolicy::Reject`] surface
    ///   as [`SyncError::ConflictRejected`] after one attempt;
    /// - otherwise the operation is retried with backoff, and
    ///   [`SyncError::RetriesExhausted`] reports the attempts made.
    ///
    /// The lock is held across retries, so later writers to the same space
    /// wait until this one has finished.
    pub async fn handle_concurrent_operation<T, F, Fut>(
        &self,
        space_id: &SpaceId,
        policy: ConflictResolutionPolicy,
        mut operation: F,
    ) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        if policy == ConflictResolutionPolicy::Merge {
            tracing::debug!(
                space_id = %space_id,
                "Merge policy without merge function, retrying conflicts instead"
            );
        }

        let max_attempts = if policy.retries_on_conflict() {
            self.retry_policy.max_attempts.max(1)
        } else {
            1
        };

        let slot = self.slot(space_id);
        let _guard = slot.lock.lock().await;

        let mut attempt = 0;
        loop {
            attempt += 1;

            match operation().await {
                Ok(value) => {
                    let version = slot.bump();
                    tracing::debug!(space_id = %space_id, version, attempt, "Operation committed");
                    return Ok(value);
                }
                Err(e) if !e.is_transient_conflict() => {
                    tracing::debug!(space_id = %space_id, attempt, "Operation failed: {}", e);
                    return Err(SyncError::Operation(e));
                }
                Err(e) if policy == ConflictResolutionPolicy::Reject => {
                    tracing::warn!(space_id = %space_id, "Conflict rejected by policy: {}", e);
                    return Err(SyncError::ConflictRejected {
                        space_id: *space_id,
                        source: e,
                    });
                }
                Err(e) if attempt >= max_attempts => {
                    tracing::warn!(
                        space_id = %space_id,
                        attempts = attempt,
                        "Retries exhausted: {}",
                        e
                    );
                    return Err(SyncError::RetriesExhausted {
                        space_id: *space_id,
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    let delay = self.retry_policy.delay_for(attempt);
                    tracing::warn!(
                        space_id = %space_id,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Transient conflict, retrying: {}",
                        e
                    );
                    self.sleeper.sleep(delay).await;
                }
            }
        }
    }

    /// Run `operation` under the space's lock, reconciling a conflict with `merge`.
    ///
    /// On a transient conflict `merge` receives the conflict error and runs
    /// once, still under the lock. Whichever of the two succeeds commits, and
    /// the version advances by one.
    pub async fn handle_concurrent_operation_with_merge<T, F, Fut, M, MFut>(
        &self,
        space_id: &SpaceId,
        operation: F,
        merge: M,
    ) -> Result<T, SyncError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
        M: FnOnce(DomainError) -> MFut,
        MFut: Future<Output = Result<T, DomainError>>,
    {
        let slot = self.slot(space_id);
        let _guard = slot.lock.lock().await;

        let value = match operation().await {
            Ok(value) => value,
            Err(e) if !e.is_transient_conflict() => return Err(SyncError::Operation(e)),
            Err(conflict) => {
                tracing::debug!(space_id = %space_id, "Merging conflicting write: {}", conflict);
                merge(conflict).await.map_err(|e| {
                    tracing::warn!(space_id = %space_id, "Merge failed: {}", e);
                    SyncError::MergeFailed {
                        space_id: *space_id,
                        source: e,
                    }
                })?
            }
        };

        let version = slot.bump();
        tracing::debug!(space_id = %space_id, version, "Operation committed");
        Ok(value)
    }

    /// Broadcast an incremental change to a space's members.
    ///
    /// Advances the version and stamps it into the `space_update` message.
    /// `exclude_user_id`, when given, is the author and does not receive it.
    pub async fn broadcast_update(
        &self,
        space_id: &SpaceId,
        update: SpaceStateUpdate,
        exclude_user_id: Option<&UserId>,
    ) -> (u64, DeliveryReport) {
        let version = self.slot(space_id).bump();

        let payload = BroadcastPayload::SpaceUpdate(SpaceUpdateData {
            space_id: *space_id,
            version,
            kind: update.kind,
            action: update.action,
            data: update.data,
            timestamp: update.timestamp,
        });
        let message = match exclude_user_id {
            Some(author) => BroadcastMessage::from_sender(payload, author.clone()),
            None => BroadcastMessage::new(payload),
        };

        let report = self
            .router
            .broadcast_to_space_members(space_id, &message, exclude_user_id)
            .await;

        tracing::debug!(
            space_id = %space_id,
            version,
            online = report.online,
            offline = report.offline,
            "Broadcast space update"
        );
        (version, report)
    }

    /// Full snapshot of a space, stamped with its current version.
    ///
    /// Taken under the space lock so the contents and version match. Must
    /// not be called from inside an operation on the same space.
    pub async fn full_state(&self, space_id: &SpaceId) -> Result<SpaceSnapshot, SyncError> {
        let provider = self
            .full_state
            .as_ref()
            .ok_or(SyncError::FullStateUnavailable)?;

        let slot = self.slot(space_id);
        let _guard = slot.lock.lock().await;

        let contents = provider
            .full_state(space_id)
            .await
            .map_err(SyncError::Provider)?
            .ok_or(SyncError::UnknownSpace(*space_id))?;

        Ok(SpaceSnapshot {
            space_id: *space_id,
            version: slot.current(),
            contents,
            taken_at: Timestamp::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::realtime::{ConnectionRegistry, InMemoryMembershipResolver, OfflineQueue};
    use crate::domain::foundation::ErrorCode;
    use crate::domain::realtime::{MessageKind, SpaceContents, UpdateAction};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    /// Records requested delays instead of sleeping.
    #[derive(Default)]
    struct RecordingSleeper {
        delays: StdMutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn delays(&self) -> Vec<Duration> {
            self.delays.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    struct StaticStateProvider {
        contents: Option<SpaceContents>,
    }

    #[async_trait]
    impl FullStateProvider for StaticStateProvider {
        async fn full_state(&self, _space_id: &SpaceId) -> Result<Option<SpaceContents>, DomainError> {
            Ok(self.contents.clone())
        }
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn setup() -> (StateSyncCoordinator, Arc<RecordingSleeper>, Arc<InMemoryMembershipResolver>) {
        let membership = Arc::new(InMemoryMembershipResolver::new());
        let router = Arc::new(BroadcastRouter::new(
            Arc::new(ConnectionRegistry::new()),
            Arc::new(OfflineQueue::with_default_capacity()),
            membership.clone(),
        ));
        let sleeper = Arc::new(RecordingSleeper::default());
        let coordinator = StateSyncCoordinator::new(router, sleeper.clone());
        (coordinator, sleeper, membership)
    }

    #[tokio::test]
    async fn new_space_starts_at_version_zero() {
        let (coordinator, _, _) = setup();
        let space_id = SpaceId::new();

        assert_eq!(coordinator.get_state_version(&space_id), 0);
        assert_eq!(coordinator.tracked_spaces(), 1);
    }

    #[tokio::test]
    async fn success_increments_version_once() {
        let (coordinator, _, _) = setup();
        let space_id = SpaceId::new();

        let result = coordinator
            .handle_concurrent_operation(&space_id, ConflictResolutionPolicy::default(), || async {
                Ok::<_, DomainError>("row-1")
            })
            .await
            .unwrap();

        assert_eq!(result, "row-1");
        assert_eq!(coordinator.get_state_version(&space_id), 1);
    }

    #[tokio::test]
    async fn transient_then_success_counts_once_and_backs_off() {
        let (coordinator, sleeper, _) = setup();
        let space_id = SpaceId::new();
        let calls = AtomicU32::new(0);

        let result = coordinator
            .handle_concurrent_operation(&space_id, ConflictResolutionPolicy::LastWriteWins, || {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if call == 1 {
                        Err(DomainError::storage_busy("SQLITE_BUSY"))
                    } else {
                        Ok(call)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(result, 2);
        assert_eq!(coordinator.get_state_version(&space_id), 1);
        assert_eq!(sleeper.delays(), vec![Duration::from_millis(100)]);
    }

    #[tokio::test]
    async fn exhaustion_after_three_attempts_leaves_version_unchanged() {
        let (coordinator, sleeper, _) = setup();
        let space_id = SpaceId::new();
        let calls = AtomicU32::new(0);

        let err = coordinator
            .handle_concurrent_operation(&space_id, ConflictResolutionPolicy::LastWriteWins, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(DomainError::database("database is locked")) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(coordinator.get_state_version(&space_id), 0);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let (coordinator, sleeper, _) = setup();
        let space_id = SpaceId::new();
        let calls = AtomicU32::new(0);

        let err = coordinator
            .handle_concurrent_operation(&space_id, ConflictResolutionPolicy::LastWriteWins, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(DomainError::new(ErrorCode::Forbidden, "not a member")) }
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Forbidden);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.delays().is_empty());
        assert_eq!(coordinator.get_state_version(&space_id), 0);
    }

    #[tokio::test]
    async fn reject_policy_fails_on_first_conflict() {
        let (coordinator, sleeper, _) = setup();
        let space_id = SpaceId::new();
        let calls = AtomicU32::new(0);

        let err = coordinator
            .handle_concurrent_operation(&space_id, ConflictResolutionPolicy::Reject, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(DomainError::storage_busy("busy")) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::ConflictRejected { .. }));
        assert_eq!(err.attempts(), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn merge_policy_without_merge_function_retries() {
        let (coordinator, _, _) = setup();
        let space_id = SpaceId::new();
        let calls = AtomicU32::new(0);

        coordinator
            .handle_concurrent_operation(&space_id, ConflictResolutionPolicy::Merge, || {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if call < 3 {
                        Err(DomainError::storage_busy("busy"))
                    } else {
                        Ok(())
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(coordinator.get_state_version(&space_id), 1);
    }

    #[tokio::test]
    async fn custom_retry_policy_is_honored() {
        let (coordinator, sleeper, _) = setup();
        let coordinator = coordinator.with_retry_policy(RetryPolicy::default().with_max_attempts(5));
        let space_id = SpaceId::new();

        let err = coordinator
            .handle_concurrent_operation(&space_id, ConflictResolutionPolicy::LastWriteWins, || async {
                Err::<(), _>(DomainError::storage_busy("busy"))
            })
            .await
            .unwrap_err();

        assert_eq!(err.attempts(), Some(5));
        assert_eq!(sleeper.delays().len(), 4);
    }

    #[tokio::test]
    async fn merge_resolves_conflict_and_commits_once() {
        let (coordinator, _, _) = setup();
        let space_id = SpaceId::new();

        let merged = coordinator
            .handle_concurrent_operation_with_merge(
                &space_id,
                || async { Err::<String, _>(DomainError::storage_busy("stale row")) },
                |conflict| async move {
                    assert_eq!(conflict.code, ErrorCode::StorageBusy);
                    Ok("merged".to_string())
                },
            )
            .await
            .unwrap();

        assert_eq!(merged, "merged");
        assert_eq!(coordinator.get_state_version(&space_id), 1);
    }

    #[tokio::test]
    async fn failed_merge_leaves_version_unchanged() {
        let (coordinator, _, _) = setup();
        let space_id = SpaceId::new();

        let err = coordinator
            .handle_concurrent_operation_with_merge(
                &space_id,
                || async { Err::<(), _>(DomainError::storage_busy("stale row")) },
                |_| async { Err(DomainError::validation("title", "cannot merge")) },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::MergeFailed { .. }));
        assert_eq!(coordinator.get_state_version(&space_id), 0);
    }

    #[tokio::test]
    async fn merge_is_skipped_for_permanent_errors() {
        let (coordinator, _, _) = setup();
        let space_id = SpaceId::new();
        let merged = AtomicU32::new(0);

        let err = coordinator
            .handle_concurrent_operation_with_merge(
                &space_id,
                || async { Err::<(), _>(DomainError::new(ErrorCode::Unauthorized, "no session")) },
                |_| {
                    merged.fetch_add(1, Ordering::SeqCst);
                    async { Ok(()) }
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(merged.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reset_returns_version_to_zero() {
        let (coordinator, _, _) = setup();
        let space_id = SpaceId::new();
        for _ in 0..3 {
            coordinator
                .handle_concurrent_operation(&space_id, ConflictResolutionPolicy::default(), || async {
                    Ok::<_, DomainError>(())
                })
                .await
                .unwrap();
        }

        coordinator.reset_state_version(&space_id);

        assert_eq!(coordinator.get_state_version(&space_id), 0);
    }

    #[tokio::test]
    async fn broadcast_update_bumps_version_and_queues_for_members() {
        let (coordinator, _, membership) = setup();
        let space_id = SpaceId::new();
        membership
            .set_members(space_id, [user("founder"), user("dev")])
            .await;

        let update = SpaceStateUpdate::new(
            MessageKind::TaskCreated,
            UpdateAction::Create,
            json!({"taskId": "t-1", "title": "Landing page"}),
        );
        let (version, report) = coordinator
            .broadcast_update(&space_id, update, Some(&user("founder")))
            .await;

        assert_eq!(version, 1);
        assert_eq!(coordinator.get_state_version(&space_id), 1);
        assert_eq!(report, DeliveryReport { online: 0, offline: 1 });

        let queued = coordinator.router().offline_queue().drain(&user("dev"));
        assert_eq!(queued.len(), 1);
        match queued[0].payload() {
            BroadcastPayload::SpaceUpdate(data) => {
                assert_eq!(data.version, 1);
                assert_eq!(data.kind, MessageKind::TaskCreated);
                assert_eq!(data.action, UpdateAction::Create);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[tokio::test]
    async fn full_state_requires_provider() {
        let (coordinator, _, _) = setup();
        let err = coordinator.full_state(&SpaceId::new()).await.unwrap_err();
        assert!(matches!(err, SyncError::FullStateUnavailable));
    }

    #[tokio::test]
    async fn full_state_is_stamped_with_current_version() {
        let (coordinator, _, _) = setup();
        let coordinator = coordinator.with_full_state_provider(Arc::new(StaticStateProvider {
            contents: Some(SpaceContents {
                members: vec![user("founder")],
                ..Default::default()
            }),
        }));
        let space_id = SpaceId::new();
        coordinator
            .handle_concurrent_operation(&space_id, ConflictResolutionPolicy::default(), || async {
                Ok::<_, DomainError>(())
            })
            .await
            .unwrap();

        let snapshot = coordinator.full_state(&space_id).await.unwrap();

        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.contents.members, vec![user("founder")]);
    }

    #[tokio::test]
    async fn full_state_of_unknown_space_fails() {
        let (coordinator, _, _) = setup();
        let coordinator =
            coordinator.with_full_state_provider(Arc::new(StaticStateProvider { contents: None }));
        let space_id = SpaceId::new();

        let err = coordinator.full_state(&space_id).await.unwrap_err();

        assert!(matches!(err, SyncError::UnknownSpace(id) if id == space_id));
    }
}
