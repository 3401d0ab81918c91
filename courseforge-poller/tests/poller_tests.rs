use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use courseforge_core::domain::course::{Course, CourseStatus};
use courseforge_core::domain::layout::CourseLayout;
use courseforge_core::domain::transition::Transition;
use courseforge_core::domain::ProcessingCourse;
use courseforge_core::store::{CourseStore, MemoryCourseStore, StoreError};
use courseforge_poller::{
    DispatchError, FailureSignal, LayoutDispatcher, LayoutPoller, PollerConfig, RetryPolicy,
    SweepOutcome,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{self, Instant};

// =============================================================================
// Test doubles
// =============================================================================

fn pending(id: &str, age_minutes: i64) -> Course {
    Course {
        id: id.to_string(),
        user_id: "u1".to_string(),
        title: Some(format!("Course {}", id)),
        description: None,
        difficulty: None,
        status: CourseStatus::Pending,
        layout: None,
        created_at: Utc::now() - ChronoDuration::minutes(age_minutes),
    }
}

fn layout() -> CourseLayout {
    CourseLayout {
        course_title: "Intro to X".to_string(),
        course_description: "All about X".to_string(),
        difficulty_level: "Beginner".to_string(),
        course_structure: vec![],
    }
}

fn store_with(courses: Vec<Course>) -> Arc<MemoryCourseStore> {
    let store = MemoryCourseStore::new();
    for c in courses {
        store.insert_course(c).unwrap();
    }
    Arc::new(store)
}

async fn status_of(store: &MemoryCourseStore, id: &str) -> CourseStatus {
    store.find_by_id(id).await.unwrap().unwrap().status
}

/// Replays scripted outcomes; a success completes the course in the store
/// the way the layout endpoint would
struct ScriptedDispatcher {
    store: Arc<MemoryCourseStore>,
    script: Mutex<VecDeque<Result<(), DispatchError>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedDispatcher {
    fn new(store: Arc<MemoryCourseStore>, script: Vec<Result<(), DispatchError>>) -> Arc<Self> {
        Arc::new(Self {
            store,
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LayoutDispatcher for ScriptedDispatcher {
    async fn dispatch(&self, course_id: &str) -> Result<(), DispatchError> {
        self.calls
            .lock()
            .unwrap()
            .push((course_id.to_string(), Instant::now()));

        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("dispatcher called more often than scripted");

        if next.is_ok() {
            assert!(self.store.complete(course_id, &layout()).await.unwrap());
        }
        next
    }
}

fn app_failure() -> Result<(), DispatchError> {
    Err(DispatchError::new(
        FailureSignal::Status(500),
        "API error (status 500): AI response parsing failed. Please try again.",
    ))
}

fn poller(store: Arc<dyn CourseStore>, dispatcher: Arc<dyn LayoutDispatcher>) -> LayoutPoller {
    LayoutPoller::new(PollerConfig::default(), store, dispatcher)
}

/// Delegates to a memory store, with injectable faults
struct FaultyStore {
    inner: Arc<MemoryCourseStore>,
    fail_find: bool,
    fail_on: Option<Transition>,
    steal_claim: bool,
}

impl FaultyStore {
    fn new(inner: Arc<MemoryCourseStore>) -> Self {
        Self {
            inner,
            fail_find: false,
            fail_on: None,
            steal_claim: false,
        }
    }
}

#[async_trait]
impl CourseStore for FaultyStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Course>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_oldest_pending(&self) -> Result<Option<Course>, StoreError> {
        if self.fail_find {
            return Err(StoreError::Database("connection closed".to_string()));
        }
        let found = self.inner.find_oldest_pending().await?;
        if let (true, Some(course)) = (self.steal_claim, &found) {
            // Another replica wins the race between select and claim
            assert!(self.inner.transition(&course.id, Transition::Claim).await?);
        }
        Ok(found)
    }

    async fn transition(&self, id: &str, transition: Transition) -> Result<bool, StoreError> {
        if self.fail_on == Some(transition) {
            return Err(StoreError::Database("deadlock detected".to_string()));
        }
        self.inner.transition(id, transition).await
    }

    async fn complete(&self, id: &str, layout: &CourseLayout) -> Result<bool, StoreError> {
        self.inner.complete(id, layout).await
    }

    async fn list_processing(&self) -> Result<Vec<ProcessingCourse>, StoreError> {
        self.inner.list_processing().await
    }
}

// =============================================================================
// Sweep outcomes
// =============================================================================

#[tokio::test]
async fn test_successful_dispatch() {
    let store = store_with(vec![pending("c1", 1)]);
    let dispatcher = ScriptedDispatcher::new(store.clone(), vec![Ok(())]);

    let outcome = poller(store.clone(), dispatcher.clone()).sweep().await;

    assert_eq!(outcome, SweepOutcome::Succeeded("c1".to_string()));
    assert_eq!(dispatcher.calls().len(), 1);
    let c1 = store.find_by_id("c1").await.unwrap().unwrap();
    assert_eq!(c1.status, CourseStatus::LayoutSuccess);
    assert_eq!(c1.layout, Some(layout()));
}

#[tokio::test]
async fn test_oldest_pending_course_goes_first() {
    let store = store_with(vec![pending("newer", 1), pending("older", 30)]);
    let dispatcher = ScriptedDispatcher::new(store.clone(), vec![Ok(())]);

    poller(store.clone(), dispatcher.clone()).sweep().await;

    assert_eq!(dispatcher.calls()[0].0, "older");
    assert_eq!(status_of(&store, "newer").await, CourseStatus::Pending);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_mark_failed() {
    let store = store_with(vec![pending("c1", 1)]);
    let dispatcher = ScriptedDispatcher::new(
        store.clone(),
        vec![
            app_failure(),
            app_failure(),
            app_failure(),
            app_failure(),
            app_failure(),
        ],
    );

    let outcome = poller(store.clone(), dispatcher.clone()).sweep().await;

    assert_eq!(outcome, SweepOutcome::Failed("c1".to_string()));
    assert_eq!(status_of(&store, "c1").await, CourseStatus::LayoutFailed);

    let calls = dispatcher.calls();
    assert_eq!(calls.len(), 5);
    let gaps: Vec<Duration> = calls.windows(2).map(|w| w[1].1 - w[0].1).collect();
    assert_eq!(
        gaps,
        vec![
            Duration::from_millis(2000),
            Duration::from_millis(4000),
            Duration::from_millis(6000),
            Duration::from_millis(8000),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_transient_failures() {
    let store = store_with(vec![pending("c1", 1)]);
    let dispatcher =
        ScriptedDispatcher::new(store.clone(), vec![app_failure(), app_failure(), Ok(())]);

    let outcome = poller(store.clone(), dispatcher.clone()).sweep().await;

    assert_eq!(outcome, SweepOutcome::Succeeded("c1".to_string()));
    assert_eq!(dispatcher.calls().len(), 3);
    assert_eq!(status_of(&store, "c1").await, CourseStatus::LayoutSuccess);
}

#[tokio::test]
async fn test_transport_failure_releases_without_retry() {
    let store = store_with(vec![pending("c1", 1)]);
    let dispatcher = ScriptedDispatcher::new(
        store.clone(),
        vec![Err(DispatchError::new(
            FailureSignal::ConnectionRefused,
            "transport failure (ConnectionRefused)",
        ))],
    );

    let outcome = poller(store.clone(), dispatcher.clone()).sweep().await;

    assert_eq!(outcome, SweepOutcome::Released("c1".to_string()));
    assert_eq!(dispatcher.calls().len(), 1);
    assert_eq!(status_of(&store, "c1").await, CourseStatus::Pending);
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_after_application_failure() {
    let store = store_with(vec![pending("c1", 1)]);
    let dispatcher = ScriptedDispatcher::new(
        store.clone(),
        vec![
            app_failure(),
            Err(DispatchError::new(FailureSignal::TimedOut, "timed out")),
        ],
    );

    let outcome = poller(store.clone(), dispatcher.clone()).sweep().await;

    assert_eq!(outcome, SweepOutcome::Released("c1".to_string()));
    assert_eq!(dispatcher.calls().len(), 2);
    assert_eq!(status_of(&store, "c1").await, CourseStatus::Pending);
}

#[tokio::test]
async fn test_lost_claim_does_nothing() {
    let memory = store_with(vec![pending("c1", 1)]);
    let mut store = FaultyStore::new(memory.clone());
    store.steal_claim = true;
    let dispatcher = ScriptedDispatcher::new(memory.clone(), vec![]);

    let outcome = poller(Arc::new(store), dispatcher.clone()).sweep().await;

    assert_eq!(outcome, SweepOutcome::ClaimLost("c1".to_string()));
    assert!(dispatcher.calls().is_empty());
    // Still owned by the winner
    assert_eq!(status_of(&memory, "c1").await, CourseStatus::LayoutProcessing);
}

#[tokio::test]
async fn test_error_after_claim_reverts_to_pending() {
    let memory = store_with(vec![pending("c1", 1)]);
    let mut store = FaultyStore::new(memory.clone());
    store.fail_on = Some(Transition::Fail);
    let dispatcher = ScriptedDispatcher::new(memory.clone(), vec![app_failure()]);
    let config =
        PollerConfig::default().with_retry(RetryPolicy::new(1, Duration::from_millis(2000)));

    let outcome = LayoutPoller::new(config, Arc::new(store), dispatcher)
        .sweep()
        .await;

    assert_eq!(outcome, SweepOutcome::Recovered("c1".to_string()));
    assert_eq!(status_of(&memory, "c1").await, CourseStatus::Pending);
}

#[tokio::test]
async fn test_error_before_claim_is_a_noop() {
    let memory = store_with(vec![pending("c1", 1)]);
    let mut store = FaultyStore::new(memory.clone());
    store.fail_find = true;
    let dispatcher = ScriptedDispatcher::new(memory.clone(), vec![]);

    let outcome = poller(Arc::new(store), dispatcher.clone()).sweep().await;

    assert_eq!(outcome, SweepOutcome::Errored);
    assert!(dispatcher.calls().is_empty());
    assert_eq!(status_of(&memory, "c1").await, CourseStatus::Pending);
}

#[tokio::test]
async fn test_failed_claim_write_is_a_noop() {
    let memory = store_with(vec![pending("c1", 1)]);
    let mut store = FaultyStore::new(memory.clone());
    store.fail_on = Some(Transition::Claim);
    let dispatcher = ScriptedDispatcher::new(memory.clone(), vec![]);

    let outcome = poller(Arc::new(store), dispatcher).sweep().await;

    assert_eq!(outcome, SweepOutcome::Errored);
    assert_eq!(status_of(&memory, "c1").await, CourseStatus::Pending);
}

/// Reverts the course to PENDING, then fails the call; what the endpoint does
/// when it cannot persist a layout
struct RevertingDispatcher {
    store: Arc<MemoryCourseStore>,
    signal: FailureSignal,
}

#[async_trait]
impl LayoutDispatcher for RevertingDispatcher {
    async fn dispatch(&self, course_id: &str) -> Result<(), DispatchError> {
        assert!(self.store.transition(course_id, Transition::Release).await.unwrap());
        Err(DispatchError::new(self.signal, "Database Error"))
    }
}

#[tokio::test]
async fn test_exhausted_retries_keep_reverted_course_pending() {
    let store = store_with(vec![pending("c1", 1)]);
    let dispatcher = Arc::new(RevertingDispatcher {
        store: store.clone(),
        signal: FailureSignal::Status(500),
    });
    let config =
        PollerConfig::default().with_retry(RetryPolicy::new(1, Duration::from_millis(1)));

    let outcome = LayoutPoller::new(config, store.clone(), dispatcher)
        .sweep()
        .await;

    assert_eq!(outcome, SweepOutcome::Superseded("c1".to_string()));
    assert_eq!(status_of(&store, "c1").await, CourseStatus::Pending);
}

#[tokio::test]
async fn test_transport_failure_on_reverted_course() {
    let store = store_with(vec![pending("c1", 1)]);
    let dispatcher = Arc::new(RevertingDispatcher {
        store: store.clone(),
        signal: FailureSignal::ConnectionReset,
    });

    let outcome = poller(store.clone(), dispatcher).sweep().await;

    assert_eq!(outcome, SweepOutcome::Superseded("c1".to_string()));
    assert_eq!(status_of(&store, "c1").await, CourseStatus::Pending);
}

// =============================================================================
// Single-flight gate
// =============================================================================

/// Blocks inside dispatch until released
struct BlockingDispatcher {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl LayoutDispatcher for BlockingDispatcher {
    async fn dispatch(&self, _course_id: &str) -> Result<(), DispatchError> {
        self.entered.notify_one();
        self.release.notified().await;
        Err(DispatchError::new(
            FailureSignal::ConnectionReset,
            "connection reset",
        ))
    }
}

#[tokio::test]
async fn test_overlapping_sweep_is_skipped() {
    let store = store_with(vec![pending("c1", 2), pending("c2", 1)]);
    let dispatcher = Arc::new(BlockingDispatcher {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let poller = poller(store.clone(), dispatcher.clone());

    let running = tokio::spawn({
        let poller = poller.clone();
        async move { poller.sweep().await }
    });
    dispatcher.entered.notified().await;

    // c2 is pending, but the gate is held
    assert_eq!(poller.sweep().await, SweepOutcome::Skipped);
    assert_eq!(status_of(&store, "c2").await, CourseStatus::Pending);

    dispatcher.release.notify_one();
    assert_eq!(
        running.await.unwrap(),
        SweepOutcome::Released("c1".to_string())
    );

    // Gate is free again
    let next = tokio::spawn({
        let poller = poller.clone();
        async move { poller.sweep().await }
    });
    dispatcher.entered.notified().await;
    dispatcher.release.notify_one();
    assert_eq!(next.await.unwrap(), SweepOutcome::Released("c1".to_string()));
}

// =============================================================================
// Polling loop
// =============================================================================

/// Counts calls and holds each one until released
struct GatedDispatcher {
    calls: AtomicUsize,
    release: Notify,
}

#[async_trait]
impl LayoutDispatcher for GatedDispatcher {
    async fn dispatch(&self, _course_id: &str) -> Result<(), DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        Err(DispatchError::new(
            FailureSignal::ConnectionReset,
            "connection reset",
        ))
    }
}

#[tokio::test(start_paused = true)]
async fn test_run_sweeps_once_per_interval() {
    let store = store_with(vec![pending("c1", 2), pending("c2", 1)]);
    let dispatcher = Arc::new(GatedDispatcher {
        calls: AtomicUsize::new(0),
        release: Notify::new(),
    });
    let poller = poller(store.clone(), dispatcher.clone());

    let running = tokio::spawn(async move { poller.run().await });

    // First sweep happens one interval after start
    time::sleep(Duration::from_secs(59)).await;
    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 0);

    time::sleep(Duration::from_secs(2)).await;
    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(status_of(&store, "c1").await, CourseStatus::LayoutProcessing);

    // The 120 s tick finds the first sweep still dispatching
    time::sleep(Duration::from_secs(60)).await;
    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(status_of(&store, "c2").await, CourseStatus::Pending);

    // Releasing the first sweep does not replay the absorbed tick
    dispatcher.release.notify_one();
    time::sleep(Duration::from_secs(30)).await;
    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(status_of(&store, "c1").await, CourseStatus::Pending);

    // Next regular tick at 180 s
    time::sleep(Duration::from_secs(30)).await;
    assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 2);

    running.abort();
}
