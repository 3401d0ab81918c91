//! Layout poller
//!
//! Sweeps the store for the oldest pending course and drives it through the
//! layout endpoint. At most one sweep runs at a time per poller: a tick that
//! finds the previous sweep still running is skipped, not queued.

use anyhow::{Context, Result};
use courseforge_core::domain::transition::Transition;
use courseforge_core::store::CourseStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use crate::config::PollerConfig;
use crate::dispatch::LayoutDispatcher;
use crate::scheduler::retry::{RetryDecision, classify};

/// How a sweep ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Another sweep was still running
    Skipped,
    /// No course was pending
    Idle,
    /// Another worker claimed the course first
    ClaimLost(String),
    /// The endpoint generated and stored the layout
    Succeeded(String),
    /// The endpoint was unreachable; the course is pending again
    Released(String),
    /// Attempts exhausted; the course is marked failed
    Failed(String),
    /// The course left `LAYOUT_PROCESSING` before the poller could release
    /// or fail it; whatever status it has now is kept
    Superseded(String),
    /// An unexpected error after the claim; the course was handed back
    Recovered(String),
    /// An unexpected error before anything was claimed
    Errored,
}

/// Periodic single-flight layout poller
#[derive(Clone)]
pub struct LayoutPoller {
    config: PollerConfig,
    store: Arc<dyn CourseStore>,
    dispatcher: Arc<dyn LayoutDispatcher>,
    gate: Arc<Mutex<()>>,
}

impl LayoutPoller {
    /// Creates a new layout poller
    pub fn new(
        config: PollerConfig,
        store: Arc<dyn CourseStore>,
        dispatcher: Arc<dyn LayoutDispatcher>,
    ) -> Self {
        Self {
            config,
            store,
            dispatcher,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Starts the polling loop
    ///
    /// The first sweep happens one interval after start. Each sweep runs in
    /// its own task so that ticks keep coming while a long retry sequence is
    /// in progress; those ticks are absorbed by the single-flight gate.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting layout poller {} (interval: {:?}, endpoint: {})",
            self.config.worker_id, self.config.poll_interval, self.config.endpoint_url
        );

        let start = Instant::now() + self.config.poll_interval;
        let mut interval = time::interval_at(start, self.config.poll_interval);

        loop {
            interval.tick().await;

            let poller = self.clone();
            tokio::spawn(async move {
                let outcome = poller.sweep().await;
                debug!("Sweep finished: {:?}", outcome);
            });
        }
    }

    /// Performs a single sweep
    ///
    /// Never leaves a course it claimed in `LAYOUT_PROCESSING` unless the
    /// endpoint itself is still responsible for it.
    pub async fn sweep(&self) -> SweepOutcome {
        let Ok(_guard) = self.gate.try_lock() else {
            debug!("Previous sweep still running, skipping this cycle");
            return SweepOutcome::Skipped;
        };

        info!("Checking for pending course layout tasks");

        let mut claimed: Option<String> = None;
        match self.process_next(&mut claimed).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Unexpected error in layout sweep: {:#}", e);
                match claimed {
                    Some(course_id) => {
                        self.recover(&course_id).await;
                        SweepOutcome::Recovered(course_id)
                    }
                    None => SweepOutcome::Errored,
                }
            }
        }
    }

    /// Selects, claims and dispatches the oldest pending course
    ///
    /// `claimed` is set as soon as the claim succeeds so the caller knows
    /// what to hand back if an error escapes afterwards.
    async fn process_next(&self, claimed: &mut Option<String>) -> Result<SweepOutcome> {
        let course = self
            .store
            .find_oldest_pending()
            .await
            .context("Failed to fetch oldest pending course")?;

        let Some(course) = course else {
            info!("No PENDING course layout task");
            return Ok(SweepOutcome::Idle);
        };

        info!("Found course layout task for course {}", course.id);

        let won = self
            .store
            .transition(&course.id, Transition::Claim)
            .await
            .with_context(|| format!("Failed to claim course {}", course.id))?;

        if !won {
            info!(
                "Course {} was already claimed by another instance",
                course.id
            );
            return Ok(SweepOutcome::ClaimLost(course.id));
        }

        *claimed = Some(course.id.clone());
        info!(
            "Worker {} started layout generation for course {}",
            self.config.worker_id, course.id
        );

        self.dispatch_with_retry(&course.id).await
    }

    /// Calls the layout endpoint until it succeeds, the endpoint is found
    /// unreachable, or the attempt ceiling is reached
    async fn dispatch_with_retry(&self, course_id: &str) -> Result<SweepOutcome> {
        let policy = self.config.retry;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let err = match self.dispatcher.dispatch(course_id).await {
                Ok(()) => {
                    info!("Course layout processed successfully: {}", course_id);
                    return Ok(SweepOutcome::Succeeded(course_id.to_string()));
                }
                Err(err) => err,
            };

            error!(
                "Attempt {}/{} failed for course {}: {}",
                attempt, policy.max_attempts, course_id, err
            );

            match policy.decide(attempt, classify(&err.signal)) {
                RetryDecision::Abort => {
                    warn!(
                        "Layout endpoint unreachable ({:?}) for course {}, not retrying",
                        err.signal, course_id
                    );
                    if !self.apply(course_id, Transition::Release).await? {
                        return Ok(SweepOutcome::Superseded(course_id.to_string()));
                    }
                    info!("Course {} reverted to PENDING", course_id);
                    return Ok(SweepOutcome::Released(course_id.to_string()));
                }
                RetryDecision::RetryAfter(delay) => {
                    info!("Retrying course {} in {:?}", course_id, delay);
                    time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    if !self.apply(course_id, Transition::Fail).await? {
                        return Ok(SweepOutcome::Superseded(course_id.to_string()));
                    }
                    error!(
                        "Course {} marked as LAYOUT_FAILED after {} attempts",
                        course_id, attempt
                    );
                    return Ok(SweepOutcome::Failed(course_id.to_string()));
                }
            }
        }
    }

    /// Applies a transition to a claimed course
    ///
    /// Returns `false` on a zero-row update: someone else moved the course
    /// meanwhile and that state is kept.
    async fn apply(&self, course_id: &str, transition: Transition) -> Result<bool> {
        let moved = self
            .store
            .transition(course_id, transition)
            .await
            .with_context(|| format!("Failed to apply {} to course {}", transition, course_id))?;

        if !moved {
            warn!(
                "Course {} is no longer in {}, {:?} not applied",
                course_id,
                transition.source(),
                transition
            );
        }

        Ok(moved)
    }

    /// Hands a claimed course back after an unexpected error
    async fn recover(&self, course_id: &str) {
        match self.store.transition(course_id, Transition::Release).await {
            Ok(true) => info!(
                "Reset course {} to PENDING due to an unexpected error",
                course_id
            ),
            Ok(false) => warn!(
                "Course {} already left LAYOUT_PROCESSING, nothing to reset",
                course_id
            ),
            Err(e) => error!("Failed to reset course {} to PENDING: {}", course_id, e),
        }
    }
}
