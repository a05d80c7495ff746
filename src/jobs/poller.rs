//! Async Job Poller
//!
//! Drives a generation request from submission to a terminal outcome by
//! polling the job service at a fixed interval. Transient per-tick
//! failures are skipped; only the overall wait budget is fatal. The
//! polling task is cancelled deterministically when its stream is
//! dropped — the server-side job is left to run.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::Backend;
use crate::config::PollingConfig;
use crate::error::{ApiError, JobError, ValidationError};
use crate::jobs::models::{GenerationParams, JobHandle, JobOutcome, JobStatus, JobUpdate};
use crate::session::SessionAuthority;

/// Failures of the submission call itself, before any polling begins.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("you need to be signed in to generate videos")]
    NotAuthenticated,

    #[error("could not start generation ({0})")]
    Backend(ApiError),
}

pub struct JobPoller {
    session: Arc<SessionAuthority>,
    backend: Arc<dyn Backend>,
    config: PollingConfig,
}

impl JobPoller {
    pub fn new(
        session: Arc<SessionAuthority>,
        backend: Arc<dyn Backend>,
        config: PollingConfig,
    ) -> Self {
        Self {
            session,
            backend,
            config,
        }
    }

    /// Validate the creative parameters and submit the job. Fails fast
    /// with the missing field name before any network call; returns the
    /// handle as soon as the service acknowledges with an id.
    pub async fn submit(&self, params: &GenerationParams) -> Result<JobHandle, SubmitError> {
        params.validate()?;

        let token = self
            .session
            .bearer_token()
            .await
            .ok_or(SubmitError::NotAuthenticated)?;

        let id = self
            .backend
            .submit_generation(&token, params)
            .await
            .map_err(SubmitError::Backend)?;

        info!("Generation job {} submitted", id);
        Ok(JobHandle { id })
    }

    /// Start polling a submitted job. The returned stream yields
    /// progress snapshots and terminates with exactly one
    /// [`JobUpdate::Done`]; it is not restartable. Dropping the stream
    /// stops the timer and releases the task.
    pub fn poll(&self, handle: &JobHandle) -> JobStream {
        let (update_tx, update_rx) = mpsc::channel(16);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let worker = PollWorker {
            session: Arc::clone(&self.session),
            backend: Arc::clone(&self.backend),
            job_id: handle.id.clone(),
            interval: self.config.interval,
            // Client-side give-up point, not a hard deadline for the job.
            max_ticks: (self.config.budget.as_millis() / self.config.interval.as_millis().max(1))
                .max(1) as u64,
        };
        tokio::spawn(worker.run(update_tx, cancel_rx));

        JobStream {
            updates: update_rx,
            _cancel: cancel_tx,
        }
    }
}

struct PollWorker {
    session: Arc<SessionAuthority>,
    backend: Arc<dyn Backend>,
    job_id: String,
    interval: std::time::Duration,
    max_ticks: u64,
}

impl PollWorker {
    async fn run(self, updates: mpsc::Sender<JobUpdate>, mut cancelled: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // An interval fires immediately; consume that so the first
        // status check happens one full interval after submission.
        ticker.tick().await;

        let mut last_progress = 0u8;

        for tick in 1..=self.max_ticks {
            tokio::select! {
                changed = cancelled.changed() => {
                    // A cancel signal or a dropped stream, either way stop.
                    let _ = changed;
                    debug!("Polling for job {} cancelled at tick {}", self.job_id, tick);
                    return;
                }
                _ = ticker.tick() => {}
            }

            // Re-read the token every tick; login/logout may have
            // changed it while we slept.
            let token = self.session.bearer_token().await.unwrap_or_default();

            let mut snapshot = match self.backend.job_status(&token, &self.job_id).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    // Transient: skip this tick. The budget keeps counting.
                    warn!(
                        "Status check for job {} failed on tick {}, will retry: {}",
                        self.job_id, tick, e
                    );
                    continue;
                }
            };

            // The service may report a lower progress after a retry;
            // never show the user a regression.
            last_progress = last_progress.max(snapshot.progress.min(100));
            snapshot.progress = last_progress;

            match snapshot.status {
                JobStatus::Completed => {
                    let outcome = match snapshot.url {
                        Some(url) => {
                            info!("Job {} completed after {} ticks", self.job_id, tick);
                            JobOutcome::Completed { url }
                        }
                        None => JobOutcome::Failed(JobError::Failed {
                            message: "service reported completion without a video URL".into(),
                        }),
                    };
                    let _ = updates.send(JobUpdate::Done(outcome)).await;
                    return;
                }
                JobStatus::Failed => {
                    let message = snapshot
                        .error
                        .unwrap_or_else(|| "Video generation failed. Please try again.".into());
                    let _ = updates
                        .send(JobUpdate::Done(JobOutcome::Failed(JobError::Failed {
                            message,
                        })))
                        .await;
                    return;
                }
                JobStatus::Queued | JobStatus::Processing => {
                    if updates.send(JobUpdate::Progress(snapshot)).await.is_err() {
                        // Consumer went away.
                        return;
                    }
                }
            }
        }

        warn!(
            "Gave up waiting for job {} after {} ticks; it may still finish server-side",
            self.job_id, self.max_ticks
        );
        let _ = updates
            .send(JobUpdate::Done(JobOutcome::Failed(JobError::TimedOut)))
            .await;
    }
}

/// Finite stream of job updates ending in exactly one terminal
/// [`JobUpdate::Done`]. Dropping it cancels the polling task.
pub struct JobStream {
    updates: mpsc::Receiver<JobUpdate>,
    _cancel: watch::Sender<bool>,
}

impl JobStream {
    /// Drain the stream to its terminal outcome. `None` only if the
    /// poller was torn down before reaching one.
    pub async fn outcome(mut self) -> Option<JobOutcome> {
        while let Some(update) = self.updates.recv().await {
            if let JobUpdate::Done(outcome) = update {
                return Some(outcome);
            }
        }
        None
    }
}

impl Stream for JobStream {
    type Item = JobUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.updates.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use futures::StreamExt;

    use super::*;
    use crate::api::backend::mock::{MockBackend, identity};
    use crate::api::types::AuthPayload;
    use crate::jobs::models::JobSnapshot;
    use crate::session::models::Role;
    use crate::session::storage::MemoryStore;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn params() -> GenerationParams {
        GenerationParams {
            category: "motivation".into(),
            content: "never give up".into(),
            visual_prompt: "sunrise over mountains".into(),
            style: "cinematic".into(),
        }
    }

    fn processing(progress: u8) -> JobSnapshot {
        JobSnapshot {
            status: JobStatus::Processing,
            progress,
            url: None,
            error: None,
        }
    }

    fn completed(url: &str) -> JobSnapshot {
        JobSnapshot {
            status: JobStatus::Completed,
            progress: 100,
            url: Some(url.into()),
            error: None,
        }
    }

    async fn signed_in_poller(backend: Arc<MockBackend>) -> JobPoller {
        backend.script_login(Ok(AuthPayload {
            user: identity("1", Role::User),
            token: "t1".into(),
        }));
        let session = Arc::new(SessionAuthority::new(
            backend.clone(),
            Arc::new(MemoryStore::new()),
        ));
        session.login("a@b.com", "pw").await.unwrap();
        JobPoller::new(session, backend, PollingConfig::default())
    }

    #[tokio::test]
    async fn submit_with_empty_content_makes_no_network_call() {
        let backend = Arc::new(MockBackend::new());
        let poller = signed_in_poller(backend.clone()).await;

        let mut bad = params();
        bad.content = String::new();

        let err = poller.submit(&bad).await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Validation(ValidationError::MissingField("content"))
        ));
        assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn submit_returns_the_acknowledged_id() {
        let backend = Arc::new(MockBackend::new());
        let poller = signed_in_poller(backend.clone()).await;
        backend.script_submit(Ok("job-7".into()));

        let handle = poller.submit(&params()).await.unwrap();
        assert_eq!(handle.id, "job-7");
        assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_emits_progress_then_one_terminal_update() {
        let backend = Arc::new(MockBackend::new());
        let poller = signed_in_poller(backend.clone()).await;
        backend.script_status(Ok(processing(10)));
        backend.script_status(Ok(processing(55)));
        backend.script_status(Ok(completed("x")));

        let mut stream = poller.poll(&JobHandle { id: "job-1".into() });

        assert_eq!(stream.next().await, Some(JobUpdate::Progress(processing(10))));
        assert_eq!(stream.next().await, Some(JobUpdate::Progress(processing(55))));
        assert_eq!(
            stream.next().await,
            Some(JobUpdate::Done(JobOutcome::Completed { url: "x".into() }))
        );
        // Stream closes after the terminal update.
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_tick_failure_does_not_abort_the_loop() {
        init_tracing();
        let backend = Arc::new(MockBackend::new());
        let poller = signed_in_poller(backend.clone()).await;
        backend.script_status(Ok(processing(10)));
        backend.script_status(Ok(processing(20)));
        backend.script_status(Err(ApiError::Transport("connection reset".into())));
        backend.script_status(Ok(processing(30)));
        backend.script_status(Ok(completed("x")));

        let stream = poller.poll(&JobHandle { id: "job-1".into() });
        let updates: Vec<_> = stream.collect().await;

        // The failed tick produced no update but still consumed a tick.
        assert_eq!(updates.len(), 4);
        assert_eq!(
            updates.last(),
            Some(&JobUpdate::Done(JobOutcome::Completed { url: "x".into() }))
        );
        assert_eq!(backend.status_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn budget_exhaustion_times_out_after_exactly_one_hundred_ticks() {
        init_tracing();
        let backend = Arc::new(MockBackend::new());
        let poller = signed_in_poller(backend.clone()).await;
        for _ in 0..150 {
            backend.script_status(Ok(processing(50)));
        }

        let stream = poller.poll(&JobHandle { id: "job-1".into() });
        let outcome = stream.outcome().await;

        assert_eq!(outcome, Some(JobOutcome::Failed(JobError::TimedOut)));
        // 300s budget at a 3s interval: exactly 100 status checks.
        assert_eq!(backend.status_calls.load(Ordering::SeqCst), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_stream_stops_the_ticks() {
        let backend = Arc::new(MockBackend::new());
        let poller = signed_in_poller(backend.clone()).await;
        for _ in 0..10 {
            backend.script_status(Ok(processing(10)));
        }

        let mut stream = poller.poll(&JobHandle { id: "job-1".into() });
        assert!(stream.next().await.is_some());
        drop(stream);

        // Give the worker every chance to keep ticking if cancellation
        // were broken.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.status_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reported_progress_never_regresses() {
        let backend = Arc::new(MockBackend::new());
        let poller = signed_in_poller(backend.clone()).await;
        backend.script_status(Ok(processing(50)));
        backend.script_status(Ok(processing(40)));
        backend.script_status(Ok(completed("x")));

        let stream = poller.poll(&JobHandle { id: "job-1".into() });
        let updates: Vec<_> = stream.collect().await;

        assert_eq!(updates[0], JobUpdate::Progress(processing(50)));
        assert_eq!(updates[1], JobUpdate::Progress(processing(50)));
    }

    #[tokio::test(start_paused = true)]
    async fn completion_without_url_is_a_failure() {
        let backend = Arc::new(MockBackend::new());
        let poller = signed_in_poller(backend.clone()).await;
        backend.script_status(Ok(JobSnapshot {
            status: JobStatus::Completed,
            progress: 100,
            url: None,
            error: None,
        }));

        let outcome = poller.poll(&JobHandle { id: "job-1".into() }).outcome().await;
        assert!(matches!(
            outcome,
            Some(JobOutcome::Failed(JobError::Failed { .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn server_reported_failure_carries_its_message() {
        let backend = Arc::new(MockBackend::new());
        let poller = signed_in_poller(backend.clone()).await;
        backend.script_status(Ok(JobSnapshot {
            status: JobStatus::Failed,
            progress: 30,
            url: None,
            error: Some("content policy rejection".into()),
        }));

        let outcome = poller.poll(&JobHandle { id: "job-1".into() }).outcome().await;
        assert_eq!(
            outcome,
            Some(JobOutcome::Failed(JobError::Failed {
                message: "content policy rejection".into()
            }))
        );
    }
}
