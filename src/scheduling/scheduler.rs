//! Event-driven scheduler runtime
//!
//! One coordinating worker per scheduler owns the job table and the sorted
//! view of pending run times. It multiplexes a deadline timer, the two
//! mutation inboxes, and the shutdown token in a single `select!`, so
//! mutations and time-based dispatch never race each other and no lock is
//! needed anywhere.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::job::{Job, JobId};

/// Handle to a running scheduler worker
///
/// All methods are non-blocking: mutations are queued to the coordinating
/// worker and applied on its next loop iteration. Construction spawns the
/// worker, so a tokio runtime must be active.
pub struct Scheduler {
    add_or_update_tx: mpsc::UnboundedSender<Arc<dyn Job>>,
    remove_tx: mpsc::UnboundedSender<JobId>,
    shutdown: CancellationToken,
}

impl Scheduler {
    /// Spawn the coordinating worker and return its handle.
    pub fn new() -> Self {
        let (add_or_update_tx, add_or_update_rx) = mpsc::unbounded_channel();
        let (remove_tx, remove_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let worker = SchedulerWorker::new();
        tokio::spawn(worker.run(add_or_update_rx, remove_rx, shutdown.clone()));

        Self {
            add_or_update_tx,
            remove_tx,
            shutdown,
        }
    }

    /// Register a job, replacing any existing job with the same ID.
    pub fn add_or_update(&self, job: Arc<dyn Job>) {
        if self.shutdown.is_cancelled() {
            debug!(job_id = job.id(), "scheduler is shut down, dropping add/update");
            return;
        }
        let _ = self.add_or_update_tx.send(job);
    }

    /// Unregister a job. Removing an unknown ID is a no-op.
    pub fn remove(&self, id: JobId) {
        if self.shutdown.is_cancelled() {
            debug!(job_id = id, "scheduler is shut down, dropping removal");
            return;
        }
        let _ = self.remove_tx.send(id);
    }

    /// Stop the worker. Idempotent. Mutations submitted afterwards are
    /// discarded; already-dispatched job executions are not cancelled.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A job ID paired with its most recently computed next run time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledEntry {
    id: JobId,
    next_run: DateTime<Utc>,
}

/// Single coordinating worker owning all scheduler state
struct SchedulerWorker {
    jobs: HashMap<JobId, Arc<dyn Job>>,
    /// Ascending by (next_run, id); rebuilt before every sleep decision
    entries: Vec<ScheduledEntry>,
}

impl SchedulerWorker {
    fn new() -> Self {
        Self {
            jobs: HashMap::new(),
            entries: Vec::new(),
        }
    }

    async fn run(
        mut self,
        mut add_or_update_rx: mpsc::UnboundedReceiver<Arc<dyn Job>>,
        mut remove_rx: mpsc::UnboundedReceiver<JobId>,
        shutdown: CancellationToken,
    ) {
        info!("scheduler worker started");

        loop {
            self.rebuild_entries(Utc::now());
            let wake_after = self.time_until_next_wake(Utc::now());
            trace!(wake_after_ms = wake_after.as_millis() as u64, "scheduler sleeping");

            tokio::select! {
                _ = sleep(wake_after) => {
                    self.dispatch_due(Utc::now());
                }
                maybe_job = add_or_update_rx.recv() => {
                    match maybe_job {
                        Some(job) => {
                            debug!(job_id = job.id(), "applying job add/update");
                            self.jobs.insert(job.id(), job);
                        }
                        // All handles dropped without an explicit shutdown
                        None => {
                            info!("scheduler handle dropped, worker stopping");
                            break;
                        }
                    }
                }
                Some(id) = remove_rx.recv() => {
                    debug!(job_id = id, "applying job removal");
                    self.jobs.remove(&id);
                }
                _ = shutdown.cancelled() => {
                    info!("scheduler worker shutting down");
                    break;
                }
            }
        }
    }

    /// Recompute every live job's next run time relative to `now` and
    /// rebuild the ordered view. Equal run times tie-break on job ID, so
    /// dispatch order is deterministic.
    fn rebuild_entries(&mut self, now: DateTime<Utc>) {
        self.entries.clear();
        for (id, job) in &self.jobs {
            match job.next_run_time(now) {
                Some(next_run) => self.entries.push(ScheduledEntry { id: *id, next_run }),
                None => debug!(job_id = *id, "job has no future run time, not scheduled"),
            }
        }
        self.entries.sort_unstable_by_key(|entry| (entry.next_run, entry.id));
    }

    /// Time to sleep before the earliest pending entry, or a bounded idle
    /// wait when nothing is scheduled. An already-passed deadline yields a
    /// zero sleep, so the timer branch fires immediately.
    fn time_until_next_wake(&self, now: DateTime<Utc>) -> StdDuration {
        let wake_at = match self.entries.first() {
            Some(entry) => entry.next_run,
            None => now + Duration::days(1),
        };
        (wake_at - now).to_std().unwrap_or(StdDuration::ZERO)
    }

    /// Fire every job whose computed run time has been reached. Entries are
    /// sorted ascending, so the walk stops at the first future entry. Each
    /// due job runs as its own spawned task and is never awaited here.
    fn dispatch_due(&self, now: DateTime<Utc>) {
        for entry in &self.entries {
            if entry.next_run > now {
                break;
            }
            if let Some(job) = self.jobs.get(&entry.id) {
                debug!(job_id = entry.id, scheduled_for = %entry.next_run, "dispatching job");
                let job = Arc::clone(job);
                tokio::spawn(async move {
                    job.run().await;
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedJob {
        id: JobId,
        fire_at: DateTime<Utc>,
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Job for FixedJob {
        fn id(&self) -> JobId {
            self.id
        }

        fn next_run_time(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
            (self.fire_at > after).then_some(self.fire_at)
        }

        async fn run(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn fixed_job(id: JobId, fire_at: DateTime<Utc>) -> (Arc<dyn Job>, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let job = Arc::new(FixedJob {
            id,
            fire_at,
            runs: runs.clone(),
        });
        (job, runs)
    }

    #[tokio::test]
    async fn test_rebuild_sorts_by_time_then_id() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = now + Duration::seconds(10);
        let sooner = now + Duration::seconds(5);

        let mut worker = SchedulerWorker::new();
        for (id, fire_at) in [(9, later), (2, sooner), (1, later)] {
            let (job, _) = fixed_job(id, fire_at);
            worker.jobs.insert(id, job);
        }

        worker.rebuild_entries(now);
        let order: Vec<JobId> = worker.entries.iter().map(|e| e.id).collect();
        assert_eq!(order, vec![2, 1, 9]);
    }

    #[tokio::test]
    async fn test_rebuild_skips_jobs_without_future_runs() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut worker = SchedulerWorker::new();
        let (past, _) = fixed_job(1, now - Duration::seconds(30));
        let (future, _) = fixed_job(2, now + Duration::seconds(30));
        worker.jobs.insert(1, past);
        worker.jobs.insert(2, future);

        worker.rebuild_entries(now);
        assert_eq!(worker.entries.len(), 1);
        assert_eq!(worker.entries[0].id, 2);
    }

    #[tokio::test]
    async fn test_dispatch_stops_at_first_future_entry() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut worker = SchedulerWorker::new();
        let (due, due_runs) = fixed_job(1, now);
        let (pending, pending_runs) = fixed_job(2, now + Duration::seconds(5));
        worker.jobs.insert(1, due);
        worker.jobs.insert(2, pending);

        worker.rebuild_entries(now - Duration::seconds(1));
        worker.dispatch_due(now);
        tokio::task::yield_now().await;

        assert_eq!(due_runs.load(Ordering::SeqCst), 1);
        assert_eq!(pending_runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_idle_worker_uses_bounded_fallback_wait() {
        let worker = SchedulerWorker::new();
        let now = Utc::now();
        let wake_after = worker.time_until_next_wake(now);
        assert!(wake_after <= StdDuration::from_secs(24 * 60 * 60));
        assert!(wake_after > StdDuration::from_secs(23 * 60 * 60));
    }
}
