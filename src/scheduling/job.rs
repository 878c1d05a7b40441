//! The job capability consumed by the scheduler runtime

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::cron_spec::CronSpec;

/// Process-unique identifier for a registered job
///
/// Assigned by the caller; the scheduler uses it for upsert and removal
/// bookkeeping only.
pub type JobId = u64;

/// Anything the scheduler can run on a timetable
///
/// The scheduler asks exactly two things of a job: when it next wants to
/// run, and to run. What running means, and whether it succeeds, is the
/// job's own business; the runtime neither awaits nor observes execution.
#[async_trait]
pub trait Job: Send + Sync {
    /// Identifier used for add/update/remove bookkeeping.
    fn id(&self) -> JobId;

    /// Earliest instant strictly after `after` at which this job wants to
    /// run, or `None` when no future run time exists.
    fn next_run_time(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>>;

    /// Execute the job once.
    async fn run(&self);
}

/// Boxed future produced by a [`CronJob`] action on each run
pub type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Standard [`Job`] implementation driving an async action from a
/// [`CronSpec`]
#[derive(Clone)]
pub struct CronJob {
    id: JobId,
    schedule: CronSpec,
    action: Arc<dyn Fn() -> JobFuture + Send + Sync>,
}

impl CronJob {
    pub fn new<F>(id: JobId, schedule: CronSpec, action: F) -> Self
    where
        F: Fn() -> JobFuture + Send + Sync + 'static,
    {
        Self {
            id,
            schedule,
            action: Arc::new(action),
        }
    }

    pub fn schedule(&self) -> &CronSpec {
        &self.schedule
    }
}

#[async_trait]
impl Job for CronJob {
    fn id(&self) -> JobId {
        self.id
    }

    fn next_run_time(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.next_run_time(after)
    }

    async fn run(&self) {
        (self.action)().await;
    }
}

impl fmt::Debug for CronJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CronJob")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
