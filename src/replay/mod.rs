// Replay engine - runs action lists on background workers
//
// execute() only schedules: the plan runs on the tokio blocking pool, gated
// by a semaphore. Within one plan actions are strictly ordered; separate
// plans may interleave unless the engine is limited to one permit.

pub mod output;
pub mod plan;

pub use output::{OutputController, OutputError, OutputFactory, SynthKey};
pub use plan::{run_plan, ReplayError, ReplayPlan, ReplayTimings};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::shortcuts::Action;

/// Default number of plans allowed to run at the same time
pub const DEFAULT_MAX_CONCURRENT_REPLAYS: usize = 4;

/// Anything that accepts replay work without blocking the caller
pub trait ReplayDispatcher: Send + Sync {
    fn dispatch(&self, plan: ReplayPlan);
}

/// Tracks plans that are driving the output, so the hook can tell its own
/// synthetic keystrokes apart from the user's
#[derive(Debug, Default)]
pub struct ReplayActivity {
    running: AtomicUsize,
    last_finished: Mutex<Option<Instant>>,
}

impl ReplayActivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a plan runs and for `grace` after the last one finished
    pub fn is_active(&self, grace: Duration) -> bool {
        if self.running.load(Ordering::SeqCst) > 0 {
            return true;
        }
        self.last_finished
            .lock()
            .is_some_and(|at| at.elapsed() < grace)
    }

    /// Mark a plan as running until the guard drops
    pub fn begin(self: &Arc<Self>) -> ActivityGuard {
        self.running.fetch_add(1, Ordering::SeqCst);
        ActivityGuard(self.clone())
    }
}

pub struct ActivityGuard(Arc<ReplayActivity>);

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        *self.0.last_finished.lock() = Some(Instant::now());
        self.0.running.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Fire-and-forget executor for replay plans
pub struct ReplayEngine {
    factory: Arc<dyn OutputFactory>,
    timings: ReplayTimings,
    permits: Arc<Semaphore>,
    activity: Arc<ReplayActivity>,
    runtime: Handle,
}

impl ReplayEngine {
    pub fn new(
        factory: Arc<dyn OutputFactory>,
        timings: ReplayTimings,
        max_concurrent: usize,
        runtime: Handle,
    ) -> Self {
        Self {
            factory,
            timings,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            activity: Arc::new(ReplayActivity::new()),
            runtime,
        }
    }

    pub fn timings(&self) -> &ReplayTimings {
        &self.timings
    }

    pub fn activity(&self) -> Arc<ReplayActivity> {
        self.activity.clone()
    }

    /// Schedule `actions` and return immediately
    pub fn execute(&self, actions: Vec<Action>) -> JoinHandle<Result<(), ReplayError>> {
        self.execute_plan(ReplayPlan::new(actions))
    }

    /// Schedule a plan and return immediately.
    ///
    /// The handle may be dropped; failures are logged on the worker either way.
    pub fn execute_plan(&self, plan: ReplayPlan) -> JoinHandle<Result<(), ReplayError>> {
        let factory = self.factory.clone();
        let timings = self.timings;
        let permits = self.permits.clone();
        let activity = self.activity.clone();

        self.runtime.spawn(async move {
            if crate::shutdown::is_shutting_down() {
                crate::debug!("Skipping replay: shutting down");
                return Err(ReplayError::ShuttingDown);
            }

            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| ReplayError::TaskPanic(e.to_string()))?;
            // Shutdown may have been signaled while this plan was queued
            if crate::shutdown::is_shutting_down() {
                crate::debug!("Dropping queued replay: shutting down");
                return Err(ReplayError::ShuttingDown);
            }

            let erase = plan.erase;
            let count = plan.actions.len();
            crate::debug!("Replay starting: erase {} chars, {} actions", erase, count);

            let result = tokio::task::spawn_blocking(move || {
                let _busy = activity.begin();
                let mut output = factory.open().map_err(ReplayError::Output)?;
                run_plan(output.as_mut(), &plan, &timings)
            })
            .await
            .map_err(|e| ReplayError::TaskPanic(e.to_string()))
            .and_then(|r| r);

            match &result {
                Ok(()) => crate::debug!("Replay finished ({} actions)", count),
                Err(e) => crate::error!("Replay aborted: {}", e),
            }
            result
        })
    }
}

impl ReplayDispatcher for ReplayEngine {
    fn dispatch(&self, plan: ReplayPlan) {
        drop(self.execute_plan(plan));
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
