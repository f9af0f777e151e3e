//! Scene scheduler — time-keyed callback dispatch for `time` triggers.
//!
//! The scheduler holds no device or condition knowledge: it parses the
//! cron expression of every `time` trigger and invokes the registered
//! callback at each matching wall-clock instant in a fixed timezone. The
//! callback is expected to perform its own condition re-evaluation.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use chrono_tz::Tz;
use cron::Schedule;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use scenehub_domain::error::DefinitionError;
use scenehub_domain::id::SceneId;
use scenehub_domain::scene::{Scene, Trigger};

/// Parse a classic 5-field cron expression
/// (`minute hour day month day_of_week`).
///
/// The underlying schedule grammar carries a leading seconds field, so a
/// fixed `0` is prepended; jobs fire at second zero of each matching
/// minute.
///
/// # Errors
///
/// Returns [`DefinitionError`] when the expression does not have exactly
/// five fields or does not parse as a schedule.
pub fn parse_cron(expr: &str) -> Result<Schedule, DefinitionError> {
    let fields = expr.split_whitespace().count();
    if fields != 5 {
        return Err(DefinitionError::new(format!(
            "cron expression `{expr}` must have 5 fields, found {fields}"
        )));
    }
    Schedule::from_str(&format!("0 {expr}"))
        .map_err(|err| DefinitionError::new(format!("cron expression `{expr}` is invalid: {err}")))
}

/// Cron-driven dispatcher mapping scene ids to scheduled callback jobs.
///
/// One tokio task per `time` trigger sleeps until the next matching
/// instant and then spawns the callback fire-and-forget, so a slow
/// execution (e.g. one containing delays) never holds back the next tick
/// or any other scene's schedule.
pub struct SceneScheduler {
    timezone: Tz,
    started: watch::Sender<bool>,
    jobs: Mutex<HashMap<SceneId, Vec<JoinHandle<()>>>>,
}

impl SceneScheduler {
    /// Create a stopped scheduler firing in the given timezone.
    #[must_use]
    pub fn new(timezone: Tz) -> Self {
        let (started, _) = watch::channel(false);
        Self {
            timezone,
            started,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// The timezone schedules are evaluated in.
    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Allow registered jobs to start firing.
    pub fn start(&self) {
        self.started.send_replace(true);
        tracing::info!(timezone = %self.timezone, "scene scheduler started");
    }

    /// Stop firing new triggers and drop all registered jobs.
    ///
    /// Executions already spawned by a previous firing keep running.
    pub fn shutdown(&self) {
        self.started.send_replace(false);
        let jobs: Vec<_> = self.lock().drain().collect();
        for (_, handles) in &jobs {
            for handle in handles {
                handle.abort();
            }
        }
        tracing::info!(scenes = jobs.len(), "scene scheduler stopped");
    }

    /// Register all `time` triggers of a scene.
    ///
    /// Re-registration is idempotent: any existing jobs for the scene id
    /// are dropped first. A malformed cron expression is logged and that
    /// trigger skipped; it does not abort registration of the scene's
    /// other triggers.
    pub fn register<C, Fut>(&self, scene: &Scene, callback: C)
    where
        C: Fn(Scene) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.unregister(&scene.id);

        let callback = Arc::new(callback);
        let mut handles = Vec::new();
        for trigger in &scene.definition.triggers {
            let Trigger::Time { cron } = trigger else {
                continue;
            };
            match parse_cron(cron) {
                Ok(schedule) => {
                    handles.push(self.spawn_job(schedule, scene.clone(), Arc::clone(&callback)));
                }
                Err(err) => {
                    tracing::warn!(scene_id = %scene.id, %cron, error = %err, "skipping malformed cron trigger");
                }
            }
        }

        if handles.is_empty() {
            return;
        }
        tracing::debug!(scene_id = %scene.id, jobs = handles.len(), "registered scene schedule");
        self.lock().insert(scene.id.clone(), handles);
    }

    /// Drop all scheduled jobs for a scene id. Unknown ids are a no-op.
    pub fn unregister(&self, scene_id: &SceneId) {
        if let Some(handles) = self.lock().remove(scene_id) {
            for handle in handles {
                handle.abort();
            }
            tracing::debug!(%scene_id, "unregistered scene schedule");
        }
    }

    /// Ids of all scenes with at least one scheduled job.
    #[must_use]
    pub fn scheduled_scene_ids(&self) -> BTreeSet<SceneId> {
        self.lock().keys().cloned().collect()
    }

    fn spawn_job<C, Fut>(
        &self,
        schedule: Schedule,
        scene: Scene,
        callback: Arc<C>,
    ) -> JoinHandle<()>
    where
        C: Fn(Scene) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let timezone = self.timezone;
        let mut started = self.started.subscribe();
        tokio::spawn(async move {
            // hold until the scheduler is started
            while !*started.borrow_and_update() {
                if started.changed().await.is_err() {
                    return;
                }
            }
            loop {
                let now = Utc::now().with_timezone(&timezone);
                let Some(next) = schedule.after(&now).next() else {
                    tracing::warn!(scene_id = %scene.id, "cron schedule has no future occurrence");
                    return;
                };
                let wait = (next - now).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;

                let scene = scene.clone();
                let callback = Arc::clone(&callback);
                tokio::spawn(async move {
                    (*callback)(scene).await;
                });
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SceneId, Vec<JoinHandle<()>>>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
