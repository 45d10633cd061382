//! Shared test helpers for reconciliation integration tests.
//!
//! Provides a scripted in-memory `WorkflowEngine`, monitor construction
//! with short poll intervals, and event collection with timeouts so
//! individual test modules can focus on behaviour rather than plumbing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Map;
use tokio::sync::mpsc;

use shipment_watch::engine::{EngineFuture, WorkflowEngine};
use shipment_watch::models::command::CommandToken;
use shipment_watch::models::snapshot::{ErrorDescriptor, WorkflowSnapshot};
use shipment_watch::monitor::{Monitor, MonitorSettings};
use shipment_watch::reconcile::events::WatchEvent;
use shipment_watch::reconcile::session::SessionUpdate;
use shipment_watch::AppError;

/// Poll interval used by every integration test.
pub const TEST_INTERVAL: Duration = Duration::from_millis(10);

/// Upper bound for waiting on any asynchronous outcome.
pub const WAIT: Duration = Duration::from_secs(5);

/// One scripted answer to `fetch_snapshot`.
#[derive(Debug, Clone)]
pub enum Step {
    /// Return this snapshot.
    Snapshot(WorkflowSnapshot),
    /// Fail as if the engine were unreachable.
    Unreachable,
}

#[derive(Default)]
struct Script {
    queue: VecDeque<Step>,
    last: Option<WorkflowSnapshot>,
}

/// In-memory engine answering fetches from per-instance scripts.
///
/// Once a script is exhausted, the last returned snapshot is repeated,
/// mirroring an engine whose state has stopped changing.
#[derive(Default)]
pub struct FakeEngine {
    scripts: Mutex<HashMap<String, Script>>,
    fetch_delay: Mutex<Duration>,
    fail_mutations: AtomicBool,
    fail_create: AtomicBool,
    fetches: Mutex<HashMap<String, usize>>,
    mutations: AtomicUsize,
    /// Every `(instance, token)` sent as a resolution.
    pub resolutions: Mutex<Vec<(String, CommandToken)>>,
    /// Every withdrawn instance.
    pub withdrawals: Mutex<Vec<String>>,
    /// Every `(instance, paused)` directive.
    pub pauses: Mutex<Vec<(String, bool)>>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Append steps to the script of `instance_id`.
    pub fn push(&self, instance_id: &str, steps: impl IntoIterator<Item = Step>) {
        let mut scripts = self.scripts.lock().unwrap();
        scripts
            .entry(instance_id.to_owned())
            .or_default()
            .queue
            .extend(steps);
    }

    /// Append plain snapshots to the script of `instance_id`.
    pub fn push_snapshots(
        &self,
        instance_id: &str,
        snapshots: impl IntoIterator<Item = WorkflowSnapshot>,
    ) {
        self.push(instance_id, snapshots.into_iter().map(Step::Snapshot));
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = delay;
    }

    pub fn fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Number of fetches issued for `instance_id`.
    pub fn fetch_count(&self, instance_id: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .get(instance_id)
            .copied()
            .unwrap_or(0)
    }

    /// Number of mutating requests received (resolutions, withdrawals, pauses).
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn next_step(&self, instance_id: &str) -> Result<WorkflowSnapshot, AppError> {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(instance_id.to_owned())
            .or_default() += 1;

        let mut scripts = self.scripts.lock().unwrap();
        let Some(script) = scripts.get_mut(instance_id) else {
            return Err(AppError::Engine {
                status: 404,
                message: format!("unknown shipment {instance_id}"),
            });
        };
        match script.queue.pop_front() {
            Some(Step::Snapshot(snapshot)) => {
                script.last = Some(snapshot.clone());
                Ok(snapshot)
            }
            Some(Step::Unreachable) => Err(AppError::Http("connection refused".into())),
            None => script
                .last
                .clone()
                .ok_or_else(|| AppError::Http("no snapshot scripted yet".into())),
        }
    }

    fn mutate(&self) -> Result<(), AppError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        if self.fail_mutations.load(Ordering::SeqCst) {
            Err(AppError::Engine {
                status: 500,
                message: "internal error".into(),
            })
        } else {
            Ok(())
        }
    }
}

impl WorkflowEngine for FakeEngine {
    fn create_instance<'a>(&'a self, scenario_id: &'a str) -> EngineFuture<'a, String> {
        Box::pin(async move {
            if self.fail_create.load(Ordering::SeqCst) {
                return Err(AppError::Engine {
                    status: 422,
                    message: format!("unknown scenario {scenario_id}"),
                });
            }
            Ok(format!("ship-{scenario_id}"))
        })
    }

    fn fetch_snapshot<'a>(&'a self, instance_id: &'a str) -> EngineFuture<'a, WorkflowSnapshot> {
        Box::pin(async move {
            let delay = *self.fetch_delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.next_step(instance_id)
        })
    }

    fn submit_resolution<'a>(
        &'a self,
        instance_id: &'a str,
        choice: CommandToken,
    ) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            self.mutate()?;
            self.resolutions
                .lock()
                .unwrap()
                .push((instance_id.to_owned(), choice));
            Ok(())
        })
    }

    fn withdraw<'a>(&'a self, instance_id: &'a str) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            self.mutate()?;
            self.withdrawals.lock().unwrap().push(instance_id.to_owned());
            Ok(())
        })
    }

    fn set_paused<'a>(&'a self, instance_id: &'a str, paused: bool) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            self.mutate()?;
            self.pauses
                .lock()
                .unwrap()
                .push((instance_id.to_owned(), paused));
            Ok(())
        })
    }
}

/// Monitor over `engine` with the test poll interval.
pub fn test_monitor(engine: &Arc<FakeEngine>) -> (Monitor, mpsc::Receiver<WatchEvent>) {
    let (tx, rx) = mpsc::channel(1024);
    let settings = MonitorSettings {
        poll_interval: TEST_INTERVAL,
        critical_halt_status: "CRITICAL_HALT".into(),
    };
    let engine: Arc<dyn WorkflowEngine> = Arc::clone(engine) as Arc<dyn WorkflowEngine>;
    (Monitor::new(engine, settings, tx), rx)
}

/// Snapshot with only a status.
pub fn status(code: &str) -> WorkflowSnapshot {
    WorkflowSnapshot::with_status(code)
}

/// Snapshot blocked on a decision.
pub fn blocked(code: &str, reason: &str, options: &[&str]) -> WorkflowSnapshot {
    WorkflowSnapshot::with_status(code).with_error(ErrorDescriptor {
        reason: reason.to_owned(),
        details: format!("{reason} needs attention"),
        resolution_options: options.iter().map(|o| (*o).to_owned()).collect(),
        enhanced_options: None,
        eta_impact: None,
        hints: Map::new(),
    })
}

/// Receive events until one satisfies `stop`, returning all of them.
///
/// Panics if the condition is not met within [`WAIT`].
pub async fn collect_until(
    rx: &mut mpsc::Receiver<WatchEvent>,
    stop: impl Fn(&WatchEvent) -> bool,
) -> Vec<WatchEvent> {
    let mut events = Vec::new();
    let outcome = tokio::time::timeout(WAIT, async {
        while let Some(event) = rx.recv().await {
            let done = stop(&event);
            events.push(event);
            if done {
                return true;
            }
        }
        false
    })
    .await;
    assert!(
        matches!(outcome, Ok(true)),
        "condition not reached; events so far: {events:#?}"
    );
    events
}

/// Receive events until the workflow finishes.
pub async fn collect_until_finished(rx: &mut mpsc::Receiver<WatchEvent>) -> Vec<WatchEvent> {
    collect_until(rx, |event| {
        matches!(event.update, SessionUpdate::Finished(_))
    })
    .await
}

/// Receive events until a decision prompt appears.
pub async fn collect_until_decision(rx: &mut mpsc::Receiver<WatchEvent>) -> Vec<WatchEvent> {
    collect_until(rx, |event| {
        matches!(event.update, SessionUpdate::DecisionRequired(_))
    })
    .await
}

/// Messages of every `Logged` event, in order.
pub fn logged(events: &[WatchEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match &event.update {
            SessionUpdate::Logged(entry) => Some(entry.message.clone()),
            _ => None,
        })
        .collect()
}

/// Wait until the monitor's poll loop has exited.
pub async fn wait_until_idle(monitor: &Monitor) {
    tokio::time::timeout(WAIT, async {
        while monitor.is_polling() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("poll loop should stop");
}
