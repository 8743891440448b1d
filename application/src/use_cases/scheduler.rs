//! Task scheduler
//!
//! Admits tasks under per-agent quotas and runs them on an
//! [`AgentTaskExecutor`]. A task whose agent is at capacity stays pending;
//! pending tasks are re-scanned in priority order (ties by submission order)
//! whenever a running task completes or fails. There is no retry: a failed
//! task is terminal.
//!
//! Tasks are kept for the lifetime of the scheduler, including terminal
//! ones, so the map grows with every submission.

use crate::events::EventBus;
use crate::ports::agent_executor::{AgentTaskExecutor, ExecutorError};
use crate::registry::{Admission, AgentRegistry};
use council_domain::task::dispatch_order;
use council_domain::{Agent, AgentId, CouncilEvent, Task, TaskId, TaskPriority, TaskStatus};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

pub const AGENT_NOT_FOUND: &str = "Agent not found";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("Invalid task: {0}")]
    InvalidTask(String),
}

/// What happened when a task was offered to its agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Quota taken, task is processing
    Dispatched,
    /// Agent at capacity, task left pending
    Deferred,
    /// Unknown agent, task failed
    Rejected,
    /// Unknown task, or not pending
    NotPending,
}

#[derive(Default)]
struct SchedulerState {
    tasks: HashMap<TaskId, Task>,
    next_seq: u64,
}

pub struct TaskScheduler {
    registry: Arc<AgentRegistry>,
    executor: Arc<dyn AgentTaskExecutor>,
    events: EventBus,
    state: Mutex<SchedulerState>,
    tracker: TaskTracker,
}

impl TaskScheduler {
    pub fn new(
        registry: Arc<AgentRegistry>,
        executor: Arc<dyn AgentTaskExecutor>,
        events: EventBus,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            executor,
            events,
            state: Mutex::new(SchedulerState::default()),
            tracker: TaskTracker::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Submit a task and try to dispatch it right away.
    pub fn create_task(
        self: &Arc<Self>,
        agent_id: impl Into<AgentId>,
        task_type: impl Into<String>,
        content: impl Into<String>,
        priority: TaskPriority,
    ) -> Result<TaskId, SchedulerError> {
        let task_type = task_type.into();
        if task_type.trim().is_empty() {
            return Err(SchedulerError::InvalidTask("task type is empty".to_string()));
        }
        let agent_id = agent_id.into();

        let id = {
            let mut state = self.lock();
            state.next_seq += 1;
            let seq = state.next_seq;
            let id = TaskId::sequential(seq);
            let task = Task::new(id.clone(), agent_id.clone(), task_type, content, priority, seq);
            state.tasks.insert(id.clone(), task);
            id
        };

        debug!(task = %id, agent = %agent_id, %priority, "Task submitted");
        self.events.publish(CouncilEvent::TaskSubmitted {
            task_id: id.clone(),
            agent_id,
        });
        self.schedule_task(&id);
        Ok(id)
    }

    /// Offer a pending task to its agent.
    pub fn schedule_task(self: &Arc<Self>, id: &TaskId) -> ScheduleOutcome {
        let mut state = self.lock();
        let Some(task) = state.tasks.get_mut(id) else {
            return ScheduleOutcome::NotPending;
        };
        if !task.is_pending() {
            return ScheduleOutcome::NotPending;
        }

        match self.registry.try_acquire(&task.agent_id) {
            Admission::NotFound => {
                task.mark_failed(AGENT_NOT_FOUND);
                let agent_id = task.agent_id.clone();
                drop(state);
                warn!(task = %id, agent = %agent_id, "Task rejected: agent not found");
                self.publish_terminal(id, agent_id, TaskStatus::Failed, Some(AGENT_NOT_FOUND));
                ScheduleOutcome::Rejected
            }
            Admission::AtCapacity => {
                debug!(task = %id, agent = %task.agent_id, "Agent at capacity, task deferred");
                ScheduleOutcome::Deferred
            }
            Admission::Admitted(agent) => {
                task.mark_processing();
                let snapshot = task.clone();
                drop(state);

                info!(task = %id, agent = %agent.id, "Task dispatched");
                self.events.publish(CouncilEvent::TaskUpdated {
                    task_id: id.clone(),
                    status: TaskStatus::Processing,
                });

                let scheduler = Arc::clone(self);
                self.tracker.spawn(async move {
                    scheduler.run(agent, snapshot).await;
                });
                ScheduleOutcome::Dispatched
            }
        }
    }

    async fn run(self: Arc<Self>, agent: Agent, task: Task) {
        let result = AssertUnwindSafe(self.executor.execute(&agent, &task))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(ExecutorError::Failed("executor panicked".to_string())));

        let (status, output, error) = match result {
            Ok(output) => (TaskStatus::Completed, Some(output), None),
            Err(e) => (TaskStatus::Failed, None, Some(e.to_string())),
        };

        // The task may already have been finalised through update_task_status,
        // which released the quota itself.
        if self.finish(&task.id, status, output, error).is_some() {
            self.check_for_next_tasks();
        } else {
            debug!(task = %task.id, "Task already finalised, dropping executor result");
        }
    }

    /// Move a task to a terminal status, releasing its quota slot if it was
    /// processing. Returns `None` if the transition was not allowed, else
    /// whether a slot was freed.
    fn finish(
        &self,
        id: &TaskId,
        status: TaskStatus,
        result: Option<String>,
        error: Option<String>,
    ) -> Option<bool> {
        let (agent_id, was_processing, error) = {
            let mut state = self.lock();
            let task = state.tasks.get_mut(id)?;
            let was_processing = task.status == TaskStatus::Processing;
            if !task.transition(status, result, error) {
                return None;
            }
            (task.agent_id.clone(), was_processing, task.error.clone())
        };

        if was_processing {
            self.registry
                .release(&agent_id, status == TaskStatus::Completed);
        }

        match status {
            TaskStatus::Completed => info!(task = %id, agent = %agent_id, "Task completed"),
            _ => warn!(task = %id, agent = %agent_id, error = ?error, "Task failed"),
        }
        self.publish_terminal(id, agent_id, status, error.as_deref());
        Some(was_processing)
    }

    fn publish_terminal(&self, id: &TaskId, agent_id: AgentId, status: TaskStatus, error: Option<&str>) {
        self.events.publish(CouncilEvent::TaskUpdated {
            task_id: id.clone(),
            status,
        });
        let event = match status {
            TaskStatus::Completed => CouncilEvent::TaskCompleted {
                task_id: id.clone(),
                agent_id,
            },
            _ => CouncilEvent::TaskFailed {
                task_id: id.clone(),
                agent_id,
                error: error.unwrap_or_default().to_string(),
            },
        };
        self.events.publish(event);
    }

    /// Finalise a task from outside the executor.
    ///
    /// Only `completed` and `failed` are accepted, and only as forward
    /// transitions. Returns `false` for unknown tasks or illegal transitions.
    pub fn update_task_status(
        self: &Arc<Self>,
        id: &TaskId,
        status: TaskStatus,
        result: Option<String>,
        error: Option<String>,
    ) -> bool {
        if !status.is_terminal() {
            return false;
        }
        let Some(freed) = self.finish(id, status, result, error) else {
            return false;
        };
        if freed {
            self.check_for_next_tasks();
        }
        true
    }

    /// Re-offer every pending task in dispatch order. Returns how many were
    /// dispatched.
    pub fn check_for_next_tasks(self: &Arc<Self>) -> usize {
        let pending: Vec<TaskId> = self.get_pending_tasks().into_iter().map(|t| t.id).collect();
        pending
            .iter()
            .filter(|id| self.schedule_task(id) == ScheduleOutcome::Dispatched)
            .count()
    }

    /// Pending tasks, highest priority first, then by submission order.
    pub fn get_pending_tasks(&self) -> Vec<Task> {
        let mut pending: Vec<Task> = self
            .lock()
            .tasks
            .values()
            .filter(|t| t.is_pending())
            .cloned()
            .collect();
        pending.sort_by(dispatch_order);
        pending
    }

    pub fn get_task(&self, id: &TaskId) -> Option<Task> {
        self.lock().tasks.get(id).cloned()
    }

    pub fn task_count(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Wait for every dispatched task, including ones dispatched while
    /// waiting, to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use council_domain::{AgentStatus, Quota};
    use tokio::sync::Semaphore;

    /// Records execution order; every task waits for a semaphore permit.
    /// Content `"boom"` fails.
    struct GatedExecutor {
        gate: Semaphore,
        order: Mutex<Vec<String>>,
        registry: Arc<AgentRegistry>,
    }

    impl GatedExecutor {
        fn new(registry: Arc<AgentRegistry>, permits: usize) -> Arc<Self> {
            Arc::new(Self {
                gate: Semaphore::new(permits),
                order: Mutex::new(Vec::new()),
                registry,
            })
        }

        fn order(&self) -> Vec<String> {
            self.order.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AgentTaskExecutor for GatedExecutor {
        async fn execute(&self, agent: &Agent, task: &Task) -> Result<String, ExecutorError> {
            let quota = self.registry.quota(&agent.id).unwrap();
            assert!(quota.current_usage() <= quota.max_concurrent_tasks());

            let permit = self.gate.acquire().await.unwrap();
            permit.forget();
            self.order.lock().unwrap().push(task.content.clone());
            if task.content == "boom" {
                return Err(ExecutorError::Failed("boom".to_string()));
            }
            Ok(format!("done: {}", task.content))
        }
    }

    fn setup(limit: u32, permits: usize) -> (Arc<TaskScheduler>, Arc<AgentRegistry>, Arc<GatedExecutor>, EventBus) {
        let events = EventBus::new(256);
        let registry = Arc::new(AgentRegistry::new(events.clone()));
        registry.register_agent_with_quota(Agent::new("tutor", "mathematics"), Quota::with_limit(limit));
        let executor = GatedExecutor::new(Arc::clone(&registry), permits);
        let scheduler = TaskScheduler::new(
            Arc::clone(&registry),
            Arc::clone(&executor) as Arc<dyn AgentTaskExecutor>,
            events.clone(),
        );
        (scheduler, registry, executor, events)
    }

    fn tutor() -> AgentId {
        AgentId::new("tutor")
    }

    #[tokio::test]
    async fn test_agent_at_capacity_defers_without_mutation() {
        let (scheduler, registry, _executor, _events) = setup(1, 0);
        assert!(matches!(registry.try_acquire(&tutor()), Admission::Admitted(_)));
        let status_before = registry.get_agent(&tutor()).unwrap().status;
        let quota_before = registry.quota(&tutor()).unwrap();

        let id = scheduler
            .create_task("tutor", "explain", "fractions", TaskPriority::Normal)
            .unwrap();

        assert_eq!(scheduler.get_task(&id).unwrap().status, TaskStatus::Pending);
        assert_eq!(registry.get_agent(&tutor()).unwrap().status, status_before);
        assert_eq!(registry.quota(&tutor()).unwrap(), quota_before);
        assert_eq!(scheduler.schedule_task(&id), ScheduleOutcome::Deferred);
    }

    #[tokio::test]
    async fn test_completion_updates_success_rate() {
        let (scheduler, registry, _executor, _events) = setup(1, 10);
        let id = scheduler
            .create_task("tutor", "explain", "fractions", TaskPriority::Normal)
            .unwrap();
        scheduler.drain().await;

        let task = scheduler.get_task(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result.as_deref(), Some("done: fractions"));
        assert!((registry.success_rate(&tutor()).unwrap() - 0.55).abs() < 1e-9);
        assert_eq!(registry.quota(&tutor()).unwrap().current_usage(), 0);
        assert_eq!(registry.get_agent(&tutor()).unwrap().status, AgentStatus::Idle);
    }

    #[tokio::test]
    async fn test_failure_is_terminal() {
        let (scheduler, registry, _executor, _events) = setup(1, 10);
        let id = scheduler
            .create_task("tutor", "explain", "boom", TaskPriority::Normal)
            .unwrap();
        scheduler.drain().await;

        let task = scheduler.get_task(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.unwrap().contains("boom"));
        assert!((registry.success_rate(&tutor()).unwrap() - 0.45).abs() < 1e-9);
        assert_eq!(scheduler.check_for_next_tasks(), 0);
    }

    #[tokio::test]
    async fn test_unknown_agent_fails_task() {
        let (scheduler, _registry, _executor, _events) = setup(1, 10);
        let id = scheduler
            .create_task("ghost", "explain", "x", TaskPriority::High)
            .unwrap();

        let task = scheduler.get_task(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some(AGENT_NOT_FOUND));
        assert!(scheduler.get_pending_tasks().is_empty());
    }

    #[tokio::test]
    async fn test_pending_dispatched_by_priority_then_submission() {
        let (scheduler, _registry, executor, _events) = setup(1, 0);
        scheduler.create_task("tutor", "t", "first", TaskPriority::Low).unwrap();
        scheduler.create_task("tutor", "t", "low", TaskPriority::Low).unwrap();
        scheduler.create_task("tutor", "t", "high-1", TaskPriority::High).unwrap();
        scheduler.create_task("tutor", "t", "critical", TaskPriority::Critical).unwrap();
        scheduler.create_task("tutor", "t", "high-2", TaskPriority::High).unwrap();

        let pending: Vec<String> = scheduler
            .get_pending_tasks()
            .into_iter()
            .map(|t| t.content)
            .collect();
        assert_eq!(pending, vec!["critical", "high-1", "high-2", "low"]);

        executor.gate.add_permits(10);
        scheduler.drain().await;
        assert_eq!(
            executor.order(),
            vec!["first", "critical", "high-1", "high-2", "low"]
        );
    }

    #[tokio::test]
    async fn test_quota_never_exceeded() {
        let (scheduler, registry, executor, _events) = setup(2, 0);
        for i in 0..6 {
            scheduler
                .create_task("tutor", "t", format!("task {i}"), TaskPriority::Normal)
                .unwrap();
        }
        let quota = registry.quota(&tutor()).unwrap();
        assert_eq!(quota.current_usage(), 2);
        assert_eq!(scheduler.get_pending_tasks().len(), 4);

        executor.gate.add_permits(6);
        scheduler.drain().await;
        assert_eq!(registry.quota(&tutor()).unwrap().current_usage(), 0);
        assert_eq!(registry.task_stats(&tutor()).unwrap().total_tasks, 6);
        assert_eq!(executor.order().len(), 6);
    }

    #[tokio::test]
    async fn test_update_task_status_rules() {
        let (scheduler, registry, _executor, _events) = setup(1, 0);
        assert!(matches!(registry.try_acquire(&tutor()), Admission::Admitted(_)));
        let id = scheduler.create_task("tutor", "t", "x", TaskPriority::Normal).unwrap();

        assert!(!scheduler.update_task_status(&id, TaskStatus::Processing, None, None));
        assert!(scheduler.update_task_status(&id, TaskStatus::Completed, Some("manual".into()), None));
        assert!(!scheduler.update_task_status(&id, TaskStatus::Failed, None, Some("late".into())));
        assert!(!scheduler.update_task_status(&TaskId::new("task-99"), TaskStatus::Completed, None, None));

        let task = scheduler.get_task(&id).unwrap();
        assert_eq!(task.result.as_deref(), Some("manual"));
        assert_eq!(task.error, None);
        // A pending task never held a slot.
        assert_eq!(registry.quota(&tutor()).unwrap().current_usage(), 1);
    }

    #[tokio::test]
    async fn test_external_finalise_releases_quota_once() {
        let (scheduler, registry, executor, _events) = setup(1, 0);
        let id = scheduler.create_task("tutor", "t", "x", TaskPriority::Normal).unwrap();
        assert_eq!(scheduler.get_task(&id).unwrap().status, TaskStatus::Processing);

        assert!(scheduler.update_task_status(&id, TaskStatus::Failed, None, Some("cancelled".into())));
        assert_eq!(registry.quota(&tutor()).unwrap().current_usage(), 0);

        executor.gate.add_permits(1);
        scheduler.drain().await;
        assert_eq!(scheduler.get_task(&id).unwrap().status, TaskStatus::Failed);
        assert_eq!(registry.quota(&tutor()).unwrap().current_usage(), 0);
        assert_eq!(registry.task_stats(&tutor()).unwrap().total_tasks, 1);
    }

    #[tokio::test]
    async fn test_external_finalise_dispatches_next_pending() {
        let (scheduler, registry, executor, _events) = setup(1, 0);
        let running = scheduler.create_task("tutor", "t", "running", TaskPriority::Normal).unwrap();
        let queued = scheduler.create_task("tutor", "t", "queued", TaskPriority::Normal).unwrap();
        assert_eq!(scheduler.get_task(&queued).unwrap().status, TaskStatus::Pending);

        assert!(scheduler.update_task_status(&running, TaskStatus::Completed, Some("manual".into()), None));
        assert_eq!(scheduler.get_task(&queued).unwrap().status, TaskStatus::Processing);
        assert_eq!(registry.quota(&tutor()).unwrap().current_usage(), 1);

        executor.gate.add_permits(2);
        scheduler.drain().await;
        assert_eq!(scheduler.get_task(&queued).unwrap().status, TaskStatus::Completed);
        assert_eq!(registry.quota(&tutor()).unwrap().current_usage(), 0);
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let (scheduler, _registry, _executor, events) = setup(1, 10);
        let mut rx = events.subscribe();
        scheduler.create_task("tutor", "t", "x", TaskPriority::Normal).unwrap();
        scheduler.drain().await;

        let mut names = Vec::new();
        while let Ok(event) = rx.try_recv() {
            names.push(event.name());
        }
        assert_eq!(
            names,
            vec!["task:submitted", "task:updated", "task:updated", "task:completed"]
        );
    }

    #[tokio::test]
    async fn test_empty_task_type_rejected() {
        let (scheduler, _registry, _executor, _events) = setup(1, 10);
        let err = scheduler.create_task("tutor", " ", "x", TaskPriority::Normal).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidTask(_)));
        assert_eq!(scheduler.task_count(), 0);
    }
}
