//! Orchestration between the presentation layer, the repository and the
//! reducer.
//!
//! # Design
//! `TaskStore` is constructed with its repository, with no global lookup.
//! State lives in a `tokio::sync::watch` channel: every dispatch replaces the
//! whole `ViewState` atomically and wakes subscribers. Operations are not
//! serialized against each other. Instead each one takes a sequence number
//! when it starts, and the store remembers the newest sequence number whose
//! task mutation was applied. A task list from an older operation is
//! discarded once a newer mutation has landed. Failed operations never
//! advance that mark.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::error::HttpError;
use crate::repository::TaskRepository;
use crate::state::{reduce, TaskAction, ViewState};
use crate::types::{CreateTaskRequest, Task, TaskId};

const FETCH_FAILED: &str = "Failed to fetch tasks";
const CREATE_FAILED: &str = "Failed to create task";
const COMPLETE_FAILED: &str = "Failed to complete task";
const REFRESH_FAILED: &str = "Failed to refresh tasks";

/// Session-scoped task state plus the operations that change it.
pub struct TaskStore<R> {
    repository: R,
    state: watch::Sender<ViewState>,
    /// Last sequence number handed out.
    sequence: AtomicU64,
    /// Newest sequence number whose task mutation reached the state.
    applied: AtomicU64,
    /// Sequence number of the most recently started refresh.
    latest_refresh: AtomicU64,
}

impl<R: TaskRepository> TaskStore<R> {
    pub fn new(repository: R) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            repository,
            state,
            sequence: AtomicU64::new(0),
            applied: AtomicU64::new(0),
            latest_refresh: AtomicU64::new(0),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every subsequent dispatch.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Load the task list, showing the loading indicator.
    pub async fn fetch_tasks(&self) {
        let seq = self.begin();
        self.dispatch(TaskAction::SetLoading(true));
        match self.repository.get_tasks().await {
            Ok(tasks) => self.apply_list(seq, tasks, false),
            Err(err) => self.fail(&err, FETCH_FAILED),
        }
    }

    /// Create a task and prepend it to the list.
    ///
    /// The failure is recorded in state and also returned, so a form can
    /// keep its input instead of assuming success.
    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task, HttpError> {
        let seq = self.begin();
        self.dispatch(TaskAction::SetLoading(true));
        match self.repository.create_task(request).await {
            Ok(task) => {
                self.apply(seq, TaskAction::AddTask(task.clone()));
                Ok(task)
            }
            Err(err) => {
                self.fail(&err, CREATE_FAILED);
                Err(err)
            }
        }
    }

    /// Mark a task completed. Failures are recorded in state only.
    ///
    /// The local id is marked whether or not the server echoes the task.
    pub async fn complete_task(&self, id: TaskId) {
        let seq = self.begin();
        self.dispatch(TaskAction::SetLoading(true));
        match self.repository.complete_task(id).await {
            Ok(_) => self.apply(seq, TaskAction::CompleteTask(id)),
            Err(err) => self.fail(&err, COMPLETE_FAILED),
        }
    }

    /// Reload the task list, showing the pull-to-refresh indicator.
    pub async fn refresh_tasks(&self) {
        let seq = self.begin();
        self.latest_refresh.fetch_max(seq, Ordering::SeqCst);
        self.dispatch(TaskAction::SetRefreshing(true));
        match self.repository.get_tasks().await {
            Ok(tasks) => self.apply_list(seq, tasks, true),
            Err(err) => self.fail(&err, REFRESH_FAILED),
        }
    }

    pub fn clear_error(&self) {
        self.dispatch(TaskAction::SetError(None));
    }

    /// Return to the initial state, e.g. when the session ends.
    pub fn reset(&self) {
        self.dispatch(TaskAction::ResetState);
    }

    fn dispatch(&self, action: TaskAction) {
        tracing::debug!(action = action.name(), "dispatch");
        self.state
            .send_modify(|state| *state = reduce(std::mem::take(state), action));
    }

    fn begin(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Dispatch a task mutation from operation `seq` unconditionally.
    fn apply(&self, seq: u64, action: TaskAction) {
        tracing::debug!(action = action.name(), seq, "dispatch");
        self.state.send_modify(|state| {
            self.applied.fetch_max(seq, Ordering::SeqCst);
            *state = reduce(std::mem::take(state), action);
        });
    }

    /// Dispatch a fetched list unless a newer mutation already landed.
    ///
    /// The check runs under the channel's write lock, so it cannot interleave
    /// with another mutation.
    fn apply_list(&self, seq: u64, tasks: Vec<Task>, refreshing: bool) {
        let mut newer = 0;
        let applied = self.state.send_if_modified(|state| {
            newer = self.applied.load(Ordering::SeqCst);
            if newer > seq {
                return false;
            }
            self.applied.store(seq, Ordering::SeqCst);
            *state = reduce(std::mem::take(state), TaskAction::SetTasks(tasks));
            true
        });
        if applied {
            tracing::debug!(action = "SET_TASKS", seq, "dispatch");
            return;
        }

        tracing::warn!(seq, newer, "discarding stale task list");
        if refreshing && self.latest_refresh.load(Ordering::SeqCst) == seq {
            self.dispatch(TaskAction::SetRefreshing(false));
        }
    }

    fn fail(&self, err: &HttpError, fallback: &str) {
        let message = if err.message.trim().is_empty() {
            fallback.to_string()
        } else {
            err.message.clone()
        };
        tracing::warn!(status = err.status, error = %message, "task operation failed");
        self.dispatch(TaskAction::SetError(Some(message)));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::types::UpdateTaskRequest;

    /// Repository whose list replies are queued with individual delays.
    #[derive(Default)]
    struct Scripted {
        lists: Mutex<VecDeque<(Duration, Result<Vec<Task>, HttpError>)>>,
        created: Mutex<Option<Result<Task, HttpError>>>,
        completed: Mutex<Option<Result<Option<Task>, HttpError>>>,
    }

    impl Scripted {
        fn list(self, delay: Duration, reply: Result<Vec<Task>, HttpError>) -> Self {
            self.lists.lock().push_back((delay, reply));
            self
        }

        fn create(self, reply: Result<Task, HttpError>) -> Self {
            *self.created.lock() = Some(reply);
            self
        }

        fn complete(self, reply: Result<Option<Task>, HttpError>) -> Self {
            *self.completed.lock() = Some(reply);
            self
        }
    }

    #[async_trait]
    impl TaskRepository for Scripted {
        async fn get_tasks(&self) -> Result<Vec<Task>, HttpError> {
            let next = self.lists.lock().pop_front();
            let (delay, reply) = next.unwrap_or((Duration::ZERO, Ok(Vec::new())));
            tokio::time::sleep(delay).await;
            reply
        }

        async fn create_task(&self, _request: &CreateTaskRequest) -> Result<Task, HttpError> {
            let reply = self.created.lock().take();
            reply.unwrap_or_else(|| Err(HttpError::network("unscripted")))
        }

        async fn complete_task(&self, _id: TaskId) -> Result<Option<Task>, HttpError> {
            let reply = self.completed.lock().take();
            reply.unwrap_or_else(|| Err(HttpError::network("unscripted")))
        }

        async fn update_task(
            &self,
            _id: TaskId,
            _updates: &UpdateTaskRequest,
        ) -> Result<Task, HttpError> {
            Err(HttpError::network("unscripted"))
        }

        async fn delete_task(&self, _id: TaskId) -> Result<(), HttpError> {
            Err(HttpError::network("unscripted"))
        }
    }

    fn task(id: TaskId, title: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: "d".to_string(),
            completed: false,
        }
    }

    #[tokio::test]
    async fn fetch_replaces_tasks() {
        let store =
            TaskStore::new(Scripted::default().list(Duration::ZERO, Ok(vec![task(1, "A")])));
        store.fetch_tasks().await;

        let state = store.state();
        assert_eq!(state.tasks, vec![task(1, "A")]);
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn fetch_failure_sets_error() {
        let store = TaskStore::new(
            Scripted::default().list(Duration::ZERO, Err(HttpError::new("Server down", 500))),
        );
        store.fetch_tasks().await;
        let state = store.state();
        assert_eq!(state.error.as_deref(), Some("Server down"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn empty_error_message_falls_back() {
        let store = TaskStore::new(
            Scripted::default().list(Duration::ZERO, Err(HttpError::new("", 500))),
        );
        store.refresh_tasks().await;
        assert_eq!(store.state().error.as_deref(), Some(REFRESH_FAILED));

        store.complete_task(1).await;
        assert_eq!(store.state().error.as_deref(), Some("unscripted"));
    }

    #[tokio::test]
    async fn create_failure_is_recorded_and_returned() {
        let store =
            TaskStore::new(Scripted::default().create(Err(HttpError::new("Server down", 500))));
        let err = store
            .create_task(&CreateTaskRequest::new("Buy milk", "2%"))
            .await
            .unwrap_err();
        assert_eq!(err.status, 500);
        assert_eq!(store.state().error.as_deref(), Some("Server down"));
    }

    #[tokio::test]
    async fn create_prepends_returned_task() {
        let store = TaskStore::new(
            Scripted::default()
                .list(Duration::ZERO, Ok(vec![task(1, "A")]))
                .create(Ok(task(2, "B"))),
        );
        store.fetch_tasks().await;
        let created = store
            .create_task(&CreateTaskRequest::new("B", ""))
            .await
            .unwrap();
        assert_eq!(created.id, 2);
        let ids: Vec<_> = store.state().tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn complete_uses_local_id() {
        // The server's echo names a different id; the local id wins.
        let store = TaskStore::new(
            Scripted::default()
                .list(Duration::ZERO, Ok(vec![task(1, "A"), task(2, "B")]))
                .complete(Ok(Some(task(42, "echo")))),
        );
        store.fetch_tasks().await;
        store.complete_task(2).await;
        let state = store.state();
        assert!(!state.tasks[0].completed);
        assert!(state.tasks[1].completed);
        assert_eq!(state.tasks[1].title, "B");
    }

    #[tokio::test]
    async fn complete_without_echo_marks_local_task() {
        let store = TaskStore::new(
            Scripted::default()
                .list(Duration::ZERO, Ok(vec![task(1, "A")]))
                .complete(Ok(None)),
        );
        store.fetch_tasks().await;
        store.complete_task(1).await;

        let state = store.state();
        assert!(state.tasks[0].completed);
        assert!(state.error.is_none());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn refresh_toggles_refreshing_not_loading() {
        let store = Arc::new(TaskStore::new(
            Scripted::default().list(Duration::from_millis(50), Ok(vec![task(1, "A")])),
        ));
        let mut rx = store.subscribe();

        let handle = {
            let store = store.clone();
            tokio::spawn(async move { store.refresh_tasks().await })
        };

        rx.changed().await.unwrap();
        {
            let during = rx.borrow_and_update();
            assert!(during.refreshing);
            assert!(!during.loading);
        }
        handle.await.unwrap();

        let after = store.state();
        assert!(!after.refreshing);
        assert_eq!(after.tasks.len(), 1);
    }

    #[tokio::test]
    async fn clear_error_and_reset() {
        let store = TaskStore::new(
            Scripted::default().list(Duration::ZERO, Err(HttpError::new("nope", 503))),
        );
        store.fetch_tasks().await;
        assert!(store.state().error.is_some());
        store.clear_error();
        assert!(store.state().error.is_none());

        store.reset();
        assert_eq!(store.state(), ViewState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_fetch_does_not_overwrite_created_task() {
        let store = Arc::new(TaskStore::new(
            Scripted::default()
                .list(Duration::from_secs(5), Ok(vec![task(1, "A")]))
                .create(Ok(task(2, "B"))),
        ));

        let mut rx = store.subscribe();
        let slow_fetch = {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_tasks().await })
        };
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().loading);

        store
            .create_task(&CreateTaskRequest::new("B", ""))
            .await
            .unwrap();
        slow_fetch.await.unwrap();

        let state = store.state();
        assert_eq!(state.tasks, vec![task(2, "B")]);
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_refresh_clears_indicator() {
        let store = Arc::new(TaskStore::new(
            Scripted::default()
                .list(Duration::from_secs(5), Ok(vec![task(1, "A")]))
                .create(Ok(task(2, "B"))),
        ));

        let mut rx = store.subscribe();
        let slow_refresh = {
            let store = store.clone();
            tokio::spawn(async move { store.refresh_tasks().await })
        };
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().refreshing);

        store
            .create_task(&CreateTaskRequest::new("B", ""))
            .await
            .unwrap();
        slow_refresh.await.unwrap();

        let state = store.state();
        assert!(!state.refreshing);
        assert_eq!(state.tasks, vec![task(2, "B")]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_newer_operation_keeps_fetched_list() {
        let store = Arc::new(TaskStore::new(
            Scripted::default()
                .list(Duration::from_secs(1), Ok(vec![task(1, "A"), task(2, "B")]))
                .complete(Err(HttpError::new("Task not found", 404))),
        ));

        let mut rx = store.subscribe();
        let slow_refresh = {
            let store = store.clone();
            tokio::spawn(async move { store.refresh_tasks().await })
        };
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().refreshing);

        store.complete_task(99).await;
        assert_eq!(store.state().error.as_deref(), Some("Task not found"));
        slow_refresh.await.unwrap();

        let state = store.state();
        assert_eq!(state.tasks, vec![task(1, "A"), task(2, "B")]);
        assert!(!state.refreshing);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_refresh_keeps_indicator_for_newer_refresh() {
        let store = Arc::new(TaskStore::new(
            Scripted::default()
                .list(Duration::from_secs(5), Ok(vec![task(1, "A")]))
                .list(Duration::from_secs(10), Ok(vec![task(3, "C")]))
                .create(Ok(task(2, "B"))),
        ));

        let mut rx = store.subscribe();
        let older = {
            let store = store.clone();
            tokio::spawn(async move { store.refresh_tasks().await })
        };
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().refreshing);

        store
            .create_task(&CreateTaskRequest::new("B", ""))
            .await
            .unwrap();
        drop(rx.borrow_and_update());

        let newer = {
            let store = store.clone();
            tokio::spawn(async move { store.refresh_tasks().await })
        };
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().refreshing);

        older.await.unwrap();
        let state = store.state();
        assert!(state.refreshing);
        assert_eq!(state.tasks, vec![task(2, "B")]);

        newer.await.unwrap();
        let state = store.state();
        assert!(!state.refreshing);
        assert_eq!(state.tasks, vec![task(3, "C")]);
    }
}
