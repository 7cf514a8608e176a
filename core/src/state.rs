//! View state and the pure reducer that evolves it.
//!
//! # Design
//! `reduce` is total over `(ViewState, TaskAction)`: every action has a
//! defined effect and none can fail. Any transition that reports an error
//! also clears `loading` and `refreshing`, so the UI never shows a spinner
//! next to a failure.

use crate::types::{Task, TaskId};

/// Everything the presentation layer renders from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Newest created task first; otherwise in the order the server listed them.
    pub tasks: Vec<Task>,
    pub loading: bool,
    pub refreshing: bool,
    pub error: Option<String>,
}

/// Counters shown alongside the task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl ViewState {
    pub fn stats(&self) -> TaskStats {
        let completed = self.tasks.iter().filter(|t| t.completed).count();
        TaskStats {
            total: self.tasks.len(),
            completed,
            pending: self.tasks.len() - completed,
        }
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

/// State transitions. `SetError(None)` clears the error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    SetLoading(bool),
    SetRefreshing(bool),
    SetError(Option<String>),
    SetTasks(Vec<Task>),
    AddTask(Task),
    UpdateTask(Task),
    CompleteTask(TaskId),
    DeleteTask(TaskId),
    ResetState,
}

impl TaskAction {
    /// Stable name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            TaskAction::SetLoading(_) => "SET_LOADING",
            TaskAction::SetRefreshing(_) => "SET_REFRESHING",
            TaskAction::SetError(_) => "SET_ERROR",
            TaskAction::SetTasks(_) => "SET_TASKS",
            TaskAction::AddTask(_) => "ADD_TASK",
            TaskAction::UpdateTask(_) => "UPDATE_TASK",
            TaskAction::CompleteTask(_) => "COMPLETE_TASK",
            TaskAction::DeleteTask(_) => "DELETE_TASK",
            TaskAction::ResetState => "RESET_STATE",
        }
    }
}

/// Compute the state that follows `state` under `action`.
pub fn reduce(state: ViewState, action: TaskAction) -> ViewState {
    match action {
        TaskAction::SetLoading(loading) => ViewState {
            loading,
            // Starting a new load discards the previous failure.
            error: if loading { None } else { state.error },
            ..state
        },
        TaskAction::SetRefreshing(refreshing) => ViewState {
            refreshing,
            ..state
        },
        TaskAction::SetError(error) => ViewState {
            error,
            loading: false,
            refreshing: false,
            ..state
        },
        TaskAction::SetTasks(tasks) => ViewState {
            tasks,
            loading: false,
            refreshing: false,
            error: None,
        },
        TaskAction::AddTask(task) => {
            let mut tasks = Vec::with_capacity(state.tasks.len() + 1);
            tasks.push(task);
            tasks.extend(state.tasks);
            ViewState {
                tasks,
                loading: false,
                error: None,
                ..state
            }
        }
        TaskAction::UpdateTask(task) => settled(
            state
                .tasks
                .into_iter()
                .map(|t| if t.id == task.id { task.clone() } else { t })
                .collect(),
            state.refreshing,
        ),
        TaskAction::CompleteTask(id) => settled(
            state
                .tasks
                .into_iter()
                .map(|t| {
                    if t.id == id {
                        Task {
                            completed: true,
                            ..t
                        }
                    } else {
                        t
                    }
                })
                .collect(),
            state.refreshing,
        ),
        TaskAction::DeleteTask(id) => settled(
            state.tasks.into_iter().filter(|t| t.id != id).collect(),
            state.refreshing,
        ),
        TaskAction::ResetState => ViewState::default(),
    }
}

/// State after a successful single-task mutation.
fn settled(tasks: Vec<Task>, refreshing: bool) -> ViewState {
    ViewState {
        tasks,
        loading: false,
        refreshing,
        error: None,
    }
}
