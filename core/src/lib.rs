//! Client core for the task list service.
//!
//! # Overview
//! The state and data-synchronization layer behind a task list UI: a pure
//! reducer over `ViewState`, a `TaskStore` that turns UI intents into
//! repository calls and dispatches, an HTTP-backed `TaskRepository`, and the
//! client-side `TaskValidator`.
//!
//! # Design
//! - `HttpClient` builds plain-data requests and parses plain-data
//!   responses; a `Transport` performs the I/O, so everything above the
//!   transport is testable without sockets.
//! - Every failure is an `HttpError` returned as a value. The store records
//!   failures in `ViewState::error` and only `create_task` also returns one.
//! - Dependencies are injected: build the client, wrap it in a repository,
//!   hand the repository to the store.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod repository;
pub mod state;
pub mod store;
pub mod transport;
pub mod types;
pub mod validator;

pub use client::HttpClient;
pub use config::{ClientConfig, ConfigError, ConfigOverrides};
pub use error::HttpError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use repository::{HttpTaskRepository, TaskRepository};
pub use state::{reduce, TaskAction, TaskStats, ViewState};
pub use store::TaskStore;
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{CreateTaskRequest, Task, TaskId, UpdateTaskRequest};
pub use validator::{TaskValidator, ValidationResult, ValidationRules};
