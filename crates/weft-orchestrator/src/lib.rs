//! Weft Orchestrator
//!
//! Turns a pipeline graph into Transform Service calls and writes the results
//! back into the graph.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Orchestrator                         │
//! │  - run(graph, cancel) → RunResult                           │
//! │  - drives the run state machine, emits RunEvents            │
//! └─────────────────────────────────────────────────────────────┘
//!          │                    │                     │
//!          ▼                    ▼                     ▼
//! ┌────────────────┐   ┌────────────────┐   ┌────────────────────┐
//! │   validator    │   │    planner     │   │      Executor      │
//! │ structural and │   │ incremental    │   │ bounded fan-out,   │
//! │ semantic rules │   │ frontier       │   │ fan-in, reconcile  │
//! └────────────────┘   └────────────────┘   └────────────────────┘
//!                                                     │
//!                                                     ▼
//!                                           ┌────────────────────┐
//!                                           │  TransformService  │
//!                                           └────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let service = Arc::new(HttpTransformService::new("http://localhost:8000")?);
//! let orchestrator = Orchestrator::new(service, OrchestratorConfig::default());
//!
//! // Runs the store's graph and saves any outputs the run materialized
//! let result = orchestrator.run_store(&mut store, CancellationToken::new()).await?;
//! println!("{:?}: {} output(s)", result.status, result.reconciled.len());
//! ```

mod config;
mod error;
mod events;
mod executor;
mod orchestrator;
mod planner;
mod request;
mod result;
mod validator;

pub use config::OrchestratorConfig;
pub use error::DispatchError;
pub use events::{ChannelNotifier, NoopNotifier, RunEvent, RunNotifier};
pub use executor::{Executor, MaterializedDataset, NodeOutcome, Reconciliation, reconcile};
pub use orchestrator::Orchestrator;
pub use planner::{Plan, plan};
pub use request::build_request;
pub use result::{
  NodeFailure, Notification, NotificationLevel, ReconciledOutput, ReconciliationMiss, RunPhase,
  RunResult, RunStatus,
};
pub use validator::{ValidationError, ValidationResult, validate};
