//! Pipeline run orchestration.
//!
//! The [`Orchestrator`] is the main entry point for running a graph. It gates
//! the run on validation, plans the frontier, dispatches it through the
//! [`Executor`] and reconciles the results into the returned node list.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use weft_graph::{Graph, project};
use weft_store::{GraphStore, StoreError};
use weft_transform::TransformService;

use crate::config::OrchestratorConfig;
use crate::events::{NoopNotifier, RunEvent, RunNotifier};
use crate::executor::{Executor, reconcile};
use crate::planner::{Plan, plan};
use crate::result::{NodeFailure, Notification, NotificationLevel, RunPhase, RunResult, RunStatus};
use crate::validator::{ValidationResult, validate};

/// Runs pipeline graphs against a Transform Service.
pub struct Orchestrator {
  executor: Executor,
  notifier: Arc<dyn RunNotifier>,
}

/// Tracks the phase of one run and announces each transition.
struct RunTracker<'a> {
  execution_id: &'a str,
  phase: RunPhase,
  notifier: &'a dyn RunNotifier,
}

impl RunTracker<'_> {
  fn advance(&mut self, next: RunPhase) {
    debug_assert!(
      self.phase.can_advance_to(next),
      "invalid run transition {} -> {}",
      self.phase,
      next
    );
    debug!(
      execution_id = %self.execution_id,
      from = %self.phase,
      to = %next,
      "run_phase"
    );
    self.phase = next;
    self.notifier.notify(RunEvent::PhaseChanged {
      execution_id: self.execution_id.to_string(),
      phase: next,
    });
  }
}

impl Orchestrator {
  pub fn new(service: Arc<dyn TransformService>, config: OrchestratorConfig) -> Self {
    Self {
      executor: Executor::new(service, config),
      notifier: Arc::new(NoopNotifier),
    }
  }

  /// Send run events to the given notifier.
  pub fn with_notifier(mut self, notifier: Arc<dyn RunNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn config(&self) -> &OrchestratorConfig {
    self.executor.config()
  }

  /// Check whether a graph may be run.
  pub fn validate(&self, graph: &Graph) -> ValidationResult {
    validate(graph)
  }

  /// Plan a run without dispatching anything.
  pub fn plan(&self, graph: &Graph) -> Plan {
    plan(&projected(graph))
  }

  /// Run the graph.
  ///
  /// Validation failures reject the run before any service call. Otherwise
  /// the planned action nodes are dispatched concurrently and every
  /// successful result is bound onto its output node. The returned nodes are
  /// projected again, so actions see the outputs materialized by this run.
  /// Node failures do not abort the run; they are reported in the result.
  #[instrument(
    name = "orchestrator_run",
    skip(self, graph, cancel),
    fields(nodes = graph.nodes.len(), edges = graph.edges.len())
  )]
  pub async fn run(&self, graph: &Graph, cancel: CancellationToken) -> RunResult {
    let execution_id = uuid::Uuid::new_v4().to_string();
    let mut tracker = RunTracker {
      execution_id: &execution_id,
      phase: RunPhase::Idle,
      notifier: self.notifier.as_ref(),
    };

    info!(execution_id = %execution_id, "run_started");
    let graph = projected(graph);

    tracker.advance(RunPhase::Validating);
    if let Err(violation) = validate(&graph).into_result() {
      warn!(
        execution_id = %execution_id,
        rule = %violation.rule(),
        error = %violation,
        "run_rejected"
      );
      let notifications = vec![Notification::new(
        NotificationLevel::Error,
        violation.to_string(),
      )];
      let result = RunResult {
        execution_id: execution_id.clone(),
        status: RunStatus::Rejected,
        nodes: graph.nodes,
        violation: Some(violation),
        dispatched: 0,
        reconciled: Vec::new(),
        failures: Vec::new(),
        misses: Vec::new(),
        notifications,
      };
      return self.finish(&mut tracker, result);
    }

    tracker.advance(RunPhase::Planning);
    let frontier = match plan(&graph) {
      Plan::NoOp { materialized } => {
        info!(
          execution_id = %execution_id,
          materialized = materialized.len(),
          "run_noop"
        );
        let result = RunResult {
          execution_id: execution_id.clone(),
          status: RunStatus::NoOp,
          nodes: graph.nodes,
          violation: None,
          dispatched: 0,
          reconciled: Vec::new(),
          failures: Vec::new(),
          misses: Vec::new(),
          notifications: vec![Notification::new(
            NotificationLevel::Info,
            "All outputs are already materialized; nothing to run",
          )],
        };
        return self.finish(&mut tracker, result);
      }
      Plan::Execute { frontier } => frontier,
    };

    tracker.advance(RunPhase::Dispatching);
    info!(
      execution_id = %execution_id,
      frontier = ?frontier.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
      "frontier_dispatching"
    );
    let outcomes = self
      .executor
      .dispatch(&frontier, &execution_id, self.notifier.as_ref(), &cancel)
      .await;

    tracker.advance(RunPhase::Reconciling);
    let reconciliation = reconcile(&graph.nodes, &outcomes);
    for miss in &reconciliation.misses {
      self.notifier.notify(RunEvent::ReconciliationMiss {
        execution_id: execution_id.clone(),
        node_id: miss.action_node_id.clone(),
        dataset_name: miss.dataset_name.clone(),
      });
    }

    let failures: Vec<NodeFailure> = outcomes
      .iter()
      .filter_map(|outcome| {
        outcome.result.as_ref().err().map(|e| NodeFailure {
          node_id: outcome.node_id.clone(),
          correlation_id: outcome.correlation_id.clone(),
          error: e.to_string(),
        })
      })
      .collect();

    let (status, notification) = if failures.is_empty() {
      (
        RunStatus::Succeeded,
        Notification::new(
          NotificationLevel::Success,
          format!(
            "Run completed: {} output(s) materialized",
            reconciliation.reconciled.len()
          ),
        ),
      )
    } else {
      (
        RunStatus::PartiallyFailed,
        Notification::new(
          NotificationLevel::Error,
          format!(
            "Run failed for {} of {} action(s)",
            failures.len(),
            outcomes.len()
          ),
        ),
      )
    };

    let result = RunResult {
      execution_id: execution_id.clone(),
      status,
      nodes: project(&reconciliation.nodes, &graph.edges),
      violation: None,
      dispatched: outcomes.len(),
      reconciled: reconciliation.reconciled,
      failures,
      misses: reconciliation.misses,
      notifications: vec![notification],
    };
    self.finish(&mut tracker, result)
  }

  /// Run the store's graph and write materialized outputs back into it.
  ///
  /// The store is only touched when the run populated at least one output,
  /// so rejected and no-op runs leave the snapshot as it was.
  pub async fn run_store(
    &self,
    store: &mut GraphStore,
    cancel: CancellationToken,
  ) -> Result<RunResult, StoreError> {
    let result = self.run(store.graph(), cancel).await;

    if result.changed() {
      store.replace_nodes(result.nodes.clone())?;
      debug!(
        execution_id = %result.execution_id,
        reconciled = result.reconciled.len(),
        "run_stored"
      );
    }

    Ok(result)
  }

  fn finish(&self, tracker: &mut RunTracker<'_>, result: RunResult) -> RunResult {
    let phase = RunPhase::from(result.status);
    debug_assert!(phase.is_terminal());
    tracker.advance(phase);

    info!(
      execution_id = %result.execution_id,
      status = ?result.status,
      dispatched = result.dispatched,
      reconciled = result.reconciled.len(),
      failed = result.failures.len(),
      "run_completed"
    );
    self.notifier.notify(RunEvent::RunFinished {
      execution_id: result.execution_id.clone(),
      status: result.status,
    });

    result
  }
}

/// A copy of the graph with freshly projected action nodes.
fn projected(graph: &Graph) -> Graph {
  Graph::new(project(&graph.nodes, &graph.edges), graph.edges.clone())
}
