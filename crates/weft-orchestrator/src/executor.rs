//! Concurrent dispatch of action nodes and reconciliation of their results.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use weft_graph::{ActionNode, Node};
use weft_transform::{TransformRequest, TransformService};

use crate::config::OrchestratorConfig;
use crate::error::DispatchError;
use crate::events::{RunEvent, RunNotifier};
use crate::request::build_request;
use crate::result::{ReconciledOutput, ReconciliationMiss};

/// Handle for a spawned dispatch task.
type DispatchHandle = tokio::task::JoinHandle<Result<MaterializedDataset, DispatchError>>;

/// A dataset created by the Transform Service for one action node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedDataset {
  pub dataset_id: String,
  /// Name reported by the service; matched against output node names.
  pub name: String,
  pub content_type: String,
  pub size_bytes: u64,
}

/// Settled result of one dispatched action node.
#[derive(Debug)]
pub struct NodeOutcome {
  pub node_id: String,
  /// Per-run id carried through the node's events.
  pub correlation_id: String,
  pub result: Result<MaterializedDataset, DispatchError>,
}

/// Dispatches action nodes to the Transform Service.
///
/// All nodes of a frontier are started together and joined together. At most
/// `max_concurrency` calls are in flight; each round trip is bounded by
/// `call_timeout_ms`. A failing node never cancels its siblings.
pub struct Executor {
  service: Arc<dyn TransformService>,
  config: OrchestratorConfig,
}

impl Executor {
  pub fn new(service: Arc<dyn TransformService>, config: OrchestratorConfig) -> Self {
    Self { service, config }
  }

  pub fn config(&self) -> &OrchestratorConfig {
    &self.config
  }

  /// Dispatch every node and wait for all of them to settle.
  ///
  /// Returns exactly one outcome per node, in frontier order.
  pub async fn dispatch(
    &self,
    frontier: &[ActionNode],
    execution_id: &str,
    notifier: &dyn RunNotifier,
    cancel: &CancellationToken,
  ) -> Vec<NodeOutcome> {
    let semaphore = Arc::new(Semaphore::new(self.config.permits()));
    let mut pending: Vec<(String, String, Option<DispatchHandle>)> =
      Vec::with_capacity(frontier.len());
    let mut outcomes: Vec<Option<NodeOutcome>> = Vec::with_capacity(frontier.len());

    // Fan out
    for action in frontier {
      let correlation_id = uuid::Uuid::new_v4().to_string();

      let request = match build_request(action) {
        Ok(request) => request,
        Err(e) => {
          outcomes.push(Some(NodeOutcome {
            node_id: action.id.clone(),
            correlation_id: correlation_id.clone(),
            result: Err(e),
          }));
          pending.push((action.id.clone(), correlation_id, None));
          continue;
        }
      };

      info!(
        execution_id = %execution_id,
        node_id = %action.id,
        correlation_id = %correlation_id,
        endpoint = %request.endpoint(),
        output = %request.output_file_name(),
        "node_dispatched"
      );
      notifier.notify(RunEvent::NodeDispatched {
        execution_id: execution_id.to_string(),
        node_id: action.id.clone(),
        correlation_id: correlation_id.clone(),
      });

      let handle = tokio::spawn(run_node(
        self.service.clone(),
        request,
        semaphore.clone(),
        self.config.clone(),
        cancel.clone(),
      ));
      outcomes.push(None);
      pending.push((action.id.clone(), correlation_id, Some(handle)));
    }

    // Fan in
    let handles: Vec<DispatchHandle> = pending
      .iter_mut()
      .filter_map(|(_, _, handle)| handle.take())
      .collect();
    let mut joined = futures::future::join_all(handles).await.into_iter();

    let mut settled = Vec::with_capacity(frontier.len());
    for ((node_id, correlation_id, _), outcome) in pending.into_iter().zip(outcomes) {
      let outcome = match outcome {
        Some(outcome) => outcome,
        None => {
          let result = match joined.next() {
            Some(Ok(result)) => result,
            Some(Err(e)) => Err(DispatchError::Join(e.to_string())),
            None => Err(DispatchError::Join("dispatch task result missing".to_string())),
          };
          NodeOutcome {
            node_id,
            correlation_id,
            result,
          }
        }
      };

      report(&outcome, execution_id, notifier);
      settled.push(outcome);
    }

    settled
  }
}

/// One node's round trip: wait for a permit, transform, fetch metadata.
async fn run_node(
  service: Arc<dyn TransformService>,
  request: TransformRequest,
  semaphore: Arc<Semaphore>,
  config: OrchestratorConfig,
  cancel: CancellationToken,
) -> Result<MaterializedDataset, DispatchError> {
  let _permit = tokio::select! {
    permit = semaphore.acquire_owned() => permit.map_err(|_| DispatchError::Cancelled)?,
    _ = cancel.cancelled() => return Err(DispatchError::Cancelled),
  };

  let call = async {
    let dataset_id = service.transform(&request).await?;
    let details = service.dataset(&dataset_id).await?;
    Ok::<_, DispatchError>(MaterializedDataset {
      dataset_id,
      name: details.name,
      content_type: details.content_type,
      size_bytes: details.size,
    })
  };

  tokio::select! {
    result = tokio::time::timeout(config.call_timeout(), call) => {
      result.map_err(|_| DispatchError::Timeout { timeout_ms: config.call_timeout_ms })?
    }
    _ = cancel.cancelled() => Err(DispatchError::Cancelled),
  }
}

fn report(outcome: &NodeOutcome, execution_id: &str, notifier: &dyn RunNotifier) {
  match &outcome.result {
    Ok(dataset) => {
      info!(
        execution_id = %execution_id,
        node_id = %outcome.node_id,
        correlation_id = %outcome.correlation_id,
        dataset_id = %dataset.dataset_id,
        dataset_name = %dataset.name,
        "node_completed"
      );
      notifier.notify(RunEvent::NodeCompleted {
        execution_id: execution_id.to_string(),
        node_id: outcome.node_id.clone(),
        correlation_id: outcome.correlation_id.clone(),
        dataset_id: dataset.dataset_id.clone(),
      });
    }
    Err(e) => {
      error!(
        execution_id = %execution_id,
        node_id = %outcome.node_id,
        correlation_id = %outcome.correlation_id,
        error = %e,
        "node_failed"
      );
      notifier.notify(RunEvent::NodeFailed {
        execution_id: execution_id.to_string(),
        node_id: outcome.node_id.clone(),
        correlation_id: outcome.correlation_id.clone(),
        error: e.to_string(),
      });
    }
  }
}

/// Nodes after binding produced datasets onto output nodes.
#[derive(Debug, Clone)]
pub struct Reconciliation {
  pub nodes: Vec<Node>,
  pub reconciled: Vec<ReconciledOutput>,
  pub misses: Vec<ReconciliationMiss>,
}

/// Bind successful outcomes to output nodes by name.
///
/// A dataset fills the unmaterialized output whose name equals the dataset's
/// name. Outputs that already hold a dataset are left alone. A dataset with no
/// such output is reported as a miss.
pub fn reconcile(nodes: &[Node], outcomes: &[NodeOutcome]) -> Reconciliation {
  let mut nodes = nodes.to_vec();
  let mut reconciled = Vec::new();
  let mut misses = Vec::new();

  for outcome in outcomes {
    let Ok(dataset) = &outcome.result else {
      continue;
    };

    let target = nodes.iter_mut().find_map(|node| match node {
      Node::Output(output) if output.name == dataset.name && !output.is_materialized() => {
        Some(output)
      }
      _ => None,
    });

    match target {
      Some(output) => {
        output.dataset_id = Some(dataset.dataset_id.clone());
        output.content_type = Some(dataset.content_type.clone());
        output.size_bytes = Some(dataset.size_bytes);
        reconciled.push(ReconciledOutput {
          output_node_id: output.id.clone(),
          action_node_id: outcome.node_id.clone(),
          dataset_id: dataset.dataset_id.clone(),
        });
      }
      None => {
        warn!(
          node_id = %outcome.node_id,
          dataset_id = %dataset.dataset_id,
          dataset_name = %dataset.name,
          "reconciliation_miss"
        );
        misses.push(ReconciliationMiss {
          action_node_id: outcome.node_id.clone(),
          dataset_id: dataset.dataset_id.clone(),
          dataset_name: dataset.name.clone(),
        });
      }
    }
  }

  Reconciliation {
    nodes,
    reconciled,
    misses,
  }
}
