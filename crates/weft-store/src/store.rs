use std::collections::HashSet;

use tracing::{debug, info};
use weft_graph::{Edge, Graph, Node, project};

use crate::error::StoreError;
use crate::snapshot::Snapshot;

/// Owner of the current pipeline graph.
///
/// The store accepts any graph shape; validation happens only before a run.
/// Each mutation is applied in memory, re-projected, and then saved. If the
/// save fails the error is returned but the in-memory graph keeps the change.
pub struct GraphStore {
  graph: Graph,
  snapshot: Box<dyn Snapshot>,
}

impl GraphStore {
  /// Open a store, restoring the graph from the snapshot if one exists.
  pub fn open(snapshot: impl Snapshot + 'static) -> Result<Self, StoreError> {
    let mut graph = snapshot.load()?.unwrap_or_default();
    graph.nodes = project(&graph.nodes, &graph.edges);

    info!(
      nodes = graph.nodes.len(),
      edges = graph.edges.len(),
      "graph_store_opened"
    );

    Ok(Self {
      graph,
      snapshot: Box::new(snapshot),
    })
  }

  /// The current graph.
  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  pub fn nodes(&self) -> &[Node] {
    &self.graph.nodes
  }

  pub fn edges(&self) -> &[Edge] {
    &self.graph.edges
  }

  pub fn add_node(&mut self, node: Node) -> Result<(), StoreError> {
    if self.graph.get_node(node.id()).is_some() {
      return Err(StoreError::DuplicateNode(node.id().to_string()));
    }

    debug!(node_id = %node.id(), kind = %node.kind(), "add_node");
    self.graph.nodes.push(node);
    self.commit()
  }

  /// Remove a node and every edge that starts or ends at it.
  pub fn remove_node(&mut self, node_id: &str) -> Result<(), StoreError> {
    let before = self.graph.nodes.len();
    self.graph.nodes.retain(|n| n.id() != node_id);
    if self.graph.nodes.len() == before {
      return Err(StoreError::NodeNotFound(node_id.to_string()));
    }

    let edges_before = self.graph.edges.len();
    self.graph.edges.retain(|e| !e.touches(node_id));

    debug!(
      node_id = %node_id,
      edges_removed = edges_before - self.graph.edges.len(),
      "remove_node"
    );
    self.commit()
  }

  /// Replace one node's data, matched by id.
  ///
  /// Derived fields on action nodes are recomputed afterwards, so values
  /// passed in for them are discarded.
  pub fn update_node(&mut self, node: Node) -> Result<(), StoreError> {
    let slot = self
      .graph
      .nodes
      .iter_mut()
      .find(|n| n.id() == node.id())
      .ok_or_else(|| StoreError::NodeNotFound(node.id().to_string()))?;

    debug!(node_id = %node.id(), "update_node");
    *slot = node;
    self.commit()
  }

  /// Replace the whole node list. Edges are left as they are.
  pub fn replace_nodes(&mut self, nodes: Vec<Node>) -> Result<(), StoreError> {
    if let Some(id) = first_duplicate(nodes.iter().map(Node::id)) {
      return Err(StoreError::DuplicateNode(id.to_string()));
    }

    debug!(nodes = nodes.len(), "replace_nodes");
    self.graph.nodes = nodes;
    self.commit()
  }

  pub fn add_edge(&mut self, edge: Edge) -> Result<(), StoreError> {
    if self.graph.edges.iter().any(|e| e.id == edge.id) {
      return Err(StoreError::DuplicateEdge(edge.id));
    }

    debug!(
      edge_id = %edge.id,
      source = %edge.source_node_id,
      target = %edge.target_node_id,
      "add_edge"
    );
    self.graph.edges.push(edge);
    self.commit()
  }

  pub fn remove_edge(&mut self, edge_id: &str) -> Result<(), StoreError> {
    let before = self.graph.edges.len();
    self.graph.edges.retain(|e| e.id != edge_id);
    if self.graph.edges.len() == before {
      return Err(StoreError::EdgeNotFound(edge_id.to_string()));
    }

    debug!(edge_id = %edge_id, "remove_edge");
    self.commit()
  }

  /// Replace the whole edge list.
  pub fn set_edges(&mut self, edges: Vec<Edge>) -> Result<(), StoreError> {
    if let Some(id) = first_duplicate(edges.iter().map(|e| e.id.as_str())) {
      return Err(StoreError::DuplicateEdge(id.to_string()));
    }

    debug!(edges = edges.len(), "set_edges");
    self.graph.edges = edges;
    self.commit()
  }

  /// Serialize the current graph as a `{nodes, edges}` JSON document.
  pub fn serialize(&self) -> Result<String, StoreError> {
    Ok(self.graph.to_json()?)
  }

  /// Replace the current graph with one parsed from a JSON document.
  pub fn deserialize(&mut self, json: &str) -> Result<(), StoreError> {
    self.graph = Graph::from_json(json)?;
    self.commit()
  }

  fn commit(&mut self) -> Result<(), StoreError> {
    self.graph.nodes = project(&self.graph.nodes, &self.graph.edges);
    self.snapshot.save(&self.graph)?;
    Ok(())
  }
}

fn first_duplicate<'a>(mut ids: impl Iterator<Item = &'a str>) -> Option<&'a str> {
  let mut seen = HashSet::new();
  ids.find(|id| !seen.insert(*id))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::snapshot::MemorySnapshot;
  use serde_json::json;
  use weft_graph::{ActionNode, ActionType, DatasetNode, OutputNode};

  fn dataset(id: &str) -> Node {
    Node::Dataset(DatasetNode {
      id: id.to_string(),
      dataset_id: format!("ds-{}", id),
      name: format!("{}.csv", id),
      content_type: "text/csv".to_string(),
      size_bytes: 64,
    })
  }

  fn populated_store(snapshot: MemorySnapshot) -> GraphStore {
    let mut store = GraphStore::open(snapshot).unwrap();
    store.add_node(dataset("a")).unwrap();
    store.add_node(dataset("b")).unwrap();
    store
      .add_node(Node::Action(
        ActionNode::new("m", ActionType::Merge)
          .with_parameters(json!({"column1": "id", "column2": "id"})),
      ))
      .unwrap();
    store
      .add_node(Node::Output(OutputNode::new("o", "merged.csv", "")))
      .unwrap();
    store.add_edge(Edge::between("a", "m")).unwrap();
    store.add_edge(Edge::between("b", "m")).unwrap();
    store.add_edge(Edge::between("m", "o")).unwrap();
    store
  }

  fn merge_action(store: &GraphStore) -> ActionNode {
    store
      .graph()
      .get_node("m")
      .and_then(Node::as_action)
      .cloned()
      .unwrap()
  }

  #[test]
  fn test_every_mutation_is_persisted() {
    let snapshot = MemorySnapshot::new();
    let store = populated_store(snapshot.clone());

    assert_eq!(snapshot.save_count(), 7);
    assert_eq!(snapshot.saved().as_ref(), Some(store.graph()));
  }

  #[test]
  fn test_edge_mutation_reprojects_actions() {
    let mut store = populated_store(MemorySnapshot::new());
    assert_eq!(merge_action(&store).source_refs.len(), 2);
    assert!(merge_action(&store).destination_ref.is_some());

    store.remove_edge("edge-b-m").unwrap();
    assert_eq!(merge_action(&store).source_refs.len(), 1);

    store.set_edges(vec![]).unwrap();
    let merge = merge_action(&store);
    assert!(merge.source_refs.is_empty());
    assert!(merge.destination_ref.is_none());
  }

  #[test]
  fn test_remove_node_cascades_exactly_incident_edges() {
    let mut store = populated_store(MemorySnapshot::new());
    store.remove_node("a").unwrap();

    let edge_ids: Vec<&str> = store.edges().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(edge_ids, vec!["edge-b-m", "edge-m-o"]);
    assert!(store.graph().get_node("a").is_none());
    assert_eq!(merge_action(&store).source_refs.len(), 1);
  }

  #[test]
  fn test_unknown_ids_are_errors_and_not_persisted() {
    let snapshot = MemorySnapshot::new();
    let mut store = populated_store(snapshot.clone());

    assert!(matches!(
      store.remove_node("missing"),
      Err(StoreError::NodeNotFound(_))
    ));
    assert!(matches!(
      store.remove_edge("missing"),
      Err(StoreError::EdgeNotFound(_))
    ));
    assert!(matches!(
      store.add_node(dataset("a")),
      Err(StoreError::DuplicateNode(_))
    ));
    assert_eq!(snapshot.save_count(), 7);
  }

  #[test]
  fn test_bulk_replace_rejects_repeated_ids() {
    let snapshot = MemorySnapshot::new();
    let mut store = populated_store(snapshot.clone());

    let mut nodes = store.nodes().to_vec();
    nodes.push(dataset("a"));
    assert!(matches!(
      store.replace_nodes(nodes),
      Err(StoreError::DuplicateNode(id)) if id == "a"
    ));

    let mut edges = store.edges().to_vec();
    edges.push(Edge::new("edge-a-m", "b", "m"));
    assert!(matches!(
      store.set_edges(edges),
      Err(StoreError::DuplicateEdge(id)) if id == "edge-a-m"
    ));

    assert_eq!(store.nodes().len(), 4);
    assert_eq!(store.edges().len(), 3);
    assert_eq!(snapshot.save_count(), 7);
  }

  #[test]
  fn test_update_node_discards_derived_fields() {
    let mut store = populated_store(MemorySnapshot::new());

    let mut merge = merge_action(&store);
    merge.source_refs.clear();
    merge
      .parameters
      .insert("column2".to_string(), json!("customer_id"));
    store.update_node(Node::Action(merge)).unwrap();

    let merge = merge_action(&store);
    assert_eq!(merge.source_refs.len(), 2);
    assert_eq!(merge.parameters["column2"], "customer_id");
  }

  #[test]
  fn test_open_restores_and_reprojects_snapshot() {
    let snapshot = MemorySnapshot::new();
    let store = populated_store(snapshot.clone());
    let json = store.serialize().unwrap();

    let reopened = GraphStore::open(snapshot).unwrap();
    assert_eq!(reopened.graph(), store.graph());

    let mut fresh = GraphStore::open(MemorySnapshot::new()).unwrap();
    fresh.deserialize(&json).unwrap();
    assert_eq!(fresh.graph(), store.graph());
  }
}
