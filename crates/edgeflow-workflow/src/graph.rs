use std::collections::{HashMap, HashSet, VecDeque};

use tracing::warn;

use crate::error::WorkflowError;

/// A data-flow edge between two nodes of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
  pub source: String,
  pub target: String,
  /// Output field read from the source. `None` forwards the whole output.
  pub source_output: Option<String>,
  /// Input field written on the target. `None` uses the source node id.
  pub target_input: Option<String>,
}

/// Graph structure for traversal and dependency analysis.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Node ids in definition order.
  nodes: Vec<String>,
  edges: Vec<Edge>,
  /// node_id -> indices of edges targeting the node.
  incoming: HashMap<String, Vec<usize>>,
  /// Adjacency list: node_id -> distinct downstream node_ids, in edge order.
  downstream: HashMap<String, Vec<String>>,
  /// Reverse adjacency: node_id -> distinct upstream node_ids, in edge order.
  upstream: HashMap<String, Vec<String>>,
  /// Nodes with no incoming edges, in definition order.
  start_nodes: Vec<String>,
  /// Nodes with no outgoing edges, in definition order.
  terminal_nodes: Vec<String>,
}

impl Graph {
  /// Build a graph from node ids and edges.
  ///
  /// Edges whose source or target is not one of `nodes` are dropped.
  pub fn new(nodes: &[String], edges: Vec<Edge>) -> Self {
    let known: HashSet<&str> = nodes.iter().map(String::as_str).collect();

    let edges: Vec<Edge> = edges
      .into_iter()
      .filter(|edge| {
        let valid = known.contains(edge.source.as_str()) && known.contains(edge.target.as_str());
        if !valid {
          warn!(
            source = %edge.source,
            target = %edge.target,
            "ignoring edge that references an unknown node"
          );
        }
        valid
      })
      .collect();

    let mut incoming: HashMap<String, Vec<usize>> = HashMap::new();
    let mut downstream: HashMap<String, Vec<String>> = HashMap::new();
    let mut upstream: HashMap<String, Vec<String>> = HashMap::new();

    // Initialize all nodes
    for node_id in nodes {
      incoming.entry(node_id.clone()).or_default();
      downstream.entry(node_id.clone()).or_default();
      upstream.entry(node_id.clone()).or_default();
    }

    for (index, edge) in edges.iter().enumerate() {
      incoming.entry(edge.target.clone()).or_default().push(index);

      let targets = downstream.entry(edge.source.clone()).or_default();
      if !targets.contains(&edge.target) {
        targets.push(edge.target.clone());
      }

      let sources = upstream.entry(edge.target.clone()).or_default();
      if !sources.contains(&edge.source) {
        sources.push(edge.source.clone());
      }
    }

    let start_nodes = nodes
      .iter()
      .filter(|id| upstream.get(*id).is_none_or(|v| v.is_empty()))
      .cloned()
      .collect();

    let terminal_nodes = nodes
      .iter()
      .filter(|id| downstream.get(*id).is_none_or(|v| v.is_empty()))
      .cloned()
      .collect();

    Self {
      nodes: nodes.to_vec(),
      edges,
      incoming,
      downstream,
      upstream,
      start_nodes,
      terminal_nodes,
    }
  }

  /// Get start nodes (no incoming edges).
  pub fn start_nodes(&self) -> &[String] {
    &self.start_nodes
  }

  /// Get terminal nodes (no outgoing edges).
  pub fn terminal_nodes(&self) -> &[String] {
    &self.terminal_nodes
  }

  /// Check whether a node is a start node.
  pub fn is_start(&self, node_id: &str) -> bool {
    self.start_nodes.iter().any(|id| id == node_id)
  }

  /// All retained edges.
  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }

  /// Edges targeting the given node, in definition order.
  pub fn incoming(&self, node_id: &str) -> impl Iterator<Item = &Edge> {
    self
      .incoming
      .get(node_id)
      .into_iter()
      .flatten()
      .map(|index| &self.edges[*index])
  }

  /// Get distinct downstream nodes for a given node.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self
      .downstream
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get distinct upstream nodes for a given node.
  pub fn upstream(&self, node_id: &str) -> &[String] {
    self
      .upstream
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// True iff every source feeding `node_id` is in `executed`.
  pub fn is_ready(&self, node_id: &str, executed: &HashSet<String>) -> bool {
    self.upstream(node_id).iter().all(|up| executed.contains(up))
  }

  /// Number of distinct upstream nodes of every node.
  pub fn dependency_counts(&self) -> HashMap<String, usize> {
    self
      .nodes
      .iter()
      .map(|id| (id.clone(), self.upstream(id).len()))
      .collect()
  }

  /// Reject graphs that contain a cycle.
  pub fn validate(&self) -> Result<(), WorkflowError> {
    let mut pending = self.dependency_counts();
    let mut queue: VecDeque<&str> = self.start_nodes.iter().map(String::as_str).collect();
    let mut visited = 0;

    while let Some(node_id) = queue.pop_front() {
      visited += 1;
      for next in self.downstream(node_id) {
        if let Some(count) = pending.get_mut(next) {
          *count -= 1;
          if *count == 0 {
            queue.push_back(next);
          }
        }
      }
    }

    if visited == self.nodes.len() {
      return Ok(());
    }

    let nodes = self
      .nodes
      .iter()
      .filter(|id| pending.get(*id).is_some_and(|count| *count > 0))
      .cloned()
      .collect();

    Err(WorkflowError::Cycle { nodes })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
  }

  fn edge(source: &str, target: &str) -> Edge {
    Edge {
      source: source.to_string(),
      target: target.to_string(),
      source_output: None,
      target_input: None,
    }
  }

  fn diamond() -> Graph {
    Graph::new(
      &ids(&["a", "b", "c", "d"]),
      vec![edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")],
    )
  }

  #[test]
  fn test_start_and_terminal_nodes() {
    let graph = diamond();

    assert_eq!(graph.start_nodes(), &ids(&["a"]));
    assert_eq!(graph.terminal_nodes(), &ids(&["d"]));
    assert!(graph.is_start("a"));
    assert!(!graph.is_start("d"));
  }

  #[test]
  fn test_isolated_node_is_start_and_terminal() {
    let graph = Graph::new(&ids(&["a", "b", "solo"]), vec![edge("a", "b")]);

    assert_eq!(graph.start_nodes(), &ids(&["a", "solo"]));
    assert_eq!(graph.terminal_nodes(), &ids(&["b", "solo"]));
  }

  #[test]
  fn test_downstream_in_edge_order() {
    let graph = Graph::new(
      &ids(&["a", "b", "c"]),
      vec![edge("a", "c"), edge("a", "b"), edge("a", "c")],
    );

    assert_eq!(graph.downstream("a"), &ids(&["c", "b"]));
    assert_eq!(graph.upstream("c"), &ids(&["a"]));
    assert_eq!(graph.incoming("c").count(), 2);
  }

  #[test]
  fn test_readiness_check() {
    let graph = diamond();
    let mut executed = HashSet::new();

    assert!(graph.is_ready("a", &executed));
    assert!(!graph.is_ready("b", &executed));

    executed.insert("a".to_string());
    executed.insert("b".to_string());
    assert!(!graph.is_ready("d", &executed));

    executed.insert("c".to_string());
    assert!(graph.is_ready("d", &executed));
  }

  #[test]
  fn test_dependency_counts() {
    let counts = diamond().dependency_counts();

    assert_eq!(counts["a"], 0);
    assert_eq!(counts["b"], 1);
    assert_eq!(counts["d"], 2);
  }

  #[test]
  fn test_unknown_endpoints_are_dropped() {
    let graph = Graph::new(
      &ids(&["a", "b"]),
      vec![edge("a", "b"), edge("a", "ghost"), edge("ghost", "b")],
    );

    assert_eq!(graph.edges().len(), 1);
    assert_eq!(graph.upstream("b"), &ids(&["a"]));
    assert_eq!(graph.terminal_nodes(), &ids(&["b"]));
  }

  #[test]
  fn test_validate_acyclic() {
    assert!(diamond().validate().is_ok());
  }

  #[test]
  fn test_validate_cycle() {
    let graph = Graph::new(
      &ids(&["a", "b", "c"]),
      vec![edge("a", "b"), edge("b", "c"), edge("c", "b")],
    );

    match graph.validate() {
      Err(WorkflowError::Cycle { nodes }) => assert_eq!(nodes, ids(&["b", "c"])),
      other => panic!("expected cycle error, got {:?}", other),
    }
  }

  #[test]
  fn test_validate_self_loop() {
    let graph = Graph::new(&ids(&["a"]), vec![edge("a", "a")]);
    assert!(matches!(graph.validate(), Err(WorkflowError::Cycle { .. })));
  }
}
