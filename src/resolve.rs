//! Locate stored sentiment annotations inside nested records.
//!
//! Records are walked through [`RecordNode`], a view that classifies every node as a
//! mapping, a sequence, or a scalar. It is implemented for `serde_json::Value` and for
//! [`RecordGraph`], an arena-backed record that can contain reference cycles.
//!
//! Resolution order:
//! - With a preferred field: that field's annotation at the top level, else the first
//!   hit in depth-first order (keys and elements in their natural order).
//! - Without one: each field of the priority list in turn, resolved as above. A
//!   higher-priority field found deep in the record beats a lower-priority one at the
//!   top level.

use crate::envelope::annotation_key;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

/// Flattened `"<source>_<label>"` (lowercased) → score.
pub type FlatScores = BTreeMap<String, f64>;

/// The closed set of node shapes the resolver understands.
#[derive(Debug, Clone)]
pub enum NodeKind<'a, N> {
    /// Keyed children, in natural order.
    Mapping(Vec<(&'a str, N)>),
    /// Positional children.
    Sequence(Vec<N>),
    /// A leaf; `Some` when it is numeric.
    Scalar(Option<f64>),
}

/// A cheap handle onto one node of a record.
pub trait RecordNode<'a>: Copy + 'a {
    /// Identity used to detect a node already on the traversal path.
    type Id: Eq + Hash;

    /// Identity of this node.
    fn id(self) -> Self::Id;

    /// Shape and children of this node.
    fn kind(self) -> NodeKind<'a, Self>;

    /// Child under `key`, if this is a mapping that has it.
    fn get(self, key: &str) -> Option<Self> {
        match self.kind() {
            NodeKind::Mapping(entries) => entries
                .into_iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Whether this node is a mapping.
    fn is_mapping(self) -> bool {
        matches!(self.kind(), NodeKind::Mapping(_))
    }
}

impl<'a> RecordNode<'a> for &'a Value {
    type Id = usize;

    fn id(self) -> usize {
        self as *const Value as usize
    }

    fn kind(self) -> NodeKind<'a, Self> {
        match self {
            Value::Object(map) => {
                NodeKind::Mapping(map.iter().map(|(k, v)| (k.as_str(), v)).collect())
            }
            Value::Array(items) => NodeKind::Sequence(items.iter().collect()),
            Value::Number(n) => NodeKind::Scalar(n.as_f64()),
            _ => NodeKind::Scalar(None),
        }
    }

    fn get(self, key: &str) -> Option<Self> {
        self.as_object().and_then(|map| map.get(key))
    }

    fn is_mapping(self) -> bool {
        self.is_object()
    }
}

/// Find the annotation for `preferred_field`, or for the first field of `priorities`
/// that resolves, and flatten it.
///
/// Returns `None` when `record` is not a mapping or nothing matches.
pub fn fetch_annotations<'a, N, S>(
    record: N,
    preferred_field: Option<&str>,
    priorities: &[S],
) -> Option<FlatScores>
where
    N: RecordNode<'a>,
    S: AsRef<str>,
{
    if !record.is_mapping() {
        return None;
    }
    match preferred_field {
        Some(field) => find_field(record, field, &mut HashSet::new()),
        None => priorities
            .iter()
            .find_map(|field| find_field(record, field.as_ref(), &mut HashSet::new())),
    }
}

fn find_field<'a, N: RecordNode<'a>>(
    node: N,
    field: &str,
    path: &mut HashSet<N::Id>,
) -> Option<FlatScores> {
    let key = annotation_key(Some(field));
    if let Some(annotation) = node.get(&key) {
        return Some(flatten(annotation));
    }

    let entries = match node.kind() {
        NodeKind::Mapping(entries) => entries,
        _ => return None,
    };

    if !path.insert(node.id()) {
        return None;
    }

    let mut found = None;
    for (_, value) in entries {
        found = match value.kind() {
            NodeKind::Mapping(_) => find_field(value, field, path),
            NodeKind::Sequence(items) => items
                .into_iter()
                .find_map(|item| find_field(item, field, path)),
            NodeKind::Scalar(_) => None,
        };
        if found.is_some() {
            break;
        }
    }

    path.remove(&node.id());
    found
}

/// `source → label → score` into `"source_label" → score`. Non-mapping sources and
/// non-numeric scores are ignored.
fn flatten<'a, N: RecordNode<'a>>(annotation: N) -> FlatScores {
    let mut flat = FlatScores::new();
    let NodeKind::Mapping(sources) = annotation.kind() else {
        return flat;
    };
    for (source, labels) in sources {
        let NodeKind::Mapping(labels) = labels.kind() else {
            continue;
        };
        for (label, score) in labels {
            if let NodeKind::Scalar(Some(score)) = score.kind() {
                flat.insert(format!("{source}_{label}").to_lowercase(), score);
            }
        }
    }
    flat
}

/// Index of a node inside a [`RecordGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum GraphNode {
    Mapping(Vec<(String, NodeId)>),
    Sequence(Vec<NodeId>),
    Scalar(Option<f64>),
}

/// Arena-backed record whose children are referenced by id, so a node may (directly or
/// indirectly) contain itself.
#[derive(Debug, Clone, Default)]
pub struct RecordGraph {
    nodes: Vec<GraphNode>,
}

impl RecordGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty mapping node.
    pub fn mapping(&mut self) -> NodeId {
        self.push_node(GraphNode::Mapping(Vec::new()))
    }

    /// Add an empty sequence node.
    pub fn sequence(&mut self) -> NodeId {
        self.push_node(GraphNode::Sequence(Vec::new()))
    }

    /// Add a numeric leaf.
    pub fn number(&mut self, value: f64) -> NodeId {
        self.push_node(GraphNode::Scalar(Some(value)))
    }

    /// Add a non-numeric leaf.
    pub fn opaque(&mut self) -> NodeId {
        self.push_node(GraphNode::Scalar(None))
    }

    /// Set `key` on mapping `map`, replacing an existing entry in place.
    ///
    /// Returns `false` (and does nothing) when `map` is not a mapping.
    pub fn insert(&mut self, map: NodeId, key: &str, value: NodeId) -> bool {
        let Some(GraphNode::Mapping(entries)) = self.nodes.get_mut(map.0) else {
            return false;
        };
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key.to_string(), value)),
        }
        true
    }

    /// Append `value` to sequence `seq`. Returns `false` when `seq` is not a sequence.
    pub fn push(&mut self, seq: NodeId, value: NodeId) -> bool {
        let Some(GraphNode::Sequence(items)) = self.nodes.get_mut(seq.0) else {
            return false;
        };
        items.push(value);
        true
    }

    /// Copy a JSON value into the graph, returning its root id.
    pub fn import_json(&mut self, value: &Value) -> NodeId {
        match value {
            Value::Object(map) => {
                let id = self.mapping();
                for (key, child) in map {
                    let child = self.import_json(child);
                    self.insert(id, key, child);
                }
                id
            }
            Value::Array(items) => {
                let id = self.sequence();
                for item in items {
                    let item = self.import_json(item);
                    self.push(id, item);
                }
                id
            }
            Value::Number(n) => self.push_node(GraphNode::Scalar(n.as_f64())),
            _ => self.opaque(),
        }
    }

    /// Handle for resolving from `id`.
    pub fn node(&self, id: NodeId) -> GraphRef<'_> {
        GraphRef { graph: self, id }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push_node(&mut self, node: GraphNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }
}

/// [`RecordNode`] handle into a [`RecordGraph`].
#[derive(Debug, Clone, Copy)]
pub struct GraphRef<'a> {
    graph: &'a RecordGraph,
    id: NodeId,
}

impl<'a> RecordNode<'a> for GraphRef<'a> {
    type Id = NodeId;

    fn id(self) -> NodeId {
        self.id
    }

    fn kind(self) -> NodeKind<'a, Self> {
        let graph = self.graph;
        let at = |id: NodeId| GraphRef { graph, id };
        match graph.nodes.get(self.id.0) {
            Some(GraphNode::Mapping(entries)) => {
                NodeKind::Mapping(entries.iter().map(|(k, id)| (k.as_str(), at(*id))).collect())
            }
            Some(GraphNode::Sequence(items)) => {
                NodeKind::Sequence(items.iter().map(|id| at(*id)).collect())
            }
            Some(GraphNode::Scalar(value)) => NodeKind::Scalar(*value),
            None => NodeKind::Scalar(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FIELD_PRIORITIES;
    use serde_json::json;

    fn fetch(record: &Value, field: Option<&str>) -> Option<FlatScores> {
        fetch_annotations(record, field, DEFAULT_FIELD_PRIORITIES)
    }

    fn flat(pairs: &[(&str, f64)]) -> FlatScores {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn lower_priority_field_used_when_alone() {
        let record = json!({"pdk_sentiment_scores_title": {"lex1": {"pos": 2.0}}});
        assert_eq!(fetch(&record, None), Some(flat(&[("lex1_pos", 2.0)])));
    }

    #[test]
    fn higher_priority_field_wins() {
        let record = json!({
            "pdk_sentiment_scores_title": {"lex1": {"pos": 2.0}},
            "pdk_sentiment_scores_text": {"lex1": {"neg": 1.0}},
        });
        assert_eq!(fetch(&record, None), Some(flat(&[("lex1_neg", 1.0)])));
    }

    #[test]
    fn nested_higher_priority_beats_shallow_lower_priority() {
        let record = json!({
            "pdk_sentiment_scores_title": {"lex1": {"pos": 2.0}},
            "body": {"pdk_sentiment_scores_text": {"lex1": {"neg": 1.0}}},
        });
        assert_eq!(fetch(&record, None), Some(flat(&[("lex1_neg", 1.0)])));
    }

    #[test]
    fn first_depth_first_hit_beats_shallower_later_hit() {
        let record = json!({
            "first": {"deeper": {"pdk_sentiment_scores_text": {"lex1": {"pos": 1.0}}}},
            "second": {"pdk_sentiment_scores_text": {"lex1": {"pos": 9.0}}},
        });
        assert_eq!(fetch(&record, Some("text")), Some(flat(&[("lex1_pos", 1.0)])));
    }

    #[test]
    fn preferred_field_found_in_list_element() {
        let record = json!({
            "comments": [
                {"author": "a"},
                {"pdk_sentiment_scores_comment": {"Lex1": {"Pos": 0.5}}},
            ]
        });
        assert_eq!(fetch(&record, Some("comment")), Some(flat(&[("lex1_pos", 0.5)])));
    }

    #[test]
    fn preferred_field_ignores_priority_list() {
        let record = json!({
            "pdk_sentiment_scores_text": {"lex1": {"pos": 1.0}},
            "pdk_sentiment_scores_title": {"lex1": {"pos": 2.0}},
        });
        assert_eq!(fetch(&record, Some("title")), Some(flat(&[("lex1_pos", 2.0)])));
        assert_eq!(fetch(&record, Some("caption")), None);
    }

    #[test]
    fn two_sources_with_same_label_stay_distinct() {
        let record = json!({
            "pdk_sentiment_scores_text": {
                "source1": {"label": 1.0},
                "source2": {"label": 3.0},
            }
        });
        assert_eq!(
            fetch(&record, None),
            Some(flat(&[("source1_label", 1.0), ("source2_label", 3.0)]))
        );
    }

    #[test]
    fn nothing_anywhere_is_not_found() {
        let record = json!({
            "text": "hello",
            "nested": {"list": [{"a": 1}, [{"pdk_sentiment_scores": {}}], 3]},
            "pdk_sentiment_scores": {"lex1": {"pos": 1.0}},
        });
        assert_eq!(fetch(&record, None), None);
        assert_eq!(fetch(&record, Some("text")), None);
    }

    #[test]
    fn non_mapping_record_is_not_found() {
        assert_eq!(fetch(&json!([{"pdk_sentiment_scores_text": {}}]), None), None);
        assert_eq!(fetch(&json!("text"), Some("text")), None);
        assert_eq!(fetch(&Value::Null, None), None);
    }

    #[test]
    fn empty_annotation_is_still_a_hit() {
        let record = json!({"pdk_sentiment_scores_text": {}});
        assert_eq!(fetch(&record, None), Some(FlatScores::new()));
    }

    #[test]
    fn malformed_annotation_values_are_skipped() {
        let record = json!({
            "pdk_sentiment_scores_text": {"lex1": {"pos": "high", "neg": -1}, "lex2": 4}
        });
        assert_eq!(fetch(&record, None), Some(flat(&[("lex1_neg", -1.0)])));
    }

    #[test]
    fn custom_priorities_are_honored() {
        let record = json!({
            "pdk_sentiment_scores_text": {"lex1": {"pos": 1.0}},
            "pdk_sentiment_scores_title": {"lex1": {"pos": 2.0}},
        });
        let got = fetch_annotations(&record, None, &["title", "text"]);
        assert_eq!(got, Some(flat(&[("lex1_pos", 2.0)])));
    }

    #[test]
    fn self_referential_record_terminates() {
        let mut graph = RecordGraph::new();
        let root = graph.mapping();
        let child = graph.mapping();
        let list = graph.sequence();
        let leaf = graph.opaque();
        graph.insert(root, "self", root);
        graph.insert(root, "child", child);
        graph.insert(child, "parent", root);
        graph.insert(child, "items", list);
        graph.push(list, child);
        graph.push(list, leaf);

        assert_eq!(fetch_annotations(graph.node(root), None, DEFAULT_FIELD_PRIORITIES), None);
        assert_eq!(fetch_annotations(graph.node(root), Some("text"), &[] as &[&str]), None);
    }

    #[test]
    fn cyclic_record_still_finds_reachable_annotation() {
        let mut graph = RecordGraph::new();
        let root = graph.import_json(&json!({"meta": {"kind": "post"}}));
        let annotated = graph.import_json(&json!({
            "pdk_sentiment_scores_post": {"lex1": {"joy": 4.0}}
        }));
        graph.insert(root, "loop", root);
        graph.insert(root, "reply", annotated);
        graph.insert(annotated, "back", root);

        let got = fetch_annotations(graph.node(root), None, DEFAULT_FIELD_PRIORITIES);
        assert_eq!(got, Some(flat(&[("lex1_joy", 4.0)])));
    }

    #[test]
    fn get_finds_mapping_children_only() {
        let record = json!({"a": {"b": 1}, "list": [1, 2]});
        assert!(record.get("a").is_some_and(|a| RecordNode::get(a, "b").is_some()));
        assert!(RecordNode::get(&record, "missing").is_none());
        assert!(RecordNode::get(&record["list"], "0").is_none());

        let mut graph = RecordGraph::new();
        let root = graph.import_json(&record);
        let a = graph.node(root).get("a").expect("child mapping");
        let b = a.get("b").map(|b| b.kind());
        assert!(matches!(b, Some(NodeKind::Scalar(Some(v))) if v == 1.0));
        assert!(graph.node(root).get("missing").is_none());
    }

    #[test]
    fn graph_insert_rejects_non_mapping() {
        let mut graph = RecordGraph::new();
        let list = graph.sequence();
        let leaf = graph.number(1.0);
        assert!(!graph.insert(list, "k", leaf));
        assert!(!graph.push(leaf, list));
        assert_eq!(graph.len(), 2);
    }
}
