//! Core data structures for scoped lens graphs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::RecordError;

/// Store-assigned node identifier, always held in string form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(pub String);

impl Uid {
    pub fn new(uid: impl Into<String>) -> Self {
        Uid(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accept the two shapes a store hands back: a string or an integer.
    fn from_value(value: &Value) -> Result<Self, RecordError> {
        match value {
            Value::String(s) if !s.is_empty() => Ok(Uid(s.clone())),
            Value::Number(n) => Ok(Uid(n.to_string())),
            other => Err(RecordError::InvalidUid(other.to_string())),
        }
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uid {
    fn from(s: &str) -> Self {
        Uid(s.to_string())
    }
}

/// Value held by a single node attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Plain value, including lists that are not lists of edge targets.
    Scalar(Value),
    /// Outgoing relational edge; each entry is the expanded target.
    Edges(Vec<NodeRecord>),
}

impl AttrValue {
    fn from_value(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Array(items) if is_edge_list(&items) => {
                let records = items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(map) => Some(NodeRecord::try_from(map)),
                        _ => None,
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(AttrValue::Edges(records))
            }
            other => Ok(AttrValue::Scalar(other)),
        }
    }

    fn into_value(self) -> Value {
        match self {
            AttrValue::Scalar(value) => value,
            AttrValue::Edges(records) => Value::Array(
                records
                    .into_iter()
                    .map(|record| Value::Object(record.into()))
                    .collect(),
            ),
        }
    }

    pub fn is_edges(&self) -> bool {
        matches!(self, AttrValue::Edges(_))
    }
}

/// A list is an edge list when it is non-empty and every entry carries a
/// non-null `uid`.
fn is_edge_list(items: &[Value]) -> bool {
    !items.is_empty()
        && items
            .iter()
            .all(|item| item.get("uid").is_some_and(|uid| !uid.is_null()))
}

/// One node as returned by a scope query.
///
/// Node kinds are schema-less at the store layer, so every node is the same
/// structural type: an identifier plus a bag of scalar and edge attributes.
/// On the wire the record is the store's flat JSON object with `uid` as an
/// ordinary field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct NodeRecord {
    pub uid: Uid,
    pub attributes: BTreeMap<String, AttrValue>,
}

impl NodeRecord {
    pub fn new(uid: impl Into<Uid>) -> Self {
        NodeRecord {
            uid: uid.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_scalar(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes
            .insert(name.to_string(), AttrValue::Scalar(value.into()));
        self
    }

    pub fn with_edges(mut self, name: &str, targets: Vec<NodeRecord>) -> Self {
        self.attributes
            .insert(name.to_string(), AttrValue::Edges(targets));
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn scalar(&self, name: &str) -> Option<&Value> {
        match self.attributes.get(name) {
            Some(AttrValue::Scalar(value)) => Some(value),
            _ => None,
        }
    }

    pub fn scalar_str(&self, name: &str) -> Option<&str> {
        self.scalar(name).and_then(Value::as_str)
    }

    /// Edge targets under `name`; empty when absent or not an edge list.
    pub fn edges(&self, name: &str) -> &[NodeRecord] {
        match self.attributes.get(name) {
            Some(AttrValue::Edges(records)) => records,
            _ => &[],
        }
    }

    /// Members of this node's `scope` relation.
    pub fn scope(&self) -> &[NodeRecord] {
        self.edges("scope")
    }

    pub fn lens_name(&self) -> Option<&str> {
        self.scalar_str("lens")
    }

    /// A node is risk-annotated when an analyzer has attached its name.
    pub fn has_risk_annotation(&self) -> bool {
        self.attributes.contains_key("analyzer_name")
    }
}

impl TryFrom<Map<String, Value>> for NodeRecord {
    type Error = RecordError;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, Self::Error> {
        let uid = map.remove("uid").ok_or(RecordError::MissingUid)?;
        let uid = Uid::from_value(&uid)?;

        let mut attributes = BTreeMap::new();
        for (name, value) in map {
            attributes.insert(name, AttrValue::from_value(value)?);
        }

        Ok(NodeRecord { uid, attributes })
    }
}

impl From<NodeRecord> for Map<String, Value> {
    fn from(record: NodeRecord) -> Self {
        let mut map = Map::new();
        map.insert("uid".to_string(), Value::String(record.uid.0));
        for (name, value) in record.attributes {
            map.insert(name, value.into_value());
        }
        map
    }
}

/// Result of one scope fetch: the lens root(s) with their expanded scope.
///
/// Normally holds exactly one root. An empty graph means the lens is not
/// visible in the store at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopedGraph {
    pub roots: Vec<NodeRecord>,
}

impl ScopedGraph {
    pub fn new(roots: Vec<NodeRecord>) -> Self {
        ScopedGraph { roots }
    }

    /// Parse the JSON array a scope query returns.
    pub fn from_json(value: Value) -> Result<Self, RecordError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Scope members across every root, in fetch order.
    pub fn scope_members(&self) -> impl Iterator<Item = &NodeRecord> {
        self.roots.iter().flat_map(|root| root.scope().iter())
    }
}

/// Caller-held mapping of node identifier to last observed content hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<Uid, String>);

impl Snapshot {
    pub fn new() -> Self {
        Snapshot(BTreeMap::new())
    }

    pub fn insert(&mut self, uid: Uid, hash: String) {
        self.0.insert(uid, hash);
    }

    pub fn get(&self, uid: &Uid) -> Option<&str> {
        self.0.get(uid).map(String::as_str)
    }

    pub fn contains(&self, uid: &Uid) -> bool {
        self.0.contains_key(uid)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn uids(&self) -> impl Iterator<Item = &Uid> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uid, &str)> {
        self.0.iter().map(|(uid, hash)| (uid, hash.as_str()))
    }
}

impl FromIterator<(Uid, String)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (Uid, String)>>(iter: I) -> Self {
        Snapshot(iter.into_iter().collect())
    }
}

/// Outcome of comparing the current scope against a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Scope members that are new or whose content hash changed.
    pub updated_nodes: Vec<NodeRecord>,
    /// Snapshot identifiers no longer present in the scope.
    pub removed_nodes: Vec<Uid>,
    /// Content hashes of every current scope member, ready to be kept as
    /// the next baseline.
    #[serde(default)]
    pub uid_hashes: Snapshot,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.updated_nodes.is_empty() && self.removed_nodes.is_empty()
    }
}

/// Lens listing entry used for lens discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LensSummary {
    pub uid: Uid,
    #[serde(default)]
    pub node_key: Option<String>,
    pub lens: String,
    #[serde(default)]
    pub score: Option<Number>,
}

impl LensSummary {
    /// Score as a float for ranking; unscored lenses sort last.
    pub fn rank(&self) -> f64 {
        self.score
            .as_ref()
            .and_then(Number::as_f64)
            .unwrap_or(f64::NEG_INFINITY)
    }
}
