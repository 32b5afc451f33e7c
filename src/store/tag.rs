//! Node record envelope and codec.
//!
//! Each node file holds one JSON envelope:
//!
//! ```json
//! {"node": {"id": "7", "parentIds": ["6"]}, "actions": [ ... ]}
//! ```
//!
//! `actions` is omitted when the node has none. Nodes are always written with
//! `parentIds`. Readers also accept the object-graph form, where `parents` holds inline
//! node documents or `{"ref": k}` pointing at the k-th node already decoded from the same
//! document; that form is rewritten to ids while decoding.

use crate::graph::{Action, FlowNode, ParentLinks};
use crate::store::resolver::{resolve_parents, IdRegistry};
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub const NODE_FILE_EXTENSION: &str = "json";

/// A node grouped with the actions read or written alongside it.
#[derive(Debug)]
pub struct Tag<A: Action> {
    node: Arc<FlowNode<A>>,
    actions: Vec<A>,
}

impl<A: Action> Tag<A> {
    pub(crate) fn new(node: Arc<FlowNode<A>>, actions: Vec<A>) -> Self {
        Self { node, actions }
    }

    pub fn node(&self) -> &Arc<FlowNode<A>> {
        &self.node
    }

    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    pub fn into_parts(self) -> (Arc<FlowNode<A>>, Vec<A>) {
        (self.node, self.actions)
    }
}

struct NodeRecord<'a, A: Action>(&'a FlowNode<A>);

impl<A: Action> Serialize for NodeRecord<'_, A> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("node", 2)?;
        record.serialize_field("id", self.0.id())?;
        record.serialize_field("parentIds", &self.0.parent_ids())?;
        record.end()
    }
}

fn no_actions<A>(actions: &&[A]) -> bool {
    actions.is_empty()
}

#[derive(Serialize)]
struct TagRecord<'a, A: Action> {
    node: NodeRecord<'a, A>,
    #[serde(skip_serializing_if = "no_actions")]
    actions: &'a [A],
}

/// Serialize `node` together with `actions`.
pub fn encode<A: Action>(node: &FlowNode<A>, actions: &[A]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(&TagRecord {
        node: NodeRecord(node),
        actions,
    })
}

/// Envelope as decoded, before the store wires it to an execution.
#[derive(Debug)]
pub struct DecodedTag<A: Action> {
    pub node: Option<Arc<FlowNode<A>>>,
    pub actions: Vec<A>,
}

/// Decode one envelope. Every node encountered, nested parents included, is recorded in
/// `registry`.
pub fn decode<A: Action>(
    bytes: &[u8],
    registry: &mut IdRegistry<A>,
) -> Result<DecodedTag<A>, serde_json::Error> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let tag = TagSeed { registry }.deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(tag)
}

struct TagSeed<'r, A: Action> {
    registry: &'r mut IdRegistry<A>,
}

impl<'de, A: Action> DeserializeSeed<'de> for TagSeed<'_, A> {
    type Value = DecodedTag<A>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, A: Action> Visitor<'de> for TagSeed<'_, A> {
    type Value = DecodedTag<A>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a flow node record")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
        let registry = self.registry;
        let mut node = None;
        let mut actions = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "node" => {
                    node = map.next_value_seed(OptionalNodeSeed {
                        registry: &mut *registry,
                    })?
                }
                "actions" => actions = map.next_value::<Option<Vec<A>>>()?,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(DecodedTag {
            node,
            actions: actions.unwrap_or_default(),
        })
    }
}

struct OptionalNodeSeed<'r, A: Action> {
    registry: &'r mut IdRegistry<A>,
}

impl<'de, A: Action> DeserializeSeed<'de> for OptionalNodeSeed<'_, A> {
    type Value = Option<Arc<FlowNode<A>>>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_option(self)
    }
}

impl<'de, A: Action> Visitor<'de> for OptionalNodeSeed<'_, A> {
    type Value = Option<Arc<FlowNode<A>>>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a flow node or null")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        NodeSeed {
            registry: self.registry,
        }
        .deserialize(deserializer)
        .map(Some)
    }
}

struct NodeSeed<'r, A: Action> {
    registry: &'r mut IdRegistry<A>,
}

impl<'de, A: Action> DeserializeSeed<'de> for NodeSeed<'_, A> {
    type Value = Arc<FlowNode<A>>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, A: Action> Visitor<'de> for NodeSeed<'_, A> {
    type Value = Arc<FlowNode<A>>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a flow node")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
        let registry = self.registry;
        let mut id: Option<String> = None;
        let mut parent_ids: Option<Vec<String>> = None;
        let mut parents: Option<Vec<Arc<FlowNode<A>>>> = None;
        let mut reference: Option<usize> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "id" => id = Some(map.next_value()?),
                "parentIds" => parent_ids = Some(map.next_value()?),
                "parents" => {
                    parents = Some(map.next_value_seed(ParentsSeed {
                        registry: &mut *registry,
                    })?)
                }
                "ref" => reference = Some(map.next_value()?),
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        if let Some(position) = reference {
            return registry.decoded_at(position).cloned().ok_or_else(|| {
                de::Error::custom(format!(
                    "reference to node #{} which has not been decoded",
                    position
                ))
            });
        }

        let id = id.ok_or_else(|| de::Error::missing_field("id"))?;
        let links = match (parents, parent_ids) {
            (Some(_), Some(_)) => {
                return Err(de::Error::custom(format!(
                    "node {} carries both `parents` and `parentIds`",
                    id
                )))
            }
            (Some(parents), None) => ParentLinks::InMemory(parents),
            (None, ids) => ParentLinks::OnDisk(ids.unwrap_or_default()),
        };

        let mut node = FlowNode::detached(id.clone(), links);
        if let Err(err) = resolve_parents(&mut node, registry) {
            let message = err.to_string();
            registry.note_violation(err);
            return Err(de::Error::custom(message));
        }

        let node = Arc::new(node);
        registry.record(&node, id);
        Ok(node)
    }
}

struct ParentsSeed<'r, A: Action> {
    registry: &'r mut IdRegistry<A>,
}

impl<'de, A: Action> DeserializeSeed<'de> for ParentsSeed<'_, A> {
    type Value = Vec<Arc<FlowNode<A>>>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, A: Action> Visitor<'de> for ParentsSeed<'_, A> {
    type Value = Vec<Arc<FlowNode<A>>>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a list of parent nodes")
    }

    fn visit_seq<S: SeqAccess<'de>>(self, mut seq: S) -> Result<Self::Value, S::Error> {
        let registry = self.registry;
        let mut parents = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(parent) = seq.next_element_seed(NodeSeed {
            registry: &mut *registry,
        })? {
            parents.push(parent);
        }
        Ok(parents)
    }
}
