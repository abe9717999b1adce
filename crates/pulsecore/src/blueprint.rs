//! Persisted graph schema.
//!
//! These are plain data types; the byte framing lives with the serializer.

use crate::{EntityRef, Link, Node, Pin, PinKind, PinSubType, PinType, PinValue, Position};
use serde::{Deserialize, Serialize};

/// Leading bytes of every encoded blueprint
pub const MAGIC: [u8; 4] = *b"PBLU";

/// Format version written by this build
pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub version: u32,
    pub nodes: Vec<BlueprintNode>,
    pub links: Vec<BlueprintLink>,
}

impl Blueprint {
    pub fn new() -> Self {
        Self {
            version: CURRENT_VERSION,
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }
}

impl Default for Blueprint {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintNode {
    pub id: u64,
    #[serde(rename = "type")]
    pub node_type: String,
    pub position: Position,
    pub inputs: Vec<BlueprintPin>,
    pub outputs: Vec<BlueprintPin>,
    pub data: Option<BlueprintPayload>,
}

impl BlueprintNode {
    pub fn from_node(node: &dyn Node) -> Self {
        let core = node.core();
        Self {
            id: core.id().raw(),
            node_type: core.type_name().to_string(),
            position: core.position(),
            inputs: core.inputs().iter().map(BlueprintPin::from_pin).collect(),
            outputs: core.outputs().iter().map(BlueprintPin::from_pin).collect(),
            data: node
                .as_data()
                .and_then(|d| d.data())
                .map(|v| BlueprintPayload::from(&v)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintPin {
    pub id: u64,
    #[serde(rename = "type")]
    pub pin_type: PinType,
    pub subtype: PinSubType,
    pub kind: PinKind,
    pub data: Option<BlueprintPayload>,
}

impl BlueprintPin {
    pub fn from_pin(pin: &Pin) -> Self {
        Self {
            id: pin.id().raw(),
            pin_type: pin.pin_type(),
            subtype: pin.subtype(),
            kind: pin.kind(),
            data: pin.data().map(BlueprintPayload::from),
        }
    }
}

/// Persisted pin or node payload. Entity references keep only their id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlueprintPayload {
    String(String),
    Int(i32),
    Float(f32),
    Bool(bool),
    Entity { id: u64 },
}

impl From<&PinValue> for BlueprintPayload {
    fn from(value: &PinValue) -> Self {
        match value {
            PinValue::String(s) => BlueprintPayload::String(s.clone()),
            PinValue::Int(i) => BlueprintPayload::Int(*i),
            PinValue::Float(f) => BlueprintPayload::Float(*f),
            PinValue::Bool(b) => BlueprintPayload::Bool(*b),
            PinValue::Entity(e) => BlueprintPayload::Entity { id: e.id },
        }
    }
}

impl From<BlueprintPayload> for PinValue {
    fn from(payload: BlueprintPayload) -> Self {
        match payload {
            BlueprintPayload::String(s) => PinValue::String(s),
            BlueprintPayload::Int(i) => PinValue::Int(i),
            BlueprintPayload::Float(f) => PinValue::Float(f),
            BlueprintPayload::Bool(b) => PinValue::Bool(b),
            BlueprintPayload::Entity { id } => PinValue::Entity(EntityRef::new(id)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintLink {
    pub id: u64,
    pub start_node: u64,
    pub start_pin: u64,
    pub end_node: u64,
    pub end_pin: u64,
}

impl From<&Link> for BlueprintLink {
    fn from(link: &Link) -> Self {
        Self {
            id: link.id().raw(),
            start_node: link.start_node().raw(),
            start_pin: link.start().raw(),
            end_node: link.end_node().raw(),
            end_pin: link.end().raw(),
        }
    }
}
