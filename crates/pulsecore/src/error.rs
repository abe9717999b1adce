use crate::{LinkId, NodeId, PinId, PinType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("Pin error: {0}")]
    Pin(#[from] PinError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] SerializeError),
}

/// Rejected writes to a pin.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PinError {
    #[error("Pin {pin} expects {expected}, got {found}")]
    TypeMismatch {
        pin: PinId,
        expected: PinType,
        found: &'static str,
    },

    #[error("Flow pin {0} cannot carry a payload")]
    FlowPayload(PinId),
}

/// Failures raised by host-object accessors and dispatchers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReflectError {
    #[error("Object instance is not a '{expected}'")]
    WrongInstance { expected: String },

    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    #[error("Property '{0}' is read-only")]
    ReadOnly(String),

    #[error("Argument {index}: expected {expected}, got {found}")]
    ArgumentType {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Expected {expected} arguments, got {found}")]
    ArgumentCount { expected: usize, found: usize },

    #[error("Property '{name}': expected {expected}, got {found}")]
    PropertyType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Call failed: {0}")]
    Call(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("Flow pin {pin} is not an entry point of node {node}")]
    UnknownFlowPin { node: NodeId, pin: PinId },

    #[error("No dispatcher registered for method '{method}'")]
    MissingDispatcher { method: String },

    #[error("Method '{method}' called without a value for parameter {index}")]
    MissingArgument { method: String, index: usize },

    #[error("Invalid node data: expected {expected}, got {found}")]
    InvalidData {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Reflection error: {0}")]
    Reflection(#[from] ReflectError),

    #[error(transparent)]
    Pin(#[from] PinError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Failed to create '{node_type}' node: {reason}")]
    NodeCreation { node_type: String, reason: NodeError },

    #[error("Node already exists: {0}")]
    DuplicateNode(NodeId),

    #[error("Pin id {0} is already used in this graph")]
    DuplicatePin(PinId),

    #[error("Link already exists: {0}")]
    DuplicateLink(LinkId),

    #[error("Pins {start} and {end} are already linked")]
    AlreadyLinked { start: PinId, end: PinId },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Pin not found: {0}")]
    PinNotFound(PinId),

    #[error("Link not found: {0}")]
    LinkNotFound(LinkId),

    #[error("Links must run from an output pin to an input pin ({start} -> {end})")]
    InvalidDirection { start: PinId, end: PinId },

    #[error("Cannot link {start} ({start_type}) to {end} ({end_type})")]
    IncompatiblePins {
        start: PinId,
        start_type: PinType,
        end: PinId,
        end_type: PinType,
    },

    #[error("Node {0} does not hold node-level data")]
    NotDataNode(NodeId),
}

#[derive(Error, Debug)]
pub enum SerializeError {
    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Decoding failed: {0}")]
    Decode(String),

    #[error("Not a blueprint buffer")]
    BadMagic,

    #[error("Blueprint format version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
