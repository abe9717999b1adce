//! Core abstractions for the pulse engine
//!
//! Ids, the pin/link/node data model, pin values, the reflection interface,
//! the persisted blueprint schema and execution events. Everything that runs
//! a graph lives in `pulseruntime`.

mod blueprint;
mod error;
pub mod events;
mod id;
mod link;
mod node;
mod pin;
pub mod reflect;
mod value;

pub use blueprint::{
    Blueprint, BlueprintLink, BlueprintNode, BlueprintPayload, BlueprintPin, CURRENT_VERSION, MAGIC,
};
pub use error::{EngineError, GraphError, NodeError, PinError, ReflectError, SerializeError};
pub use events::*;
pub use id::{LinkId, NodeId, PinId};
pub use link::Link;
pub use node::{Color, DataNode, HostEvent, KeyAction, Node, NodeContext, NodeCore, Position};
pub use pin::{Pin, PinKind, PinSubType, PinType};
pub use value::{EntityPayload, EntityRef, PinValue};

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
