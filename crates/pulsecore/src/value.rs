use crate::PinType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar carried inline by an entity reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityPayload {
    String(String),
    Int(i32),
    Float(f32),
    Bool(bool),
}

/// Reference to an object that lives outside the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: u64,
    pub payload: Option<EntityPayload>,
}

impl EntityRef {
    pub fn new(id: u64) -> Self {
        Self { id, payload: None }
    }

    pub fn with_payload(mut self, payload: EntityPayload) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Value held by a data pin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PinValue {
    Entity(EntityRef),
    String(String),
    Int(i32),
    Float(f32),
    Bool(bool),
}

impl PinValue {
    /// Value a freshly created pin of `pin_type` starts with.
    pub fn default_for(pin_type: PinType) -> Option<PinValue> {
        match pin_type {
            PinType::Bool => Some(PinValue::Bool(false)),
            PinType::Int => Some(PinValue::Int(0)),
            PinType::Float => Some(PinValue::Float(0.0)),
            PinType::String => Some(PinValue::String(String::new())),
            PinType::Flow | PinType::Object | PinType::Function | PinType::Delegate => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            PinValue::Entity(_) => "entity",
            PinValue::String(_) => "string",
            PinValue::Int(_) => "int",
            PinValue::Float(_) => "float",
            PinValue::Bool(_) => "bool",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PinValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            PinValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            PinValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PinValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            PinValue::Entity(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for PinValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinValue::Entity(e) => write!(f, "entity#{}", e.id),
            PinValue::String(s) => write!(f, "{:?}", s),
            PinValue::Int(i) => write!(f, "{}", i),
            PinValue::Float(v) => write!(f, "{}", v),
            PinValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for PinValue {
    fn from(s: String) -> Self {
        PinValue::String(s)
    }
}

impl From<&str> for PinValue {
    fn from(s: &str) -> Self {
        PinValue::String(s.to_string())
    }
}

impl From<i32> for PinValue {
    fn from(i: i32) -> Self {
        PinValue::Int(i)
    }
}

impl From<f32> for PinValue {
    fn from(f: f32) -> Self {
        PinValue::Float(f)
    }
}

impl From<bool> for PinValue {
    fn from(b: bool) -> Self {
        PinValue::Bool(b)
    }
}

impl From<EntityRef> for PinValue {
    fn from(e: EntityRef) -> Self {
        PinValue::Entity(e)
    }
}
