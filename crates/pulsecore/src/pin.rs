use crate::{NodeId, PinError, PinId, PinValue};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinType {
    Flow,
    Bool,
    Int,
    Float,
    String,
    Object,
    Function,
    Delegate,
}

impl PinType {
    pub fn is_flow(self) -> bool {
        matches!(self, PinType::Flow)
    }

    pub fn is_data(self) -> bool {
        !self.is_flow()
    }

    /// Whether an output of this type may feed an input of `other`.
    pub fn is_compatible_with(self, other: PinType) -> bool {
        self == other
    }

    /// Whether a pin of this type may hold `value`.
    pub fn accepts(self, value: &PinValue) -> bool {
        matches!(
            (self, value),
            (PinType::Bool, PinValue::Bool(_))
                | (PinType::Int, PinValue::Int(_))
                | (PinType::Float, PinValue::Float(_))
                | (PinType::String, PinValue::String(_))
                | (
                    PinType::Object | PinType::Function | PinType::Delegate,
                    PinValue::Entity(_)
                )
        )
    }

    /// Map a reflected type name onto a pin type. Anything unrecognised is an `Object`.
    pub fn from_type_name(type_name: &str) -> PinType {
        match type_name.trim() {
            "float" | "f32" | "double" | "f64" => PinType::Float,
            "int" | "i32" | "long long" | "i64" | "u32" => PinType::Int,
            "bool" => PinType::Bool,
            "string" | "String" | "std::string" | "&str" => PinType::String,
            _ => PinType::Object,
        }
    }
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PinType::Flow => "flow",
            PinType::Bool => "bool",
            PinType::Int => "int",
            PinType::Float => "float",
            PinType::String => "string",
            PinType::Object => "object",
            PinType::Function => "function",
            PinType::Delegate => "delegate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinSubType {
    #[default]
    None,
    Actor,
    Light,
    Camera,
    Animation,
    Sequence,
    Composition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinKind {
    Input,
    Output,
}

/// A typed connection point owned by a node
///
/// Links touching a pin are recorded by the graph that owns the node, not by
/// the pin itself.
#[derive(Debug, Clone)]
pub struct Pin {
    id: PinId,
    node_id: NodeId,
    label: String,
    pin_type: PinType,
    subtype: PinSubType,
    kind: PinKind,
    can_flow: bool,
    data: Option<PinValue>,
}

impl Pin {
    pub fn new(
        id: PinId,
        node_id: NodeId,
        label: impl Into<String>,
        pin_type: PinType,
        kind: PinKind,
    ) -> Self {
        Self {
            id,
            node_id,
            label: label.into(),
            pin_type,
            subtype: PinSubType::None,
            kind,
            can_flow: false,
            data: PinValue::default_for(pin_type),
        }
    }

    pub fn with_subtype(mut self, subtype: PinSubType) -> Self {
        self.subtype = subtype;
        self
    }

    pub fn id(&self) -> PinId {
        self.id
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pin_type(&self) -> PinType {
        self.pin_type
    }

    pub fn subtype(&self) -> PinSubType {
        self.subtype
    }

    pub fn set_subtype(&mut self, subtype: PinSubType) {
        self.subtype = subtype;
    }

    pub fn kind(&self) -> PinKind {
        self.kind
    }

    pub fn is_input(&self) -> bool {
        self.kind == PinKind::Input
    }

    pub fn is_output(&self) -> bool {
        self.kind == PinKind::Output
    }

    pub fn data(&self) -> Option<&PinValue> {
        self.data.as_ref()
    }

    /// Store a new payload. Never triggers evaluation.
    ///
    /// A value whose tag does not match the pin type is dropped and reported.
    pub fn set_data(&mut self, data: Option<PinValue>) -> Result<(), PinError> {
        match &data {
            Some(_) if self.pin_type.is_flow() => {
                tracing::warn!(pin = %self.id, "Dropping payload written to flow pin");
                return Err(PinError::FlowPayload(self.id));
            }
            Some(value) if !self.pin_type.accepts(value) => {
                tracing::warn!(
                    pin = %self.id,
                    expected = %self.pin_type,
                    found = value.kind_name(),
                    "Dropping mismatched pin write"
                );
                return Err(PinError::TypeMismatch {
                    pin: self.id,
                    expected: self.pin_type,
                    found: value.kind_name(),
                });
            }
            _ => {}
        }
        self.data = data;
        Ok(())
    }

    pub fn can_flow(&self) -> bool {
        self.can_flow
    }

    /// Arm a flow pin. Data pins are left untouched.
    pub fn arm(&mut self) {
        if self.pin_type.is_flow() {
            self.can_flow = true;
        }
    }

    pub fn disarm(&mut self) {
        self.can_flow = false;
    }
}
