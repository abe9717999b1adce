use crate::events::{EventEmitter, PulseId};
use crate::{NodeError, NodeId, Pin, PinId, PinKind, PinType, PinValue};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Core trait that all graph nodes implement
///
/// `evaluate` only sees the node itself and a read-only context, so a node can
/// never reach back into the graph that is running it.
pub trait Node: Send {
    fn core(&self) -> &NodeCore;

    fn core_mut(&mut self) -> &mut NodeCore;

    /// Run the node because `flow_pin` fired.
    ///
    /// Returns `Ok(true)` when the node armed at least one flow output and the
    /// pulse should continue downstream.
    fn evaluate(&mut self, flow_pin: PinId, ctx: &NodeContext) -> Result<bool, NodeError>;

    /// Event entry point. Nodes that react to host events override this and
    /// call their own `evaluate`.
    fn handle_event(&mut self, _event: &HostEvent, _ctx: &NodeContext) -> Result<bool, NodeError> {
        Ok(false)
    }

    fn as_data(&self) -> Option<&dyn DataNode> {
        None
    }

    fn as_data_mut(&mut self) -> Option<&mut dyn DataNode> {
        None
    }

    /// Deep copy, including any wrapped object state.
    fn clone_node(&self) -> Box<dyn Node>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn id(&self) -> NodeId {
        self.core().id()
    }

    fn node_type(&self) -> &str {
        self.core().type_name()
    }

    fn reset_flow(&mut self) {
        self.core_mut().reset_flow();
    }
}

/// Nodes holding one scalar that pins alone cannot express
pub trait DataNode {
    fn data(&self) -> Option<PinValue>;

    fn set_data(&mut self, data: Option<PinValue>) -> Result<(), NodeError>;
}

/// Editor position, stored as opaque metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::rgb(128, 128, 128)
    }
}

/// State shared by every node kind: identity, metadata and pins
#[derive(Debug, Clone)]
pub struct NodeCore {
    id: NodeId,
    type_name: String,
    color: Color,
    position: Position,
    inputs: Vec<Pin>,
    outputs: Vec<Pin>,
}

impl NodeCore {
    pub fn new(id: NodeId, type_name: impl Into<String>) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            color: Color::default(),
            position: Position::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Append an input pin; its id is derived from this node's id and the pin's index.
    pub fn add_input(&mut self, label: impl Into<String>, pin_type: PinType) -> PinId {
        let id = PinId::derive(self.id, PinKind::Input, self.inputs.len());
        self.inputs
            .push(Pin::new(id, self.id, label, pin_type, PinKind::Input));
        id
    }

    pub fn add_output(&mut self, label: impl Into<String>, pin_type: PinType) -> PinId {
        let id = PinId::derive(self.id, PinKind::Output, self.outputs.len());
        self.outputs
            .push(Pin::new(id, self.id, label, pin_type, PinKind::Output));
        id
    }

    pub fn inputs(&self) -> &[Pin] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Pin] {
        &self.outputs
    }

    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    pub fn pins_mut(&mut self) -> impl Iterator<Item = &mut Pin> {
        self.inputs.iter_mut().chain(self.outputs.iter_mut())
    }

    pub fn input(&self, index: usize) -> Option<&Pin> {
        self.inputs.get(index)
    }

    pub fn output(&self, index: usize) -> Option<&Pin> {
        self.outputs.get(index)
    }

    pub fn input_mut(&mut self, index: usize) -> Option<&mut Pin> {
        self.inputs.get_mut(index)
    }

    pub fn output_mut(&mut self, index: usize) -> Option<&mut Pin> {
        self.outputs.get_mut(index)
    }

    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins().find(|p| p.id() == id)
    }

    pub fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.pins_mut().find(|p| p.id() == id)
    }

    /// Pin at `index` among this node's pins of `kind`.
    pub fn pin_at(&self, kind: PinKind, index: usize) -> Option<&Pin> {
        match kind {
            PinKind::Input => self.inputs.get(index),
            PinKind::Output => self.outputs.get(index),
        }
    }

    pub fn pin_at_mut(&mut self, kind: PinKind, index: usize) -> Option<&mut Pin> {
        match kind {
            PinKind::Input => self.inputs.get_mut(index),
            PinKind::Output => self.outputs.get_mut(index),
        }
    }

    pub fn input_by_label(&self, label: &str) -> Option<&Pin> {
        self.inputs.iter().find(|p| p.label() == label)
    }

    pub fn output_by_label(&self, label: &str) -> Option<&Pin> {
        self.outputs.iter().find(|p| p.label() == label)
    }

    /// Arm every flow output.
    pub fn arm_outputs(&mut self) -> bool {
        let mut armed = false;
        for pin in self.outputs.iter_mut().filter(|p| p.pin_type().is_flow()) {
            pin.arm();
            armed = true;
        }
        armed
    }

    /// Disarm every pin. Idempotent.
    pub fn reset_flow(&mut self) {
        for pin in self.pins_mut() {
            pin.disarm();
        }
    }

    /// Flow outputs currently armed.
    pub fn armed_outputs(&self) -> impl Iterator<Item = &Pin> {
        self.outputs
            .iter()
            .filter(|p| p.pin_type().is_flow() && p.can_flow())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAction {
    Press,
    Release,
    Repeat,
}

/// Input raised by the host and delivered to a node's event entry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostEvent {
    Key { code: i32, action: KeyAction },
}

impl HostEvent {
    pub fn key_press(code: i32) -> Self {
        HostEvent::Key {
            code,
            action: KeyAction::Press,
        }
    }

    pub fn key_release(code: i32) -> Self {
        HostEvent::Key {
            code,
            action: KeyAction::Release,
        }
    }
}

/// Read-only context passed to a node while it runs
#[derive(Clone)]
pub struct NodeContext {
    pub node_id: NodeId,
    pub pulse_id: PulseId,
    pub events: EventEmitter,
}

impl NodeContext {
    pub fn new(node_id: NodeId, pulse_id: PulseId, events: EventEmitter) -> Self {
        Self {
            node_id,
            pulse_id,
            events,
        }
    }
}
