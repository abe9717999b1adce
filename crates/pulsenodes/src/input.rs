use pulsecore::{
    Color, DataNode, HostEvent, KeyAction, Node, NodeContext, NodeCore, NodeError, NodeId, PinId,
    PinType, PinValue,
};
use pulseruntime::{NodeFactory, NodeMetadata};
use std::any::Any;

const KEY_COLOR: Color = Color::rgb(255, 0, 255);

/// Key code a key node listens for. Unset means the node never fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct KeyBinding {
    code: Option<i32>,
}

impl KeyBinding {
    fn data(&self) -> Option<PinValue> {
        self.code.map(PinValue::Int)
    }

    fn set_data(&mut self, data: Option<PinValue>) -> Result<(), NodeError> {
        self.code = match data {
            None => None,
            Some(PinValue::Int(code)) => Some(code),
            Some(other) => {
                return Err(NodeError::InvalidData {
                    expected: "int",
                    found: other.kind_name(),
                })
            }
        };
        Ok(())
    }

    /// The action, if the event is for the bound key.
    fn matches(&self, event: &HostEvent) -> Option<KeyAction> {
        match event {
            HostEvent::Key { code, action } if self.code == Some(*code) => Some(*action),
            _ => None,
        }
    }
}

/// Event node that fires once when its key goes down.
///
/// Holding the key does not fire again until it has been released.
#[derive(Debug, Clone)]
pub struct KeyPressNode {
    core: NodeCore,
    key: KeyBinding,
    held: bool,
    pending: bool,
}

impl KeyPressNode {
    pub const TYPE: &'static str = "KeyPress";

    pub fn new(id: NodeId) -> Self {
        let mut core = NodeCore::new(id, Self::TYPE).with_color(KEY_COLOR);
        core.add_output("pressed", PinType::Flow);
        Self {
            core,
            key: KeyBinding::default(),
            held: false,
            pending: false,
        }
    }

    pub fn with_key(mut self, code: i32) -> Self {
        self.key.code = Some(code);
        self
    }

    pub fn key_code(&self) -> Option<i32> {
        self.key.code
    }
}

impl DataNode for KeyPressNode {
    fn data(&self) -> Option<PinValue> {
        self.key.data()
    }

    fn set_data(&mut self, data: Option<PinValue>) -> Result<(), NodeError> {
        self.key.set_data(data)?;
        self.held = false;
        Ok(())
    }
}

impl Node for KeyPressNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn evaluate(&mut self, flow_pin: PinId, _ctx: &NodeContext) -> Result<bool, NodeError> {
        if flow_pin != PinId::EVENT {
            return Err(NodeError::UnknownFlowPin {
                node: self.core.id(),
                pin: flow_pin,
            });
        }
        if !std::mem::take(&mut self.pending) {
            return Ok(false);
        }
        Ok(self.core.arm_outputs())
    }

    fn handle_event(&mut self, event: &HostEvent, ctx: &NodeContext) -> Result<bool, NodeError> {
        match self.key.matches(event) {
            Some(KeyAction::Press | KeyAction::Repeat) if !self.held => {
                self.held = true;
                self.pending = true;
                self.evaluate(PinId::EVENT, ctx)
            }
            Some(KeyAction::Release) => {
                self.held = false;
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    fn as_data(&self) -> Option<&dyn DataNode> {
        Some(self)
    }

    fn as_data_mut(&mut self) -> Option<&mut dyn DataNode> {
        Some(self)
    }

    fn clone_node(&self) -> Box<dyn Node> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub struct KeyPressNodeFactory;

impl NodeFactory for KeyPressNodeFactory {
    fn create(&self, id: NodeId) -> Result<Box<dyn Node>, NodeError> {
        Ok(Box::new(KeyPressNode::new(id)))
    }

    fn node_type(&self) -> &str {
        KeyPressNode::TYPE
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::new("Fires when the configured key is pressed", "input")
    }
}

/// Event node that fires when its key comes back up after a press.
#[derive(Debug, Clone)]
pub struct KeyReleaseNode {
    core: NodeCore,
    key: KeyBinding,
    held: bool,
    pending: bool,
}

impl KeyReleaseNode {
    pub const TYPE: &'static str = "KeyRelease";

    pub fn new(id: NodeId) -> Self {
        let mut core = NodeCore::new(id, Self::TYPE).with_color(KEY_COLOR);
        core.add_output("released", PinType::Flow);
        Self {
            core,
            key: KeyBinding::default(),
            held: false,
            pending: false,
        }
    }

    pub fn with_key(mut self, code: i32) -> Self {
        self.key.code = Some(code);
        self
    }

    pub fn key_code(&self) -> Option<i32> {
        self.key.code
    }
}

impl DataNode for KeyReleaseNode {
    fn data(&self) -> Option<PinValue> {
        self.key.data()
    }

    fn set_data(&mut self, data: Option<PinValue>) -> Result<(), NodeError> {
        self.key.set_data(data)?;
        self.held = false;
        Ok(())
    }
}

impl Node for KeyReleaseNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn evaluate(&mut self, flow_pin: PinId, _ctx: &NodeContext) -> Result<bool, NodeError> {
        if flow_pin != PinId::EVENT {
            return Err(NodeError::UnknownFlowPin {
                node: self.core.id(),
                pin: flow_pin,
            });
        }
        if !std::mem::take(&mut self.pending) {
            return Ok(false);
        }
        Ok(self.core.arm_outputs())
    }

    fn handle_event(&mut self, event: &HostEvent, ctx: &NodeContext) -> Result<bool, NodeError> {
        match self.key.matches(event) {
            Some(KeyAction::Press | KeyAction::Repeat) => {
                self.held = true;
                Ok(false)
            }
            Some(KeyAction::Release) if self.held => {
                self.held = false;
                self.pending = true;
                self.evaluate(PinId::EVENT, ctx)
            }
            _ => Ok(false),
        }
    }

    fn as_data(&self) -> Option<&dyn DataNode> {
        Some(self)
    }

    fn as_data_mut(&mut self) -> Option<&mut dyn DataNode> {
        Some(self)
    }

    fn clone_node(&self) -> Box<dyn Node> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub struct KeyReleaseNodeFactory;

impl NodeFactory for KeyReleaseNodeFactory {
    fn create(&self, id: NodeId) -> Result<Box<dyn Node>, NodeError> {
        Ok(Box::new(KeyReleaseNode::new(id)))
    }

    fn node_type(&self) -> &str {
        KeyReleaseNode::TYPE
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::new("Fires when the configured key is released after a press", "input")
    }
}
