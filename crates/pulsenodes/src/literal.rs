use pulsecore::{Color, DataNode, Node, NodeContext, NodeCore, NodeError, NodeId, PinId, PinType, PinValue};
use pulseruntime::{NodeFactory, NodeMetadata};
use std::any::Any;

/// String literal. Its value is mirrored onto the `value` output pin.
#[derive(Debug, Clone)]
pub struct StringNode {
    core: NodeCore,
    value: String,
}

impl StringNode {
    pub const TYPE: &'static str = "String";

    pub fn new(id: NodeId) -> Self {
        let mut core = NodeCore::new(id, Self::TYPE).with_color(Color::rgb(200, 50, 190));
        core.add_output("value", PinType::String);
        Self {
            core,
            value: String::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.store(value.into());
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn store(&mut self, value: String) {
        if let Some(pin) = self.core.output_mut(0) {
            // The output is a String pin, so this cannot mismatch.
            let _ = pin.set_data(Some(PinValue::String(value.clone())));
        }
        self.value = value;
    }
}

impl DataNode for StringNode {
    fn data(&self) -> Option<PinValue> {
        Some(PinValue::String(self.value.clone()))
    }

    fn set_data(&mut self, data: Option<PinValue>) -> Result<(), NodeError> {
        match data {
            Some(PinValue::String(value)) => self.store(value),
            None => self.store(String::new()),
            Some(other) => {
                tracing::warn!("String node {} ignored a {} value", self.core.id(), other.kind_name());
                return Err(NodeError::InvalidData {
                    expected: "string",
                    found: other.kind_name(),
                });
            }
        }
        Ok(())
    }
}

impl Node for StringNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    // Pure data; never on a flow path.
    fn evaluate(&mut self, _flow_pin: PinId, _ctx: &NodeContext) -> Result<bool, NodeError> {
        Ok(false)
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

pub struct StringNodeFactory;

impl NodeFactory for StringNodeFactory {
    fn create(&self, id: NodeId) -> Result<Box<dyn Node>, NodeError> {
        Ok(Box::new(StringNode::new(id)))
    }

    fn node_type(&self) -> &str {
        StringNode::TYPE
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::new("Constant string value", "data")
    }
}
