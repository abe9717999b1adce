use pulsecore::{Color, Node, NodeContext, NodeCore, NodeError, NodeId, PinId, PinType};
use pulseruntime::{NodeFactory, NodeMetadata};
use std::any::Any;

/// Prints its `text` input each time flow reaches it
///
/// The text is logged and published as a `NodeEvent::Print` on the graph's
/// event bus. When `text` is not linked, the value typed into the pin is used.
#[derive(Debug, Clone)]
pub struct PrintNode {
    core: NodeCore,
    last: Option<String>,
}

impl PrintNode {
    pub const TYPE: &'static str = "Print";

    pub fn new(id: NodeId) -> Self {
        let mut core = NodeCore::new(id, Self::TYPE).with_color(Color::rgb(130, 200, 255));
        core.add_input("in", PinType::Flow);
        core.add_input("text", PinType::String);
        core.add_output("then", PinType::Flow);
        Self { core, last: None }
    }

    /// Text printed by the most recent evaluation
    pub fn last_printed(&self) -> Option<&str> {
        self.last.as_deref()
    }
}

impl Node for PrintNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn evaluate(&mut self, flow_pin: PinId, ctx: &NodeContext) -> Result<bool, NodeError> {
        if self.core.input(0).map(|p| p.id()) != Some(flow_pin) {
            return Err(NodeError::UnknownFlowPin {
                node: self.core.id(),
                pin: flow_pin,
            });
        }

        let text = self
            .core
            .input(1)
            .and_then(|p| p.data())
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        tracing::info!("Print: {}", text);
        ctx.events.print(text.clone());
        self.last = Some(text);

        Ok(self.core.arm_outputs())
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

pub struct PrintNodeFactory;

impl NodeFactory for PrintNodeFactory {
    fn create(&self, id: NodeId) -> Result<Box<dyn Node>, NodeError> {
        Ok(Box::new(PrintNode::new(id)))
    }

    fn node_type(&self) -> &str {
        PrintNode::TYPE
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::new("Prints a string when flow reaches it", "debug")
    }
}
