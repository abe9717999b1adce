// crates/pulseruntime/tests/common/mod.rs
#![allow(dead_code)]

use pulsecore::{
    DataNode, HostEvent, KeyAction, Node, NodeContext, NodeCore, NodeError, NodeId, PinId,
    PinType, PinValue,
};
use pulseruntime::{Graph, NodeMetadata, NodeRegistry};
use std::any::Any;
use std::sync::Arc;

pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Arms its output on any key press.
#[derive(Clone)]
pub struct StartNode {
    core: NodeCore,
}

impl StartNode {
    pub fn new(id: NodeId) -> Self {
        let mut core = NodeCore::new(id, "Start");
        core.add_output("out", PinType::Flow);
        Self { core }
    }
}

impl Node for StartNode {
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
        Ok(self.core.arm_outputs())
    }

    fn handle_event(&mut self, event: &HostEvent, ctx: &NodeContext) -> Result<bool, NodeError> {
        match event {
            HostEvent::Key {
                action: KeyAction::Press,
                ..
            } => self.evaluate(PinId::EVENT, ctx),
            _ => Ok(false),
        }
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

/// Flow in, int in, flow out. Records every value it sees.
#[derive(Clone)]
pub struct RelayNode {
    core: NodeCore,
    pub seen: Vec<Option<i32>>,
}

impl RelayNode {
    pub fn new(id: NodeId) -> Self {
        let mut core = NodeCore::new(id, "Relay");
        core.add_input("in", PinType::Flow);
        core.add_input("value", PinType::Int);
        core.add_output("out", PinType::Flow);
        Self {
            core,
            seen: Vec::new(),
        }
    }
}

impl Node for RelayNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn evaluate(&mut self, flow_pin: PinId, _ctx: &NodeContext) -> Result<bool, NodeError> {
        let entry = self.core.input(0).map(|p| p.id());
        if entry != Some(flow_pin) {
            return Err(NodeError::UnknownFlowPin {
                node: self.core.id(),
                pin: flow_pin,
            });
        }
        let value = self.core.input(1).and_then(|p| p.data()).and_then(|v| v.as_int());
        self.seen.push(value);
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

/// Int literal exposed on one output pin.
#[derive(Clone)]
pub struct ConstNode {
    core: NodeCore,
    value: i32,
}

impl ConstNode {
    pub fn new(id: NodeId) -> Self {
        let mut core = NodeCore::new(id, "Const");
        core.add_output("value", PinType::Int);
        Self { core, value: 0 }
    }
}

impl DataNode for ConstNode {
    fn data(&self) -> Option<PinValue> {
        Some(PinValue::Int(self.value))
    }

    fn set_data(&mut self, data: Option<PinValue>) -> Result<(), NodeError> {
        let value = match data {
            Some(PinValue::Int(v)) => v,
            None => 0,
            Some(other) => {
                return Err(NodeError::InvalidData {
                    expected: "int",
                    found: other.kind_name(),
                })
            }
        };
        self.value = value;
        if let Some(pin) = self.core.output_mut(0) {
            pin.set_data(Some(PinValue::Int(value)))?;
        }
        Ok(())
    }
}

impl Node for ConstNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

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

/// Flow in, nothing out.
#[derive(Clone)]
pub struct SinkNode {
    core: NodeCore,
    pub runs: usize,
}

impl SinkNode {
    pub fn new(id: NodeId) -> Self {
        let mut core = NodeCore::new(id, "Sink");
        core.add_input("in", PinType::Flow);
        Self { core, runs: 0 }
    }
}

impl Node for SinkNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn evaluate(&mut self, _flow_pin: PinId, _ctx: &NodeContext) -> Result<bool, NodeError> {
        self.runs += 1;
        Ok(false)
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

pub fn test_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry.register_fn("Start", NodeMetadata::new("Test event source", "test"), |id| {
        Box::new(StartNode::new(id))
    });
    registry.register_fn("Relay", NodeMetadata::default(), |id| Box::new(RelayNode::new(id)));
    registry.register_fn("Const", NodeMetadata::default(), |id| Box::new(ConstNode::new(id)));
    registry.register_fn("Sink", NodeMetadata::default(), |id| Box::new(SinkNode::new(id)));
    registry
}

pub fn test_graph() -> Graph {
    Graph::new(Arc::new(test_registry()))
}

pub fn output(graph: &Graph, node: NodeId, index: usize) -> PinId {
    graph.find_node(node).unwrap().core().output(index).unwrap().id()
}

pub fn input(graph: &Graph, node: NodeId, index: usize) -> PinId {
    graph.find_node(node).unwrap().core().input(index).unwrap().id()
}
