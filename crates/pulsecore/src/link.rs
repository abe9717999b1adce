use crate::{LinkId, NodeId, PinId};

/// Edge from one output pin to one input pin.
///
/// Holds ids only; the graph resolves them to pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    id: LinkId,
    start_node: NodeId,
    start_pin: PinId,
    end_node: NodeId,
    end_pin: PinId,
}

impl Link {
    pub fn new(
        id: LinkId,
        start_node: NodeId,
        start_pin: PinId,
        end_node: NodeId,
        end_pin: PinId,
    ) -> Self {
        Self {
            id,
            start_node,
            start_pin,
            end_node,
            end_pin,
        }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    /// Output pin the link starts from
    pub fn start(&self) -> PinId {
        self.start_pin
    }

    /// Input pin the link ends at
    pub fn end(&self) -> PinId {
        self.end_pin
    }

    pub fn start_node(&self) -> NodeId {
        self.start_node
    }

    pub fn end_node(&self) -> NodeId {
        self.end_node
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.start_node == node || self.end_node == node
    }
}
