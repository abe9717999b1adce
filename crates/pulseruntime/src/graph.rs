use crate::config::GraphConfig;
use crate::registry::NodeRegistry;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use pulsecore::{
    EngineError, EventBus, ExecutionEvent, GraphError, Link, LinkId, Node, NodeId, Pin, PinId,
    PinKind, PinValue,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Owns every node and link of a blueprint and runs pulses through them.
///
/// Nodes and links live in a stable arena; everything else refers to them by
/// id. A link can only be created between pins that exist in this graph, and
/// removing a node removes its links with it.
pub struct Graph {
    pub(crate) graph: StableDiGraph<Box<dyn Node>, Link>,
    pub(crate) nodes: HashMap<NodeId, NodeIndex>,
    pub(crate) links: HashMap<LinkId, EdgeIndex>,
    pin_owner: HashMap<PinId, NodeId>,
    // Incident links per pin, oldest first.
    pin_links: HashMap<PinId, Vec<LinkId>>,
    registry: Arc<NodeRegistry>,
    pub(crate) events: Arc<EventBus>,
    pub(crate) config: GraphConfig,
}

/// The editor-facing name for a graph.
pub type NodeProcessor = Graph;

impl Graph {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self::with_config(registry, GraphConfig::default())
    }

    pub fn with_config(registry: Arc<NodeRegistry>, config: GraphConfig) -> Self {
        let events = Arc::new(EventBus::new(config.event_buffer_size));
        Self {
            graph: StableDiGraph::new(),
            nodes: HashMap::new(),
            links: HashMap::new(),
            pin_owner: HashMap::new(),
            pin_links: HashMap::new(),
            registry,
            events,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Subscribe to execution events
    pub fn subscribe_events(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.events.subscribe()
    }

    /// Build a node through the registry and insert it under `id`.
    pub fn create_node(&mut self, node_type: &str, id: NodeId) -> Result<NodeId, GraphError> {
        if self.nodes.contains_key(&id) {
            tracing::error!("Cannot create {} node: id {} already in use", node_type, id);
            return Err(GraphError::DuplicateNode(id));
        }
        let node = self.registry.create_node(node_type, id).map_err(|e| {
            tracing::error!("Failed to create node {}: {}", id, e);
            e
        })?;
        self.add_node(node)
    }

    /// Create a node of `node_type` under a fresh id.
    pub fn spawn_node(&mut self, node_type: &str) -> Result<NodeId, GraphError> {
        self.create_node(node_type, NodeId::new())
    }

    /// Take ownership of a pre-built node.
    pub fn add_node(&mut self, node: Box<dyn Node>) -> Result<NodeId, GraphError> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        if let Some(pin) = node
            .core()
            .pins()
            .find(|p| self.pin_owner.contains_key(&p.id()))
        {
            return Err(GraphError::DuplicatePin(pin.id()));
        }

        for pin in node.core().pins() {
            self.pin_owner.insert(pin.id(), id);
        }

        tracing::debug!("Added {} node {}", node.node_type(), id);
        let index = self.graph.add_node(node);
        self.nodes.insert(id, index);
        Ok(id)
    }

    pub fn find_node(&self, id: NodeId) -> Option<&dyn Node> {
        let index = *self.nodes.get(&id)?;
        let node = self.graph.node_weight(index)?;
        Some(&**node)
    }

    pub fn find_node_mut(&mut self, id: NodeId) -> Option<&mut dyn Node> {
        let index = *self.nodes.get(&id)?;
        let node = self.graph.node_weight_mut(index)?;
        Some(&mut **node)
    }

    /// Downcast a node to its concrete type.
    pub fn node_as<T: Node + 'static>(&self, id: NodeId) -> Option<&T> {
        self.find_node(id)?.as_any().downcast_ref::<T>()
    }

    pub fn node_as_mut<T: Node + 'static>(&mut self, id: NodeId) -> Option<&mut T> {
        self.find_node_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in arena order.
    ///
    /// Slots freed by [`Graph::remove_node`] are reused, so after a removal this
    /// is not insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &dyn Node> {
        self.graph.node_weights().map(|n| &**n)
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.graph.node_weights().map(|n| n.id()).collect()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.graph.edge_weights()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_link(&self, id: LinkId) -> Option<&Link> {
        let index = *self.links.get(&id)?;
        self.graph.edge_weight(index)
    }

    /// Resolve a pin id anywhere in the graph.
    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        let owner = self.pin_owner_of(id)?;
        self.find_node(owner)?.core().pin(id)
    }

    pub(crate) fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        let owner = self.pin_owner_of(id)?;
        self.find_node_mut(owner)?.core_mut().pin_mut(id)
    }

    fn pin_owner_of(&self, id: PinId) -> Option<NodeId> {
        if let Some(owner) = self.pin_owner.get(&id) {
            return Some(*owner);
        }
        // Pins added to a node after it joined the graph are not indexed yet.
        self.nodes()
            .find(|n| n.core().pin(id).is_some())
            .map(|n| n.id())
    }

    /// Links touching `pin`, oldest first. Empty for unknown pins.
    pub fn pin_links(&self, pin: PinId) -> &[LinkId] {
        self.pin_links.get(&pin).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_pin_linked(&self, pin: PinId) -> bool {
        !self.pin_links(pin).is_empty()
    }

    /// Output pin a link starts from
    pub fn link_start(&self, id: LinkId) -> Option<&Pin> {
        let link = self.find_link(id)?;
        self.pin(link.start())
    }

    /// Input pin a link ends at
    pub fn link_end(&self, id: LinkId) -> Option<&Pin> {
        let link = self.find_link(id)?;
        self.pin(link.end())
    }

    /// Connect an output pin to an input pin.
    ///
    /// Validation happens before anything is touched, so a rejected link leaves
    /// both pins exactly as they were.
    pub fn create_link(&mut self, id: LinkId, start: PinId, end: PinId) -> Result<LinkId, GraphError> {
        if self.links.contains_key(&id) {
            return Err(GraphError::DuplicateLink(id));
        }
        let start_pin = self.pin(start).ok_or(GraphError::PinNotFound(start))?;
        let end_pin = self.pin(end).ok_or(GraphError::PinNotFound(end))?;

        if start_pin.kind() != PinKind::Output || end_pin.kind() != PinKind::Input {
            tracing::warn!("Rejected link {} -> {}: wrong direction", start, end);
            return Err(GraphError::InvalidDirection { start, end });
        }
        if !start_pin.pin_type().is_compatible_with(end_pin.pin_type()) {
            tracing::warn!(
                "Rejected link {} ({}) -> {} ({})",
                start,
                start_pin.pin_type(),
                end,
                end_pin.pin_type()
            );
            return Err(GraphError::IncompatiblePins {
                start,
                start_type: start_pin.pin_type(),
                end,
                end_type: end_pin.pin_type(),
            });
        }
        if self
            .links()
            .any(|l| l.start() == start && l.end() == end)
        {
            return Err(GraphError::AlreadyLinked { start, end });
        }

        let start_node = start_pin.node_id();
        let end_node = end_pin.node_id();
        let (Some(&from), Some(&to)) = (self.nodes.get(&start_node), self.nodes.get(&end_node))
        else {
            return Err(GraphError::NodeNotFound(start_node));
        };

        let link = Link::new(id, start_node, start, end_node, end);
        let edge = self.graph.add_edge(from, to, link);
        self.links.insert(id, edge);
        self.pin_owner.insert(start, start_node);
        self.pin_owner.insert(end, end_node);
        self.pin_links.entry(start).or_default().push(id);
        self.pin_links.entry(end).or_default().push(id);

        tracing::debug!("Linked {} -> {} as {}", start, end, id);
        Ok(id)
    }

    /// Connect two pins under a fresh link id.
    pub fn connect(&mut self, start: PinId, end: PinId) -> Result<LinkId, GraphError> {
        self.create_link(LinkId::new(), start, end)
    }

    pub fn remove_link(&mut self, id: LinkId) -> Result<Link, GraphError> {
        let edge = self.links.remove(&id).ok_or(GraphError::LinkNotFound(id))?;
        let link = self
            .graph
            .remove_edge(edge)
            .ok_or(GraphError::LinkNotFound(id))?;
        for pin in [link.start(), link.end()] {
            if let Some(links) = self.pin_links.get_mut(&pin) {
                links.retain(|l| *l != id);
                if links.is_empty() {
                    self.pin_links.remove(&pin);
                }
            }
        }
        tracing::debug!("Removed link {}", id);
        Ok(link)
    }

    fn incident_links(&self, index: NodeIndex) -> Vec<LinkId> {
        let mut ids: Vec<LinkId> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .chain(self.graph.edges_directed(index, Direction::Incoming))
            .map(|e| e.weight().id())
            .collect();
        // Self links show up in both directions.
        ids.sort();
        ids.dedup();
        ids
    }

    /// Remove every link touching `node`, keeping the node. Returns how many went.
    pub fn break_links(&mut self, node: NodeId) -> Result<usize, GraphError> {
        let index = *self.nodes.get(&node).ok_or(GraphError::NodeNotFound(node))?;
        let incident = self.incident_links(index);
        for id in &incident {
            self.remove_link(*id)?;
        }
        Ok(incident.len())
    }

    /// Remove a node together with all of its links.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Box<dyn Node>, GraphError> {
        self.break_links(id)?;
        let index = self.nodes.remove(&id).ok_or(GraphError::NodeNotFound(id))?;
        let node = self
            .graph
            .remove_node(index)
            .ok_or(GraphError::NodeNotFound(id))?;
        for pin in node.core().pins() {
            self.pin_owner.remove(&pin.id());
        }
        tracing::debug!("Removed {} node {}", node.node_type(), id);
        Ok(node)
    }

    /// Drop every node and link.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.nodes.clear();
        self.links.clear();
        self.pin_owner.clear();
        self.pin_links.clear();
    }

    /// Write a value into a pin, as an editor would.
    pub fn set_pin_data(&mut self, pin: PinId, data: Option<PinValue>) -> Result<(), EngineError> {
        let target = self.pin_mut(pin).ok_or(GraphError::PinNotFound(pin))?;
        target.set_data(data)?;
        Ok(())
    }

    pub fn set_node_data(&mut self, node: NodeId, data: Option<PinValue>) -> Result<(), EngineError> {
        let target = self.find_node_mut(node).ok_or(GraphError::NodeNotFound(node))?;
        let data_node = target.as_data_mut().ok_or(GraphError::NotDataNode(node))?;
        data_node.set_data(data)?;
        Ok(())
    }

    pub fn node_data(&self, node: NodeId) -> Option<PinValue> {
        self.find_node(node)?.as_data()?.data()
    }

    /// Disarm every pin of every node.
    pub fn reset_flow(&mut self) {
        for node in self.graph.node_weights_mut() {
            node.reset_flow();
        }
    }

    /// Deep copy of this graph sharing the registry.
    ///
    /// Node ids, pin ids and link ids are preserved; object state is cloned, so
    /// running the copy never touches this graph.
    pub fn duplicate(&self) -> Graph {
        let mut copy = Graph::with_config(self.registry.clone(), self.config.clone());
        for node in self.nodes() {
            if let Err(e) = copy.add_node(node.clone_node()) {
                tracing::warn!("Skipping node {} while duplicating: {}", node.id(), e);
            }
        }
        for link in self.links() {
            if let Err(e) = copy.create_link(link.id(), link.start(), link.end()) {
                tracing::warn!("Skipping link {} while duplicating: {}", link.id(), e);
            }
        }
        copy
    }

    /// Groups of nodes that can keep passing a pulse around forever.
    ///
    /// Only flow links count. Each group is reported once; a node linked to
    /// itself is a group of one.
    pub fn flow_cycles(&self) -> Vec<Vec<NodeId>> {
        let mut flow: DiGraphMap<NodeId, ()> = DiGraphMap::new();
        for id in self.nodes.keys() {
            flow.add_node(*id);
        }
        for link in self.links() {
            let is_flow = self
                .pin(link.start())
                .is_some_and(|p| p.pin_type().is_flow());
            if is_flow {
                flow.add_edge(link.start_node(), link.end_node(), ());
            }
        }

        tarjan_scc(&flow)
            .into_iter()
            .filter(|scc| scc.len() > 1 || flow.contains_edge(scc[0], scc[0]))
            .map(|mut scc| {
                scc.sort();
                scc
            })
            .collect()
    }
}
