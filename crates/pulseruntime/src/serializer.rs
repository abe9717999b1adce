//! Binary blueprint codec.
//!
//! A buffer is the 4 byte magic `PBLU` followed by the bincode encoding of a
//! [`Blueprint`]. Loading decodes the whole buffer before the target graph is
//! touched, so a malformed buffer leaves the graph as it was.

use crate::graph::Graph;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use pulsecore::{
    Blueprint, BlueprintLink, BlueprintNode, BlueprintPin, GraphError, LinkId, NodeId, PinId,
    PinValue, SerializeError, CURRENT_VERSION, MAGIC,
};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// Upper bound on a decoded blueprint, so a corrupt length prefix cannot allocate without limit.
const DECODE_LIMIT: usize = 64 * 1024 * 1024;

/// What a load kept and what it had to drop
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub nodes_loaded: usize,
    /// Types that were not registered, one entry per skipped node
    pub skipped_types: Vec<String>,
    /// Nodes whose id was already taken by an earlier node in the blueprint
    pub duplicate_nodes: Vec<NodeId>,
    /// Nodes of a known type whose factory failed
    pub failed_nodes: Vec<NodeId>,
    pub links_loaded: usize,
    pub links_dropped: usize,
}

/// Capture a graph as plain blueprint data.
pub fn to_blueprint(graph: &Graph) -> Blueprint {
    let mut blueprint = Blueprint::new();
    blueprint.nodes = graph.nodes().map(BlueprintNode::from_node).collect();
    blueprint.links = graph.links().map(BlueprintLink::from).collect();
    blueprint
}

pub fn encode_blueprint(blueprint: &Blueprint) -> Result<Vec<u8>, SerializeError> {
    let body = encode_to_vec(blueprint, standard())
        .map_err(|e| SerializeError::Encode(e.to_string()))?;
    let mut bytes = Vec::with_capacity(MAGIC.len() + body.len());
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

pub fn decode_blueprint(bytes: &[u8]) -> Result<Blueprint, SerializeError> {
    let body = bytes.strip_prefix(&MAGIC[..]).ok_or(SerializeError::BadMagic)?;
    let (blueprint, read): (Blueprint, usize) =
        decode_from_slice(body, standard().with_limit::<DECODE_LIMIT>())
            .map_err(|e| SerializeError::Decode(e.to_string()))?;
    if read != body.len() {
        return Err(SerializeError::Decode(format!(
            "{} trailing bytes after blueprint",
            body.len() - read
        )));
    }
    if blueprint.version > CURRENT_VERSION {
        return Err(SerializeError::UnsupportedVersion {
            found: blueprint.version,
            supported: CURRENT_VERSION,
        });
    }
    Ok(blueprint)
}

/// Serialize a graph to bytes.
pub fn save(graph: &Graph) -> Result<Vec<u8>, SerializeError> {
    encode_blueprint(&to_blueprint(graph))
}

/// Replace the contents of `graph` with the blueprint in `bytes`.
pub fn load(graph: &mut Graph, bytes: &[u8]) -> Result<LoadReport, SerializeError> {
    let blueprint = decode_blueprint(bytes)?;
    Ok(apply_blueprint(graph, &blueprint))
}

pub fn save_to_file(graph: &Graph, path: impl AsRef<Path>) -> Result<(), SerializeError> {
    let bytes = save(graph)?;
    fs::write(path.as_ref(), bytes)?;
    tracing::info!("Saved blueprint to {}", path.as_ref().display());
    Ok(())
}

pub fn load_from_file(graph: &mut Graph, path: impl AsRef<Path>) -> Result<LoadReport, SerializeError> {
    let bytes = fs::read(path.as_ref())?;
    let report = load(graph, &bytes)?;
    tracing::info!("Loaded blueprint from {}", path.as_ref().display());
    Ok(report)
}

/// Clear `graph` and rebuild it from an already decoded blueprint.
///
/// Unknown node types are skipped, links whose endpoints did not survive are
/// dropped. Neither is an error.
pub fn apply_blueprint(graph: &mut Graph, blueprint: &Blueprint) -> LoadReport {
    let mut report = LoadReport::default();
    graph.clear();

    // Persisted pin id -> pin id on the rebuilt node.
    let mut pin_map: HashMap<u64, PinId> = HashMap::new();

    for saved in &blueprint.nodes {
        let id = NodeId(saved.id);
        if let Err(e) = graph.create_node(&saved.node_type, id) {
            tracing::warn!("Skipping node {} of type '{}': {}", id, saved.node_type, e);
            match e {
                GraphError::UnknownNodeType(node_type) => report.skipped_types.push(node_type),
                GraphError::DuplicateNode(id) => report.duplicate_nodes.push(id),
                _ => report.failed_nodes.push(id),
            }
            continue;
        }
        let Some(node) = graph.find_node_mut(id) else {
            continue;
        };

        node.core_mut().set_position(saved.position);
        if let Some(data_node) = node.as_data_mut() {
            if let Err(e) = data_node.set_data(saved.data.clone().map(PinValue::from)) {
                tracing::warn!("Dropping stored data of node {}: {}", id, e);
            }
        }

        let kinds = [&saved.inputs, &saved.outputs];
        for pins in kinds {
            for (position, saved_pin) in pins.iter().enumerate() {
                restore_pin(node.core_mut(), position, saved_pin, &mut pin_map);
            }
        }
        report.nodes_loaded += 1;
    }

    for saved in &blueprint.links {
        let (Some(start), Some(end)) = (pin_map.get(&saved.start_pin), pin_map.get(&saved.end_pin))
        else {
            tracing::warn!("Dropping link {}: an endpoint was not restored", LinkId(saved.id));
            report.links_dropped += 1;
            continue;
        };
        match graph.create_link(LinkId(saved.id), *start, *end) {
            Ok(_) => report.links_loaded += 1,
            Err(e) => {
                tracing::warn!("Dropping link {}: {}", LinkId(saved.id), e);
                report.links_dropped += 1;
            }
        }
    }

    tracing::info!(
        "Loaded {} nodes and {} links ({} nodes skipped, {} links dropped)",
        report.nodes_loaded,
        report.links_loaded,
        report.skipped_types.len() + report.duplicate_nodes.len() + report.failed_nodes.len(),
        report.links_dropped
    );
    report
}

fn restore_pin(
    core: &mut pulsecore::NodeCore,
    position: usize,
    saved: &BlueprintPin,
    pin_map: &mut HashMap<u64, PinId>,
) {
    let by_id = core
        .pin(PinId(saved.id))
        .filter(|p| p.kind() == saved.kind)
        .map(|p| p.id());
    let Some(pin_id) = by_id.or_else(|| core.pin_at(saved.kind, position).map(|p| p.id())) else {
        tracing::warn!("Pin {} has no counterpart on node {}", PinId(saved.id), core.id());
        return;
    };
    pin_map.insert(saved.id, pin_id);

    let Some(pin) = core.pin_mut(pin_id) else {
        return;
    };
    pin.set_subtype(saved.subtype);
    if pin.pin_type() != saved.pin_type {
        tracing::warn!("Pin {} changed type; keeping its default value", pin_id);
        return;
    }
    if pin.pin_type().is_data() {
        if let Err(e) = pin.set_data(saved.data.clone().map(PinValue::from)) {
            tracing::warn!("Dropping stored value of pin {}: {}", pin_id, e);
        }
    }
}
