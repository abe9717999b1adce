// crates/pulseruntime/tests/serializer_test.rs

mod common;

use common::{input, output, test_graph, test_registry};
use pulsecore::{
    Blueprint, BlueprintLink, BlueprintNode, LinkId, NodeId, PinKind, PinSubType, PinValue,
    Position, SerializeError, CURRENT_VERSION,
};
use pulseruntime::{serializer, Graph, NodeRegistry};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Comparable fingerprint of a graph: ids, types, positions, pin values, links.
fn fingerprint(graph: &Graph) -> (BTreeSet<String>, BTreeSet<(LinkId, u64, u64)>) {
    let nodes = graph
        .nodes()
        .map(|n| {
            let pins: Vec<String> = n
                .core()
                .pins()
                .map(|p| format!("{}:{:?}", p.id(), p.data()))
                .collect();
            format!(
                "{} {} {:?} {:?} [{}]",
                n.id(),
                n.node_type(),
                n.core().position(),
                n.as_data().and_then(|d| d.data()),
                pins.join(",")
            )
        })
        .collect();
    let links = graph
        .links()
        .map(|l| (l.id(), l.start().raw(), l.end().raw()))
        .collect();
    (nodes, links)
}

fn sample_graph() -> Graph {
    let mut graph = test_graph();
    let start = graph.spawn_node("Start").unwrap();
    let relay = graph.spawn_node("Relay").unwrap();
    let value = graph.spawn_node("Const").unwrap();
    graph.set_node_data(value, Some(PinValue::Int(42))).unwrap();
    graph
        .find_node_mut(relay)
        .unwrap()
        .core_mut()
        .set_position(Position::new(120, -40));
    graph.connect(output(&graph, start, 0), input(&graph, relay, 0)).unwrap();
    graph.connect(output(&graph, value, 0), input(&graph, relay, 1)).unwrap();
    graph
}

#[test]
fn test_round_trip_preserves_graph() {
    common::init_tracing();
    let graph = sample_graph();
    let bytes = serializer::save(&graph).unwrap();
    assert_eq!(&bytes[..4], b"PBLU");

    let mut restored = test_graph();
    let report = serializer::load(&mut restored, &bytes).unwrap();
    assert_eq!(report.nodes_loaded, 3);
    assert_eq!(report.links_loaded, 2);
    assert!(report.skipped_types.is_empty());
    assert_eq!(report.links_dropped, 0);

    assert_eq!(fingerprint(&restored), fingerprint(&graph));
}

#[test]
fn test_load_replaces_existing_contents() {
    let graph = sample_graph();
    let bytes = serializer::save(&graph).unwrap();

    let mut target = test_graph();
    let leftover = target.spawn_node("Sink").unwrap();
    serializer::load(&mut target, &bytes).unwrap();

    assert!(!target.contains_node(leftover));
    assert_eq!(target.node_count(), 3);
}

#[test]
fn test_unknown_types_are_skipped() {
    common::init_tracing();
    let graph = sample_graph();
    let bytes = serializer::save(&graph).unwrap();

    // Same blueprint, but "Const" is no longer registered.
    let mut registry = NodeRegistry::new();
    registry.register_fn("Start", Default::default(), |id| Box::new(common::StartNode::new(id)));
    registry.register_fn("Relay", Default::default(), |id| Box::new(common::RelayNode::new(id)));
    let mut restored = Graph::new(Arc::new(registry));

    let report = serializer::load(&mut restored, &bytes).unwrap();
    assert_eq!(report.nodes_loaded, 2);
    assert_eq!(report.skipped_types, vec!["Const".to_string()]);
    assert_eq!(report.links_loaded, 1);
    assert_eq!(report.links_dropped, 1);
    assert_eq!(restored.link_count(), 1);
}

#[test]
fn test_duplicate_node_ids_are_reported_apart() {
    let graph = sample_graph();
    let mut blueprint = serializer::to_blueprint(&graph);
    let relay = blueprint
        .nodes
        .iter()
        .find(|n| n.node_type == "Relay")
        .cloned()
        .unwrap();
    blueprint.nodes.push(relay.clone());

    let mut restored = test_graph();
    let report = serializer::apply_blueprint(&mut restored, &blueprint);
    assert_eq!(report.nodes_loaded, 3);
    assert!(report.skipped_types.is_empty());
    assert_eq!(report.duplicate_nodes, vec![NodeId(relay.id)]);
    assert!(report.failed_nodes.is_empty());
    assert_eq!(restored.node_count(), 3);
}

#[test]
fn test_pin_subtype_survives_round_trip() {
    let mut graph = sample_graph();
    let relay = graph
        .nodes()
        .find(|n| n.node_type() == "Relay")
        .map(|n| n.id())
        .unwrap();
    let pin = input(&graph, relay, 1);
    graph
        .find_node_mut(relay)
        .unwrap()
        .core_mut()
        .pin_mut(pin)
        .unwrap()
        .set_subtype(PinSubType::Actor);

    let bytes = serializer::save(&graph).unwrap();
    let mut restored = test_graph();
    serializer::load(&mut restored, &bytes).unwrap();

    assert_eq!(restored.pin(pin).unwrap().subtype(), PinSubType::Actor);
    assert_eq!(restored.pin(input(&restored, relay, 0)).unwrap().subtype(), PinSubType::None);
}

#[test]
fn test_malformed_input_leaves_graph_unchanged() {
    common::init_tracing();
    let graph = sample_graph();
    let bytes = serializer::save(&graph).unwrap();

    let mut target = sample_graph();
    let before = fingerprint(&target);

    let truncated = &bytes[..bytes.len() / 2];
    assert!(matches!(
        serializer::load(&mut target, truncated),
        Err(SerializeError::Decode(_))
    ));

    let mut garbage = bytes.clone();
    garbage[0] = b'X';
    assert!(matches!(
        serializer::load(&mut target, &garbage),
        Err(SerializeError::BadMagic)
    ));

    let mut trailing = bytes.clone();
    trailing.push(0);
    assert!(matches!(
        serializer::load(&mut target, &trailing),
        Err(SerializeError::Decode(_))
    ));

    assert!(serializer::load(&mut target, &[]).is_err());
    assert_eq!(fingerprint(&target), before);
}

#[test]
fn test_newer_version_is_rejected() {
    let mut blueprint = Blueprint::new();
    blueprint.version = CURRENT_VERSION + 1;
    let bytes = serializer::encode_blueprint(&blueprint).unwrap();

    let mut graph = test_graph();
    assert!(matches!(
        serializer::load(&mut graph, &bytes),
        Err(SerializeError::UnsupportedVersion { found, .. }) if found == CURRENT_VERSION + 1
    ));
}

#[test]
fn test_pins_fall_back_to_position() {
    let mut graph = Graph::new(Arc::new(test_registry()));

    let start = graph.spawn_node("Start").unwrap();
    let relay = graph.spawn_node("Relay").unwrap();
    graph.connect(output(&graph, start, 0), input(&graph, relay, 0)).unwrap();
    let mut blueprint = serializer::to_blueprint(&graph);

    // Pin ids written by some other tool: only positions line up.
    let node: &mut BlueprintNode = blueprint.nodes.iter_mut().find(|n| n.id == relay.raw()).unwrap();
    for pin in node.inputs.iter_mut().chain(node.outputs.iter_mut()) {
        pin.id ^= 0xdead_beef;
    }
    let link: &mut BlueprintLink = &mut blueprint.links[0];
    link.end_pin ^= 0xdead_beef;

    let report = serializer::apply_blueprint(&mut graph, &blueprint);
    assert_eq!(report.links_loaded, 1);
    let link = graph.links().next().unwrap();
    assert_eq!(link.end(), input(&graph, relay, 0));
    assert_eq!(graph.pin(link.end()).unwrap().kind(), PinKind::Input);
}

#[test]
fn test_file_helpers() {
    let graph = sample_graph();
    let path = std::env::temp_dir().join(format!("pulse-{}.pblu", NodeId::new()));

    serializer::save_to_file(&graph, &path).unwrap();
    let mut restored = test_graph();
    serializer::load_from_file(&mut restored, &path).unwrap();
    assert_eq!(fingerprint(&restored), fingerprint(&graph));

    std::fs::remove_file(&path).unwrap();
    assert!(matches!(
        serializer::load_from_file(&mut restored, &path),
        Err(SerializeError::Io(_))
    ));
    assert_eq!(restored.node_count(), 3);
}
