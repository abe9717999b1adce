// crates/pulseruntime/tests/reflected_test.rs

mod common;

use common::{input, output};
use pulsecore::reflect::{Param, ReflectionRegistry, TypeBuilder, TypeRegistration};
use pulsecore::{GraphError, NodeError, NodeId, PinId, PinType, PinValue, ReflectError};
use pulseruntime::{Graph, NodeRegistry, ReflectedNode};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct Slider {
    x: f32,
}

fn slider_type() -> TypeRegistration {
    TypeBuilder::new("Slider", Slider::default)
        .property_rw("x", |s: &Slider| s.x, |s: &mut Slider, v: f32| s.x = v)
        .method("move", &[Param::of::<f32>(), Param::of::<f32>()], |s, args| {
            s.x += args.float(0)? * args.float(1)?;
            Ok(())
        })
        .method("nudge", &[Param::with_default(0.5f32)], |s, args| {
            s.x += args.float(0)?;
            Ok(())
        })
        .build()
}

fn reflected_graph() -> Graph {
    let mut reflection = ReflectionRegistry::new();
    reflection.register(slider_type());
    let mut registry = NodeRegistry::with_reflection(Arc::new(reflection));
    registry.register_fn("Start", Default::default(), |id| Box::new(common::StartNode::new(id)));
    Graph::new(Arc::new(registry))
}

fn slider<'a>(graph: &'a Graph, id: NodeId) -> &'a ReflectedNode {
    graph.node_as::<ReflectedNode>(id).unwrap()
}

#[test]
fn test_pins_follow_type_info() {
    let mut graph = reflected_graph();
    let id = graph.spawn_node("Slider").unwrap();
    let node = graph.find_node(id).unwrap();
    let core = node.core();

    assert_eq!(node.node_type(), "Slider");
    let outputs: Vec<(&str, PinType)> = core.outputs().iter().map(|p| (p.label(), p.pin_type())).collect();
    assert_eq!(outputs, vec![("x", PinType::Float), ("then", PinType::Flow)]);

    let inputs: Vec<(&str, PinType)> = core.inputs().iter().map(|p| (p.label(), p.pin_type())).collect();
    assert_eq!(
        inputs,
        vec![
            ("move", PinType::Flow),
            ("param_0", PinType::Float),
            ("param_1", PinType::Float),
            ("nudge", PinType::Flow),
            ("param_0", PinType::Float),
        ]
    );

    let reflected = slider(&graph, id);
    assert_eq!(reflected.param_pins("move").unwrap().len(), 2);
    assert_eq!(reflected.method_pin("nudge"), Some(core.input(3).unwrap().id()));
}

#[test]
fn test_unconnected_argument_is_rejected() {
    common::init_tracing();
    let mut graph = reflected_graph();
    let id = graph.spawn_node("Slider").unwrap();
    let move_pin = input(&graph, id, 0);

    let report = graph.trigger(id, move_pin).unwrap();
    assert_eq!(
        report.failed,
        vec![(
            id,
            NodeError::MissingArgument {
                method: "move".into(),
                index: 0,
            }
        )]
    );
    assert_eq!(slider(&graph, id).property("x").unwrap(), PinValue::Float(0.0));
    assert!(!graph.pin(output(&graph, id, 1)).unwrap().can_flow());
}

#[test]
fn test_declared_default_fills_parameter() {
    let mut graph = reflected_graph();
    let id = graph.spawn_node("Slider").unwrap();
    let nudge = slider(&graph, id).method_pin("nudge").unwrap();

    let report = graph.trigger(id, nudge).unwrap();
    assert!(report.is_success());
    assert_eq!(slider(&graph, id).property("x").unwrap(), PinValue::Float(0.5));
    assert!(graph.pin(slider(&graph, id).then_pin()).unwrap().can_flow());
}

#[test]
fn test_property_pins_lag_one_evaluation() {
    let mut graph = reflected_graph();
    let id = graph.spawn_node("Slider").unwrap();
    let move_pin = input(&graph, id, 0);
    let x_pin = output(&graph, id, 0);

    graph.set_pin_data(input(&graph, id, 1), Some(PinValue::Float(2.0))).unwrap();
    graph.set_pin_data(input(&graph, id, 2), Some(PinValue::Float(3.0))).unwrap();

    graph.trigger(id, move_pin).unwrap();
    assert_eq!(slider(&graph, id).property("x").unwrap(), PinValue::Float(6.0));
    // Read before the call.
    assert_eq!(graph.pin(x_pin).unwrap().data(), Some(&PinValue::Float(0.0)));

    graph.trigger(id, move_pin).unwrap();
    assert_eq!(graph.pin(x_pin).unwrap().data(), Some(&PinValue::Float(6.0)));
    assert_eq!(slider(&graph, id).property("x").unwrap(), PinValue::Float(12.0));
}

#[test]
fn test_unknown_flow_pin_is_an_error() {
    let mut graph = reflected_graph();
    let id = graph.spawn_node("Slider").unwrap();

    let report = graph.trigger(id, PinId::EVENT).unwrap();
    assert!(matches!(
        report.failed.as_slice(),
        [(node, NodeError::UnknownFlowPin { .. })] if *node == id
    ));
}

#[test]
fn test_missing_dispatcher_is_an_error() {
    let mut registration = slider_type();
    registration.info.methods.push(pulsecore::reflect::MethodInfo {
        name: "spin".into(),
        parameters: Vec::new(),
    });
    let node_id = NodeId::new();
    let mut node = ReflectedNode::new(node_id, registration.info, registration.bindings);
    let spin = node.method_pin("spin").unwrap();

    let mut graph = reflected_graph();
    graph.add_node(Box::new(node.clone())).unwrap();
    let report = graph.trigger(node_id, spin).unwrap();
    assert_eq!(
        report.failed,
        vec![(node_id, NodeError::MissingDispatcher { method: "spin".into() })]
    );

    node.set_property("x", PinValue::Float(1.0)).unwrap();
    assert_eq!(node.property("x").unwrap(), PinValue::Float(1.0));
}

#[test]
fn test_property_editing() {
    let mut graph = reflected_graph();
    let id = graph.spawn_node("Slider").unwrap();
    let node = graph.node_as_mut::<ReflectedNode>(id).unwrap();

    node.set_property("x", PinValue::Float(4.0)).unwrap();
    assert_eq!(node.property("x").unwrap(), PinValue::Float(4.0));
    assert_eq!(
        node.set_property("y", PinValue::Float(1.0)),
        Err(ReflectError::UnknownProperty("y".into()))
    );
    assert!(matches!(
        node.set_property("x", PinValue::Int(1)),
        Err(ReflectError::PropertyType { .. })
    ));
}

#[test]
fn test_duplicate_clones_object_state() {
    let mut graph = reflected_graph();
    let id = graph.spawn_node("Slider").unwrap();
    graph
        .node_as_mut::<ReflectedNode>(id)
        .unwrap()
        .set_property("x", PinValue::Float(1.0))
        .unwrap();

    let mut copy = graph.duplicate();
    let nudge = slider(&copy, id).method_pin("nudge").unwrap();
    copy.trigger(id, nudge).unwrap();

    assert_eq!(slider(&copy, id).property("x").unwrap(), PinValue::Float(1.5));
    assert_eq!(slider(&graph, id).property("x").unwrap(), PinValue::Float(1.0));
}

#[test]
fn test_unknown_reflected_type() {
    let mut graph = reflected_graph();
    assert_eq!(
        graph.spawn_node("Knob"),
        Err(GraphError::UnknownNodeType("Knob".into()))
    );
    assert!(graph.registry().list_node_types().contains(&"Slider".to_string()));
    assert_eq!(graph.registry().get_metadata("Slider").unwrap().category, "reflected");
}
