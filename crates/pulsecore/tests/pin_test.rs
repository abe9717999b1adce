// crates/pulsecore/tests/pin_test.rs

use pulsecore::{
    EntityRef, NodeCore, NodeId, Pin, PinError, PinId, PinKind, PinSubType, PinType, PinValue,
};

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

#[test]
fn test_data_pins_start_with_type_default() {
    let node = NodeId::new();
    let float = Pin::new(PinId::derive(node, PinKind::Input, 0), node, "x", PinType::Float, PinKind::Input);
    let text = Pin::new(PinId::derive(node, PinKind::Input, 1), node, "s", PinType::String, PinKind::Input);
    let flow = Pin::new(PinId::derive(node, PinKind::Input, 2), node, "in", PinType::Flow, PinKind::Input);
    let object = Pin::new(PinId::derive(node, PinKind::Input, 3), node, "o", PinType::Object, PinKind::Input);

    assert_eq!(float.data(), Some(&PinValue::Float(0.0)));
    assert_eq!(text.data(), Some(&PinValue::String(String::new())));
    assert_eq!(flow.data(), None);
    assert_eq!(object.data(), None);
}

#[test]
fn test_mismatched_write_is_dropped() {
    init_tracing();

    let node = NodeId::new();
    let id = PinId::derive(node, PinKind::Input, 0);
    let mut pin = Pin::new(id, node, "flag", PinType::Bool, PinKind::Input);

    let err = pin.set_data(Some(PinValue::from("yes"))).unwrap_err();
    assert_eq!(
        err,
        PinError::TypeMismatch {
            pin: id,
            expected: PinType::Bool,
            found: "string",
        }
    );
    assert_eq!(pin.data(), Some(&PinValue::Bool(false)));

    pin.set_data(Some(PinValue::Bool(true))).unwrap();
    assert_eq!(pin.data(), Some(&PinValue::Bool(true)));

    pin.set_data(None).unwrap();
    assert_eq!(pin.data(), None);
}

#[test]
fn test_flow_pin_rejects_payload() {
    init_tracing();

    let node = NodeId::new();
    let id = PinId::derive(node, PinKind::Output, 0);
    let mut pin = Pin::new(id, node, "out", PinType::Flow, PinKind::Output);

    assert_eq!(pin.set_data(Some(PinValue::Int(1))), Err(PinError::FlowPayload(id)));
    assert!(pin.data().is_none());
}

#[test]
fn test_object_pins_accept_entities() {
    let node = NodeId::new();
    let mut pin = Pin::new(PinId::derive(node, PinKind::Input, 0), node, "target", PinType::Object, PinKind::Input);

    pin.set_data(Some(EntityRef::new(42).into())).unwrap();
    assert_eq!(pin.data().and_then(|v| v.as_entity()).map(|e| e.id), Some(42));
    assert!(pin.set_data(Some(PinValue::Float(1.0))).is_err());
}

#[test]
fn test_arm_only_affects_flow_pins() {
    let node = NodeId::new();
    let mut flow = Pin::new(PinId::derive(node, PinKind::Output, 0), node, "out", PinType::Flow, PinKind::Output);
    let mut data = Pin::new(PinId::derive(node, PinKind::Output, 1), node, "value", PinType::Int, PinKind::Output);

    flow.arm();
    data.arm();
    assert!(flow.can_flow());
    assert!(!data.can_flow());

    flow.disarm();
    flow.disarm();
    assert!(!flow.can_flow());
}

#[test]
fn test_subtype_is_metadata_only() {
    let node = NodeId::new();
    let mut pin = Pin::new(PinId::derive(node, PinKind::Output, 0), node, "actor", PinType::Object, PinKind::Output);
    assert_eq!(pin.subtype(), PinSubType::None);

    pin.set_subtype(PinSubType::Camera);
    assert_eq!(pin.subtype(), PinSubType::Camera);
    assert_eq!(pin.pin_type(), PinType::Object);
}

#[test]
fn test_pin_ids_are_reproducible() {
    let id = NodeId::new();
    let build = || {
        let mut core = NodeCore::new(id, "Test");
        core.add_input("in", PinType::Flow);
        core.add_input("value", PinType::Int);
        core.add_output("out", PinType::Flow);
        core
    };

    let a = build();
    let b = build();
    let ids = |c: &NodeCore| c.pins().map(|p| p.id()).collect::<Vec<_>>();
    assert_eq!(ids(&a), ids(&b));

    // Inputs and outputs at the same index never collide.
    assert_ne!(a.input(0).unwrap().id(), a.output(0).unwrap().id());

    let mut other = NodeCore::new(NodeId::new(), "Test");
    other.add_input("in", PinType::Flow);
    assert_ne!(other.input(0).unwrap().id(), a.input(0).unwrap().id());
}

#[test]
fn test_reset_flow_disarms_everything() {
    let mut core = NodeCore::new(NodeId::new(), "Test");
    core.add_input("in", PinType::Flow);
    core.add_output("then", PinType::Flow);
    core.add_output("else", PinType::Flow);

    assert!(core.arm_outputs());
    assert_eq!(core.armed_outputs().count(), 2);

    core.reset_flow();
    assert_eq!(core.armed_outputs().count(), 0);
    core.reset_flow();
    assert_eq!(core.armed_outputs().count(), 0);
}

#[test]
fn test_type_name_mapping() {
    assert_eq!(PinType::from_type_name("float"), PinType::Float);
    assert_eq!(PinType::from_type_name("f32"), PinType::Float);
    assert_eq!(PinType::from_type_name("long long"), PinType::Int);
    assert_eq!(PinType::from_type_name("i32"), PinType::Int);
    assert_eq!(PinType::from_type_name("bool"), PinType::Bool);
    assert_eq!(PinType::from_type_name("std::string"), PinType::String);
    assert_eq!(PinType::from_type_name("String"), PinType::String);
    assert_eq!(PinType::from_type_name("Actor"), PinType::Object);
}
