use pulsecore::reflect::{HostObject, MethodDispatcher, PropertyGetter, TypeBindings, TypeInfo};
use pulsecore::{
    Color, Node, NodeContext, NodeCore, NodeError, NodeId, PinId, PinType, PinValue, ReflectError,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

const REFLECTED_COLOR: Color = Color::rgb(210, 210, 210);

/// Generic node wrapping one host object described by a reflection provider.
///
/// Pins are laid out once at construction: one output per property, then per
/// method a flow input named after the method followed by `param_<index>`
/// inputs, and finally a `then` flow output.
pub struct ReflectedNode {
    core: NodeCore,
    type_info: TypeInfo,
    bindings: TypeBindings,
    object: Box<dyn HostObject>,
    property_pins: Vec<(String, PinId)>,
    getters: Vec<(PinId, Arc<dyn PropertyGetter>)>,
    method_pins: HashMap<PinId, String>,
    param_pins: HashMap<String, Vec<PinId>>,
    dispatchers: HashMap<String, Arc<dyn MethodDispatcher>>,
    then_pin: PinId,
}

impl ReflectedNode {
    pub fn new(id: NodeId, type_info: TypeInfo, bindings: TypeBindings) -> Self {
        let object = bindings.instantiate();
        Self::with_object(id, type_info, bindings, object)
    }

    /// Wrap an existing instance instead of a freshly constructed one.
    pub fn with_object(
        id: NodeId,
        type_info: TypeInfo,
        bindings: TypeBindings,
        object: Box<dyn HostObject>,
    ) -> Self {
        let mut core = NodeCore::new(id, type_info.name.clone()).with_color(REFLECTED_COLOR);

        let mut property_pins = Vec::new();
        let mut getters = Vec::new();
        for property in type_info.properties() {
            let pin = core.add_output(
                property.name.clone(),
                PinType::from_type_name(&property.type_name),
            );
            property_pins.push((property.name.clone(), pin));
            if let Some(getter) = bindings.getter(&property.name) {
                getters.push((pin, getter));
            }
        }

        let mut method_pins = HashMap::new();
        let mut param_pins = HashMap::new();
        let mut dispatchers = HashMap::new();
        for method in type_info.methods() {
            let flow = core.add_input(method.name.clone(), PinType::Flow);
            method_pins.insert(flow, method.name.clone());

            let mut params = Vec::with_capacity(method.parameters.len());
            for param in &method.parameters {
                let pin_type = PinType::from_type_name(&param.type_name);
                let pin = core.add_input(format!("param_{}", param.index), pin_type);
                if let Some(input) = core.pin_mut(pin) {
                    let initial = match &param.default {
                        Some(value) if pin_type.accepts(value) => Some(value.clone()),
                        _ => None,
                    };
                    // Declared default, or empty so an unconnected argument is detectable.
                    let _ = input.set_data(initial);
                }
                params.push(pin);
            }
            param_pins.insert(method.name.clone(), params);

            if let Some(dispatcher) = bindings.dispatcher(&method.name) {
                dispatchers.insert(method.name.clone(), dispatcher);
            }
        }

        let then_pin = core.add_output("then", PinType::Flow);

        Self {
            core,
            type_info,
            bindings,
            object,
            property_pins,
            getters,
            method_pins,
            param_pins,
            dispatchers,
            then_pin,
        }
    }

    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    pub fn object(&self) -> &dyn HostObject {
        self.object.as_ref()
    }

    pub fn object_mut(&mut self) -> &mut dyn HostObject {
        self.object.as_mut()
    }

    pub fn then_pin(&self) -> PinId {
        self.then_pin
    }

    pub fn property_pin(&self, name: &str) -> Option<PinId> {
        self.property_pins
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, pin)| *pin)
    }

    /// Flow input that invokes `method`
    pub fn method_pin(&self, method: &str) -> Option<PinId> {
        self.method_pins
            .iter()
            .find(|(_, name)| name.as_str() == method)
            .map(|(pin, _)| *pin)
    }

    pub fn param_pins(&self, method: &str) -> Option<&[PinId]> {
        self.param_pins.get(method).map(Vec::as_slice)
    }

    /// Read a property straight from the wrapped object.
    pub fn property(&self, name: &str) -> Result<PinValue, ReflectError> {
        let getter = self
            .bindings
            .getter(name)
            .ok_or_else(|| ReflectError::UnknownProperty(name.to_string()))?;
        getter.get(self.object.as_ref())
    }

    /// Write a property on the wrapped object. Pins catch up on the next evaluate.
    pub fn set_property(&mut self, name: &str, value: PinValue) -> Result<(), ReflectError> {
        if self.type_info.property(name).is_none() {
            return Err(ReflectError::UnknownProperty(name.to_string()));
        }
        let setter = self
            .bindings
            .setter(name)
            .ok_or_else(|| ReflectError::ReadOnly(name.to_string()))?;
        setter.set(self.object.as_mut(), value)
    }

    fn refresh_properties(&mut self) -> Result<(), NodeError> {
        for (pin, getter) in &self.getters {
            let value = getter.get(self.object.as_ref())?;
            if let Some(output) = self.core.pin_mut(*pin) {
                output.set_data(Some(value))?;
            }
        }
        Ok(())
    }

    fn gather_arguments(&self, method: &str) -> Result<Vec<PinValue>, NodeError> {
        let pins = self.param_pins.get(method).map(Vec::as_slice).unwrap_or(&[]);
        pins.iter()
            .enumerate()
            .map(|(index, pin)| {
                self.core
                    .pin(*pin)
                    .and_then(|p| p.data())
                    .cloned()
                    .ok_or_else(|| NodeError::MissingArgument {
                        method: method.to_string(),
                        index,
                    })
            })
            .collect()
    }
}

impl Clone for ReflectedNode {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            type_info: self.type_info.clone(),
            bindings: self.bindings.clone(),
            object: self.object.clone_object(),
            property_pins: self.property_pins.clone(),
            getters: self.getters.clone(),
            method_pins: self.method_pins.clone(),
            param_pins: self.param_pins.clone(),
            dispatchers: self.dispatchers.clone(),
            then_pin: self.then_pin,
        }
    }
}

impl Node for ReflectedNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn evaluate(&mut self, flow_pin: PinId, _ctx: &NodeContext) -> Result<bool, NodeError> {
        // Outputs show the state from before the call.
        self.refresh_properties()?;

        let method = self
            .method_pins
            .get(&flow_pin)
            .cloned()
            .ok_or(NodeError::UnknownFlowPin {
                node: self.core.id(),
                pin: flow_pin,
            })?;

        let args = self.gather_arguments(&method)?;

        let dispatcher = self
            .dispatchers
            .get(&method)
            .cloned()
            .ok_or_else(|| NodeError::MissingDispatcher {
                method: method.clone(),
            })?;

        tracing::debug!("Calling {}::{}", self.type_info.name, method);
        dispatcher.dispatch(self.object.as_mut(), &args)?;

        if let Some(then) = self.core.pin_mut(self.then_pin) {
            then.arm();
        }
        Ok(true)
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
