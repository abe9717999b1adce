//! Reflection interface used to expose host objects as graph nodes.
//!
//! A [`ReflectionProvider`] answers two questions for a type name: what the
//! type looks like ([`TypeInfo`]) and how to touch an instance of it
//! ([`TypeBindings`]). The engine never sees concrete host types.

use crate::{EntityRef, PinValue, ReflectError};
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    pub index: usize,
    pub type_name: String,
    /// Value the parameter pin starts with
    pub default: Option<PinValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub name: String,
    pub parameters: Vec<ParameterInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub name: String,
    pub properties: Vec<PropertyInfo>,
    pub methods: Vec<MethodInfo>,
}

impl TypeInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn properties(&self) -> &[PropertyInfo] {
        &self.properties
    }

    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A host object instance wrapped by a reflected node
pub trait HostObject: Any + Send {
    fn clone_object(&self) -> Box<dyn HostObject>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Send + Clone> HostObject for T {
    fn clone_object(&self) -> Box<dyn HostObject> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub trait PropertyGetter: Send + Sync {
    fn get(&self, object: &dyn HostObject) -> Result<PinValue, ReflectError>;
}

pub trait PropertySetter: Send + Sync {
    fn set(&self, object: &mut dyn HostObject, value: PinValue) -> Result<(), ReflectError>;
}

pub trait MethodDispatcher: Send + Sync {
    fn dispatch(&self, object: &mut dyn HostObject, args: &[PinValue]) -> Result<(), ReflectError>;
}

impl<F> PropertyGetter for F
where
    F: Fn(&dyn HostObject) -> Result<PinValue, ReflectError> + Send + Sync,
{
    fn get(&self, object: &dyn HostObject) -> Result<PinValue, ReflectError> {
        self(object)
    }
}

impl<F> PropertySetter for F
where
    F: Fn(&mut dyn HostObject, PinValue) -> Result<(), ReflectError> + Send + Sync,
{
    fn set(&self, object: &mut dyn HostObject, value: PinValue) -> Result<(), ReflectError> {
        self(object, value)
    }
}

impl<F> MethodDispatcher for F
where
    F: Fn(&mut dyn HostObject, &[PinValue]) -> Result<(), ReflectError> + Send + Sync,
{
    fn dispatch(&self, object: &mut dyn HostObject, args: &[PinValue]) -> Result<(), ReflectError> {
        self(object, args)
    }
}

type Instantiate = dyn Fn() -> Box<dyn HostObject> + Send + Sync;

/// Accessors and constructor for one reflected type
#[derive(Clone)]
pub struct TypeBindings {
    instantiate: Arc<Instantiate>,
    getters: HashMap<String, Arc<dyn PropertyGetter>>,
    setters: HashMap<String, Arc<dyn PropertySetter>>,
    dispatchers: HashMap<String, Arc<dyn MethodDispatcher>>,
}

impl TypeBindings {
    pub fn new(instantiate: impl Fn() -> Box<dyn HostObject> + Send + Sync + 'static) -> Self {
        Self {
            instantiate: Arc::new(instantiate),
            getters: HashMap::new(),
            setters: HashMap::new(),
            dispatchers: HashMap::new(),
        }
    }

    pub fn with_getter(mut self, name: impl Into<String>, getter: impl PropertyGetter + 'static) -> Self {
        self.getters.insert(name.into(), Arc::new(getter));
        self
    }

    pub fn with_setter(mut self, name: impl Into<String>, setter: impl PropertySetter + 'static) -> Self {
        self.setters.insert(name.into(), Arc::new(setter));
        self
    }

    pub fn with_dispatcher(
        mut self,
        name: impl Into<String>,
        dispatcher: impl MethodDispatcher + 'static,
    ) -> Self {
        self.dispatchers.insert(name.into(), Arc::new(dispatcher));
        self
    }

    pub fn instantiate(&self) -> Box<dyn HostObject> {
        (self.instantiate)()
    }

    pub fn getter(&self, property: &str) -> Option<Arc<dyn PropertyGetter>> {
        self.getters.get(property).cloned()
    }

    pub fn setter(&self, property: &str) -> Option<Arc<dyn PropertySetter>> {
        self.setters.get(property).cloned()
    }

    pub fn dispatcher(&self, method: &str) -> Option<Arc<dyn MethodDispatcher>> {
        self.dispatchers.get(method).cloned()
    }
}

impl std::fmt::Debug for TypeBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeBindings")
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .field("setters", &self.setters.keys().collect::<Vec<_>>())
            .field("dispatchers", &self.dispatchers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// External source of type metadata and accessors
pub trait ReflectionProvider: Send + Sync {
    fn type_info_for(&self, name: &str) -> Option<TypeInfo>;

    fn bind(&self, name: &str) -> Option<TypeBindings>;

    fn type_names(&self) -> Vec<String>;
}

/// Metadata plus bindings, as produced by [`TypeBuilder`]
#[derive(Debug, Clone)]
pub struct TypeRegistration {
    pub info: TypeInfo,
    pub bindings: TypeBindings,
}

/// In-memory [`ReflectionProvider`]
#[derive(Default)]
pub struct ReflectionRegistry {
    types: HashMap<String, TypeRegistration>,
}

impl ReflectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, registration: TypeRegistration) {
        tracing::info!("Registering reflected type: {}", registration.info.name);
        self.types.insert(registration.info.name.clone(), registration);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }
}

impl ReflectionProvider for ReflectionRegistry {
    fn type_info_for(&self, name: &str) -> Option<TypeInfo> {
        self.types.get(name).map(|r| r.info.clone())
    }

    fn bind(&self, name: &str) -> Option<TypeBindings> {
        self.types.get(name).map(|r| r.bindings.clone())
    }

    fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Rust values that can cross the reflection boundary
pub trait ReflectValue: Sized {
    const TYPE_NAME: &'static str;

    fn into_value(self) -> PinValue;

    fn from_value(value: &PinValue) -> Option<Self>;
}

impl ReflectValue for f32 {
    const TYPE_NAME: &'static str = "float";

    fn into_value(self) -> PinValue {
        PinValue::Float(self)
    }

    fn from_value(value: &PinValue) -> Option<Self> {
        value.as_float()
    }
}

impl ReflectValue for i32 {
    const TYPE_NAME: &'static str = "int";

    fn into_value(self) -> PinValue {
        PinValue::Int(self)
    }

    fn from_value(value: &PinValue) -> Option<Self> {
        value.as_int()
    }
}

impl ReflectValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn into_value(self) -> PinValue {
        PinValue::Bool(self)
    }

    fn from_value(value: &PinValue) -> Option<Self> {
        value.as_bool()
    }
}

impl ReflectValue for String {
    const TYPE_NAME: &'static str = "string";

    fn into_value(self) -> PinValue {
        PinValue::String(self)
    }

    fn from_value(value: &PinValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl ReflectValue for EntityRef {
    const TYPE_NAME: &'static str = "object";

    fn into_value(self) -> PinValue {
        PinValue::Entity(self)
    }

    fn from_value(value: &PinValue) -> Option<Self> {
        value.as_entity().cloned()
    }
}

/// Method parameter declaration for [`TypeBuilder::method`]
#[derive(Debug, Clone)]
pub struct Param {
    type_name: &'static str,
    default: Option<PinValue>,
}

impl Param {
    pub fn of<V: ReflectValue>() -> Self {
        Self {
            type_name: V::TYPE_NAME,
            default: None,
        }
    }

    pub fn with_default<V: ReflectValue>(value: V) -> Self {
        Self {
            type_name: V::TYPE_NAME,
            default: Some(value.into_value()),
        }
    }
}

/// Typed view over the arguments handed to a dispatcher
pub struct Args<'a> {
    values: &'a [PinValue],
}

impl<'a> Args<'a> {
    pub fn new(values: &'a [PinValue]) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get<V: ReflectValue>(&self, index: usize) -> Result<V, ReflectError> {
        let value = self.values.get(index).ok_or(ReflectError::ArgumentCount {
            expected: index + 1,
            found: self.values.len(),
        })?;
        V::from_value(value).ok_or(ReflectError::ArgumentType {
            index,
            expected: V::TYPE_NAME,
            found: value.kind_name(),
        })
    }

    pub fn float(&self, index: usize) -> Result<f32, ReflectError> {
        self.get(index)
    }

    pub fn int(&self, index: usize) -> Result<i32, ReflectError> {
        self.get(index)
    }

    pub fn bool(&self, index: usize) -> Result<bool, ReflectError> {
        self.get(index)
    }

    pub fn string(&self, index: usize) -> Result<String, ReflectError> {
        self.get(index)
    }

    pub fn entity(&self, index: usize) -> Result<EntityRef, ReflectError> {
        self.get(index)
    }
}

/// Builds a [`TypeRegistration`] for a concrete Rust type.
///
/// ```ignore
/// let reg = TypeBuilder::new("Counter", Counter::default)
///     .property("count", |c: &Counter| c.count)
///     .method("add", &[Param::of::<i32>()], |c, args| {
///         c.count += args.int(0)?;
///         Ok(())
///     })
///     .build();
/// ```
pub struct TypeBuilder<T> {
    info: TypeInfo,
    bindings: TypeBindings,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Clone> TypeBuilder<T> {
    pub fn new(name: impl Into<String>, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            info: TypeInfo::new(name),
            bindings: TypeBindings::new(move || Box::new(factory()) as Box<dyn HostObject>),
            _marker: PhantomData,
        }
    }

    fn wrong_instance(&self) -> ReflectError {
        ReflectError::WrongInstance {
            expected: self.info.name.clone(),
        }
    }

    /// Read-only property
    pub fn property<V, G>(mut self, name: &str, get: G) -> Self
    where
        V: ReflectValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        let err = self.wrong_instance();
        self.info.properties.push(PropertyInfo {
            name: name.to_string(),
            type_name: V::TYPE_NAME.to_string(),
        });
        self.bindings = self.bindings.with_getter(name, move |object: &dyn HostObject| {
            object
                .as_any()
                .downcast_ref::<T>()
                .map(|t| get(t).into_value())
                .ok_or_else(|| err.clone())
        });
        self
    }

    /// Property with both a getter and a setter
    pub fn property_rw<V, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        V: ReflectValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let mut this = self.property(name, get);
        let err = this.wrong_instance();
        let property = name.to_string();
        this.bindings = this.bindings.with_setter(
            name,
            move |object: &mut dyn HostObject, value: PinValue| {
                let target = object
                    .as_any_mut()
                    .downcast_mut::<T>()
                    .ok_or_else(|| err.clone())?;
                let value = V::from_value(&value).ok_or_else(|| ReflectError::PropertyType {
                    name: property.clone(),
                    expected: V::TYPE_NAME,
                    found: value.kind_name(),
                })?;
                set(target, value);
                Ok(())
            },
        );
        this
    }

    pub fn method<F>(mut self, name: &str, params: &[Param], call: F) -> Self
    where
        F: Fn(&mut T, &Args<'_>) -> Result<(), ReflectError> + Send + Sync + 'static,
    {
        let parameters: Vec<ParameterInfo> = params
            .iter()
            .enumerate()
            .map(|(index, p)| ParameterInfo {
                index,
                type_name: p.type_name.to_string(),
                default: p.default.clone(),
            })
            .collect();
        let arity = parameters.len();
        self.info.methods.push(MethodInfo {
            name: name.to_string(),
            parameters,
        });

        let err = self.wrong_instance();
        self.bindings = self.bindings.with_dispatcher(
            name,
            move |object: &mut dyn HostObject, args: &[PinValue]| {
                if args.len() != arity {
                    return Err(ReflectError::ArgumentCount {
                        expected: arity,
                        found: args.len(),
                    });
                }
                let target = object
                    .as_any_mut()
                    .downcast_mut::<T>()
                    .ok_or_else(|| err.clone())?;
                call(target, &Args::new(args))
            },
        );
        self
    }

    pub fn build(self) -> TypeRegistration {
        TypeRegistration {
            info: self.info,
            bindings: self.bindings,
        }
    }
}
