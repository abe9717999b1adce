use crate::reflected::ReflectedNode;
use pulsecore::reflect::ReflectionProvider;
use pulsecore::{GraphError, Node, NodeError, NodeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Factory trait for creating node instances
pub trait NodeFactory: Send + Sync {
    /// Create a new node carrying `id`. Pin ids derive from it.
    fn create(&self, id: NodeId) -> Result<Box<dyn Node>, NodeError>;

    /// Get node type identifier
    fn node_type(&self) -> &str;

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::default()
    }
}

/// Metadata about a node type
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub description: String,
    pub category: String,
}

impl NodeMetadata {
    pub fn new(description: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            category: category.into(),
        }
    }
}

impl Default for NodeMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            category: "general".to_string(),
        }
    }
}

/// [`NodeFactory`] backed by a plain constructor function
pub struct FnNodeFactory<F> {
    node_type: String,
    metadata: NodeMetadata,
    build: F,
}

impl<F> FnNodeFactory<F>
where
    F: Fn(NodeId) -> Box<dyn Node> + Send + Sync,
{
    pub fn new(node_type: impl Into<String>, metadata: NodeMetadata, build: F) -> Self {
        Self {
            node_type: node_type.into(),
            metadata,
            build,
        }
    }
}

impl<F> NodeFactory for FnNodeFactory<F>
where
    F: Fn(NodeId) -> Box<dyn Node> + Send + Sync,
{
    fn create(&self, id: NodeId) -> Result<Box<dyn Node>, NodeError> {
        Ok((self.build)(id))
    }

    fn node_type(&self) -> &str {
        &self.node_type
    }

    fn metadata(&self) -> NodeMetadata {
        self.metadata.clone()
    }
}

/// Registry of available node types
///
/// Hardcoded kinds are looked up first; any other name is offered to the
/// reflection provider, if one is attached.
pub struct NodeRegistry {
    factories: HashMap<String, Arc<dyn NodeFactory>>,
    reflection: Option<Arc<dyn ReflectionProvider>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            reflection: None,
        }
    }

    pub fn with_reflection(provider: Arc<dyn ReflectionProvider>) -> Self {
        Self {
            factories: HashMap::new(),
            reflection: Some(provider),
        }
    }

    pub fn set_reflection(&mut self, provider: Arc<dyn ReflectionProvider>) {
        self.reflection = Some(provider);
    }

    pub fn reflection(&self) -> Option<&Arc<dyn ReflectionProvider>> {
        self.reflection.as_ref()
    }

    /// Register a node factory
    pub fn register(&mut self, factory: Arc<dyn NodeFactory>) {
        let node_type = factory.node_type().to_string();
        tracing::info!("Registering node type: {}", node_type);
        self.factories.insert(node_type, factory);
    }

    pub fn register_fn<F>(&mut self, node_type: &str, metadata: NodeMetadata, build: F)
    where
        F: Fn(NodeId) -> Box<dyn Node> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnNodeFactory::new(node_type, metadata, build)));
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.factories.contains_key(node_type)
            || self
                .reflection
                .as_ref()
                .is_some_and(|r| r.type_info_for(node_type).is_some())
    }

    /// Create a node instance of `node_type` carrying `id`
    pub fn create_node(&self, node_type: &str, id: NodeId) -> Result<Box<dyn Node>, GraphError> {
        if let Some(factory) = self.factories.get(node_type) {
            return factory.create(id).map_err(|reason| GraphError::NodeCreation {
                node_type: node_type.to_string(),
                reason,
            });
        }

        let reflection = self
            .reflection
            .as_ref()
            .ok_or_else(|| GraphError::UnknownNodeType(node_type.to_string()))?;
        match (reflection.type_info_for(node_type), reflection.bind(node_type)) {
            (Some(info), Some(bindings)) => Ok(Box::new(ReflectedNode::new(id, info, bindings))),
            _ => Err(GraphError::UnknownNodeType(node_type.to_string())),
        }
    }

    /// Get all registered node types, reflected ones included
    pub fn list_node_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        if let Some(reflection) = &self.reflection {
            for name in reflection.type_names() {
                if !self.factories.contains_key(&name) {
                    types.push(name);
                }
            }
        }
        types.sort();
        types
    }

    /// Get metadata for a node type
    pub fn get_metadata(&self, node_type: &str) -> Option<NodeMetadata> {
        if let Some(factory) = self.factories.get(node_type) {
            return Some(factory.metadata());
        }
        let info = self.reflection.as_ref()?.type_info_for(node_type)?;
        Some(NodeMetadata::new(
            format!(
                "Reflected {} ({} properties, {} methods)",
                info.name,
                info.properties.len(),
                info.methods.len()
            ),
            "reflected",
        ))
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
