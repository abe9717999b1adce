//! Standard node library
//!
//! Key press/release event nodes, a string literal, a print node and the
//! reflected `Transform` type.

mod debug;
mod input;
mod literal;
mod transform;

pub use debug::{PrintNode, PrintNodeFactory};
pub use input::{KeyPressNode, KeyPressNodeFactory, KeyReleaseNode, KeyReleaseNodeFactory};
pub use literal::{StringNode, StringNodeFactory};
pub use transform::{builtin_reflection, Transform};
use pulseruntime::NodeRegistry;

use std::sync::Arc;

/// Register all standard nodes with a registry
pub fn register_all(registry: &mut NodeRegistry) {
    registry.register(Arc::new(input::KeyPressNodeFactory));
    registry.register(Arc::new(input::KeyReleaseNodeFactory));
    registry.register(Arc::new(literal::StringNodeFactory));
    registry.register(Arc::new(debug::PrintNodeFactory));
}

/// Registry with every standard node plus the built-in reflected types
pub fn standard_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::with_reflection(Arc::new(builtin_reflection()));
    register_all(&mut registry);
    registry
}
