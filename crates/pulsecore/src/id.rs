use crate::PinKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Random 64 bits taken from a v4 UUID.
fn random_u64() -> u64 {
    Uuid::new_v4().as_u64_pair().0
}

// splitmix64 finalizer
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn raw(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:016x}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a node, unique within a graph.
    NodeId
);
id_type!(
    /// Identifier of a link, unique within a graph.
    LinkId
);
id_type!(
    /// Identifier of a pin.
    ///
    /// Derived from the owning node id and the pin's position, so a node rebuilt
    /// by its factory under the same id gets the same pin ids back.
    PinId
);

impl NodeId {
    pub fn new() -> Self {
        Self(random_u64())
    }
}

impl LinkId {
    pub fn new() -> Self {
        Self(random_u64())
    }
}

impl PinId {
    /// Flow pin id passed to `evaluate` when a node runs from its own event entry point.
    pub const EVENT: PinId = PinId(0);

    pub fn derive(node: NodeId, kind: PinKind, index: usize) -> Self {
        let salt = match kind {
            PinKind::Input => 1,
            PinKind::Output => 2,
        };
        Self(mix(node.0 ^ mix(((index as u64) << 2) | salt)))
    }
}
