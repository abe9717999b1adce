use crate::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

pub type PulseId = Uuid;

/// Events emitted while a pulse travels through a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExecutionEvent {
    PulseStarted {
        pulse_id: PulseId,
        source: NodeId,
        timestamp: DateTime<Utc>,
    },
    NodeEvaluated {
        pulse_id: PulseId,
        node_id: NodeId,
        node_type: String,
        armed: bool,
        timestamp: DateTime<Utc>,
    },
    NodeFailed {
        pulse_id: PulseId,
        node_id: NodeId,
        error: String,
        timestamp: DateTime<Utc>,
    },
    NodeMessage {
        pulse_id: PulseId,
        node_id: NodeId,
        event: NodeEvent,
        timestamp: DateTime<Utc>,
    },
    PulseCompleted {
        pulse_id: PulseId,
        evaluated: usize,
        truncated: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl ExecutionEvent {
    pub fn pulse_id(&self) -> PulseId {
        match self {
            ExecutionEvent::PulseStarted { pulse_id, .. }
            | ExecutionEvent::NodeEvaluated { pulse_id, .. }
            | ExecutionEvent::NodeFailed { pulse_id, .. }
            | ExecutionEvent::NodeMessage { pulse_id, .. }
            | ExecutionEvent::PulseCompleted { pulse_id, .. } => *pulse_id,
        }
    }
}

/// Events raised by a node from inside `evaluate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum NodeEvent {
    Info { message: String },
    Warning { message: String },
    Print { text: String },
}

/// Event emitter handed to nodes through their evaluation context
#[derive(Clone)]
pub struct EventEmitter {
    pulse_id: PulseId,
    node_id: NodeId,
    sender: broadcast::Sender<ExecutionEvent>,
}

impl EventEmitter {
    pub fn new(pulse_id: PulseId, node_id: NodeId, sender: broadcast::Sender<ExecutionEvent>) -> Self {
        Self {
            pulse_id,
            node_id,
            sender,
        }
    }

    pub fn emit(&self, event: NodeEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(ExecutionEvent::NodeMessage {
            pulse_id: self.pulse_id,
            node_id: self.node_id,
            event,
            timestamp: Utc::now(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(NodeEvent::Info {
            message: message.into(),
        });
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(NodeEvent::Warning {
            message: message.into(),
        });
    }

    pub fn print(&self, text: impl Into<String>) {
        self.emit(NodeEvent::Print { text: text.into() });
    }
}

/// Broadcast bus shared by a graph and its observers
pub struct EventBus {
    sender: broadcast::Sender<ExecutionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: ExecutionEvent) {
        let _ = self.sender.send(event);
    }

    pub fn create_emitter(&self, pulse_id: PulseId, node_id: NodeId) -> EventEmitter {
        EventEmitter::new(pulse_id, node_id, self.sender.clone())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}
