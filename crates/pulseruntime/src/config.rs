use serde::{Deserialize, Serialize};

/// Configuration for a graph instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Upper bound on node evaluations in a single pulse
    pub max_pulse_steps: usize,
    pub event_buffer_size: usize,
}

impl GraphConfig {
    pub fn with_max_pulse_steps(mut self, steps: usize) -> Self {
        self.max_pulse_steps = steps.max(1);
        self
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size.max(1);
        self
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_pulse_steps: 10_000,
            event_buffer_size: 1000,
        }
    }
}
