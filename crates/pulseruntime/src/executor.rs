use crate::graph::Graph;
use chrono::Utc;
use petgraph::stable_graph::NodeIndex;
use pulsecore::{
    ExecutionEvent, GraphError, HostEvent, NodeContext, NodeError, NodeId, PinId, PinValue, PulseId,
};
use std::time::Instant;

/// Outcome of one top-level pulse
#[derive(Debug, Clone)]
pub struct PulseReport {
    pub pulse_id: PulseId,
    pub source: NodeId,
    /// Nodes that ran, in evaluation order. A node reached twice appears twice.
    pub evaluated: Vec<NodeId>,
    pub failed: Vec<(NodeId, NodeError)>,
    pub steps: usize,
    /// Set when the step limit stopped the pulse early
    pub truncated: bool,
}

impl PulseReport {
    fn new(pulse_id: PulseId, source: NodeId) -> Self {
        Self {
            pulse_id,
            source,
            evaluated: Vec::new(),
            failed: Vec::new(),
            steps: 0,
            truncated: false,
        }
    }

    /// True when the source node reacted at all.
    pub fn fired(&self) -> bool {
        !self.evaluated.is_empty() || !self.failed.is_empty()
    }

    pub fn was_evaluated(&self, node: NodeId) -> bool {
        self.evaluated.contains(&node)
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.truncated
    }
}

#[derive(Clone, Copy)]
enum Entry<'e> {
    Event(&'e HostEvent),
    Flow(PinId),
}

impl Graph {
    /// Deliver a host event to one node's event entry point and run the pulse it starts.
    ///
    /// An event the node ignores starts no pulse: nothing is published and every
    /// pin keeps its state.
    pub fn fire(&mut self, node: NodeId, event: &HostEvent) -> Result<PulseReport, GraphError> {
        self.run_pulse(node, Entry::Event(event))
    }

    /// Evaluate `node` as if `flow_pin` had fired, then propagate.
    pub fn trigger(&mut self, node: NodeId, flow_pin: PinId) -> Result<PulseReport, GraphError> {
        self.run_pulse(node, Entry::Flow(flow_pin))
    }

    /// Offer a host event to every node, one pulse per node that reacts.
    pub fn dispatch(&mut self, event: &HostEvent) -> Vec<PulseReport> {
        let mut reports = Vec::new();
        for id in self.node_ids() {
            match self.fire(id, event) {
                Ok(report) if report.fired() => reports.push(report),
                Ok(_) => {}
                Err(e) => tracing::warn!("Failed to deliver event to {}: {}", id, e),
            }
        }
        reports
    }

    fn run_pulse(&mut self, source: NodeId, entry: Entry<'_>) -> Result<PulseReport, GraphError> {
        let index = *self
            .nodes
            .get(&source)
            .ok_or(GraphError::NodeNotFound(source))?;

        let pulse_id = PulseId::new_v4();
        let started = Instant::now();
        let mut report = PulseReport::new(pulse_id, source);

        let continues = match entry {
            Entry::Event(event) => {
                // The source is asked first; an ignored event is not a pulse and
                // leaves every pin as it was.
                let stale = self.take_flow(index);
                let Some((node_id, result)) = self.invoke(index, Entry::Event(event), pulse_id) else {
                    return Ok(report);
                };
                if matches!(result, Ok(false)) {
                    self.restore_flow(index, &stale);
                    return Ok(report);
                }
                self.begin_pulse(pulse_id, source, Some(index));
                report.steps += 1;
                self.record(index, node_id, result, &mut report)
            }
            Entry::Flow(pin) => {
                self.begin_pulse(pulse_id, source, None);
                report.steps += 1;
                match self.invoke(index, Entry::Flow(pin), pulse_id) {
                    Some((node_id, result)) => self.record(index, node_id, result, &mut report),
                    None => false,
                }
            }
        };

        // Depth-first over an explicit stack of (node, flow input) pairs.
        let mut pending: Vec<(NodeIndex, PinId)> = Vec::new();
        if continues {
            self.schedule_downstream(index, &mut pending);
        }

        while let Some((index, pin)) = pending.pop() {
            if report.steps >= self.config.max_pulse_steps {
                tracing::warn!(
                    "Pulse {} stopped after {} steps; the graph likely loops",
                    pulse_id,
                    report.steps
                );
                report.truncated = true;
                break;
            }
            report.steps += 1;
            let Some((node_id, result)) = self.invoke(index, Entry::Flow(pin), pulse_id) else {
                continue;
            };
            if self.record(index, node_id, result, &mut report) {
                self.schedule_downstream(index, &mut pending);
            }
        }

        self.events.emit(ExecutionEvent::PulseCompleted {
            pulse_id,
            evaluated: report.evaluated.len(),
            truncated: report.truncated,
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });
        tracing::debug!(
            "Pulse {} finished: {} evaluated, {} failed",
            pulse_id,
            report.evaluated.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Disarm every node except `keep` and announce the pulse.
    fn begin_pulse(&mut self, pulse_id: PulseId, source: NodeId, keep: Option<NodeIndex>) {
        let indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        for index in indices {
            if Some(index) == keep {
                continue;
            }
            if let Some(node) = self.graph.node_weight_mut(index) {
                node.reset_flow();
            }
        }
        self.events.emit(ExecutionEvent::PulseStarted {
            pulse_id,
            source,
            timestamp: Utc::now(),
        });
        tracing::debug!("Pulse {} started at {}", pulse_id, source);
    }

    /// Disarm one node, returning the output pins that were armed.
    fn take_flow(&mut self, index: NodeIndex) -> Vec<PinId> {
        let Some(node) = self.graph.node_weight_mut(index) else {
            return Vec::new();
        };
        let armed = node.core().armed_outputs().map(|p| p.id()).collect();
        node.reset_flow();
        armed
    }

    fn restore_flow(&mut self, index: NodeIndex, armed: &[PinId]) {
        let Some(node) = self.graph.node_weight_mut(index) else {
            return;
        };
        node.reset_flow();
        for pin in armed {
            if let Some(pin) = node.core_mut().pin_mut(*pin) {
                pin.arm();
            }
        }
    }

    /// Pull a node's data inputs and run one of its entry points.
    fn invoke(
        &mut self,
        index: NodeIndex,
        entry: Entry<'_>,
        pulse_id: PulseId,
    ) -> Option<(NodeId, Result<bool, NodeError>)> {
        self.pull_inputs(index);

        let node = self.graph.node_weight_mut(index)?;
        let node_id = node.id();
        let ctx = NodeContext::new(node_id, pulse_id, self.events.create_emitter(pulse_id, node_id));

        let result = match entry {
            Entry::Event(event) => node.handle_event(event, &ctx),
            Entry::Flow(pin) => node.evaluate(pin, &ctx),
        };
        Some((node_id, result))
    }

    /// Book one evaluation into the report. Returns whether the pulse continues past it.
    fn record(
        &self,
        index: NodeIndex,
        node_id: NodeId,
        result: Result<bool, NodeError>,
        report: &mut PulseReport,
    ) -> bool {
        let pulse_id = report.pulse_id;
        match result {
            Ok(armed) => {
                let node_type = self
                    .graph
                    .node_weight(index)
                    .map(|n| n.node_type().to_string())
                    .unwrap_or_default();
                tracing::debug!("Evaluated {} node {} (armed: {})", node_type, node_id, armed);
                self.events.emit(ExecutionEvent::NodeEvaluated {
                    pulse_id,
                    node_id,
                    node_type,
                    armed,
                    timestamp: Utc::now(),
                });
                report.evaluated.push(node_id);
                armed
            }
            Err(e) => {
                tracing::error!("Node {} failed: {}", node_id, e);
                self.events.emit(ExecutionEvent::NodeFailed {
                    pulse_id,
                    node_id,
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                report.failed.push((node_id, e));
                false
            }
        }
    }

    /// Copy the current value of each connected data input's newest source.
    fn pull_inputs(&mut self, index: NodeIndex) {
        let Some(node) = self.graph.node_weight(index) else {
            return;
        };

        let mut updates: Vec<(PinId, Option<PinValue>)> = Vec::new();
        for input in node.core().inputs() {
            if input.pin_type().is_flow() {
                continue;
            }
            let newest = self.pin_links(input.id()).last();
            let Some(link) = newest.and_then(|id| self.find_link(*id)) else {
                continue;
            };
            if let Some(source) = self.pin(link.start()) {
                updates.push((input.id(), source.data().cloned()));
            }
        }

        let Some(node) = self.graph.node_weight_mut(index) else {
            return;
        };
        for (pin, value) in updates {
            if let Some(input) = node.core_mut().pin_mut(pin) {
                if let Err(e) = input.set_data(value) {
                    tracing::warn!("Could not pull into pin {}: {}", pin, e);
                }
            }
        }
    }

    fn schedule_downstream(&self, index: NodeIndex, pending: &mut Vec<(NodeIndex, PinId)>) {
        let Some(node) = self.graph.node_weight(index) else {
            return;
        };

        let mut next = Vec::new();
        for output in node.core().armed_outputs() {
            for link_id in self.pin_links(output.id()) {
                let Some(link) = self.find_link(*link_id) else {
                    continue;
                };
                if let Some(target) = self.nodes.get(&link.end_node()) {
                    next.push((*target, link.end()));
                }
            }
        }
        // Reversed so the first link is evaluated first.
        pending.extend(next.into_iter().rev());
    }
}
