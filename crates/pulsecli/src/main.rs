// crates/pulsecli/src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pulsecore::{ExecutionEvent, HostEvent, Node, NodeEvent, NodeId, PinValue, Position};
use pulsenodes::{standard_registry, KeyPressNode, PrintNode, StringNode};
use pulseruntime::{serializer, Graph, GraphConfig, NodeRegistry, PulseReport};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Pulse graph engine CLI", long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a small example graph
    Init {
        /// Output file path
        #[arg(short, long, default_value = "graph.pblu")]
        output: PathBuf,

        /// Key code the example reacts to
        #[arg(short, long, default_value_t = 32)]
        key: i32,
    },

    /// Show the nodes and links stored in a graph file
    Inspect {
        file: PathBuf,
    },

    /// Dump a graph file as JSON
    Export {
        file: PathBuf,
    },

    /// Load a graph and feed it a key press
    Fire {
        /// Path to graph file
        #[arg(short, long)]
        file: PathBuf,

        /// Key code to press
        #[arg(short, long)]
        key: i32,

        /// Release the key after pressing it
        #[arg(short, long)]
        release: bool,

        /// Evaluation limit per pulse
        #[arg(long, default_value_t = 10_000)]
        max_steps: usize,
    },

    /// List available node types
    Nodes,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Init { output, key } => create_example_graph(output, key)?,
        Commands::Inspect { file } => inspect_graph(file)?,
        Commands::Export { file } => export_graph(file)?,
        Commands::Fire {
            file,
            key,
            release,
            max_steps,
        } => fire_key(file, key, release, max_steps)?,
        Commands::Nodes => list_nodes()?,
    }

    Ok(())
}

fn registry() -> Arc<NodeRegistry> {
    Arc::new(standard_registry())
}

fn load_graph(file: &PathBuf, config: GraphConfig) -> Result<Graph> {
    let mut graph = Graph::with_config(registry(), config);
    let report = serializer::load_from_file(&mut graph, file)
        .with_context(|| format!("failed to load {}", file.display()))?;

    for node_type in &report.skipped_types {
        println!("⚠️  Skipped node of unknown type '{}'", node_type);
    }
    for id in &report.duplicate_nodes {
        println!("⚠️  Skipped node {}: id already used", id);
    }
    for id in &report.failed_nodes {
        println!("⚠️  Skipped node {}: its factory failed", id);
    }
    if report.links_dropped > 0 {
        println!("⚠️  Dropped {} links", report.links_dropped);
    }
    Ok(graph)
}

fn create_example_graph(output: PathBuf, key: i32) -> Result<()> {
    let mut graph = Graph::new(registry());

    let press = graph.spawn_node(KeyPressNode::TYPE)?;
    let text = graph.spawn_node(StringNode::TYPE)?;
    let print = graph.spawn_node(PrintNode::TYPE)?;

    graph.set_node_data(press, Some(PinValue::Int(key)))?;
    graph.set_node_data(text, Some(PinValue::String("Hello from pulse".into())))?;

    let positions = [
        (press, Position::new(100, 100)),
        (text, Position::new(100, 250)),
        (print, Position::new(350, 150)),
    ];
    for (id, position) in positions {
        if let Some(node) = graph.find_node_mut(id) {
            node.core_mut().set_position(position);
        }
    }

    let pressed = output_pin(&graph, press, "pressed")?;
    let flow_in = input_pin(&graph, print, "in")?;
    let value = output_pin(&graph, text, "value")?;
    let message = input_pin(&graph, print, "text")?;
    graph.connect(pressed, flow_in)?;
    graph.connect(value, message)?;

    serializer::save_to_file(&graph, &output)?;

    println!("✨ Created example graph: {}", output.display());
    println!();
    println!("Fire it with:");
    println!("  pulse fire --file {} --key {}", output.display(), key);

    Ok(())
}

fn output_pin(graph: &Graph, node: NodeId, label: &str) -> Result<pulsecore::PinId> {
    graph
        .find_node(node)
        .and_then(|n| n.core().output_by_label(label))
        .map(|p| p.id())
        .with_context(|| format!("node {} has no output '{}'", node, label))
}

fn input_pin(graph: &Graph, node: NodeId, label: &str) -> Result<pulsecore::PinId> {
    graph
        .find_node(node)
        .and_then(|n| n.core().input_by_label(label))
        .map(|p| p.id())
        .with_context(|| format!("node {} has no input '{}'", node, label))
}

fn inspect_graph(file: PathBuf) -> Result<()> {
    println!("🔍 Inspecting graph: {}", file.display());
    let graph = load_graph(&file, GraphConfig::default())?;

    println!("   Nodes: {}", graph.node_count());
    println!("   Links: {}", graph.link_count());
    println!();

    for node in graph.nodes() {
        print_node(node);
        if let Some(data) = graph.node_data(node.id()) {
            println!("      data: {:?}", data);
        }
    }

    if graph.link_count() > 0 {
        println!();
        println!("🔗 Links:");
        for link in graph.links() {
            let start = graph.pin(link.start()).map(|p| p.label()).unwrap_or("?");
            let end = graph.pin(link.end()).map(|p| p.label()).unwrap_or("?");
            println!(
                "   {} {}.{} -> {}.{}",
                link.id(),
                link.start_node(),
                start,
                link.end_node(),
                end
            );
        }
    }

    for cycle in graph.flow_cycles() {
        let members: Vec<String> = cycle.iter().map(ToString::to_string).collect();
        println!("⚠️  Flow cycle through {}", members.join(", "));
    }

    Ok(())
}

fn print_node(node: &dyn Node) {
    let core = node.core();
    let position = core.position();
    println!("  • {} {} at ({}, {})", node.node_type(), node.id(), position.x, position.y);
    for pin in core.inputs() {
        println!("      in  {:<10} {}", pin.label(), pin.pin_type());
    }
    for pin in core.outputs() {
        println!("      out {:<10} {}", pin.label(), pin.pin_type());
    }
}

fn export_graph(file: PathBuf) -> Result<()> {
    let bytes = std::fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
    let blueprint = serializer::decode_blueprint(&bytes)?;
    println!("{}", serde_json::to_string_pretty(&blueprint)?);
    Ok(())
}

fn fire_key(file: PathBuf, key: i32, release: bool, max_steps: usize) -> Result<()> {
    println!("🚀 Loading graph from: {}", file.display());
    let config = GraphConfig::default().with_max_pulse_steps(max_steps);
    let mut graph = load_graph(&file, config)?;
    let mut events = graph.subscribe_events();

    let mut sequence = vec![HostEvent::key_press(key)];
    if release {
        sequence.push(HostEvent::key_release(key));
    }

    for event in &sequence {
        let reports = graph.dispatch(event);
        if reports.is_empty() {
            println!("   No node reacted to {:?}", event);
        }
        for report in &reports {
            print_report(report);
        }

        while let Ok(event) = events.try_recv() {
            print_event(event);
        }
    }

    Ok(())
}

fn print_report(report: &PulseReport) {
    println!();
    println!("▶️  Pulse {} from {}", report.pulse_id, report.source);
    println!("   Evaluated: {} nodes in {} steps", report.evaluated.len(), report.steps);
    for (node, error) in &report.failed {
        println!("  ❌ Node {} failed: {}", node, error);
    }
    if report.truncated {
        println!("  ⚠️  Stopped at the step limit");
    }
}

fn print_event(event: ExecutionEvent) {
    if let ExecutionEvent::NodeMessage { node_id, event, .. } = event {
        match event {
            NodeEvent::Print { text } => println!("     🖨️  [{}] {}", node_id, text),
            NodeEvent::Info { message } => println!("     ℹ️  [{}] {}", node_id, message),
            NodeEvent::Warning { message } => println!("     ⚠️  [{}] {}", node_id, message),
        }
    }
}

fn list_nodes() -> Result<()> {
    println!("📦 Available Node Types:");
    println!();

    let registry = registry();
    for node_type in registry.list_node_types() {
        match registry.get_metadata(&node_type) {
            Some(metadata) => {
                println!("  • {} ({})", node_type, metadata.category);
                println!("    {}", metadata.description);
            }
            None => println!("  • {}", node_type),
        }

        let sample = registry.create_node(&node_type, NodeId::new())?;
        for pin in sample.core().inputs() {
            println!("      in  {:<10} {}", pin.label(), pin.pin_type());
        }
        for pin in sample.core().outputs() {
            println!("      out {:<10} {}", pin.label(), pin.pin_type());
        }
    }

    Ok(())
}
