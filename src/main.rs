mod config;

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use weft_graph::{ActionNode, DatasetNode, Edge, Node, NodeKind, OutputNode, node_id};
use weft_orchestrator::{Orchestrator, Plan, RunStatus};
use weft_store::{FileSnapshot, GraphStore};
use weft_transform::HttpTransformService;

use crate::config::Settings;

/// File name of the graph snapshot inside the data directory.
const GRAPH_FILE: &str = "graph.json";

/// Weft - build dataset pipelines as graphs and run them against a Transform Service
#[derive(Parser)]
#[command(name = "weft")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.weft)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Transform Service base URL, overriding config.json
  #[arg(long, global = true)]
  service_url: Option<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Show, import or export the whole graph
  Graph {
    #[command(subcommand)]
    command: GraphCommand,
  },

  /// Add, remove or edit nodes
  Node {
    #[command(subcommand)]
    command: NodeCommand,
  },

  /// Connect or disconnect nodes
  Edge {
    #[command(subcommand)]
    command: EdgeCommand,
  },

  /// Check whether the graph may be run
  Validate,

  /// Show which action nodes a run would execute
  Plan,

  /// Run the graph and store the materialized outputs
  Run,
}

#[derive(Subcommand)]
enum GraphCommand {
  /// Print the graph as JSON
  Show,

  /// Replace the graph with a JSON document (`-` reads stdin)
  Import { file: PathBuf },

  /// Write the graph as JSON to a file, or stdout when omitted
  Export { file: Option<PathBuf> },
}

#[derive(Subcommand)]
enum NodeCommand {
  /// Add a node for an existing dataset
  AddDataset {
    /// Dataset id in the Transform Service
    dataset_id: String,

    #[arg(long)]
    name: String,

    #[arg(long, default_value = "text/csv")]
    content_type: String,

    #[arg(long, default_value_t = 0)]
    size_bytes: u64,

    #[arg(long)]
    id: Option<String>,
  },

  /// Add an action node
  AddAction {
    /// concatenate, merge, standardize or split
    action_type: String,

    /// Parameters as a JSON object
    #[arg(long)]
    params: Option<String>,

    #[arg(long)]
    id: Option<String>,
  },

  /// Add an output node
  AddOutput {
    /// Output file name
    name: String,

    #[arg(long, default_value = "")]
    description: String,

    #[arg(long)]
    id: Option<String>,
  },

  /// Remove a node and every edge touching it
  Remove { node_id: String },

  /// Replace an action node's parameters
  SetParams {
    node_id: String,

    /// Parameters as a JSON object
    params: String,
  },
}

#[derive(Subcommand)]
enum EdgeCommand {
  /// Connect two nodes
  Add { source: String, target: String },

  /// Remove an edge by id
  Remove { edge_id: String },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weft=info,warn")),
    )
    .with_target(false)
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".weft"),
  };

  let Some(command) = cli.command else {
    println!("weft - use --help to see available commands");
    return Ok(());
  };

  let mut store = open_store(&data_dir)?;

  match command {
    Commands::Graph { command } => graph_command(&mut store, command)?,
    Commands::Node { command } => node_command(&mut store, command)?,
    Commands::Edge { command } => edge_command(&mut store, command)?,
    Commands::Validate => {
      let result = weft_orchestrator::validate(store.graph());
      println!("{}", serde_json::to_string_pretty(&result)?);
      if let Some(violation) = result.violation {
        bail!("graph is invalid: {}", violation);
      }
    }
    Commands::Plan => print_plan(&store)?,
    Commands::Run => {
      let settings = Settings::load(&data_dir)?.with_service_url(cli.service_url);
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { run_graph(&mut store, settings).await })?;
    }
  }

  Ok(())
}

fn open_store(data_dir: &Path) -> Result<GraphStore> {
  let path = data_dir.join(GRAPH_FILE);
  GraphStore::open(FileSnapshot::new(&path))
    .with_context(|| format!("failed to open graph: {}", path.display()))
}

fn graph_command(store: &mut GraphStore, command: GraphCommand) -> Result<()> {
  match command {
    GraphCommand::Show => {
      println!("{}", store.serialize()?);
    }
    GraphCommand::Import { file } => {
      let json = read_input(&file)?;
      store
        .deserialize(&json)
        .with_context(|| format!("failed to import graph: {}", file.display()))?;
      eprintln!(
        "Imported {} nodes and {} edges",
        store.nodes().len(),
        store.edges().len()
      );
    }
    GraphCommand::Export { file } => {
      let json = store.serialize()?;
      match file {
        Some(path) => std::fs::write(&path, json)
          .with_context(|| format!("failed to write graph: {}", path.display()))?,
        None => println!("{}", json),
      }
    }
  }

  Ok(())
}

fn node_command(store: &mut GraphStore, command: NodeCommand) -> Result<()> {
  match command {
    NodeCommand::AddDataset {
      dataset_id,
      name,
      content_type,
      size_bytes,
      id,
    } => {
      let id = id.unwrap_or_else(|| node_id(NodeKind::Dataset, &dataset_id));
      store.add_node(Node::Dataset(DatasetNode {
        id: id.clone(),
        dataset_id,
        name,
        content_type,
        size_bytes,
      }))?;
      println!("{}", id);
    }
    NodeCommand::AddAction {
      action_type,
      params,
      id,
    } => {
      let id = id.unwrap_or_else(|| node_id(NodeKind::Action, &action_type));
      let mut action = ActionNode::new(id.clone(), action_type);
      if let Some(params) = params {
        action.parameters = parse_params(&params)?;
      }
      store.add_node(Node::Action(action))?;
      println!("{}", id);
    }
    NodeCommand::AddOutput {
      name,
      description,
      id,
    } => {
      let id = id.unwrap_or_else(|| node_id(NodeKind::Output, &name));
      store.add_node(Node::Output(OutputNode::new(id.clone(), name, description)))?;
      println!("{}", id);
    }
    NodeCommand::Remove { node_id } => {
      store.remove_node(&node_id)?;
    }
    NodeCommand::SetParams { node_id, params } => {
      let mut action = store
        .graph()
        .get_node(&node_id)
        .and_then(Node::as_action)
        .cloned()
        .with_context(|| format!("no action node '{}'", node_id))?;
      action.parameters = parse_params(&params)?;
      store.update_node(Node::Action(action))?;
    }
  }

  Ok(())
}

fn edge_command(store: &mut GraphStore, command: EdgeCommand) -> Result<()> {
  match command {
    EdgeCommand::Add { source, target } => {
      let edge = Edge::between(source, target);
      let id = edge.id.clone();
      store.add_edge(edge)?;
      println!("{}", id);
    }
    EdgeCommand::Remove { edge_id } => {
      store.remove_edge(&edge_id)?;
    }
  }

  Ok(())
}

fn print_plan(store: &GraphStore) -> Result<()> {
  let graph = store.graph();
  if let Err(violation) = weft_orchestrator::validate(graph).into_result() {
    bail!("graph is invalid: {}", violation);
  }

  match weft_orchestrator::plan(graph) {
    Plan::NoOp { materialized } => {
      eprintln!(
        "Nothing to run: {} output(s) already materialized",
        materialized.len()
      );
    }
    Plan::Execute { frontier } => {
      for action in frontier {
        println!("{}\t{}", action.id, action.action_type);
      }
    }
  }

  Ok(())
}

async fn run_graph(store: &mut GraphStore, settings: Settings) -> Result<()> {
  let service = HttpTransformService::new(&settings.service_url)
    .context("failed to create transform service client")?;
  info!(
    service_url = %settings.service_url,
    max_concurrency = settings.orchestrator.max_concurrency,
    "transform_service"
  );
  let orchestrator = Orchestrator::new(Arc::new(service), settings.orchestrator);

  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      on_interrupt.cancel();
    }
  });

  let result = orchestrator
    .run_store(store, cancel)
    .await
    .context("failed to store materialized outputs")?;

  for notification in &result.notifications {
    eprintln!("[{:?}] {}", notification.level, notification.message);
  }
  for failure in &result.failures {
    eprintln!("  {}: {}", failure.node_id, failure.error);
  }
  for miss in &result.misses {
    eprintln!(
      "  {}: produced '{}' which matches no output",
      miss.action_node_id, miss.dataset_name
    );
  }

  println!("{}", serde_json::to_string_pretty(&result.reconciled)?);

  match result.status {
    RunStatus::Rejected => bail!("run rejected"),
    RunStatus::PartiallyFailed => bail!("run partially failed"),
    RunStatus::NoOp | RunStatus::Succeeded => Ok(()),
  }
}

fn parse_params(params: &str) -> Result<Map<String, Value>> {
  serde_json::from_str(params).context("parameters must be a JSON object")
}

fn read_input(file: &Path) -> Result<String> {
  if file == Path::new("-") {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read graph from stdin")?;
    return Ok(input);
  }

  std::fs::read_to_string(file).with_context(|| format!("failed to read file: {}", file.display()))
}
