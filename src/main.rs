use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hireflow_core::config::AppConfig;
use hireflow_core::traits::WorkflowStore;
use hireflow_core::types::{CampaignId, Orientation, WorkflowDocument};
use hireflow_editor::{
    relayout, resolve_connectors, validation_messages, EditorSettings, Graph, WorkflowEditor,
};
use hireflow_store::SqliteStore;

#[derive(Parser)]
#[command(name = "hireflow", version, about = "Hiring workflow graph editor")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "hireflow.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Auto-layout a workflow document and print it
    Layout {
        /// Workflow JSON file, `-` for stdin
        file: PathBuf,
        /// Flow direction (horizontal, vertical)
        #[arg(long, short)]
        orientation: Option<Orientation>,
    },
    /// Check a workflow document for structural problems
    Validate {
        /// Workflow JSON file, `-` for stdin
        file: PathBuf,
    },
    /// Print connector geometry for every edge
    Connectors {
        /// Workflow JSON file, `-` for stdin
        file: PathBuf,
        /// Flow direction (horizontal, vertical)
        #[arg(long, short)]
        orientation: Option<Orientation>,
        /// Print SVG path data instead of JSON
        #[arg(long)]
        svg: bool,
    },
    /// Validate a workflow document and save it to the local store
    Import {
        /// Workflow JSON file, `-` for stdin
        file: PathBuf,
        /// Campaign the workflow belongs to
        #[arg(long)]
        campaign: String,
    },
    /// Print a campaign's workflow (default template if none is stored)
    Export {
        /// Campaign ID
        #[arg(long)]
        campaign: String,
    },
    /// List campaigns in the local store
    List,
    /// Show current configuration
    Config,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hireflow=info,warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Handle completions before config loading
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "hireflow", &mut io::stdout());
        return Ok(());
    }

    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Layout { file, orientation } => {
            let mut doc = read_document(&file)?;
            let orientation = orientation.unwrap_or(config.editor.orientation);
            let mut graph = Graph::new(doc.nodes, doc.edges);
            let layout = relayout(&mut graph, orientation, &config.layout);
            info!(levels = layout.levels.len(), %orientation, "Layout computed");
            doc.nodes = graph.nodes;
            doc.edges = graph.edges;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        Commands::Validate { file } => {
            let doc = read_document(&file)?;
            let problems = validation_messages(&Graph::new(doc.nodes, doc.edges));
            if problems.is_empty() {
                println!("Workflow is valid");
            } else {
                for problem in &problems {
                    println!("- {}", problem);
                }
                anyhow::bail!("workflow has {} problem(s)", problems.len());
            }
        }
        Commands::Connectors {
            file,
            orientation,
            svg,
        } => {
            let doc = read_document(&file)?;
            let orientation = orientation.unwrap_or(config.editor.orientation);
            let mut graph = Graph::new(doc.nodes, doc.edges);
            relayout(&mut graph, orientation, &config.layout);
            let connectors = resolve_connectors(&graph, orientation);
            if svg {
                for c in &connectors {
                    println!("{} -> {}: {}", c.from, c.to, c.svg_path());
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&connectors)?);
            }
        }
        Commands::Import { file, campaign } => {
            let mut doc = read_document(&file)?;
            doc.campaign_id = CampaignId::new(campaign);

            let mut graph = Graph::new(doc.nodes, doc.edges);
            let problems = validation_messages(&graph);
            if !problems.is_empty() {
                for problem in &problems {
                    eprintln!("- {}", problem);
                }
                anyhow::bail!("refusing to import an invalid workflow");
            }
            relayout(&mut graph, config.editor.orientation, &config.layout);
            doc.nodes = graph.nodes;
            doc.edges = graph.edges;

            let store = SqliteStore::open(&config.store_path())?;
            store.save(&doc).await?;
            println!("Imported workflow for campaign {}", doc.campaign_id);
        }
        Commands::Export { campaign } => {
            let store = SqliteStore::open(&config.store_path())?;
            let editor = WorkflowEditor::load(
                &store,
                CampaignId::new(campaign),
                EditorSettings::from(&config),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&editor.document())?);
        }
        Commands::List => {
            let store = SqliteStore::open(&config.store_path())?;
            let workflows = store.list_campaigns()?;
            if workflows.is_empty() {
                println!("No saved workflows.");
            }
            for w in workflows {
                println!("{}  {}", w.campaign_id, w.saved_at.to_rfc3339());
            }
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    if path.exists() {
        return Ok(AppConfig::load(path)?);
    }
    if let Some(home_config) = dirs_home().map(|h| h.join(".hireflow").join("config.toml")) {
        if home_config.exists() {
            info!(path = %home_config.display(), "Loading config from home directory");
            return Ok(AppConfig::load(&home_config)?);
        }
    }
    warn!(path = %path.display(), "No config file found, using defaults");
    Ok(AppConfig::default())
}

fn read_document(path: &Path) -> anyhow::Result<WorkflowDocument> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&content)?)
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
