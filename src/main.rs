use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;

use scriptbook::app::{self, App};
use scriptbook::bridge::ControlMessage;
use scriptbook::config::Config;
use scriptbook::content::FsContentLoader;
use scriptbook::server::daemon;
use scriptbook::server::protocol::{ClientRequest, ServerResponse};
use scriptbook::session::store;
use scriptbook::{event, tui, ContentDescriptor, Workspace};

#[derive(Parser)]
#[command(name = "scriptbook", about = "Tiling layout engine for documents and terminals")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the layout daemon in the foreground
    Serve {
        /// Documents directory (default: behavior.docs_dir)
        docs_dir: Option<PathBuf>,
        #[arg(long)]
        socket: Option<PathBuf>,
    },
    /// Send one control command to the daemon
    Control {
        action: Action,
        /// Filename for open_window
        #[arg(short, long)]
        filename: Option<String>,
        /// Window type
        #[arg(short = 't', long = "type")]
        kind: Option<Kind>,
        /// Split direction
        #[arg(short, long)]
        direction: Option<Direction>,
        /// Window ID
        #[arg(short, long)]
        window_id: Option<String>,
        #[arg(long)]
        socket: Option<PathBuf>,
    },
    /// Print the daemon's resolved layout
    Show {
        #[arg(long, default_value_t = 120)]
        width: u16,
        #[arg(long, default_value_t = 40)]
        height: u16,
        #[arg(long)]
        socket: Option<PathBuf>,
    },
    /// Save the daemon's layout
    Save {
        name: Option<String>,
        #[arg(long)]
        socket: Option<PathBuf>,
    },
    /// Replace the daemon's layout with a saved one
    Load {
        name: String,
        #[arg(long)]
        socket: Option<PathBuf>,
    },
    /// List saved layouts
    Ls,
    /// Open a local, interactive view of a layout
    Preview {
        /// Documents directory (default: behavior.docs_dir)
        #[arg(long)]
        docs: Option<PathBuf>,
        /// Saved layout to start from
        #[arg(long)]
        layout: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
#[value(rename_all = "snake_case")]
enum Action {
    OpenWindow,
    SplitWindow,
    CloseWindow,
    FocusWindow,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Action::OpenWindow => "open_window",
            Action::SplitWindow => "split_window",
            Action::CloseWindow => "close_window",
            Action::FocusWindow => "focus_window",
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Markdown,
    Document,
    Terminal,
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Horizontal,
    Vertical,
    Row,
    Column,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // The preview owns the terminal, so its logs go to a file.
    if matches!(cli.command, Commands::Preview { .. }) {
        init_tracing(cli.verbose, Some(&preview_log_path()))?;
    } else {
        init_tracing(cli.verbose, None)?;
    }
    let config = Config::load();

    let rt = tokio::runtime::Runtime::new()?;
    let socket_for = |socket: Option<PathBuf>| {
        socket
            .or_else(|| config.behavior.socket_path.clone())
            .unwrap_or_else(daemon::default_socket_path)
    };

    match cli.command {
        Commands::Serve { docs_dir, socket } => {
            let docs = docs_dir.unwrap_or_else(|| config.behavior.docs_dir.clone());
            let loader = FsContentLoader::new(docs).with_max_size(config.behavior.max_document_bytes);
            let socket = socket_for(socket);
            rt.block_on(daemon::run(&socket, loader, store::layouts_dir()))
        }
        Commands::Control {
            action,
            filename,
            kind,
            direction,
            window_id,
            socket,
        } => {
            let message = control_message(action, filename, kind, direction, window_id);
            let response = rt.block_on(daemon::send_request(&socket_for(socket), &ClientRequest::Control(message)))?;
            match response {
                ServerResponse::Control { applied: true } => println!("Command '{}' sent", action.as_str()),
                ServerResponse::Control { applied: false } => {
                    println!("Command '{}' ignored: it does not match the current layout", action.as_str())
                }
                other => bail!("unexpected response: {other:?}"),
            }
            Ok(())
        }
        Commands::Show { width, height, socket } => {
            let request = ClientRequest::Resolve { width, height };
            match rt.block_on(daemon::send_request(&socket_for(socket), &request))? {
                ServerResponse::Layout { panes, focused } => {
                    if panes.is_empty() {
                        println!("(no windows)");
                    }
                    for pane in panes {
                        let marker = if Some(pane.id) == focused { "*" } else { " " };
                        println!(
                            "{marker} {}  {:>4},{:<4} {:>4}x{:<4} {:?} {}",
                            pane.id, pane.x, pane.y, pane.width, pane.height, pane.content.kind, pane.content.filename
                        );
                    }
                    Ok(())
                }
                other => bail!("unexpected response: {other:?}"),
            }
        }
        Commands::Save { name, socket } => {
            expect_ok(rt.block_on(daemon::send_request(&socket_for(socket), &ClientRequest::Save { name }))?)
        }
        Commands::Load { name, socket } => {
            expect_ok(rt.block_on(daemon::send_request(&socket_for(socket), &ClientRequest::Load { name }))?)
        }
        Commands::Ls => {
            for name in store::list() {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Preview { docs, layout } => {
            let docs = docs.unwrap_or_else(|| config.behavior.docs_dir.clone());
            rt.block_on(run_preview(config, docs, layout))
        }
    }
}

fn expect_ok(response: ServerResponse) -> Result<()> {
    match response {
        ServerResponse::Ok => Ok(()),
        ServerResponse::Error(e) => bail!(e),
        other => bail!("unexpected response: {other:?}"),
    }
}

fn control_message(
    action: Action,
    filename: Option<String>,
    kind: Option<Kind>,
    direction: Option<Direction>,
    window_id: Option<String>,
) -> ControlMessage {
    let mut payload = Map::new();
    if let Some(filename) = filename {
        payload.insert("filename".into(), json!(filename));
    }
    if let Some(kind) = kind {
        let kind = match kind {
            Kind::Markdown | Kind::Document => "document",
            Kind::Terminal => "terminal",
        };
        payload.insert("type".into(), json!(kind));
    }
    if let Some(direction) = direction {
        let direction = match direction {
            Direction::Horizontal | Direction::Row => "row",
            Direction::Vertical | Direction::Column => "column",
        };
        payload.insert("direction".into(), json!(direction));
    }
    if let Some(window_id) = window_id {
        payload.insert("windowId".into(), json!(window_id));
    }
    ControlMessage::new(action.as_str(), Value::Object(payload))
}

async fn run_preview(config: Config, docs: PathBuf, layout: Option<String>) -> Result<()> {
    let loader = FsContentLoader::new(docs).with_max_size(config.behavior.max_document_bytes);
    let mut workspace = Workspace::new("preview");
    match layout {
        Some(name) => {
            let saved = store::load(&name).with_context(|| format!("failed to load layout {name:?}"))?;
            workspace.restore(saved)?;
        }
        None => {
            let documents = loader.list_documents().await.unwrap_or_default();
            match documents.first() {
                Some(first) => workspace.open_window(ContentDescriptor::document(first.as_str())),
                None => workspace.open_window(ContentDescriptor::terminal("shell")),
            };
        }
    }

    tui::install_panic_hook();
    let (tx, rx) = mpsc::unbounded_channel();
    event::start_event_loop(tx.clone());
    let app = App::new(workspace, config, loader, store::layouts_dir(), tx);
    let tui = tui::Tui::enter()?;
    app::run(app, tui, rx).await
}

fn preview_log_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scriptbook")
        .join("preview.log")
}

fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    match log_file {
        Some(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .with(filter)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .try_init()
                .context("Failed to initialize tracing subscriber")?;
        }
    }

    Ok(())
}
