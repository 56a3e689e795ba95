use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use ratatui::layout::Rect;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::bridge::{self, Outcome};
use crate::content::{ContentError, ContentLoader, ContentRequest};
use crate::layout::geometry;
use crate::server::framing::{recv, recv_required, send};
use crate::server::protocol::{ClientRequest, ResolvedPaneInfo, ServerResponse};
use crate::session::store;
use crate::workspace::Workspace;

const QUEUE_DEPTH: usize = 64;

/// Default socket location: the user runtime dir, else the temp dir.
pub fn default_socket_path() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("scriptbook.sock")
}

enum Job {
    Request(ClientRequest, oneshot::Sender<ServerResponse>),
    Loaded(ContentRequest, Result<String, ContentError>),
}

/// Cloneable handle to the task that owns the workspace.
#[derive(Clone)]
pub struct LayoutHandle {
    jobs: mpsc::Sender<Job>,
}

impl LayoutHandle {
    /// Start the owning task. It stops once every handle is dropped.
    pub fn spawn<L: ContentLoader + 'static>(workspace: Workspace, loader: Arc<L>, layouts_dir: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let actor = LayoutActor {
            workspace,
            loader,
            layouts_dir,
            jobs: tx.downgrade(),
        };
        tokio::spawn(actor.run(rx));
        Self { jobs: tx }
    }

    pub async fn request(&self, request: ClientRequest) -> ServerResponse {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.jobs.send(Job::Request(request, reply_tx)).await.is_err() {
            return ServerResponse::Error("layout task stopped".to_string());
        }
        reply_rx
            .await
            .unwrap_or_else(|_| ServerResponse::Error("layout task stopped".to_string()))
    }
}

/// Sole owner of the workspace. Every tree operation runs here, one at a time.
struct LayoutActor<L> {
    workspace: Workspace,
    loader: Arc<L>,
    layouts_dir: PathBuf,
    jobs: mpsc::WeakSender<Job>,
}

impl<L: ContentLoader + 'static> LayoutActor<L> {
    async fn run(mut self, mut rx: mpsc::Receiver<Job>) {
        self.spawn_loads();
        while let Some(job) = rx.recv().await {
            match job {
                Job::Request(request, reply) => {
                    let response = self.handle(request);
                    let _ = reply.send(response);
                    self.spawn_loads();
                }
                Job::Loaded(request, result) => {
                    self.workspace.apply_content(&request, result);
                }
            }
        }
        debug!("layout task stopped");
    }

    fn handle(&mut self, request: ClientRequest) -> ServerResponse {
        match request {
            ClientRequest::Control(message) => {
                let applied = bridge::apply(&mut self.workspace, &message) == Outcome::Applied;
                ServerResponse::Control { applied }
            }
            ClientRequest::Resolve { width, height } => {
                let tree = self.workspace.tree();
                let panes = match tree.root() {
                    Some(root) => geometry::resolve_layout(root, Rect::new(0, 0, width, height))
                        .into_iter()
                        .filter_map(|(id, rect)| {
                            let pane = tree.pane(id)?;
                            Some(ResolvedPaneInfo::new(id, pane.content.clone(), rect))
                        })
                        .collect(),
                    None => Vec::new(),
                };
                ServerResponse::Layout {
                    panes,
                    focused: tree.focused(),
                }
            }
            ClientRequest::Read { window_id } => ServerResponse::Content {
                text: self.workspace.contents().text(window_id).map(str::to_string),
            },
            ClientRequest::Save { name } => {
                let mut layout = self.workspace.snapshot();
                if let Some(name) = name {
                    layout.name = name;
                }
                let path = match store::layout_file(&self.layouts_dir, &layout.name) {
                    Ok(path) => path,
                    Err(e) => return ServerResponse::Error(e.to_string()),
                };
                match store::save_to(&layout, &path) {
                    Ok(()) => {
                        info!(path = %path.display(), "saved layout");
                        ServerResponse::Ok
                    }
                    Err(e) => ServerResponse::Error(e.to_string()),
                }
            }
            ClientRequest::Load { name } => {
                let path = match store::layout_file(&self.layouts_dir, &name) {
                    Ok(path) => path,
                    Err(e) => return ServerResponse::Error(e.to_string()),
                };
                let result = store::load_from(&path).and_then(|layout| self.workspace.restore(layout));
                match result {
                    Ok(()) => {
                        info!(path = %path.display(), "loaded layout");
                        ServerResponse::Ok
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to load layout");
                        ServerResponse::Error(e.to_string())
                    }
                }
            }
            ClientRequest::ListLayouts => ServerResponse::Layouts(store::list_in(&self.layouts_dir)),
            ClientRequest::Ping => ServerResponse::Pong,
        }
    }

    /// Fetch queued document bodies off the actor; results come back as jobs.
    fn spawn_loads(&mut self) {
        let requests = self.workspace.take_pending();
        if requests.is_empty() {
            return;
        }
        let Some(jobs) = self.jobs.upgrade() else {
            return;
        };
        for request in requests {
            let loader = Arc::clone(&self.loader);
            let jobs = jobs.clone();
            tokio::spawn(async move {
                let result = loader.load(&request.filename).await;
                let _ = jobs.send(Job::Loaded(request, result)).await;
            });
        }
    }
}

/// Accept connections until the listener fails.
pub async fn serve(listener: UnixListener, handle: LayoutHandle) -> Result<()> {
    loop {
        let (stream, _) = listener.accept().await.context("accept failed")?;
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, handle).await {
                debug!(error = %e, "client disconnected with error");
            }
        });
    }
}

async fn handle_client(mut stream: UnixStream, handle: LayoutHandle) -> Result<()> {
    while let Some(request) = recv::<_, ClientRequest>(&mut stream).await? {
        debug!(?request, "client request");
        let response = handle.request(request).await;
        send(&mut stream, &response).await?;
    }
    Ok(())
}

/// Run the daemon on `socket` until Ctrl-C.
pub async fn run<L: ContentLoader + 'static>(socket: &Path, loader: L, layouts_dir: PathBuf) -> Result<()> {
    if socket.exists() {
        if std::os::unix::net::UnixStream::connect(socket).is_ok() {
            return Err(anyhow!("a daemon is already listening on {}", socket.display()));
        }
        // Stale socket from a previous run.
        let _ = std::fs::remove_file(socket);
    }
    if let Some(dir) = socket.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let listener =
        UnixListener::bind(socket).with_context(|| format!("failed to bind {}", socket.display()))?;
    let handle = LayoutHandle::spawn(Workspace::new("default"), Arc::new(loader), layouts_dir);
    info!(socket = %socket.display(), "layout daemon listening");

    let result = tokio::select! {
        result = serve(listener, handle) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    };
    let _ = std::fs::remove_file(socket);
    result
}

/// Send one request to a running daemon and wait for the reply.
pub async fn send_request(socket: &Path, request: &ClientRequest) -> Result<ServerResponse> {
    let mut stream = UnixStream::connect(socket)
        .await
        .with_context(|| format!("cannot connect to {}", socket.display()))?;
    send(&mut stream, request).await?;
    recv_required(&mut stream).await
}
