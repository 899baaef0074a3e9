//! Background tasks: each [`Command`] runs on its own thread and reports
//! back with exactly one [`Message`], unless it was cancelled first.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::catalog::CatalogCache;
use crate::details::DetailFetcher;
use crate::download::Downloader;
use crate::error::TaskError;
use crate::message::{Command, Message};

/// How long quitting waits for cancelled tasks that own a child process.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Shared flag a task checks to learn it should stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A running job and the token that cancels it.
pub struct BackgroundTask {
    name: String,
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

impl BackgroundTask {
    /// Run `job` on a new thread and send its message on `tx`. The message is
    /// dropped if the task was cancelled by the time the job returns.
    pub fn spawn<F>(name: &str, tx: Sender<Message>, job: F) -> std::io::Result<Self>
    where
        F: FnOnce(&CancelToken) -> Message + Send + 'static,
    {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let message = job(&token);
                if token.is_cancelled() {
                    tracing::debug!(task = thread::current().name(), "discarding cancelled result");
                    return;
                }
                // The receiver only goes away when the UI is shutting down.
                let _ = tx.send(message);
            })?;
        Ok(Self {
            name: name.to_string(),
            cancel,
            handle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Join the thread if it finishes before `deadline`. Returns false if it
    /// was still running when the deadline passed.
    pub fn join_until(self, deadline: Instant) -> bool {
        while !self.handle.is_finished() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
        if self.handle.join().is_err() {
            tracing::error!(task = %self.name, "task panicked");
        }
        true
    }
}

struct Tracked {
    task: BackgroundTask,
    /// Set for tasks running steamcmd; shutdown waits for these so the child
    /// is killed before the process exits.
    owns_process: bool,
}

/// The blocking services commands are executed against.
#[derive(Debug, Clone)]
pub struct Services {
    pub catalog: CatalogCache,
    pub details: DetailFetcher,
    pub downloader: Downloader,
}

/// Executes commands issued by the state machine.
pub struct TaskRunner {
    services: Arc<Services>,
    tx: Sender<Message>,
    tasks: Vec<Tracked>,
}

impl TaskRunner {
    pub fn new(services: Services, tx: Sender<Message>) -> Self {
        Self {
            services: Arc::new(services),
            tx,
            tasks: Vec::new(),
        }
    }

    pub fn execute_all(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.execute(command);
        }
    }

    pub fn execute(&mut self, command: Command) {
        self.tasks.retain(|t| !t.task.is_finished());

        let owns_process = matches!(command, Command::Download(_));
        let services = Arc::clone(&self.services);
        let (name, spawned) = match command {
            Command::LoadCatalog => (
                "load-catalog".to_string(),
                BackgroundTask::spawn("load-catalog", self.tx.clone(), move |_| {
                    match services.catalog.load() {
                        Ok(catalog) => Message::CatalogLoaded(catalog),
                        Err(e) => Message::Failed(TaskError::Catalog(e)),
                    }
                }),
            ),
            Command::FetchDetails(id) => {
                let name = format!("fetch-details-{id}");
                let spawned = BackgroundTask::spawn(&name, self.tx.clone(), move |_| {
                    match services.details.fetch(id) {
                        Ok(details) => Message::DetailsLoaded { id, details },
                        Err(source) => Message::Failed(TaskError::Details { id, source }),
                    }
                });
                (name, spawned)
            }
            Command::Download(request) => {
                let name = format!("download-{}", request.id);
                let spawned = BackgroundTask::spawn(&name, self.tx.clone(), move |cancel| {
                    let id = request.id;
                    match services.downloader.download(&request, cancel) {
                        Ok(()) => Message::DownloadDone { id },
                        Err(source) => Message::Failed(TaskError::Download { id, source }),
                    }
                });
                (name, spawned)
            }
            Command::ExpireError { token, after } => (
                "expire-error".to_string(),
                BackgroundTask::spawn("expire-error", self.tx.clone(), move |_| {
                    thread::sleep(after);
                    Message::ErrorExpired(token)
                }),
            ),
        };

        match spawned {
            Ok(task) => {
                tracing::debug!(task = task.name(), "spawned task");
                self.tasks.push(Tracked { task, owns_process });
            }
            Err(e) => tracing::error!(task = %name, error = %e, "failed to spawn task"),
        }
    }

    /// Number of tasks that have not finished yet.
    pub fn pending(&mut self) -> usize {
        self.tasks.retain(|t| !t.task.is_finished());
        self.tasks.len()
    }

    /// Cancel everything still running, then wait up to [`SHUTDOWN_GRACE`]
    /// for downloads to kill and reap their steamcmd child. Other threads are
    /// left to die with the process.
    pub fn shutdown(&mut self) {
        let tasks: Vec<Tracked> = self.tasks.drain(..).collect();
        for tracked in &tasks {
            if !tracked.task.is_finished() {
                tracing::debug!(task = tracked.task.name(), "cancelling task");
                tracked.task.cancel();
            }
        }

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        for tracked in tasks.into_iter().filter(|t| t.owns_process) {
            let name = tracked.task.name().to_string();
            if !tracked.task.join_until(deadline) {
                tracing::warn!(task = %name, "download did not stop before exit");
            }
        }
    }
}
