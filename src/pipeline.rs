use crate::error::{ForwardError, UploadOutcome};
use crate::resource::{self, ResourceResolver};
use crate::staging::Stager;
use crate::telegram::TelegramBot;
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::{JoinError, spawn_blocking};

/// One forward command, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRequest {
    pub resource_reference: String,
    pub credential: String,
    pub destination_id: String,
}

impl ForwardRequest {
    pub fn new(
        resource_reference: impl Into<String>,
        credential: impl Into<String>,
        destination_id: impl Into<String>,
    ) -> Result<Self, ForwardError> {
        let request = ForwardRequest {
            resource_reference: resource_reference.into(),
            credential: credential.into(),
            destination_id: destination_id.into(),
        };
        if request.resource_reference.is_empty()
            || request.credential.is_empty()
            || request.destination_id.is_empty()
        {
            return Err(ForwardError::InvalidArguments);
        }
        Ok(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Resolving,
    Staging,
    Uploading,
    Succeeded,
    Failed(String),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Pending => write!(f, "pending"),
            Stage::Resolving => write!(f, "resolving"),
            Stage::Staging => write!(f, "staging"),
            Stage::Uploading => write!(f, "uploading"),
            Stage::Succeeded => write!(f, "succeeded"),
            Stage::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

struct Progress {
    run_id: String,
    history: Vec<Stage>,
}

impl Progress {
    fn new() -> Self {
        let run_id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        Progress {
            run_id,
            history: vec![Stage::Pending],
        }
    }

    fn advance(&mut self, next: Stage) {
        if let Some(current) = self.history.last() {
            debug!("[{}] {} -> {}", self.run_id, current, next);
        }
        self.history.push(next);
    }
}

/// Resolve, stage, upload and clean up, one request at a time per run.
///
/// Cloning is cheap: the resolver and bot are shared, and no run touches
/// another run's state.
#[derive(Clone)]
pub struct Pipeline {
    resolver: Arc<dyn ResourceResolver>,
    stager: Stager,
    bot: Arc<TelegramBot>,
}

impl Pipeline {
    pub fn new(resolver: Arc<dyn ResourceResolver>, stager: Stager, bot: TelegramBot) -> Self {
        Pipeline {
            resolver,
            stager,
            bot: Arc::new(bot),
        }
    }

    /// Run `request` on `runtime`; the receiver resolves exactly once.
    pub fn spawn(&self, runtime: &Handle, request: ForwardRequest) -> oneshot::Receiver<UploadOutcome> {
        let (tx, rx) = oneshot::channel();
        let pipeline = self.clone();
        runtime.spawn(async move {
            let outcome = pipeline.run(request).await;
            if tx.send(outcome).is_err() {
                warn!("Outcome dropped: caller is gone");
            }
        });
        rx
    }

    pub async fn run(&self, request: ForwardRequest) -> UploadOutcome {
        self.run_traced(request).await.0
    }

    async fn run_traced(&self, request: ForwardRequest) -> (UploadOutcome, Vec<Stage>) {
        let mut progress = Progress::new();
        let outcome = match self.execute(&request, &mut progress).await {
            Ok(()) => {
                progress.advance(Stage::Succeeded);
                info!(
                    "[{}] Forwarded {} to chat {}",
                    progress.run_id, request.resource_reference, request.destination_id
                );
                UploadOutcome::Success
            }
            Err(e) => {
                error!("[{}] Error: {}", progress.run_id, e);
                progress.advance(Stage::Failed(e.to_string()));
                UploadOutcome::from(e)
            }
        };
        (outcome, progress.history)
    }

    async fn execute(
        &self,
        request: &ForwardRequest,
        progress: &mut Progress,
    ) -> Result<(), ForwardError> {
        progress.advance(Stage::Resolving);
        let resolver = self.resolver.clone();
        let reference = request.resource_reference.clone();
        let resolved = spawn_blocking(move || resource::resolve(resolver.as_ref(), &reference))
            .await
            .map_err(worker_error)??;

        progress.advance(Stage::Staging);
        let stager = self.stager.clone();
        let staged = spawn_blocking(move || stager.stage(resolved.stream, &resolved.display_name))
            .await
            .map_err(worker_error)?
            .map_err(ForwardError::Staging)?;

        progress.advance(Stage::Uploading);
        self.bot
            .send_document(&staged, &request.credential, &request.destination_id)
            .await?;

        if let Err(e) = tokio::fs::remove_file(&staged.local_path).await {
            warn!(
                "[{}] Cannot delete {}: {}",
                progress.run_id,
                staged.local_path.display(),
                e
            );
        }
        Ok(())
    }
}

fn worker_error(err: JoinError) -> ForwardError {
    ForwardError::Worker(err.to_string())
}
