use crate::config::Config;
use crate::error::{FILE_NOT_FOUND, ForwardError, INVALID_ARGUMENTS, UPLOAD_FAILED, UploadOutcome};
use crate::pipeline::{ForwardRequest, Pipeline};
use crate::resource::{ContentResolver, ResourceResolver};
use crate::staging::Stager;
use crate::telegram::{TelegramBot, UploadOptions};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

pub const CHANNEL_NAME: &str = "telegram_forwarder";
pub const FORWARD_METHOD: &str = "forwardToTelegram";

/// A host command: method name plus named arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl MethodCall {
    pub fn new(method: &str, arguments: Map<String, Value>) -> Self {
        MethodCall {
            method: method.to_string(),
            arguments,
        }
    }

    pub fn forward(file_path: &str, bot_token: &str, chat_id: &str) -> Self {
        let mut arguments = Map::new();
        arguments.insert("filePath".into(), Value::from(file_path));
        arguments.insert("botToken".into(), Value::from(bot_token));
        arguments.insert("chatId".into(), Value::from(chat_id));
        MethodCall::new(FORWARD_METHOD, arguments)
    }

    /// Non-empty string argument, if present.
    fn argument(&self, key: &str) -> Option<&str> {
        self.arguments
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    Success {
        result: Value,
    },
    Error {
        code: String,
        message: String,
        details: Option<Value>,
    },
    NotImplemented,
}

impl Reply {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Reply::Error {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Reply::Error { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<UploadOutcome> for Reply {
    fn from(outcome: UploadOutcome) -> Self {
        match outcome {
            UploadOutcome::Success => Reply::Success {
                result: Value::Bool(true),
            },
            UploadOutcome::FileNotFound => Reply::error(FILE_NOT_FOUND, "File not found"),
            UploadOutcome::UploadFailed(reason) => Reply::error(UPLOAD_FAILED, reason),
        }
    }
}

enum Pending {
    Ready(Reply),
    Outcome(oneshot::Receiver<UploadOutcome>),
}

/// Completion handle for one method call; resolves exactly once.
pub struct PendingReply(Pending);

impl PendingReply {
    fn ready(reply: Reply) -> Self {
        PendingReply(Pending::Ready(reply))
    }

    pub async fn wait(self) -> Reply {
        match self.0 {
            Pending::Ready(reply) => reply,
            Pending::Outcome(rx) => rx.await.map(Reply::from).unwrap_or_else(|_| aborted()),
        }
    }

    /// For host threads outside the runtime. Panics if called from async context.
    pub fn blocking_wait(self) -> Reply {
        match self.0 {
            Pending::Ready(reply) => reply,
            Pending::Outcome(rx) => rx.blocking_recv().map(Reply::from).unwrap_or_else(|_| aborted()),
        }
    }
}

fn aborted() -> Reply {
    warn!("Forward task ended without an outcome");
    Reply::from(UploadOutcome::from(ForwardError::Worker(
        "no outcome delivered".to_string(),
    )))
}

/// Entry point for host commands. Each accepted call starts one
/// independent pipeline run on the captured runtime.
#[derive(Clone)]
pub struct TelegramForwarder {
    pipeline: Pipeline,
    runtime: Handle,
}

impl TelegramForwarder {
    pub fn new(pipeline: Pipeline, runtime: Handle) -> Self {
        TelegramForwarder { pipeline, runtime }
    }

    /// Build the resolver, stager and bot from `config`, bound to `runtime`.
    pub fn from_config(config: &Config, runtime: Handle) -> Result<Self, ForwardError> {
        let resolver: Arc<dyn ResourceResolver> =
            Arc::new(ContentResolver::new(config.authorities.clone()));
        let stager = Stager::new(&config.scratch_dir).map_err(ForwardError::Staging)?;
        let bot = TelegramBot::new(&UploadOptions::from(config))?;
        Ok(Self::new(Pipeline::new(resolver, stager, bot), runtime))
    }

    pub fn on_method_call(&self, call: &MethodCall) -> PendingReply {
        match call.method.as_str() {
            FORWARD_METHOD => self.forward_to_telegram(call),
            other => {
                debug!("Unknown method on {}: {}", CHANNEL_NAME, other);
                PendingReply::ready(Reply::NotImplemented)
            }
        }
    }

    fn forward_to_telegram(&self, call: &MethodCall) -> PendingReply {
        let request = match (
            call.argument("filePath"),
            call.argument("botToken"),
            call.argument("chatId"),
        ) {
            (Some(file_path), Some(bot_token), Some(chat_id)) => {
                ForwardRequest::new(file_path, bot_token, chat_id)
            }
            _ => Err(ForwardError::InvalidArguments),
        };
        match request {
            Ok(request) => {
                debug!("Forwarding {}", request.resource_reference);
                PendingReply(Pending::Outcome(self.pipeline.spawn(&self.runtime, request)))
            }
            Err(e) => PendingReply::ready(Reply::error(INVALID_ARGUMENTS, e.to_string())),
        }
    }
}
