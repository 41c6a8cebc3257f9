//! Forward a locally addressable resource to a Telegram chat as a document.
//!
//! A [`channel::TelegramForwarder`] validates host commands and runs one
//! [`pipeline::Pipeline`] per command in the background: the resource is
//! resolved, staged to a scratch file, uploaded with `sendDocument`, and
//! the scratch file is deleted on success.

pub mod channel;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod resource;
pub mod server;
pub mod staging;
pub mod telegram;

#[cfg(test)]
mod testing;

pub use channel::{MethodCall, PendingReply, Reply, TelegramForwarder};
pub use config::Config;
pub use error::{ForwardError, UploadOutcome};
pub use pipeline::{ForwardRequest, Pipeline};
