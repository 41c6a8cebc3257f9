pub mod api;

pub use api::{TelegramBot, UploadOptions};
