//! Local stand-in for the Bot API `sendDocument` endpoint.

use crate::telegram::UploadOptions;
use actix_multipart::Multipart;
use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, web};
use futures_util::StreamExt as _;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct ReceivedUpload {
    pub token: String,
    pub chat_id: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub document: Vec<u8>,
}

struct StubState {
    status: u16,
    uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
}

pub struct StubBotApi {
    addr: SocketAddr,
    handle: ServerHandle,
    uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
}

impl StubBotApi {
    /// Bind on an ephemeral port and answer every upload with `status`.
    pub async fn start(status: u16) -> Self {
        let uploads = Arc::new(Mutex::new(Vec::new()));
        let state = web::Data::new(StubState {
            status,
            uploads: uploads.clone(),
        });
        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .route("/{bot}/sendDocument", web::post().to(send_document))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("Failed to bind stub server");
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        StubBotApi {
            addr,
            handle,
            uploads,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn options(&self) -> UploadOptions {
        UploadOptions {
            api_base: self.base_url(),
            connect_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
        }
    }

    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}

async fn send_document(
    path: web::Path<String>,
    mut payload: Multipart,
    state: web::Data<StubState>,
) -> HttpResponse {
    let segment = path.into_inner();
    let mut upload = ReceivedUpload {
        token: segment.strip_prefix("bot").unwrap_or(&segment).to_string(),
        ..ReceivedUpload::default()
    };

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
        };
        let name = field.name().map(str::to_string);
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let content_type = field.content_type().map(|mime| mime.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(bytes) => data.extend_from_slice(&bytes),
                Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
            }
        }

        match name.as_deref() {
            Some("document") => {
                upload.file_name = file_name;
                upload.content_type = content_type;
                upload.document = data;
            }
            Some("chat_id") => upload.chat_id = Some(String::from_utf8_lossy(&data).into_owned()),
            _ => {}
        }
    }
    state.uploads.lock().unwrap().push(upload);

    let status = StatusCode::from_u16(state.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_success() {
        HttpResponse::build(status).json(serde_json::json!({
            "ok": true,
            "result": { "message_id": 1 }
        }))
    } else {
        HttpResponse::build(status).json(serde_json::json!({
            "ok": false,
            "error_code": state.status,
            "description": status.canonical_reason().unwrap_or("Error"),
        }))
    }
}
