use crate::channel::{FORWARD_METHOD, MethodCall, Reply, TelegramForwarder};
use crate::error::{FILE_NOT_FOUND, INVALID_ARGUMENTS};
use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, post, web};
use log::info;
use serde_json::{Map, Value};

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("telegram_forwarder is running")
}

/// Generic host command endpoint.
#[post("/invoke")]
async fn invoke(
    forwarder: web::Data<TelegramForwarder>,
    call: web::Json<MethodCall>,
) -> impl Responder {
    let reply = forwarder.on_method_call(&call).wait().await;
    respond(reply)
}

#[post("/forwardToTelegram")]
async fn forward_to_telegram(
    forwarder: web::Data<TelegramForwarder>,
    arguments: web::Json<Map<String, Value>>,
) -> impl Responder {
    let call = MethodCall::new(FORWARD_METHOD, arguments.into_inner());
    let reply = forwarder.on_method_call(&call).wait().await;
    respond(reply)
}

fn respond(reply: Reply) -> HttpResponse {
    let mut builder = match &reply {
        Reply::Success { .. } => HttpResponse::Ok(),
        Reply::NotImplemented => HttpResponse::NotImplemented(),
        Reply::Error { code, .. } if code == INVALID_ARGUMENTS => HttpResponse::BadRequest(),
        Reply::Error { code, .. } if code == FILE_NOT_FOUND => HttpResponse::NotFound(),
        Reply::Error { .. } => HttpResponse::BadGateway(),
    };
    builder.json(reply)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(hello).service(invoke).service(forward_to_telegram);
}

pub async fn serve(forwarder: TelegramForwarder, bind_addr: &str, port: u16) -> std::io::Result<()> {
    info!("Listening on {}:{}", bind_addr, port);
    let forwarder = web::Data::new(forwarder);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![actix_web::http::header::CONTENT_TYPE]);
        App::new()
            .wrap(cors)
            .app_data(forwarder.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
