use clap::{Arg, ArgMatches, Command, value_parser};
use dotenv::dotenv;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use telegram_forwarder::{Config, MethodCall, Reply, TelegramForwarder, server};
use tokio::runtime::Handle;

fn cli() -> Command {
    Command::new("telegram-forwarder")
        .about("Forward local files to a Telegram chat as documents")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML config file"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("serve").about("Accept forward commands over HTTP").arg(
                Arg::new("port")
                    .long("port")
                    .short('p')
                    .value_parser(value_parser!(u16)),
            ),
        )
        .subcommand(
            Command::new("forward")
                .about("Forward one resource and exit")
                .arg(Arg::new("reference").required(true))
                .arg(Arg::new("token").long("token"))
                .arg(Arg::new("chat-id").long("chat-id")),
        )
}

#[actix_web::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();
    let config = match Config::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path)) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let forwarder = match TelegramForwarder::from_config(&config, Handle::current()) {
        Ok(forwarder) => forwarder,
        Err(e) => {
            error!("Cannot start forwarder: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match matches.subcommand() {
        Some(("serve", sub)) => {
            let port = sub.get_one::<u16>("port").copied().unwrap_or(config.port);
            match server::serve(forwarder, &config.bind_addr, port).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("Server error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Some(("forward", sub)) => forward(&forwarder, &config, sub).await,
        _ => ExitCode::FAILURE,
    }
}

async fn forward(forwarder: &TelegramForwarder, config: &Config, sub: &ArgMatches) -> ExitCode {
    let arg = |key: &str, fallback: &Option<String>| {
        sub.get_one::<String>(key)
            .cloned()
            .or_else(|| fallback.clone())
            .unwrap_or_default()
    };
    let reference = arg("reference", &None);
    let call = MethodCall::forward(
        &reference,
        &arg("token", &config.bot_token),
        &arg("chat-id", &config.chat_id),
    );

    let reply = forwarder.on_method_call(&call).wait().await;
    match serde_json::to_string(&reply) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Cannot encode reply: {}", e),
    }
    match reply {
        Reply::Success { .. } => {
            info!("Forwarded {}", reference);
            ExitCode::SUCCESS
        }
        _ => ExitCode::FAILURE,
    }
}
