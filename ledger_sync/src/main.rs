use dotenvy::dotenv;
use ledger_sync::{cli::handle_command_line_args, config::SyncServerConfig, service::run_service};
use log::info;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    if handle_command_line_args() {
        return;
    }
    let config = SyncServerConfig::from_env_or_default();

    info!("🚀️ Starting ledger sync against {}", config.coins_config.base_url);
    match run_service(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
