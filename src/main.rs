use clap::Parser;
use tracing_subscriber::FmtSubscriber;

use icbu::{
    auth,
    cli::{Cli, Command},
    commands,
    config::Settings,
    error::GopError,
    gateway::GopClient,
    logsink::ResponseLog,
};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    // logger
    let subscriber = FmtSubscriber::builder().with_target(false).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "command failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), GopError> {
    let settings = Settings::load(&cli)?;
    let log = ResponseLog::new(&settings.log_dir);
    match cli.command {
        Command::Auth(cmd) => auth::run(cmd, &settings, &log).await,
        Command::Product(cmd) => {
            let client = GopClient::new(&settings)?;
            commands::product::run(cmd, &client, &log, &settings).await
        }
        Command::Category(cmd) => {
            let client = GopClient::new(&settings)?;
            commands::category::run(cmd, &client, &log).await
        }
        Command::Schema(cmd) => {
            let client = GopClient::new(&settings)?;
            commands::schema::run(cmd, &client, &log).await
        }
        Command::Photobank(cmd) => {
            let client = GopClient::new(&settings)?;
            commands::photobank::run(cmd, &client, &log).await
        }
    }
}
