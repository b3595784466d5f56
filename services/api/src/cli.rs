use crate::server;
use clap::{Args, Parser, Subcommand};
use realty::config::AppConfig;
use realty::error::AppError;
use realty::storage::PgStore;
use realty::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "realty-api",
    about = "Serve the realty storefront API or prepare its database",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Apply the embedded schema migrations to DATABASE_URL and exit
    Migrate,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Migrate => migrate().await,
    }
}

async fn migrate() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let store = PgStore::connect(&config.database).await?;
    store.migrate().await?;
    tracing::info!("database migrations applied");
    store.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_and_accepts_overrides() {
        let cli = Cli::try_parse_from(["realty-api"]).expect("no arguments parse");
        assert!(cli.command.is_none());

        let args = ["realty-api", "serve", "--host", "0.0.0.0", "--port", "8080"];
        let cli = Cli::try_parse_from(args).expect("serve flags parse");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
                assert_eq!(args.port, Some(8080));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn migrate_takes_no_arguments() {
        let cli = Cli::try_parse_from(["realty-api", "migrate"]).expect("migrate parses");
        assert!(matches!(cli.command, Some(Command::Migrate)));
        assert!(Cli::try_parse_from(["realty-api", "migrate", "--port", "1"]).is_err());
    }
}
