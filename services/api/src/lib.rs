mod cli;
mod infra;
mod routes;
mod server;
mod throttle;

use realty::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
