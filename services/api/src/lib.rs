mod cli;
mod infra;
mod routes;
mod server;

use trustdesk::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
