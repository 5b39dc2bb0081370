mod cli;
mod infra;
mod join;
mod routes;
mod server;

use void_walker::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
