use std::error::Error;

mod basic;
mod child;
mod dependency_cycle;
mod functions;
mod modules;
mod services;
mod variants;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wrapp_ioc=debug".into()),
        )
        .with_target(false)
        .init();

    basic::run().await?;
    variants::run().await?;
    functions::run().await?;
    child::run().await?;
    modules::run().await?;
    dependency_cycle::run().await;

    Ok(())
}
