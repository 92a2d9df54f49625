use wrapp_ioc::Container;

use crate::services::bind_services;

/// DependencyC requires DependencyA, which requires DependencyC
pub async fn run() {
    tracing::info!("-- dependency cycle");

    let container = Container::new();
    if let Err(error) = bind_services(&container, "Singleton", &["DependencyA"]) {
        tracing::error!("Failed to bind the services: {error}");
        return;
    }

    match container.resolve("Client").await {
        Ok(_) => tracing::error!("The cycle went unnoticed"),
        Err(error) => tracing::info!("{error}"),
    }
}
