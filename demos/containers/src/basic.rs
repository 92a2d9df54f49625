use std::{error::Error, sync::Arc, time::Instant};

use wrapp_ioc::Container;

use crate::services::{bind_services, Client};

/// Two concurrent resolutions share one Client and one DependencyC
pub async fn run() -> Result<(), Box<dyn Error>> {
    tracing::info!("-- basic");

    let container = Container::new();
    bind_services(&container, "Singleton", &[])?;
    container.validate_all()?;

    let started = Instant::now();
    let (first, second) = tokio::join!(
        container.resolve_as::<Client>("Client"),
        container.resolve_as::<Client>("Client"),
    );
    let (first, second) = (first?, second?);

    tracing::info!(
        "Resolved twice in {:?}, same client: {}, same DependencyC: {}",
        started.elapsed(),
        Arc::ptr_eq(&first, &second),
        Arc::ptr_eq(&first.a.c, &second.b.c),
    );

    container.shutdown().await?;
    Ok(())
}
