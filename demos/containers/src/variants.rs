use std::{
    error::Error,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use wrapp_ioc::{
    Container, DynError, Factory, FactoryFn, Instance, LinkOptions, ObjectOptions,
};

use crate::services::{bind_services, Client};

#[derive(Debug, Clone)]
struct Settings {
    retries: u32,
}

/// Scopes, objects and factories side by side
pub async fn run() -> Result<(), Box<dyn Error>> {
    tracing::info!("-- variants");

    let container = Container::new();
    bind_services(&container, "Prototype", &[])?;

    let first = container.resolve_as::<Client>("Client").await?;
    let second = container.resolve_as::<Client>("Client").await?;
    tracing::info!(
        "Prototype clients differ: {}, their DependencyC is shared: {}",
        !Arc::ptr_eq(&first, &second),
        Arc::ptr_eq(&first.a.c, &second.a.c),
    );

    container.bind_object(
        "Settings",
        Instance::cloneable(Settings { retries: 3 }),
        ObjectOptions::new().with_clone(true),
    )?;
    let settings = container.resolve_as::<Settings>("Settings").await?;
    tracing::info!("Cloned settings: {settings:?}");

    let ticket = Arc::new(AtomicU32::new(0));
    container.bind_factory(
        "Ticket",
        FactoryFn::new(move |_| {
            let number = ticket.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, DynError>(number) }
        }),
        &[],
    )?;
    container.bind_link("FirstTicket", "Ticket", LinkOptions::new())?;

    let factory = container.resolve_as::<Factory>("@factories/Ticket").await?;
    let first_ticket = container.resolve_as::<u32>("FirstTicket").await?;
    let next_ticket = factory.create_as::<u32>().await?;
    let again = container.resolve_as::<u32>("FirstTicket").await?;
    tracing::info!("Linked ticket {first_ticket} stays {again}, the factory moved on to {next_ticket}");

    container.shutdown().await?;
    Ok(())
}
