//! Services shared by the demos
//!
//! `Client` needs `DependencyA` and `DependencyB`, which both need `DependencyC`.

use std::{sync::Arc, time::Duration};

use futures::FutureExt;
use wrapp_ioc::{
    Args, Constructor, Container, ContainerError, DynError, HookFuture, InstanceOptions,
    Lifecycle,
};

pub struct DependencyC;

impl DependencyC {
    async fn initialize(&self) -> Result<(), DynError> {
        tracing::info!("DependencyC is connecting");
        tokio::time::sleep(Duration::from_millis(500)).await;
        tracing::info!("DependencyC is ready");
        Ok(())
    }

    async fn deinitialize(&self) -> Result<(), DynError> {
        tracing::info!("DependencyC is closed");
        Ok(())
    }
}

impl Lifecycle for DependencyC {
    fn lifecycle_hook(&self, name: &str) -> Option<HookFuture<'_>> {
        match name {
            "initialize" => Some(self.initialize().boxed()),
            "deinitialize" => Some(self.deinitialize().boxed()),
            _ => None,
        }
    }
}

pub struct DependencyA {
    pub c: Arc<DependencyC>,
}
impl Lifecycle for DependencyA {}

pub struct DependencyB {
    pub c: Arc<DependencyC>,
}
impl Lifecycle for DependencyB {}

pub struct Client {
    pub a: Arc<DependencyA>,
    pub b: Arc<DependencyB>,
}
impl Lifecycle for Client {}

/// Binds the four services, `c_dependencies` lets DependencyC depend on others
pub fn bind_services(
    container: &Container,
    client_scope: &str,
    c_dependencies: &[&str],
) -> Result<(), ContainerError> {
    container.bind_instance(
        "Client",
        Constructor::new(|args: Args| {
            Ok(Client {
                a: args.get(0)?,
                b: args.get(1)?,
            })
        }),
        &["DependencyA", "DependencyB"],
        InstanceOptions::new().with_scope(client_scope),
    )?;
    container.bind_instance(
        "DependencyA",
        Constructor::new(|args: Args| Ok(DependencyA { c: args.get(0)? })),
        &["DependencyC"],
        InstanceOptions::new(),
    )?;
    container.bind_instance(
        "DependencyB",
        Constructor::new(|args: Args| Ok(DependencyB { c: args.get(0)? })),
        &["DependencyC"],
        InstanceOptions::new(),
    )?;
    container.bind_instance(
        "DependencyC",
        Constructor::new(|_| Ok(DependencyC)),
        c_dependencies,
        InstanceOptions::new()
            .with_initialize(true)
            .with_deinitialize(true),
    )?;

    Ok(())
}
