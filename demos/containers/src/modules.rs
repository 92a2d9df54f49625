//! Modules composing their own child containers out of shared bindings
//!
//! Every module gets `@containers/self`, builds a child container from it
//! and shuts that child down again when the root container shuts down.

use std::{
    error::Error,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use futures::FutureExt;
use wrapp_ioc::{
    Args, Constructor, Container, DynError, HookFuture, Instance, InstanceOptions, Lifecycle,
    ObjectOptions, WeakContainer, SELF_BINDING,
};

struct Config {
    database_uri: &'static str,
}

#[derive(Default)]
struct RequestCounter {
    current: AtomicUsize,
}

struct DatabaseConnection {
    config: Arc<Config>,
}

impl DatabaseConnection {
    async fn connect(&self) -> Result<(), DynError> {
        tracing::info!("Shared: connecting to \"{}\"", self.config.database_uri);
        tokio::time::sleep(Duration::from_millis(300)).await;
        tracing::info!("Shared: connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DynError> {
        tracing::info!("Shared: disconnected");
        Ok(())
    }
}

impl Lifecycle for DatabaseConnection {
    fn lifecycle_hook(&self, name: &str) -> Option<HookFuture<'_>> {
        match name {
            "initialize" => Some(self.connect().boxed()),
            "deinitialize" => Some(self.disconnect().boxed()),
            _ => None,
        }
    }
}

/// Component of [Reporting], prints the request count
struct Info {
    counter: Arc<RequestCounter>,
}

impl Lifecycle for Info {
    fn lifecycle_hook(&self, name: &str) -> Option<HookFuture<'_>> {
        match name {
            "initialize" => Some(
                async {
                    let current = self.counter.current.load(Ordering::SeqCst);
                    tracing::info!("Reporting: {current} request(s) so far");
                    Ok(())
                }
                .boxed(),
            ),
            "deinitialize" => Some(
                async {
                    tracing::info!("Reporting: info stopped");
                    Ok(())
                }
                .boxed(),
            ),
            _ => None,
        }
    }
}

/// Component of [Serving], one per resolution
struct Server {
    id: usize,
    _database: Arc<DatabaseConnection>,
}

impl Lifecycle for Server {
    fn lifecycle_hook(&self, name: &str) -> Option<HookFuture<'_>> {
        match name {
            "initialize" => Some(
                async {
                    tracing::info!("Serving: server {} listening", self.id);
                    Ok(())
                }
                .boxed(),
            ),
            "deinitialize" => Some(
                async {
                    tracing::info!("Serving: server {} closed", self.id);
                    Ok(())
                }
                .boxed(),
            ),
            _ => None,
        }
    }
}

/// A composition root of its own, living in a child of the root container
struct Module {
    name: &'static str,
    container: Container,
    components: &'static [&'static str],
}

impl Module {
    fn child_of(name: &'static str, args: &Args) -> Result<Container, DynError> {
        let parent = args
            .get::<WeakContainer>(0)?
            .upgrade()
            .ok_or_else(|| format!("the container of {name} is gone"))?;
        Ok(parent.create_child())
    }

    async fn initialize(&self) -> Result<(), DynError> {
        self.container.validate_all()?;
        self.container.resolve_all(self.components).await?;
        Ok(())
    }

    async fn deinitialize(&self) -> Result<(), DynError> {
        tracing::info!("{}: deinitializing components", self.name);
        self.container.shutdown().await?;
        Ok(())
    }
}

impl Lifecycle for Module {
    fn lifecycle_hook(&self, name: &str) -> Option<HookFuture<'_>> {
        match name {
            "initialize" => Some(self.initialize().boxed()),
            "deinitialize" => Some(self.deinitialize().boxed()),
            _ => None,
        }
    }
}

fn reporting(args: Args) -> Result<Module, DynError> {
    let container = Module::child_of("Reporting", &args)?;
    container.bind_instance(
        "Info",
        Constructor::new(|args: Args| Ok(Info { counter: args.get(0)? })),
        &["RequestCounter"],
        InstanceOptions::new()
            .with_initialize(true)
            .with_deinitialize(true),
    )?;

    Ok(Module {
        name: "Reporting",
        container,
        components: &["Info"],
    })
}

fn serving(args: Args) -> Result<Module, DynError> {
    let container = Module::child_of("Serving", &args)?;
    let next_id = Arc::new(AtomicUsize::new(1));
    container.bind_instance(
        "Server",
        Constructor::new(move |args: Args| {
            args.get::<RequestCounter>(1)?
                .current
                .fetch_add(1, Ordering::SeqCst);
            Ok(Server {
                id: next_id.fetch_add(1, Ordering::SeqCst),
                _database: args.get(0)?,
            })
        }),
        &["DatabaseConnection", "RequestCounter"],
        InstanceOptions::new()
            .with_scope("Prototype")
            .with_track_instances(true)
            .with_initialize(true)
            .with_deinitialize(true),
    )?;

    // Prototype scope: two servers sharing the singleton database connection
    Ok(Module {
        name: "Serving",
        container,
        components: &["Server", "Server"],
    })
}

pub async fn run() -> Result<(), Box<dyn Error>> {
    tracing::info!("-- modules");

    let container = Container::new();
    container.bind_object(
        "Config",
        Instance::new(Config {
            database_uri: "<connection string>",
        }),
        ObjectOptions::new(),
    )?;
    container.bind_object(
        "RequestCounter",
        Instance::new(RequestCounter::default()),
        ObjectOptions::new(),
    )?;
    container.bind_instance(
        "DatabaseConnection",
        Constructor::new(|args: Args| Ok(DatabaseConnection { config: args.get(0)? })),
        &["Config"],
        InstanceOptions::new()
            .with_initialize(true)
            .with_deinitialize(true),
    )?;

    // Serving comes first so its servers are counted by the time Reporting starts
    for (name, constructor) in [
        ("Serving", Constructor::new(serving)),
        ("Reporting", Constructor::new(reporting)),
    ] {
        container.bind_instance(
            name,
            constructor,
            &[SELF_BINDING],
            InstanceOptions::new()
                .with_initialize(true)
                .with_deinitialize(true),
        )?;
        container.resolve(name).await?;
    }

    // Releases the modules together with the child containers they hold
    container.shutdown().await?;
    Ok(())
}
