use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use futures::FutureExt;
use wrapp_ioc::{
    Args, Constructor, Container, ContainerError, DynError, HookFuture, InstanceOptions,
    Lifecycle, ValidationError,
};

#[derive(Default)]
struct Counters {
    c_constructed: AtomicUsize,
    c_initialized: AtomicUsize,
    c_deinitialized: AtomicUsize,
}

struct DependencyC {
    counters: Arc<Counters>,
}

impl DependencyC {
    async fn initialize(&self) -> Result<(), DynError> {
        tokio::time::sleep(Duration::from_millis(900)).await;
        self.counters.c_initialized.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Lifecycle for DependencyC {
    fn lifecycle_hook(&self, name: &str) -> Option<HookFuture<'_>> {
        match name {
            "initialize" => Some(self.initialize().boxed()),
            "deinitialize" => {
                self.counters.c_deinitialized.fetch_add(1, Ordering::SeqCst);
                Some(async { Ok(()) }.boxed())
            }
            _ => None,
        }
    }
}

struct DependencyA {
    c: Arc<DependencyC>,
}
impl Lifecycle for DependencyA {}

struct DependencyB {
    c: Arc<DependencyC>,
}
impl Lifecycle for DependencyB {}

struct Client {
    a: Arc<DependencyA>,
    b: Arc<DependencyB>,
}
impl Lifecycle for Client {}

fn container(counters: Arc<Counters>, client_scope: &str) -> Container {
    let container = Container::new();

    container
        .bind_instance(
            "Client",
            Constructor::new(|args: Args| {
                Ok(Client {
                    a: args.get(0)?,
                    b: args.get(1)?,
                })
            }),
            &["DependencyA", "DependencyB"],
            InstanceOptions::new().with_scope(client_scope),
        )
        .unwrap();
    container
        .bind_instance(
            "DependencyA",
            Constructor::new(|args: Args| Ok(DependencyA { c: args.get(0)? })),
            &["DependencyC"],
            InstanceOptions::new(),
        )
        .unwrap();
    container
        .bind_instance(
            "DependencyB",
            Constructor::new(|args: Args| Ok(DependencyB { c: args.get(0)? })),
            &["DependencyC"],
            InstanceOptions::new(),
        )
        .unwrap();
    container
        .bind_instance(
            "DependencyC",
            Constructor::new(move |_| {
                counters.c_constructed.fetch_add(1, Ordering::SeqCst);
                Ok(DependencyC {
                    counters: counters.clone(),
                })
            }),
            &[],
            InstanceOptions::new()
                .with_initialize(true)
                .with_deinitialize(true),
        )
        .unwrap();

    container
}

#[tokio::test]
async fn concurrent_resolution_constructs_shared_dependencies_once() {
    let counters = Arc::new(Counters::default());
    let container = container(counters.clone(), "Singleton");

    let started = Instant::now();
    let (first, second) = tokio::join!(
        container.resolve_as::<Client>("Client"),
        container.resolve_as::<Client>("Client"),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert!(started.elapsed() >= Duration::from_millis(900));
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.a.c, &first.b.c));
    assert_eq!(counters.c_constructed.load(Ordering::SeqCst), 1);
    assert_eq!(counters.c_initialized.load(Ordering::SeqCst), 1);

    container.shutdown().await.unwrap();
    assert_eq!(counters.c_deinitialized.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn prototype_clients_share_the_singleton_dependency() {
    let counters = Arc::new(Counters::default());
    let container = container(counters.clone(), "Prototype");

    let (first, second) = tokio::join!(
        container.resolve_as::<Client>("Client"),
        container.resolve_as::<Client>("Client"),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.a.c, &second.b.c));
    assert_eq!(counters.c_constructed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn a_cycle_is_reported_before_anything_is_constructed() {
    let counters = Arc::new(Counters::default());
    let container = Container::new();

    container
        .bind_instance(
            "Client",
            Constructor::new(|args: Args| {
                Ok(Client {
                    a: args.get(0)?,
                    b: args.get(1)?,
                })
            }),
            &["DependencyA", "DependencyB"],
            InstanceOptions::new(),
        )
        .unwrap();
    container
        .bind_instance(
            "DependencyA",
            Constructor::new(|args: Args| Ok(DependencyA { c: args.get(0)? })),
            &["DependencyC"],
            InstanceOptions::new(),
        )
        .unwrap();
    container
        .bind_instance(
            "DependencyB",
            Constructor::new(|args: Args| Ok(DependencyB { c: args.get(0)? })),
            &["DependencyC"],
            InstanceOptions::new(),
        )
        .unwrap();
    let c_counters = counters.clone();
    container
        .bind_instance(
            "DependencyC",
            Constructor::new(move |_| {
                c_counters.c_constructed.fetch_add(1, Ordering::SeqCst);
                Ok(DependencyC {
                    counters: c_counters.clone(),
                })
            }),
            &["DependencyA"],
            InstanceOptions::new(),
        )
        .unwrap();

    let error = container.resolve("Client").await.unwrap_err();

    match error {
        ContainerError::Validation(ValidationError::CyclicDependency { target, path }) => {
            assert_eq!(target, "Client");
            assert_eq!(path, "Client → DependencyA ⇄ DependencyC ⇄ DependencyA");
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
    assert_eq!(counters.c_constructed.load(Ordering::SeqCst), 0);
}
