use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt};
use futures_channel::oneshot;
use parking_lot::Mutex;

use super::{setup_instance, Scope, ScopeOptions, ScopeType};
use crate::{errors::ContainerError, providers::Provider, types::Instance};

type Waiter = oneshot::Sender<Result<Instance, ContainerError>>;

enum SingletonState {
    Empty,
    /// A caller is constructing the instance, everyone else waits here
    Creating(Vec<Waiter>),
    Ready(Instance),
}

enum Step {
    Done(Instance),
    Wait(oneshot::Receiver<Result<Instance, ContainerError>>),
    Create,
}

/// Creates the instance once and hands out the same value afterwards
///
/// Concurrent callers arriving during construction wait for its outcome
/// instead of starting their own construction.
pub struct SingletonScope {
    provider: Arc<dyn Provider>,
    options: ScopeOptions,
    state: Mutex<SingletonState>,
}

impl SingletonScope {
    pub fn new(provider: Arc<dyn Provider>, options: ScopeOptions) -> Self {
        SingletonScope {
            provider,
            options,
            state: Mutex::new(SingletonState::Empty),
        }
    }

    async fn create(&self) -> Result<Instance, ContainerError> {
        let guard = CreationGuard {
            state: &self.state,
            finished: false,
        };

        let result = async {
            let instance = self.provider.create().await?;
            setup_instance(&self.options, self.provider.name(), &instance).await?;
            Ok(instance)
        }
        .await;

        guard.finish(result)
    }
}

impl Scope for SingletonScope {
    fn get(&self) -> BoxFuture<'_, Result<Instance, ContainerError>> {
        async move {
            let step = {
                let mut state = self.state.lock();
                match &mut *state {
                    SingletonState::Ready(instance) => Step::Done(instance.clone()),
                    SingletonState::Creating(waiters) => {
                        let (tx, rx) = oneshot::channel();
                        waiters.push(tx);
                        Step::Wait(rx)
                    }
                    SingletonState::Empty => {
                        *state = SingletonState::Creating(Vec::new());
                        Step::Create
                    }
                }
            };

            match step {
                Step::Done(instance) => Ok(instance),
                Step::Wait(rx) => {
                    tracing::debug!("Waiting for \"{}\" to be constructed", self.provider.name());
                    rx.await.unwrap_or_else(|_| {
                        Err(ContainerError::ConstructionAborted(
                            self.provider.name().to_string(),
                        ))
                    })
                }
                Step::Create => self.create().await,
            }
        }
        .boxed()
    }

    fn deinitialize(&self) -> BoxFuture<'_, Result<(), ContainerError>> {
        async move {
            let instance = loop {
                let waiter = {
                    let mut state = self.state.lock();
                    match std::mem::replace(&mut *state, SingletonState::Empty) {
                        SingletonState::Empty => break None,
                        SingletonState::Ready(instance) => break Some(instance),
                        SingletonState::Creating(mut waiters) => {
                            let (tx, rx) = oneshot::channel();
                            waiters.push(tx);
                            *state = SingletonState::Creating(waiters);
                            rx
                        }
                    }
                };

                // Whatever the outcome, the state is checked again
                let _ = waiter.await;
            };

            tracing::debug!("Deinitializing singleton \"{}\"", self.provider.name());
            self.provider.deinitialize_instance(instance).await
        }
        .boxed()
    }
}

/// Resets the scope if the constructing future is dropped before it finished
struct CreationGuard<'a> {
    state: &'a Mutex<SingletonState>,
    finished: bool,
}

impl CreationGuard<'_> {
    /// Stores the outcome and informs all waiters
    fn finish(
        mut self,
        result: Result<Instance, ContainerError>,
    ) -> Result<Instance, ContainerError> {
        self.finished = true;

        let next = match &result {
            Ok(instance) => SingletonState::Ready(instance.clone()),
            Err(_) => SingletonState::Empty,
        };
        let waiters = match std::mem::replace(&mut *self.state.lock(), next) {
            SingletonState::Creating(waiters) => waiters,
            _ => Vec::new(),
        };

        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }

        result
    }
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        // Dropping the waiters cancels their channels
        let mut state = self.state.lock();
        if matches!(*state, SingletonState::Creating(_)) {
            *state = SingletonState::Empty;
        }
    }
}

/// Registered as `@scopes/Singleton`
pub struct SingletonScopeType;

impl ScopeType for SingletonScopeType {
    fn create(
        &self,
        provider: Arc<dyn Provider>,
        options: ScopeOptions,
    ) -> Result<Arc<dyn Scope>, ContainerError> {
        Ok(Arc::new(SingletonScope::new(provider, options)))
    }
}
