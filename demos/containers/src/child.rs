use std::error::Error;

use wrapp_ioc::{Container, Instance, ObjectOptions, PARENT_BINDING};

#[derive(Debug)]
struct Environment(&'static str);

/// Children see the bindings of their parent and may shadow them
pub async fn run() -> Result<(), Box<dyn Error>> {
    tracing::info!("-- child containers");

    let root = Container::new();
    root.bind_object("Environment", Instance::new(Environment("production")), ObjectOptions::new())?;

    let inherited = root.create_child();
    let shadowing = root.create_child();
    shadowing.bind_object("Environment", Instance::new(Environment("test")), ObjectOptions::new())?;

    tracing::info!(
        "Inherited {:?}, shadowed {:?}",
        inherited.resolve_as::<Environment>("Environment").await?,
        shadowing.resolve_as::<Environment>("Environment").await?,
    );

    let parent = shadowing.resolve_as::<Container>(PARENT_BINDING).await?;
    tracing::info!(
        "The parent still has {:?}",
        parent.resolve_as::<Environment>("Environment").await?
    );

    Ok(())
}
