use std::error::Error;

use wrapp_ioc::{
    Args, BoundFunction, Container, DynError, FunctionFn, FunctionOptions, Instance,
    ObjectOptions, PLACEHOLDER,
};

struct Greeting(String);

/// A function with one injected and one caller supplied argument
pub async fn run() -> Result<(), Box<dyn Error>> {
    tracing::info!("-- functions");

    let container = Container::new();
    container.bind_object(
        "Greeting",
        Instance::new(Greeting("Hello".to_string())),
        ObjectOptions::new(),
    )?;
    container.bind_function(
        "Greet",
        FunctionFn::new(|args: Args| async move {
            let greeting = args.get::<Greeting>(0)?;
            let name = args.get::<String>(1)?;
            Ok::<_, DynError>(format!("{}, {name}!", greeting.0))
        }),
        &["Greeting", PLACEHOLDER],
        FunctionOptions::new(),
    )?;

    let greet = container.resolve_as::<BoundFunction>("Greet").await?;
    for name in ["Ada", "Grace"] {
        let message = greet
            .call_as::<String, _>([Instance::new(name.to_string())])
            .await?;
        tracing::info!("{message}");
    }

    Ok(())
}
