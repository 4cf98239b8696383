//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development), tracing every lookup:
//! ```bash
//! SCOPED_INJECTOR_LOG=trace cargo run --example logging --features logging-pretty
//! ```

use scoped_injector::{
    ApplicationScope, Container, Injector, Provider, SingletonScope, Token, logging,
};

fn main() {
    logging::LoggingBuilder::from_env().pretty().init();

    println!("=== Scoped Injector Logging Demo ===\n");

    let url = Token::new("DatabaseUrl");
    let pool = Token::new("Pool");

    // logs: "Built container"
    let base = Container::builder()
        .name("base")
        .provider(Provider::value(url.clone(), "postgres://localhost/mydb").build())
        .build();
    let app = Container::builder()
        .name("app")
        .parent(base)
        .provider(
            Provider::factory(pool.clone(), |args| Ok(format!("pool({})", args.get::<&str>(0)?)))
                .depends_on(url)
                .singleton()
                .named("Pool")
                .build(),
        )
        .build();

    println!("{}", app.tree());

    // logs: "Creating injector", inside the parent's span for the child
    let root = Injector::root::<ApplicationScope>(app);
    let singleton = root.create_child_injector::<SingletonScope>();

    // logs: "Activating provider" once, then cached hits at trace level
    for _ in 0..2 {
        match singleton.get::<String>(&pool) {
            Ok(pool) => println!("  [App] resolved {pool}"),
            Err(err) => println!("  [App] {err}"),
        }
    }

    // Scope errors are reported, not logged
    if let Err(err) = root.get::<String>(&pool) {
        println!("  [App] {err}");
    }

    println!("\n=== Demo Complete ===");
}
