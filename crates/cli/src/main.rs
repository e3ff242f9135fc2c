use anyhow::Context;
use clap::{Parser, Subcommand};

use catalog_kernel::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "catalog-cli", version, about = "Catalog server and maintenance commands")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending module migrations to the configured database
    Migrate,
    /// List the migrations contributed by each module
    Migrations,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load catalog settings")?;
    catalog_telemetry::init(&settings.telemetry)?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;

    match cli.command {
        Command::Serve => runtime.block_on(catalog_app::run(settings)),
        Command::Migrate => runtime.block_on(async {
            let store = catalog_app::open_store(&settings)?;
            let registry = catalog_app::build_registry();
            let applied = catalog_app::migrate(&store, &registry).await?;
            println!("applied {applied} migration(s) to {}", store.path().display());
            Ok(())
        }),
        Command::Migrations => {
            let registry = catalog_app::build_registry();
            for (module, migration) in registry.collect_migrations() {
                println!("{}/{}", module, migration.id);
            }
            Ok(())
        }
    }
}
