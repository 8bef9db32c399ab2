mod catalog;
mod requests;

use clap::{Parser, Subcommand};
use handyhub_core::{RequestStatus, StoreBackend};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "handyhub-cli")]
#[command(about = "HandyHub service request administration")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List service requests, newest first.
    List {
        /// Only show requests in this status.
        #[arg(long)]
        status: Option<RequestStatus>,
        /// Case-insensitive match on client name, service type or address.
        #[arg(long)]
        search: Option<String>,
    },
    /// Move a request to a new status.
    SetStatus { id: String, status: RequestStatus },
    /// Apply pending database migrations (postgres store only).
    Migrate,
    /// Print the service catalog in effect.
    Catalog,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = handyhub_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::List { status, search }) => {
            let store = open_shared_store(&config).await?;
            requests::run_list(store.as_ref(), status, search.as_deref()).await?;
        }
        Some(Commands::SetStatus { id, status }) => {
            let store = open_shared_store(&config).await?;
            requests::run_set_status(store.as_ref(), &id, status).await?;
        }
        Some(Commands::Migrate) => run_migrate(&config).await?,
        Some(Commands::Catalog) => catalog::run_catalog(config.catalog_path.as_deref())?,
        None => println!("handyhub-cli: use --help to list commands"),
    }

    Ok(())
}

/// The memory store lives inside one process, so the CLI would only ever see
/// an empty one.
fn ensure_shared_backend(backend: StoreBackend) -> anyhow::Result<()> {
    if backend == StoreBackend::Memory {
        anyhow::bail!(
            "HANDYHUB_STORE is memory; the CLI needs a shared store. \
             Set HANDYHUB_STORE=postgres (with DATABASE_URL) or json_file"
        );
    }
    Ok(())
}

async fn open_shared_store(
    config: &handyhub_core::AppConfig,
) -> anyhow::Result<std::sync::Arc<dyn handyhub_db::RequestStore>> {
    ensure_shared_backend(config.store_backend)?;
    Ok(handyhub_db::open_store(config).await?)
}

async fn run_migrate(config: &handyhub_core::AppConfig) -> anyhow::Result<()> {
    if config.store_backend != StoreBackend::Postgres {
        anyhow::bail!(
            "migrate only applies to the postgres store; HANDYHUB_STORE is {}",
            config.store_backend
        );
    }
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for migrate"))?;

    let pool =
        handyhub_db::connect_pool(url, handyhub_db::PoolConfig::from_app_config(config)).await?;
    let applied = handyhub_db::run_migrations(&pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

#[cfg(test)]
mod tests;
