use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use research_registry::{
    api,
    config::{DatabaseArgs, ServerConfig, DEFAULT_PORT, DEFAULT_SEARCH_LIMIT},
    mcp,
};

#[derive(Parser)]
#[command(name = "rreg")]
#[command(about = "Research project and researcher directory server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve(ServerConfig),
    /// Start MCP server via stdio
    Mcp {
        /// Maximum researchers returned by a name search (0 = unbounded)
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        search_limit: usize,

        #[command(flatten)]
        db: DatabaseArgs,
    },
    /// Create or upgrade the database schema and exit
    Migrate(DatabaseArgs),
    /// Register a researcher, or rename an existing researcher id
    AddResearcher {
        /// Researcher id
        id: String,
        /// Display name
        name: String,

        #[command(flatten)]
        db: DatabaseArgs,
    },
    /// Check whether a server is answering
    Status {
        /// Base URL of the server
        #[arg(long, default_value_t = format!("http://127.0.0.1:{}", DEFAULT_PORT))]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the MCP stdio transport keeps stdout to itself.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                "research_registry=debug,registry_core=debug,tower_http=debug".into()
            }),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let command = match cli.command {
        Some(command) => command,
        None => Commands::Serve(ServerConfig::from_env()?),
    };

    match command {
        Commands::Serve(config) => serve(config).await?,
        Commands::Mcp { search_limit, db } => {
            let db = db.open()?;
            mcp::run_stdio_server(db, (search_limit > 0).then_some(search_limit)).await?;
        }
        Commands::Migrate(db) => {
            let db = db.open()?;
            println!("Database schema at version {}", db.schema_version()?);
        }
        Commands::AddResearcher { id, name, db } => {
            let db = db.open()?;
            db.register_researcher(&id, &name)?;
            println!("Registered {} as {}", id, name);
        }
        Commands::Status { url } => {
            let health = format!("{}/api/health", url.trim_end_matches('/'));
            match reqwest::get(&health).await {
                Ok(response) if response.status().is_success() => {
                    let body: serde_json::Value = response.json().await?;
                    println!("Server at {} is up: {}", url, body);
                }
                Ok(response) => println!("Server at {} answered {}", url, response.status()),
                Err(err) => println!("Server at {} is not reachable: {}", url, err),
            }
        }
    }

    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    tracing::info!("Starting research registry server on {}", addr);

    let db = config.db.open()?;
    let app = api::create_router(api::AppState::from_config(db, &config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Research registry listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}
