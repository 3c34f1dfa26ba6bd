//! Bookshelf - book catalog and review service
//!
//! This is the main entry point. All operations are exposed via GraphQL at /graphql.

use std::sync::Arc;

use bookshelf::cli::{CliOptions, Command, SeedArgs};
use bookshelf::config::Config;
use bookshelf::db::Database;
use bookshelf::db::seed::{SeedOptions, Seeder};
use bookshelf::services::init_tracing;
use bookshelf::{AppState, build_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let options = CliOptions::from_args()?;
    let config = Arc::new(Config::from_env()?);

    init_tracing(config.log_format);

    if config.session_secret_generated {
        tracing::warn!("SESSION_SECRET is not set; using a random secret. Sessions will not survive a restart");
    }

    let db = Database::connect(&config.database_url, config.database_max_connections).await?;
    db.migrate().await?;
    tracing::info!("Database connected");

    match options.command {
        Command::Serve => serve(config, db).await,
        Command::Seed(args) => seed(&config, db, args).await,
    }
}

async fn serve(config: Arc<Config>, db: Database) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let state = AppState::new(config.clone(), db);
    let app = build_app(state);

    tracing::info!("Listening on {}", addr);
    tracing::info!("GraphQL playground: http://localhost:{}/graphql", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn seed(config: &Config, db: Database, args: SeedArgs) -> anyhow::Result<()> {
    let options = SeedOptions {
        users: args.users,
        query: args.query,
        max_results: args.max_results,
        bcrypt_cost: config.bcrypt_cost,
    };

    let summary = Seeder::new(db)?.run(&options).await?;
    tracing::info!(?summary, "Seeding finished");

    Ok(())
}
