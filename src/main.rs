use std::sync::Arc;

use config::Config;
use mail::sendmail::Mailer;
use media::{LocalMediaStore, MediaStore};
use repositories::{posts_repo::PostsRepository, user_repo::UserRepository, PostgresRepo};
use routes::{configure_cors, create_routes};
use services::{auth::AuthService, posts::PostsService};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use self::errors::{Error, Result};

mod config;
mod errors;
mod handlers;
mod mail;
mod media;
mod middleware;
mod models;
mod render;
mod repositories;
mod routes;
mod services;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth_service: AuthService,
    pub posts_service: PostsService,
    pub mailer: Option<Arc<Mailer>>,
}

impl AppState {
    pub fn new(
        config: Config,
        posts_repo: Arc<dyn PostsRepository>,
        user_repo: Arc<dyn UserRepository>,
        media: Arc<dyn MediaStore>,
        mailer: Option<Arc<Mailer>>,
    ) -> Self {
        Self {
            auth_service: AuthService::new(user_repo, config.jwt_secret.clone(), config.jwt_maxage),
            posts_service: PostsService::new(posts_repo, media),
            mailer,
            config,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,portfolio_blog=debug,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("🔒 {}", err);
            std::process::exit(1);
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            tracing::error!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!().run(&pool).await {
        tracing::error!("🔥 Failed to run migrations: {:?}", err);
        std::process::exit(1);
    }

    let media = match LocalMediaStore::new(&config.upload_dir).await {
        Ok(media) => {
            tracing::info!(dir = %media.root().display(), "Upload directory ready");
            media
        }
        Err(err) => {
            tracing::error!("🔥 Upload directory is not usable: {:?}", err);
            std::process::exit(1);
        }
    };

    let mailer = match config.smtp.as_ref().map(Mailer::new).transpose() {
        Ok(mailer) => mailer.map(Arc::new),
        Err(err) => {
            tracing::error!("🔥 Invalid mail relay configuration: {:?}", err);
            std::process::exit(1);
        }
    };
    if mailer.is_none() {
        tracing::warn!("No SMTP relay configured; the contact form will be unavailable");
    }

    let db_blog = Arc::new(PostgresRepo::new(pool));
    let app_state = AppState::new(
        config.clone(),
        db_blog.clone(),
        db_blog,
        Arc::new(media),
        mailer,
    );

    let app = create_routes(Arc::new(app_state)).layer(configure_cors());

    let listener = match tokio::net::TcpListener::bind(format!("[::]:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("🔥 Failed to bind port {}: {:?}", config.port, err);
            std::process::exit(1);
        }
    };
    tracing::info!("🚀 Listening on port {}", config.port);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {:?}", err);
    }
}
