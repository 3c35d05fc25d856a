mod authentication;
pub mod config;
mod data_formats;
mod db_helpers;
mod errors;
mod handlers;
pub mod models;
pub mod notifications;
mod redirects;
mod uploads;

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
use config::Config;
pub use data_formats::*;
use handlers::*;
use log::LevelFilter;
use notifications::{MailTransport, Notifier};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{migrate::MigrateDatabase, ConnectOptions, Sqlite, SqlitePool};
use std::{
    net::{SocketAddr, TcpListener},
    str::FromStr,
    sync::Arc,
    time::Duration,
};
pub type JsonResponse<T> = (StatusCode, Json<T>);

/// Everything a request handler needs, built once at startup.
#[derive(Debug)]
pub struct AppContext {
    pub pool: SqlitePool,
    pub config: Config,
    pub notifier: Notifier,
}

impl AppContext {
    pub fn new(pool: SqlitePool, config: Config, transport: Arc<dyn MailTransport>) -> Arc<Self> {
        let notifier = Notifier::new(transport, &config.site_url);
        Arc::new(AppContext {
            pool,
            config,
            notifier,
        })
    }
}

pub async fn run_app(app: Router, address: SocketAddr, ctx: Arc<AppContext>) -> Result<()> {
    let app = app.layer(Extension(ctx));
    axum::Server::bind(&address)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn init_db(db_url: &str, slow_query_threshold_ms: u64) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        tracing::info!(db_url, "creating database");
        Sqlite::create_database(db_url)
            .await
            .context("Failed to create database")?;
    } else {
        tracing::debug!(db_url, "database already exists");
    }
    let mut options = SqliteConnectOptions::from_str(db_url)
        .context("Invalid DATABASE_URL")?
        .foreign_keys(true);
    options.log_slow_statements(
        LevelFilter::Warn,
        Duration::from_millis(slow_query_threshold_ms),
    );
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    tracing::info!("running migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("migrations completed");
    Ok(pool)
}

/// Creates the upload directory and, when a password is configured, the
/// admin account.
pub async fn bootstrap(ctx: &AppContext) -> Result<()> {
    tokio::fs::create_dir_all(&ctx.config.upload_path)
        .await
        .with_context(|| {
            format!(
                "Failed to create upload folder {}",
                ctx.config.upload_path.display()
            )
        })?;
    if let Some(password) = &ctx.config.admin_password {
        db_helpers::ensure_admin_in_db(&ctx.pool, &ctx.config.admin_username, password.clone())
            .await
            .context("Failed to initialize the administrator account")?;
    }
    Ok(())
}

pub fn get_random_free_port() -> (u16, SocketAddr) {
    let listener = TcpListener::bind("localhost:0").unwrap();
    match listener.local_addr() {
        Ok(addr) => (addr.port(), addr),
        Err(_) => panic!("Could not get a free port"),
    }
}

pub fn make_router() -> Router {
    Router::new()
        .route("/check_health", get(alive))
        // ----------------- Blog -----------------
        .route("/", get(blog::index))
        .route("/about", get(blog::about))
        .route("/sidebar", get(blog::sidebar))
        .route("/category/:category_id", get(blog::show_category))
        .route(
            "/post/:post_id",
            get(blog::show_post).post(blog::submit_comment),
        )
        .route("/reply/comment/:comment_id", get(blog::reply_comment))
        .route("/change-theme/:theme_name", get(blog::change_theme))
        .route("/uploads/:filename", get(blog::get_image))
        // ----------------- Auth -----------------
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", get(auth::logout))
        // ----------------- Admin -----------------
        .route(
            "/admin/settings",
            get(admin::settings).post(admin::update_settings),
        )
        .route("/admin/post/manage", get(admin::manage_posts))
        .route("/admin/post/new", post(admin::new_post))
        .route(
            "/admin/post/:post_id/edit",
            get(admin::post_form).post(admin::edit_post),
        )
        .route("/admin/post/:post_id/delete", post(admin::delete_post))
        .route("/admin/post/:post_id/set-comment", post(admin::set_comment))
        .route("/admin/comment/manage", get(admin::manage_comments))
        .route("/admin/comment/approve", post(admin::approve_all_comments))
        .route(
            "/admin/comment/:comment_id/approve",
            post(admin::approve_comment),
        )
        .route(
            "/admin/comment/:comment_id/delete",
            post(admin::delete_comment),
        )
        .route("/admin/category/manage", get(admin::manage_categories))
        .route("/admin/category/new", post(admin::new_category))
        .route(
            "/admin/category/:category_id/edit",
            post(admin::edit_category),
        )
        .route(
            "/admin/category/:category_id/delete",
            post(admin::delete_category),
        )
        .route("/admin/link/manage", get(admin::manage_links))
        .route("/admin/link/new", post(admin::new_link))
        .route("/admin/link/:link_id/edit", post(admin::edit_link))
        .route("/admin/link/:link_id/delete", post(admin::delete_link))
        .route("/admin/upload", post(admin::upload_image))
        .fallback(not_found)
}
