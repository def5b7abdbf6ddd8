use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use stratus_api::AppStateInner;
use stratus_blob::DiskBlobStore;
use stratus_core::{
    AccountLifecycle, ArgonVerifier, BlobStore, FileRegistry, HierarchyEngine, Notifier,
    TokenStore, token,
};
use stratus_db::Database;
use stratus_notify::{HttpNotifier, LogNotifier};

/// Placeholder secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

/// Expired activation/reset tokens are swept once an hour.
const REAPER_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stratus=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("STRATUS_JWT_SECRET").unwrap_or_default();
    if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
        eprintln!("FATAL: STRATUS_JWT_SECRET is unset or still a placeholder.");
        eprintln!("       Session tokens are signed with it; pick a long random string.");
        eprintln!("       Set it in your .env file and restart.");
        std::process::exit(1);
    }
    let presign_secret = std::env::var("STRATUS_PRESIGN_SECRET").unwrap_or_default();
    if presign_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&presign_secret.as_str()) {
        eprintln!("FATAL: STRATUS_PRESIGN_SECRET is unset or still a placeholder.");
        eprintln!("       Presigned download links are signed with it; pick a long random string.");
        eprintln!("       Set it in your .env file and restart.");
        std::process::exit(1);
    }

    let host = std::env::var("STRATUS_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("STRATUS_PORT")
        .unwrap_or_else(|_| "4000".into())
        .parse()?;
    let db_path: PathBuf = std::env::var("STRATUS_DB_PATH")
        .unwrap_or_else(|_| "stratus.db".into())
        .into();
    let blob_dir: PathBuf = std::env::var("STRATUS_BLOB_DIR")
        .unwrap_or_else(|_| "./blob-storage".into())
        .into();
    // Where presigned download links point: this server, as clients reach it.
    let public_url = std::env::var("STRATUS_PUBLIC_URL")
        .unwrap_or_else(|_| format!("http://localhost:{port}"));
    // Where mail links point: the web app, which calls back into the API.
    let app_url = std::env::var("STRATUS_APP_URL").unwrap_or_else(|_| "http://localhost:5173".into());

    // Init database and blob storage
    let db = Arc::new(Database::open(&db_path)?);
    let blobs: Arc<dyn BlobStore> = Arc::new(
        DiskBlobStore::new(blob_dir, public_url, presign_secret.clone()).await?,
    );

    // Outbound mail goes through the HTTP mail API when one is configured,
    // otherwise links land in the log.
    let notifier: Arc<dyn Notifier> = match (
        std::env::var("STRATUS_MAIL_API_URL"),
        std::env::var("STRATUS_MAIL_API_KEY"),
    ) {
        (Ok(api_url), Ok(api_key)) => {
            let from = std::env::var("STRATUS_MAIL_FROM")
                .unwrap_or_else(|_| "Stratus <no-reply@stratus.local>".into());
            info!("Mail delivery via {}", api_url);
            Arc::new(HttpNotifier::new(api_url, api_key, from))
        }
        _ => {
            info!("STRATUS_MAIL_API_URL not set; mail goes to the log");
            Arc::new(LogNotifier)
        }
    };

    let tokens = TokenStore::new(db.clone());
    tokio::spawn(token::run_reaper_loop(tokens.clone(), REAPER_INTERVAL_SECS));

    let state = Arc::new(AppStateInner {
        accounts: AccountLifecycle::new(
            db.clone(),
            tokens,
            Arc::new(ArgonVerifier),
            notifier,
            app_url,
        ),
        folders: HierarchyEngine::new(db.clone()),
        files: FileRegistry::new(db, blobs.clone()),
        blobs,
        jwt_secret,
        presign_secret,
    });

    // CORS — the web app runs on its own origin.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(false);

    let app = stratus_api::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Stratus listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
