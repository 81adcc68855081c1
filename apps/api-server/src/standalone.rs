use crate::{ai::init_caption_model, routes::get_routes, Ctx};
use dotenvy::dotenv;
use model_registry::RegistryConfig;
use std::env;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 7860;

pub async fn start_server() -> anyhow::Result<()> {
    match dotenv() {
        Ok(path) => println!(".env read successfully from {}", path.display()),
        Err(e) => println!("Could not load .env file: {e}"),
    };

    init_tracing(); // after dotenv() so RUST_LOG from a .env file applies

    let registry_config = {
        let mut config = RegistryConfig::default();
        if let Ok(url) = env::var("MODEL_REGISTRY_URL") {
            config.url = url;
        }
        if let Ok(dir) = env::var("LOCAL_RESOURCES_DIR") {
            config.resources_dir = std::path::PathBuf::from(dir);
        }
        config
    };

    tracing::info!(
        "loading caption model, artifacts under {:?}",
        registry_config.resources_dir
    );
    let caption_model = init_caption_model(registry_config).await?;
    tracing::info!("caption model ready");

    let ctx = Ctx { caption_model };

    let app: axum::Router = get_routes(ctx).layer({
        let cors = CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any);
        cors
    });

    let port = match env::var("PORT") {
        Ok(port) => port.parse::<u16>()?,
        Err(_) => DEFAULT_PORT,
    };

    axum::serve(
        {
            let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
            tracing::info!("Listening on http://{}/", addr);
            tokio::net::TcpListener::bind(addr).await?
        },
        app,
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            // load filters from the `RUST_LOG` environment variable.
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_server=info,ai=info,model_registry=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };
    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl-C received, shutting down...");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, shutting down...");
        },
    }
}
