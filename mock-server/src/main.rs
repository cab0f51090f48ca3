use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let seed = match std::env::var("SEED_POSTS") {
        Ok(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
            warn!(%raw, "SEED_POSTS is not a number, starting empty");
            0
        }),
        Err(_) => 0,
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, seed, "listening");
    mock_server::run_with(listener, mock_server::Store::seeded(seed)).await
}
