use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use pagos_ilp::{
    config::Config,
    open_payments::HttpClientProvider,
    payment::PaymentOrchestrator,
    routes::create_router,
    utils::init_logger,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);
    info!(
        "Paying from {} to {} as {}",
        config.open_payments.sending_wallet_url,
        config.open_payments.receiving_wallet_url,
        config.open_payments.wallet_address_url
    );

    let provider = Arc::new(HttpClientProvider::new(config.open_payments.clone()));
    let orchestrator =
        PaymentOrchestrator::from_config(provider, &config.open_payments, &config.payment);

    // Create shared state
    let state = AppState {
        config: config.clone(),
        orchestrator: Arc::new(orchestrator),
    };

    let app = create_router(state);

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    info!("Servidor Open Payments corriendo en http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
