use checkout_dispatch::api::{self, AppState};
use checkout_dispatch::config::Config;
use checkout_dispatch::payments::{PaymentGateway, Widgets};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    let config = Config::from_env()?;

    tracing::info!("Starting checkout dispatch service");
    tracing::info!("Environment: {}", config.server.environment);
    tracing::info!("Provider mode: {:?}", config.payments.mode);

    // Checkout widgets run in the browser, so only push payments and
    // reconciliation lookups are served from here.
    let gateway = PaymentGateway::new(config.payments.clone(), Widgets::default())?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = api::router(AppState::new(config, gateway));

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}
