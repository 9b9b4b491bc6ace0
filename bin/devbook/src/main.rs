use devbook_net::config::Config;
use devbook_net::server::build_server;
use devbook_net::telemetry::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_logging(&config);

    if config.jwt_secret == "change-me" {
        tracing::warn!("DEVBOOK_JWT_SECRET is not set, using the built-in development secret");
    }

    build_server(config).await?;
    Ok(())
}
