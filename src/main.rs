use clap::Parser;
use matchforge::auth::{AuthorizationInterceptor, HttpIamSource, TokenValidator};
use matchforge::config::load_config;
use matchforge::observability::CallMetrics;
use matchforge::pb::matchfunction::match_function_server::MatchFunctionServer;
use matchforge::{MatchFunctionService, pb};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::Server;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "matchforge")]
#[command(version, about = "Matchmaking function gRPC server")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "MATCHFORGE_CONFIG")]
    config: Option<String>,

    /// Log level filter (overrides the configuration file)
    #[arg(long, env = "MATCHFORGE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Bind host (overrides the configuration file)
    #[arg(long, env = "MATCHFORGE_HOST")]
    host: Option<String>,

    /// Bind port (overrides the configuration file)
    #[arg(short, long, env = "MATCHFORGE_PORT")]
    port: Option<u16>,

    /// Serve gRPC reflection alongside the match function
    #[arg(long, env = "MATCHFORGE_ENABLE_REFLECTION")]
    enable_reflection: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.logging.level)
        .to_string();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if config.logging.json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    let iam_source = Arc::new(HttpIamSource::new(&config.iam)?);
    let validator = Arc::new(
        TokenValidator::new(
            iam_source,
            Duration::from_secs(config.iam.fetch_interval_secs),
        )
        .with_cross_namespace(
            config.iam.publisher_namespace.clone(),
            config.iam.allow_cross_namespace,
        ),
    );
    validator.initialize().await?;
    info!(namespace = %config.iam.namespace, "token validator ready");

    let metrics = Arc::new(CallMetrics::new());
    let auth = Arc::new(AuthorizationInterceptor::new(
        Arc::clone(&validator),
        config.iam.namespace.clone(),
        &config.iam.resource_name,
        Arc::clone(&metrics),
    ));
    let service = MatchFunctionService::new(auth, metrics);

    let host = args.host.as_deref().unwrap_or(&config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    let mut router = Server::builder().add_service(MatchFunctionServer::new(service));
    if args.enable_reflection || config.server.enable_reflection {
        let reflection = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(pb::FILE_DESCRIPTOR_SET)
            .build_v1()?;
        router = router.add_service(reflection);
    }

    info!(%addr, "matchforge listening");
    router
        .serve_with_shutdown(addr, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    validator.cancel();
    Ok(())
}
