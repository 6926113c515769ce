pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod gate;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;

pub async fn run() -> anyhow::Result<()> {
    let args = Cli::parse();
    let config = Config::load()?;

    let serving = matches!(args.command, Some(Commands::Serve { .. }));

    // Only the server exposes metrics
    let prometheus_handle = if serving && config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config, serving)?;

    if prometheus_handle.is_some() {
        info!("Prometheus metrics recorder initialized");
    }

    let Some(command) = args.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Serve { port } => cli::cmd_serve(config, port, prometheus_handle).await,
        Commands::Init => cli::cmd_init(),
        Commands::CreateUser {
            username,
            email,
            name,
            role,
            password,
        } => cli::cmd_create_user(&config, &username, &email, &name, role, password).await,
        Commands::SetActive { identifier, active } => {
            cli::cmd_set_active(&config, &identifier, active).await
        }
        Commands::SetRole { identifier, role } => {
            cli::cmd_set_role(&config, &identifier, role).await
        }
        Commands::Users => cli::cmd_list_users(&config).await,
        Commands::Login {
            username,
            password,
            server,
        } => cli::cmd_login(&config, &username, password, server.as_deref()).await,
        Commands::Status { server } => cli::cmd_status(&config, server.as_deref()).await,
        Commands::Logout => cli::cmd_logout(&config).await,
    }
}

fn init_tracing(config: &Config, serving: bool) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if serving && config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;
        let env = if config.general.environment.is_production() {
            "production"
        } else {
            "development"
        };

        let (layer, task) = tracing_loki::builder()
            .label("app", "chamcong")?
            .extra_field("env", env)?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}
