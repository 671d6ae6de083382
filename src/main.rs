//! appd-datasource
//!
//! Command-line interface for the AppDynamics data source:
//! - Serve the JSON data source API
//! - Run one-off metric queries
//! - Browse applications and the metric tree
//! - Test the controller connection

use anyhow::Context;
use appd_datasource::api::{serve, AppState};
use appd_datasource::config::{generate_default_config, Config, LoggingConfig};
use appd_datasource::{AppDynamicsDatasource, QueryTarget, RangeBound, TimeRange, TestStatus};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

#[derive(Parser)]
#[command(name = "appd-datasource")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AppDynamics data source for time-series dashboards")]
#[command(long_about = "Translates metric-path patterns into AppDynamics controller queries.\nServe it to a dashboard host or query the controller directly.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the data source API server
    Serve,

    /// Query metric data
    Query {
        /// Application name
        application: String,
        /// Metric path patterns (one target each)
        #[arg(required = true)]
        metrics: Vec<String>,
        /// Range start: epoch ms, RFC 3339, or now-<n><unit>
        #[arg(long, default_value = "now-1h")]
        from: String,
        /// Range end
        #[arg(long, default_value = "now")]
        to: String,
    },

    /// List applications
    Apps {
        /// Substring filter
        #[arg(default_value = "")]
        query: String,
    },

    /// Browse the metric tree of an application
    Metrics {
        /// Application name
        application: String,
        /// Partial metric path, e.g. "Overall Application Performance|Calls"
        #[arg(default_value = "")]
        query: String,
    },

    /// Test the controller connection
    Ping,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        return write_default_config(output.as_deref());
    }

    let config = Config::load_default(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(&config.logging);

    let datasource = Arc::new(
        AppDynamicsDatasource::from_config(&config).context("building controller client")?,
    );

    match cli.command {
        Commands::Serve => {
            tracing::info!(
                "Starting appd-datasource v{} for controller {}",
                env!("CARGO_PKG_VERSION"),
                config.controller.url
            );

            let state = AppState::new(datasource, config.api.clone());
            serve(state, &config.api).await?;
        }

        Commands::Query {
            application,
            metrics,
            from,
            to,
        } => {
            let range = TimeRange::resolve(
                &RangeBound::Expr(from),
                &RangeBound::Expr(to),
                chrono::Utc::now(),
            )?;

            let targets: Vec<QueryTarget> = metrics
                .iter()
                .map(|metric| QueryTarget::new(application.as_str(), metric.as_str()))
                .collect();

            let response = datasource.query_range(&targets, &range).await;

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&response)?),
                _ => {
                    if response.data.is_empty() {
                        println!("No data for the selected time range");
                    }
                    for series in &response.data {
                        println!("{}", series.label);
                        println!("{}", "-".repeat(series.label.len().max(20)));
                        for (value, timestamp) in &series.points {
                            let date = chrono::DateTime::from_timestamp_millis(*timestamp)
                                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                                .unwrap_or_else(|| timestamp.to_string());
                            println!("{:<20} {}", date, value);
                        }
                        println!();
                    }
                    for error in &response.errors {
                        let metric = metrics.get(error.index).map_or("?", String::as_str);
                        eprintln!("{}: {}", metric, error.message);
                    }
                }
            }

            if !response.errors.is_empty() && response.data.is_empty() {
                std::process::exit(1);
            }
        }

        Commands::Apps { query } => {
            print_names(&datasource.application_names(&query).await, &cli.format)?;
        }

        Commands::Metrics { application, query } => {
            print_names(
                &datasource.metric_names(&application, &query).await,
                &cli.format,
            )?;
        }

        Commands::Ping => {
            let result = datasource.test_datasource().await;

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&result)?),
                _ => println!("{}: {}", result.title, result.message),
            }

            if result.status == TestStatus::Failure {
                std::process::exit(1);
            }
        }

        // Written above without touching the controller
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("appd_datasource={},tower_http=info", logging.level).into()
    });

    log_subscriber(logging, filter, std::io::stderr).init();
}

/// Logs never share stdout with command output, whatever the format
fn log_subscriber<W>(
    logging: &LoggingConfig,
    filter: EnvFilter,
    writer: W,
) -> Box<dyn tracing::Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(filter);

    if logging.is_json() {
        Box::new(registry.with(tracing_subscriber::fmt::layer().json().with_writer(writer)))
    } else {
        Box::new(registry.with(tracing_subscriber::fmt::layer().with_writer(writer)))
    }
}

fn print_names(names: &[String], format: &str) -> anyhow::Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(names)?),
        _ => {
            if names.is_empty() {
                println!("No matches.");
            }
            for name in names {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

fn write_default_config(output: Option<&std::path::Path>) -> anyhow::Result<()> {
    let config = generate_default_config();

    match output {
        Some(path) => {
            // Create parent directory if needed
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &config)
                .with_context(|| format!("writing config to {:?}", path))?;
            println!("Config written to {:?}", path);
        }
        None => {
            print!("{}", config);
        }
    }

    Ok(())
}
