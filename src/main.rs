use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use futures_util::TryStreamExt;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use outscraper::config::{AppConfig, OutputConfig};
use outscraper::endpoints;
use outscraper::output;
use outscraper::utils::Timer;
use outscraper::{Business, BusinessQuery, EndpointResult, OutscraperClient};

#[derive(Parser)]
#[command(name = "outscraper", about = "Outscraper API command-line client", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// API key (overrides config files)
    #[arg(long, env = "OUTSCRAPER_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// List every endpoint the client knows
    Endpoints,

    /// Call an endpoint by name, e.g. `call google_maps_search "bars ny usa"`
    Call {
        endpoint: String,

        /// One or more queries; a directions route is written `"origin | destination"`
        #[arg(required = true)]
        queries: Vec<String>,

        /// Endpoint parameter as key=value; values are read as JSON when they parse
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Comma-separated fields to return
        #[arg(long)]
        fields: Option<String>,

        /// Return the request id instead of waiting for results
        #[arg(long = "async")]
        async_request: bool,

        /// Run the task through the web UI
        #[arg(long)]
        ui: bool,

        #[arg(long)]
        webhook: Option<String>,

        /// Write results to a .json or .csv file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch a request from the archive
    Archive {
        id: String,

        /// Poll until the request is finished
        #[arg(long)]
        wait: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show running or finished requests
    History {
        #[arg(long, default_value = "running")]
        kind: String,

        #[arg(long, default_value_t = 0)]
        skip: u32,

        #[arg(long, default_value_t = 25)]
        page_size: u32,
    },

    /// List tasks created in the web UI
    Tasks {
        #[arg(long, default_value = "")]
        query: String,

        #[arg(long, default_value = "")]
        last_id: String,

        #[arg(long, default_value_t = 10)]
        page_size: u32,
    },

    /// Search the businesses database
    Businesses {
        /// Filters as a JSON object
        #[arg(long)]
        filters: Option<String>,

        #[arg(long, default_value_t = 10)]
        limit: u32,

        #[arg(long)]
        cursor: Option<String>,

        /// Follow the cursor through every page
        #[arg(long)]
        all: bool,

        #[arg(long)]
        fields: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show one business by id
    Business {
        id: String,

        #[arg(long)]
        fields: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "outscraper=info,warn",
        1 => "outscraper=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();

    let mut config = AppConfig::load().context("Failed to load configuration")?;
    if let Some(key) = cli.api_key {
        config.client.api_key = key;
    }

    if let Command::Endpoints = cli.command {
        for ep in endpoints::ALL {
            let aliases = if ep.aliases.is_empty() {
                String::new()
            } else {
                format!(" (alias: {})", ep.aliases.join(", "))
            };
            println!("{:<28} {:<5} {}{}", ep.name, ep.method.as_str(), ep.path, aliases);
        }
        return Ok(());
    }

    let client = OutscraperClient::with_config(config.client.clone())
        .context("Cannot build the API client; is an API key configured?")?;
    let out = &config.output;

    match cli.command {
        Command::Endpoints => {}

        Command::Call {
            endpoint,
            queries,
            params,
            fields,
            async_request,
            ui,
            webhook,
            output,
        } => {
            let Some(ep) = endpoints::find(&endpoint) else {
                bail!("Unknown endpoint `{}`; run `outscraper endpoints`", endpoint);
            };

            let mut call = client
                .call(ep)
                .query(queries)
                .params(parse_params(&params)?);
            if async_request {
                call = call.async_request(true);
            }
            if ui {
                call = call.ui(true);
            }
            if let Some(url) = webhook {
                call = call.webhook(url);
            }
            if let Some(f) = fields {
                call = call.fields(split_list(&f));
            }

            let result = {
                let _t = Timer::start(format!("{} call", ep.name));
                call.send().await?
            };

            let value = match result {
                EndpointResult::Data(data) => Value::Array(data),
                EndpointResult::Queued(queued) => queued.raw,
            };
            emit(out, &value, output)?;
        }

        Command::Archive { id, wait, output } => {
            let record = if wait {
                client.wait_request_archive(&id).await?
            } else {
                client.get_request_archive(&id).await?
            };
            emit(out, &serde_json::to_value(&record)?, output)?;
        }

        Command::History {
            kind,
            skip,
            page_size,
        } => {
            let history = client.get_requests_history(&kind, skip, page_size).await?;
            emit(out, &history, None)?;
        }

        Command::Tasks {
            query,
            last_id,
            page_size,
        } => {
            let page = client.get_tasks(&query, &last_id, page_size).await?;
            emit(out, &serde_json::to_value(&page)?, None)?;
        }

        Command::Businesses {
            filters,
            limit,
            cursor,
            all,
            fields,
            output,
        } => {
            let mut query = BusinessQuery::new().limit(limit);
            if let Some(raw) = filters {
                query = query.raw_filters(parse_object(&raw).context("--filters must be a JSON object")?);
            }
            if let Some(c) = cursor {
                query = query.cursor(c);
            }
            if let Some(f) = fields {
                query = query.fields(split_list(&f));
            }

            let businesses = client.businesses();
            let value = if all {
                let items: Vec<Business> = businesses.iter_search(query).try_collect().await?;
                info!("Collected {} businesses", items.len());
                serde_json::to_value(items)?
            } else {
                let page = businesses.search(&query).await?;
                if let Some(next) = page.cursor() {
                    info!("More results: --cursor {}", next);
                }
                serde_json::to_value(page.items)?
            };
            emit(out, &value, output)?;
        }

        Command::Business { id, fields, output } => {
            let fields = fields.map(|f| split_list(&f)).unwrap_or_default();
            let business = client.businesses().get_details(&id, &fields).await?;
            emit(out, &business.to_value(), output)?;
        }
    }

    Ok(())
}

/// Print to stdout, or write to `path` (relative paths land in `output.dir`).
fn emit(config: &OutputConfig, value: &Value, path: Option<PathBuf>) -> Result<()> {
    match path {
        Some(path) => {
            let path = match &config.dir {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path,
            };
            output::write_file(&path, value, config.pretty)
        }
        None => {
            println!("{}", output::render_json(value, config.pretty)?);
            Ok(())
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_object(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => bail!("expected a JSON object, got {}", other),
    }
}

/// `key=value` pairs; `limit=5` is a number, `ignore_empty=true` a bool,
/// anything that is not JSON stays a string.
fn parse_params(raw: &[String]) -> Result<Map<String, Value>> {
    let mut params = Map::new();
    for pair in raw {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Parameter `{}` is not in key=value form", pair);
        };
        let value = serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::from(value));
        params.insert(key.trim().to_string(), value);
    }
    Ok(params)
}
