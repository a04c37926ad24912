use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::filter::{Directive, EnvFilter};

use product_info::config::Config;
use product_info::error::AnalyzeError;
use product_info::models::ErrorPayload;
use product_info::utils::http::HttpFetcher;
use product_info::{analyze, render_json};

const USAGE: &str = "Usage: product-info <url>";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load();

    // Logs go to stderr; stdout carries exactly one JSON line
    let directive = config
        .as_ref()
        .map(|c| c.log_filter.clone())
        .unwrap_or_else(|_| Config::default().log_filter);
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = directive.parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let config = config.unwrap_or_else(|e| {
        warn!("Could not load configuration, using defaults: {}", e);
        Config::default()
    });

    let Some(url) = std::env::args().nth(1) else {
        println!("{}", serde_json::to_string(&ErrorPayload::new(USAGE))?);
        std::process::exit(1);
    };

    info!("Analyzing {}", url);

    let outcome = match HttpFetcher::new(config.fetch) {
        Ok(fetcher) => analyze(&fetcher, &url).await,
        Err(e) => Err(AnalyzeError::Fetch(e)),
    };

    println!("{}", render_json(&outcome));
    Ok(())
}
