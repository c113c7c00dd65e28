//! Utility to replay a sales export through the dashboard pipeline.
//!
//! Usage: `replay_dashboard <sales.json> [start end]`
//!
//! The file may hold either a bare array of sales or a full dashboard
//! request body. The resulting dashboard is printed as pretty JSON.

use anyhow::Context;
use dotenvy::dotenv;
use sales_analytics::config::Config;
use sales_analytics::dashboard::{build_dashboard, DashboardInput};
use sales_analytics::models::{DashboardRequest, RangeRequest, RawSale};
use serde::Deserialize;
use std::env;

#[derive(Deserialize)]
#[serde(untagged)]
enum ReplayFile {
    Sales(Vec<RawSale>),
    Request(DashboardRequest),
}

/// Main entry point for the replay utility.
fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let path = args
        .first()
        .context("usage: replay_dashboard <sales.json> [start end]")?;

    let config = Config::from_env()?;

    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let mut request = match serde_json::from_str::<ReplayFile>(&content)
        .with_context(|| format!("parsing {}", path))?
    {
        ReplayFile::Request(request) => request,
        ReplayFile::Sales(sales) => DashboardRequest {
            sales,
            ..Default::default()
        },
    };

    if let [_, start, end, ..] = args.as_slice() {
        request.range = Some(RangeRequest {
            start: start.clone(),
            end: end.clone(),
        });
    }

    tracing::info!("Replaying {} sale(s) from {}", request.sales.len(), path);

    let input = DashboardInput::from_request(&request, &config.analytics);
    let today = config.analytics.today();
    let dashboard = build_dashboard(&input, &config.analytics, &config.tiers, today);

    println!("{}", serde_json::to_string_pretty(&dashboard)?);

    Ok(())
}
