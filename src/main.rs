// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use clap::Parser;
use seedcrawl::application::crawler::Crawler;
use seedcrawl::application::fetch_processor::FetchProcessor;
use seedcrawl::config::settings::Settings;
use seedcrawl::domain::models::seed::Seed;
use seedcrawl::infrastructure::metrics::init_metrics;
use seedcrawl::utils::shutdown::install_shutdown_hook;
use seedcrawl::utils::telemetry;
use std::sync::Arc;
use tracing::info;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "seedcrawl", version, about = "Crawl the given URLs and their same-host links")]
struct Cli {
    /// Maximum link depth followed from the start URLs
    #[arg(long, default_value_t = 1)]
    depth: u32,

    /// Start URLs
    #[arg(required = true)]
    urls: Vec<String>,
}

/// 主函数
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration, the demo run ends when every reachable seed is processed
    let settings = Settings::new()?.one_shot();

    // 2. Initialize logging and metrics
    telemetry::init_telemetry(&settings.telemetry.log_filter);
    info!("Starting seedcrawl...");
    if let Some(addr) = &settings.telemetry.metrics_addr {
        init_metrics(addr);
    }

    // 3. Build crawler
    let crawler = Crawler::builder(settings)
        .processor(Arc::new(FetchProcessor::new(cli.depth)))
        .build()?;

    let seeds: Vec<Seed> = cli.urls.into_iter().map(Seed::new).collect();
    let added = crawler.push_seeds(seeds).await?;
    info!("Queued {} seeds, max depth {}", added, cli.depth);

    // 4. Run
    install_shutdown_hook(crawler.scheduler().clone());
    crawler.run_until_stopped().await?;

    info!("seedcrawl finished");
    Ok(())
}
