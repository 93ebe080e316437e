use anyhow::Context;
use chrono::Local;
use clap::Parser;
use sales_report::analysis::{product, report, sales};
use sales_report::config::toml_config::PlanConfig;
use sales_report::core::fetch_engine::ProgressReceiver;
use sales_report::utils::{logger, validation::Validate};
use sales_report::{
    progress_channel, ApiClient, ApiConfig, CliConfig, FetchEngine, FetchOrchestrator, FetchPlan,
    LocalStorage, ProgressEvent, ReportError, Table,
};
use std::collections::HashMap;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let config = CliConfig::parse();

    if let Err(e) = logger::init_cli_logger(config.verbose, config.json_logs, config.log_file.as_deref()) {
        eprintln!("❌ Could not open log file: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Starting sales-report");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = run(config).await {
        tracing::error!("❌ Run failed: {:#}", e);
        match e.downcast_ref::<ReportError>() {
            Some(report_error) => eprintln!("❌ {}", report_error.user_friendly_message()),
            None => eprintln!("❌ {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(config: CliConfig) -> anyhow::Result<()> {
    config.validate()?;
    let (date_from, date_to) = config.date_range(Local::now().date_naive())?;
    tracing::info!("📅 Fetching {} to {}", date_from, date_to);

    let api_config = ApiConfig::from_env()?;
    let client = ApiClient::new(&api_config)?;
    let engine = FetchEngine::new(client).with_concurrency(config.concurrency)?;
    tracing::debug!("Up to {} page requests in flight", engine.max_concurrency());
    let orchestrator = FetchOrchestrator::new(engine);

    let plan = match &config.plan {
        Some(path) => {
            let vars = HashMap::from([
                ("DATE_FROM".to_string(), date_from.format("%Y-%m-%d").to_string()),
                ("DATE_TO".to_string(), date_to.format("%Y-%m-%d").to_string()),
            ]);
            PlanConfig::from_file(path, &vars)
                .with_context(|| format!("loading plan {}", path.display()))?
                .into_plan()?
        }
        None => FetchPlan::for_range(date_from, date_to),
    };

    let total_pages = orchestrator.estimate_total_pages(&plan).await?;
    let (events, receiver) = progress_channel();
    let renderer = tokio::spawn(render_progress(receiver, total_pages));

    let fetched = orchestrator.fetch_all(&plan, &events).await;
    drop(events);
    renderer.await.context("progress renderer stopped unexpectedly")?;
    let dataset = fetched?;

    let empty = Table::default();
    let transactions = dataset.transactions().unwrap_or(&empty);
    let products = dataset.products().unwrap_or(&empty);

    let storage = LocalStorage::new(&config.output_path);
    let stamp = format!("{}_{}", date_from.format("%Y%m%d"), date_to.format("%Y%m%d"));

    report::generate_sales_report(&storage, &format!("sales_report_{}.zip", stamp), transactions, products).await?;

    let range = sales::sales_report_range(transactions, date_from, date_to);
    report::write_range_report(&storage, &format!("range_report_{}.csv", stamp), &range).await?;

    if let Some(day) = config.report_date {
        let daily = sales::daily_sales_report(transactions, day);
        report::write_daily_report(&storage, &format!("daily_report_{}.csv", day.format("%Y%m%d")), &daily)
            .await?;
    }

    if let Some(name) = &config.product {
        match product::analyze_product(transactions, products, name) {
            Some(analysis) => {
                report::write_product_report(&storage, "product_analysis.csv", &analysis).await?;
            }
            None => tracing::warn!("Product '{}' not found, no analysis written", name),
        }
    }

    println!("✅ Reports saved to: {}", storage.base_path().display());
    Ok(())
}

/// Console counterpart of a progress bar: tracks pages done against the plan total.
async fn render_progress(mut receiver: ProgressReceiver, total_pages: u64) {
    let mut done = 0u64;
    while let Some(event) = receiver.recv().await {
        match event {
            ProgressEvent::Start { endpoint, total_pages: pages } => {
                tracing::info!("⏳ {}: {} page(s) to fetch", endpoint, pages);
            }
            ProgressEvent::PageDone { endpoint } => {
                done += 1;
                tracing::info!("📊 {}: {}/{} pages", endpoint, done, total_pages);
            }
            ProgressEvent::Error { endpoint, message } => {
                tracing::error!("❌ {}: {}", endpoint, message);
            }
            ProgressEvent::Complete { endpoint } => {
                tracing::info!("✅ {}: complete", endpoint);
            }
        }
    }
}
