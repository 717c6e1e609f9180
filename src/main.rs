use std::sync::Arc;
use std::time::Duration;

use resume_intake::config::IntakeConfig;
use resume_intake::extract::PdfExtractor;
use resume_intake::llm::GroqReasoner;
use resume_intake::mailbox::GmailMailbox;
use resume_intake::pipeline::IntakePipeline;
use resume_intake::scheduler::{Scheduler, SchedulerConfig};
use resume_intake::sheets::GoogleSheets;
use resume_intake::sink::SinkRouter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Log to stdout and a rolling file under logs/.
    let file_appender = tracing_appender::rolling::daily("logs", "resume-intake.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    let config = IntakeConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  Required: GROQ_API_KEY, GOOGLE_ACCESS_TOKEN");
        std::process::exit(1);
    });

    tracing::info!("Resume intake agent v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(query = %config.search_query, "  search query");
    tracing::info!(secs = config.cycle_interval.as_secs(), "  run interval");
    tracing::info!(attempts = config.max_attempts, "  retry attempts");
    tracing::info!(model = %config.model, "  model");
    tracing::info!(sheet = %config.accepted_sheet, "  valid resumes sheet");
    tracing::info!(sheet = %config.rejected_sheet, "  rejected docs sheet");

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(120))
        .build()?;

    let mailbox = Arc::new(GmailMailbox::new(http.clone(), config.google_token.clone()));
    let reasoner = Arc::new(GroqReasoner::new(
        http.clone(),
        config.groq_api_key.clone(),
        config.model.clone(),
    ));
    let sheets = Arc::new(GoogleSheets::new(http, config.google_token.clone()));
    let sink = Arc::new(SinkRouter::new(
        sheets,
        config.accepted_sheet.clone(),
        config.rejected_sheet.clone(),
        config.share_with.clone(),
    ));

    let pipeline = Arc::new(IntakePipeline::new(
        mailbox,
        Arc::new(PdfExtractor::new()),
        reasoner,
        sink,
        config.search_query.clone(),
    ));

    let scheduler_config = SchedulerConfig {
        max_attempts: config.max_attempts,
        retry_delay: config.retry_delay,
        cycle_interval: config.cycle_interval,
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let scheduler = Scheduler::new(pipeline, scheduler_config, shutdown_rx);
    let handle = tokio::spawn(scheduler.run());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, stopping after the current cycle");
    shutdown_tx.send(true).ok();
    handle.await?;

    Ok(())
}
