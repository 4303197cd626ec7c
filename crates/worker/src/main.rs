use anyhow::Context;
use clap::Parser;
use niftyswing_core::config::Settings;
use niftyswing_core::ingest::yahoo::YahooChartProvider;
use niftyswing_core::notify::email::EmailNotifier;
use niftyswing_core::notify::Notifier;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod universe;

#[derive(Debug, Parser)]
#[command(name = "niftyswing_worker")]
struct Args {
    /// Build the report but do not send the email.
    #[arg(long)]
    dry_run: bool,

    /// Also write the rendered HTML report to this path.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            // Log the rejection to the configured file before exiting.
            init_tracing(Settings::log_file_from_env().as_deref())?;
            let detail = format!("{err:#}");
            tracing::error!(error = %detail, "invalid configuration");
            return Err(err);
        }
    };
    let _sentry_guard = init_sentry(&settings);
    init_tracing(settings.log_file.as_deref())?;

    let tickers = universe::resolve_universe(&settings);
    let screen_cfg = settings.screen_config();
    let provider = YahooChartProvider::from_settings(&settings)?;

    let report = niftyswing_core::screen::run_screen(&provider, &tickers, &screen_cfg).await;

    let subject = niftyswing_core::report::subject_line(&report);
    let html = niftyswing_core::report::render_html(&report, &screen_cfg.classifier);

    if let Some(path) = args.output.as_deref() {
        write_report_file(path, &html);
    }

    if args.dry_run {
        tracing::info!(
            run_id = %report.run_id,
            %subject,
            dry_run = true,
            html_bytes = html.len(),
            "skipping email delivery"
        );
        return Ok(());
    }

    if let Err(err) = deliver(&settings, &subject, &html).await {
        sentry_anyhow::capture_anyhow(&err);
        let detail = format!("{err:#}");
        tracing::error!(run_id = %report.run_id, error = %detail, "error sending email");
        return Err(err);
    }

    tracing::info!(run_id = %report.run_id, "analysis complete, report sent");
    Ok(())
}

async fn deliver(settings: &Settings, subject: &str, html: &str) -> anyhow::Result<()> {
    let notifier = EmailNotifier::from_settings(settings)?;
    tracing::info!(
        channel = notifier.channel_name(),
        recipients = notifier.recipient_count(),
        "sending report"
    );
    notifier.send_report(subject, html).await
}

/// A failed copy is logged and captured; delivery still goes ahead.
fn write_report_file(path: &Path, html: &str) -> bool {
    match std::fs::write(path, html)
        .with_context(|| format!("failed to write report to {}", path.display()))
    {
        Ok(()) => {
            tracing::info!(path = %path.display(), "report written");
            true
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            let detail = format!("{err:#}");
            tracing::error!(path = %path.display(), error = %detail, "error writing report file");
            false
        }
    }
}

fn init_tracing(log_file: Option<&str>) -> anyhow::Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {path}"))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .with(sentry_tracing::layer())
        .init();
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
