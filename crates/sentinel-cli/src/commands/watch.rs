//! Live event stream command.

use std::time::Duration;

use clap::Args;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::output::{self, OutputFormat, ResultLine};
use sentinel_core::error::AppError;
use sentinel_realtime::handler::CLOSE_NORMAL;
use sentinel_realtime::message::payload::{NotificationView, TestResultRow};
use sentinel_realtime::{ClientConfig, CloseInfo, HandlerSet, WebSocketClient};

/// Arguments for the watch command
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Print client counters on exit
    #[arg(long)]
    pub metrics: bool,
}

/// Handler invocations forwarded to the printer.
#[derive(Debug)]
enum Event {
    Connected,
    Disconnected(CloseInfo),
    TestResults(Value),
    MetricsUpdate(Value),
    Notification(Value),
    Error(String),
}

/// Execute the watch command
pub async fn execute(
    args: &WatchArgs,
    config: ClientConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = WebSocketClient::new(config, forwarding_handlers(tx));

    if format == OutputFormat::Table {
        output::print_kv("Watching", client.url());
    }

    let deadline = async {
        match args.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.map_err(|e| AppError::internal(format!("Failed to listen for Ctrl-C: {e}")))?;
                break;
            }
            _ = &mut deadline => break,
            Some(event) = rx.recv() => print_event(event, client.url(), format),
        }
    }

    client.close(CLOSE_NORMAL, "watch finished").await;
    while let Ok(event) = rx.try_recv() {
        print_event(event, client.url(), format);
    }

    if args.metrics {
        output::print_item(&client.metrics(), format);
    }
    Ok(())
}

fn forwarding_handlers(tx: mpsc::UnboundedSender<Event>) -> HandlerSet {
    let (a, b, c, d, e, f) = (
        tx.clone(),
        tx.clone(),
        tx.clone(),
        tx.clone(),
        tx.clone(),
        tx,
    );
    HandlerSet::new()
        .on_connect(move || {
            let _ = a.send(Event::Connected);
        })
        .on_disconnect(move |info| {
            let _ = b.send(Event::Disconnected(info.clone()));
        })
        .on_test_results(move |payload| {
            let _ = c.send(Event::TestResults(payload));
        })
        .on_metrics_update(move |payload| {
            let _ = d.send(Event::MetricsUpdate(payload));
        })
        .on_notification(move |payload| {
            let _ = e.send(Event::Notification(payload));
        })
        .on_error(move |err| {
            let _ = f.send(Event::Error(err.to_string()));
        })
}

fn print_event(event: Event, url: &str, format: OutputFormat) {
    match (event, format) {
        (Event::TestResults(payload), OutputFormat::Json) => {
            output::print_item(&payload, format);
        }
        (Event::TestResults(payload), OutputFormat::Table) => {
            let lines: Vec<ResultLine> = TestResultRow::rows(&payload)
                .into_iter()
                .map(ResultLine::from)
                .collect();
            output::print_list(&lines, format);
        }
        (Event::MetricsUpdate(payload), _) => output::print_object(&payload, format),
        (Event::Notification(payload), OutputFormat::Json) => {
            output::print_item(&NotificationView::from_value(&payload), format);
        }
        (Event::Notification(payload), OutputFormat::Table) => {
            let view = NotificationView::from_value(&payload);
            match view.title {
                Some(title) => println!("[{}] {}: {}", view.level, title, view.message),
                None => println!("[{}] {}", view.level, view.message),
            }
        }
        (Event::Connected, _) => output::print_success(&format!("Connected to {url}")),
        (Event::Disconnected(info), _) => output::print_warning(&format!(
            "Disconnected (code {}{}){}",
            info.code,
            if info.was_clean { "" } else { ", unclean" },
            if info.reason.is_empty() {
                String::new()
            } else {
                format!(": {}", info.reason)
            }
        )),
        (Event::Error(message), _) => output::print_error(&message),
    }
}
