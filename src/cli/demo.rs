use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use marquee::core::activity::{StepKind, StepOutcome, TaskActivity};
use marquee::core::surface::{SurfaceConfig, SurfaceManager};
use marquee::core::terminal;
use marquee::interfaces::ConsoleSurface;
use marquee::logging::FanoutMakeWriter;

use super::DemoArgs;

/// Scripted stand-in for the task orchestrator: owns the timeline, drives
/// the manager, and renders the inline step list at the end.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<()> {
    let (log_tx, _) = tokio::sync::broadcast::channel::<String>(500);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(FanoutMakeWriter {
            sender: log_tx,
            suppress_stdout: false,
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    terminal::print_banner();

    let config = SurfaceConfig::load(".").await?;
    let platform = Arc::new(ConsoleSurface::new());
    let mut manager = SurfaceManager::new(platform.clone(), config);
    manager.observe_activation_tokens();
    manager.observe_external_sessions();

    let pace = Duration::from_millis(args.pace_ms);
    let mut activity = TaskActivity::new();

    terminal::print_step(&format!("Task: {}", args.task));
    manager.start(&args.context, &args.task).await;
    platform.emit_activation_token("demo-push-to-start-7f3a");

    let script: &[(StepKind, &str, &str, Option<&str>, Option<&str>)] = &[
        (
            StepKind::Thinking,
            "Working out what to do",
            "The user wants a flight. Check dates, then search.",
            Some("Flight booking"),
            None,
        ),
        (
            StepKind::ToolCall,
            "Searching flights",
            "query: departures June 15",
            None,
            Some("$0.12"),
        ),
        (
            StepKind::ToolCall,
            "Comparing fares",
            "carriers: 4, fares: 23",
            None,
            Some("$0.27"),
        ),
        (
            StepKind::Thinking,
            "Found 3 options",
            "",
            None,
            None,
        ),
    ];

    for (kind, label, detail, subject, cost) in script {
        activity.finish_current(StepOutcome::Completed);
        let id = activity.begin_step(*kind, *label, *detail);
        if *kind == StepKind::Thinking && detail.is_empty() {
            activity.append_thinking("The 10:15 departure has the best price.");
            activity.append_detail(id, " Two stopovers ruled out.");
        }
        manager.report_step(*kind, label, *subject, *cost);
        tokio::time::sleep(pace).await;
    }

    manager.report_cost_only("$0.49");
    tokio::time::sleep(pace).await;

    activity.finish_current(StepOutcome::Completed);
    manager.end();
    // Give the fire-and-forget final dispatch a moment to land.
    tokio::time::sleep(Duration::from_millis(200)).await;

    terminal::print_step("Completed steps");
    for step in activity.completed_steps() {
        terminal::print_status(&step.label, &format!("{} · {}", step.glyph(), step.formatted_elapsed()));
    }

    let ledger = manager.token_ledger();
    if let Some(token) = ledger.lock().await.activation_token.clone() {
        terminal::print_info(&format!("Activation token on record: {}", token));
    }

    manager.shutdown().await;
    terminal::print_success("Demo run finished.");
    Ok(())
}
