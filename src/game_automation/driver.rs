// Repeats whole runs up to the configured count
use super::fsm::RunController;
use super::session::Session;
use super::types::BatchSummary;
use crate::host::HostPlatform;

/// Run up to `runs` tower attempts.
///
/// Recoverable failures are logged and retried after a delay. A user stop ends
/// the batch cleanly; a non-recoverable error aborts it.
pub async fn run_batch<H: HostPlatform>(session: &Session<H>, runs: u32) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for attempt in 1..=runs {
        if !session.control().is_running() {
            summary.stopped_by_user = true;
            break;
        }
        summary.attempted += 1;
        log::info!("🏁 Run {attempt}/{runs}");

        let result = RunController::new(session).run().await;
        // Per-run flags never leak into the next attempt
        session.control().clear_skip();

        match result {
            Ok(outcome) => {
                summary.completed += 1;
                log::info!(
                    "🏆 Run {attempt}/{runs} complete ({} shops, {} choices)",
                    outcome.shops_visited,
                    outcome.choices_resolved
                );
            }
            Err(e) if e.is_stop() => {
                summary.stopped_by_user = true;
                log::info!("🛑 Stopped by user during run {attempt}");
                break;
            }
            Err(e) if e.is_retryable() => {
                summary.failed += 1;
                log::error!("❌ Run {attempt}/{runs} failed: {e}");
                if attempt < runs {
                    let delay = session.timing().retry_delay_ms;
                    log::info!("🔁 Retrying in {:.1}s", delay as f64 / 1000.0);
                    session.sleep_ms(delay).await;
                }
            }
            Err(e) => {
                summary.failed += 1;
                log::error!("❌ Run {attempt}/{runs} failed, giving up: {e}");
                summary.aborted = Some(e.to_string());
                break;
            }
        }
    }

    log::info!("📊 Batch finished: {summary}");
    summary
}
