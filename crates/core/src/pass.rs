//! Outputs of one evaluation pass.

/// A fired alert, ready for routing.
///
/// Produced by evaluation, consumed immediately by the notification router,
/// never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerResult {
    pub user_id: String,
    pub alert_id: String,
    pub symbol: String,
    pub message: String,
}

/// Counters for one completed pass, logged by the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Alerts loaded and run through the evaluator.
    pub alerts_evaluated: usize,
    /// Alerts whose condition fired this pass.
    pub triggers_fired: usize,
    /// Alerts skipped because their symbol had no market data.
    pub alerts_skipped: usize,
    /// Fired alerts whose notification could not be delivered.
    pub notification_errors: usize,
    /// Distinct symbols the batched fetch returned.
    pub symbols_fetched: usize,
}
