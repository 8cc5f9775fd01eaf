//! One full evaluation pass.

use std::collections::{HashMap, HashSet};

use pricewatch_alerts::{ChannelProvider, NotificationRouter};
use pricewatch_core::{PassSummary, PriceBaseline, TriggerResult};
use pricewatch_feeds::MarketDataFetcher;
use pricewatch_store::{AlertStore, BaselineStore};
use tracing::{debug, error, info};

use crate::coordinator::PriceBaselineCoordinator;
use crate::error::EngineError;
use crate::evaluator::evaluate;

/// Orchestrates a scheduled pass over every alert.
///
/// A pass is a pure function of (alert configs, persisted baselines, fetched
/// snapshots): running it twice with unchanged inputs makes the same trigger
/// decisions twice. Baselines advance exactly once per fetched symbol after
/// all alerts are evaluated, whether or not anything fired.
pub struct EvaluationRunner<S, F, P> {
    store: S,
    coordinator: PriceBaselineCoordinator<F>,
    router: NotificationRouter<P>,
}

impl<S, F, P> EvaluationRunner<S, F, P>
where
    S: AlertStore + BaselineStore,
    F: MarketDataFetcher,
    P: ChannelProvider,
{
    pub fn new(store: S, fetcher: F, router: NotificationRouter<P>) -> Self {
        Self {
            store,
            coordinator: PriceBaselineCoordinator::new(fetcher),
            router,
        }
    }

    pub async fn run(&self) -> Result<PassSummary, EngineError> {
        let alerts = AlertStore::list_all(&self.store).await?;
        info!(alerts = alerts.len(), "evaluation pass started");

        let mut summary = PassSummary::default();
        if alerts.is_empty() {
            return Ok(summary);
        }

        let baselines: HashMap<String, f64> = BaselineStore::list_all(&self.store)
            .await?
            .into_iter()
            .map(|b| (b.symbol, b.last_price))
            .collect();

        let symbols: HashSet<String> = alerts.iter().map(|a| a.symbol.clone()).collect();
        let views = self
            .coordinator
            .fetch_and_reconcile(&symbols, &baselines)
            .await?;
        summary.symbols_fetched = views.len();

        for alert in &alerts {
            summary.alerts_evaluated += 1;

            let Some(view) = views.get(&alert.symbol) else {
                debug!(
                    alert_id = %alert.alert_id,
                    symbol = %alert.symbol,
                    "no market data for symbol, skipping"
                );
                summary.alerts_skipped += 1;
                continue;
            };

            let Some(message) = evaluate(&alert.condition, view.previous, &view.snapshot) else {
                continue;
            };

            let trigger = TriggerResult {
                user_id: alert.user_id.clone(),
                alert_id: alert.alert_id.clone(),
                symbol: alert.symbol.clone(),
                message: format!("Alert for {} ({}): {}", alert.alert_id, alert.symbol, message),
            };
            summary.triggers_fired += 1;
            info!(
                alert_id = %alert.alert_id,
                symbol = %alert.symbol,
                condition = alert.condition.kind(),
                "alert triggered"
            );

            if let Err(err) = self.router.dispatch(&trigger, &alert.email).await {
                error!(
                    alert_id = %alert.alert_id,
                    error = %err,
                    "failed to deliver alert notification"
                );
                summary.notification_errors += 1;
            }
        }

        let new_baselines: Vec<PriceBaseline> = views
            .values()
            .map(|view| PriceBaseline::from_snapshot(&view.snapshot))
            .collect();
        self.store.put_many(&new_baselines).await?;

        info!(
            evaluated = summary.alerts_evaluated,
            fired = summary.triggers_fired,
            skipped = summary.alerts_skipped,
            errors = summary.notification_errors,
            "evaluation pass finished"
        );
        Ok(summary)
    }
}
