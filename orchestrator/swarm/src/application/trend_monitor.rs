// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Trend Monitor - Background research loop with alerting
//!
//! Every interval, runs the supervisor's RESEARCH phase for the configured
//! keywords and raises alerts from the `fetched_trends` each research worker
//! returned. Cancellation is cooperative and only observed between cycles;
//! a cycle that has started always runs to completion.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use chimera_core::domain::node_config::{AlertThresholds, MonitoringConfig};
use chimera_core::domain::worker::WorkerId;

use crate::application::supervisor::{ResearchRequest, Supervisor};
use crate::domain::phase::PhaseResult;

/// Recorded alerts kept in memory; oldest are dropped first.
pub const ALERT_HISTORY_LIMIT: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    HighVolume,
    StrongSentiment,
    RisingTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAlert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub keyword: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
    pub source: WorkerId,
    pub detected_at: DateTime<Utc>,
}

/// Scan one research phase result for alert-worthy trends.
pub fn detect_alerts(phase: &PhaseResult, thresholds: &AlertThresholds) -> Vec<TrendAlert> {
    let mut alerts = Vec::new();

    for outcome in phase.results() {
        let Some(trends) = outcome
            .result_field("fetched_trends")
            .and_then(Value::as_array)
        else {
            continue;
        };

        for trend in trends {
            let Some(keyword) = trend.get("keyword").and_then(Value::as_str) else {
                continue;
            };
            let mut push = |kind: AlertKind,
                            message: String,
                            volume: Option<u64>,
                            sentiment: Option<f64>| {
                alerts.push(TrendAlert {
                    kind,
                    keyword: keyword.to_string(),
                    message,
                    volume,
                    sentiment,
                    source: outcome.worker_id.clone(),
                    detected_at: Utc::now(),
                });
            };

            if let Some(volume) = trend.get("volume").and_then(Value::as_u64) {
                if volume > thresholds.high_volume {
                    push(
                        AlertKind::HighVolume,
                        format!("High volume detected for '{}': {} searches", keyword, volume),
                        Some(volume),
                        None,
                    );
                }
            }

            if let Some(sentiment) = trend.get("sentiment_score").and_then(Value::as_f64) {
                if sentiment.abs() > thresholds.strong_sentiment {
                    push(
                        AlertKind::StrongSentiment,
                        format!("Strong sentiment detected for '{}': {}", keyword, sentiment),
                        None,
                        Some(sentiment),
                    );
                }
            }

            if trend.get("trend_strength").and_then(Value::as_str) == Some("rising") {
                push(
                    AlertKind::RisingTrend,
                    format!("Rising trend detected for '{}'", keyword),
                    None,
                    None,
                );
            }
        }
    }

    alerts
}

#[derive(Debug)]
pub enum MonitorStart {
    Started(JoinHandle<()>),
    /// A loop is already running; nothing new was spawned.
    AlreadyRunning,
}

pub struct TrendMonitor {
    supervisor: Arc<Supervisor>,
    interval: Duration,
    keywords: Vec<String>,
    max_cycles: Option<u64>,
    thresholds: RwLock<AlertThresholds>,
    alerts: Mutex<VecDeque<TrendAlert>>,
    running: AtomicBool,
    shutdown_token: Mutex<CancellationToken>,
}

impl TrendMonitor {
    pub fn new(supervisor: Arc<Supervisor>, config: &MonitoringConfig) -> Self {
        Self {
            supervisor,
            interval: Duration::from_secs(config.interval_seconds.max(1)),
            keywords: config.keywords.clone(),
            max_cycles: None,
            thresholds: RwLock::new(config.thresholds),
            alerts: Mutex::new(VecDeque::new()),
            running: AtomicBool::new(false),
            shutdown_token: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Stop on its own after `cycles` completed cycles.
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn start(self: Arc<Self>) -> MonitorStart {
        if self.running.swap(true, Ordering::SeqCst) {
            info!("Trend monitoring is already active");
            return MonitorStart::AlreadyRunning;
        }

        let token = self.shutdown_token.lock().clone();

        MonitorStart::Started(tokio::spawn(async move {
            self.run(token).await;
        }))
    }

    /// Request shutdown. Takes effect before the next cycle starts; a stop
    /// requested before `start()` ends that loop before its first cycle.
    pub fn stop(&self) {
        self.shutdown_token.lock().cancel();
    }

    pub fn alerts(&self) -> Vec<TrendAlert> {
        self.alerts.lock().iter().cloned().collect()
    }

    pub fn thresholds(&self) -> AlertThresholds {
        *self.thresholds.read()
    }

    pub fn set_thresholds(&self, thresholds: AlertThresholds) {
        info!(
            high_volume = thresholds.high_volume,
            strong_sentiment = thresholds.strong_sentiment,
            "Trend alert thresholds updated"
        );
        *self.thresholds.write() = thresholds;
    }

    async fn run(&self, token: CancellationToken) {
        info!(
            interval_seconds = self.interval.as_secs(),
            keywords = ?self.keywords,
            "Starting trend monitoring"
        );

        let mut tick = interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycles = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!("Shutdown signal received, stopping trend monitoring");
                    break;
                }
                _ = tick.tick() => {
                    let raised = self.run_cycle().await;
                    cycles += 1;
                    debug!(cycle = cycles, alerts = raised, "Trend monitoring cycle completed");

                    if self.max_cycles.is_some_and(|max| cycles >= max) {
                        info!(cycles, "Trend monitoring reached its cycle limit");
                        break;
                    }
                }
            }
        }

        // A consumed stop must not leak into the next start()
        *self.shutdown_token.lock() = CancellationToken::new();
        self.running.store(false, Ordering::SeqCst);
        info!("Trend monitoring stopped");
    }

    /// One research pass. Returns the number of alerts raised.
    pub async fn run_cycle(&self) -> usize {
        let request = ResearchRequest::new("trend_monitoring").with_keywords(self.keywords.clone());
        let phase = self.supervisor.analyze_trends(&request).await;

        if let Some(error) = phase.error() {
            warn!(error, "Trend monitoring cycle could not run research");
            return 0;
        }

        let alerts = detect_alerts(&phase, &self.thresholds());
        for alert in &alerts {
            info!(alert_type = ?alert.kind, keyword = %alert.keyword, "ALERT: {}", alert.message);
        }

        let count = alerts.len();
        let mut history = self.alerts.lock();
        history.extend(alerts);
        while history.len() > ALERT_HISTORY_LIMIT {
            history.pop_front();
        }
        count
    }
}
