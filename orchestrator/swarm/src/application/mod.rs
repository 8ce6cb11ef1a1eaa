// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod supervisor;
pub mod trend_monitor;

pub use supervisor::{ResearchRequest, SubagentRegistration, Supervisor, SupervisorError};
pub use trend_monitor::{detect_alerts, AlertKind, MonitorStart, TrendAlert, TrendMonitor};
