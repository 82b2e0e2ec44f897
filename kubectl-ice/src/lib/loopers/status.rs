use chrono::{DateTime, SecondsFormat, Utc};
use k8s_openapi::api::core::v1::{ContainerState, ContainerStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

use super::column_sum;
use super::restarts::COLUMN_RESTARTS;
use crate::Result;
use crate::lib::builder::{BuilderInformation, Looper, Row};
use crate::lib::cell::Cell;

const READY: usize = 0;
const RESTARTS: usize = 2;
const STATE: usize = 3;
const COLUMNS: usize = 10;

/// Current (or previous) state of every container
pub struct Status {
    previous: bool,
    now: DateTime<Utc>,
}

/// The interesting parts of whichever state a container is in
#[derive(Default)]
struct StateSummary<'a> {
    name: &'static str,
    reason: Option<&'a str>,
    message: Option<&'a str>,
    exit_code: Option<i32>,
    signal: Option<i32>,
    timestamp: Option<&'a Time>,
}

impl<'a> StateSummary<'a> {
    fn of(state: Option<&'a ContainerState>) -> Self {
        let Some(state) = state else {
            return Self::default();
        };
        if let Some(running) = &state.running {
            Self {
                name: "Running",
                timestamp: running.started_at.as_ref(),
                ..Default::default()
            }
        } else if let Some(terminated) = &state.terminated {
            Self {
                name: "Terminated",
                reason: terminated.reason.as_deref(),
                message: terminated.message.as_deref(),
                exit_code: Some(terminated.exit_code),
                signal: terminated.signal,
                timestamp: terminated.finished_at.as_ref(),
            }
        } else if let Some(waiting) = &state.waiting {
            Self {
                name: "Waiting",
                reason: waiting.reason.as_deref(),
                message: waiting.message.as_deref(),
                ..Default::default()
            }
        } else {
            Self::default()
        }
    }
}

fn optional_count(value: Option<i32>) -> Cell {
    value.map_or_else(Cell::empty, |v| Cell::count(i64::from(v)))
}

/// Largest two units of an elapsed time, `3d4h`, `12m5s`
pub fn format_age(seconds: i64) -> String {
    const UNITS: [(i64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

    let mut remaining = seconds.max(0);
    let mut parts = Vec::new();
    for (size, suffix) in UNITS {
        if remaining >= size || (parts.is_empty() && size == 1) {
            parts.push(format!("{}{suffix}", remaining / size));
            remaining %= size;
        } else if !parts.is_empty() {
            break;
        }
        if parts.len() == 2 {
            break;
        }
    }
    parts.concat()
}

impl Status {
    pub fn new(previous: bool, now: DateTime<Utc>) -> Self {
        Self { previous, now }
    }

    fn status_row(&self, status: &ContainerStatus) -> Row {
        let state = if self.previous {
            status.last_state.as_ref()
        } else {
            status.state.as_ref()
        };
        let summary = StateSummary::of(state);

        let instant = summary.timestamp.map(|time| time.0);
        let (timestamp, age) = match instant {
            Some(at) => {
                let elapsed = (self.now - at).num_seconds().max(0);
                (
                    Cell::text(at.to_rfc3339_opts(SecondsFormat::Secs, true)),
                    Cell::int(format_age(elapsed), elapsed),
                )
            }
            None => (Cell::empty(), Cell::empty()),
        };

        vec![
            Cell::text(status.ready.to_string()),
            Cell::text(status.started.map(|s| s.to_string()).unwrap_or_default()),
            Cell::count(i64::from(status.restart_count)),
            Cell::text(summary.name),
            Cell::text(summary.reason.unwrap_or_default()),
            optional_count(summary.exit_code),
            optional_count(summary.signal),
            timestamp,
            age,
            Cell::text(summary.message.unwrap_or_default()),
        ]
    }
}

impl Looper for Status {
    fn headers(&self) -> Vec<&'static str> {
        vec![
            "READY",
            "STARTED",
            COLUMN_RESTARTS,
            "STATE",
            "REASON",
            "EXIT-CODE",
            "SIGNAL",
            "TIMESTAMP",
            "AGE",
            "MESSAGE",
        ]
    }

    fn build_container_status(
        &self,
        status: &ContainerStatus,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(vec![self.status_row(status)])
    }

    fn build_ephemeral_container_status(
        &self,
        status: &ContainerStatus,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(vec![self.status_row(status)])
    }

    fn build_branch(&self, info: &BuilderInformation, rows: &[Row]) -> Result<Option<Row>> {
        let ready = rows
            .iter()
            .filter(|row| row.get(READY).is_some_and(|c| c.as_str() == "true"))
            .count();
        let total = rows
            .iter()
            .filter(|row| row.get(READY).is_some_and(|c| !c.as_str().is_empty()))
            .count();

        let mut branch = vec![Cell::empty(); COLUMNS];
        branch[READY] = Cell::text(format!("{ready}/{total}"));
        branch[RESTARTS] = Cell::count(column_sum(rows, RESTARTS).unwrap_or_default());
        branch[STATE] = Cell::text(info.phase.as_str());
        Ok(Some(branch))
    }
}
