//! NDJSON streaming events for driver integration.
//!
//! One line per event on stderr when enabled; the library itself never
//! prints.

use crate::counters::MoveCounters;
use crate::update::UpdateReport;

#[derive(Debug, Clone, Copy)]
pub struct StreamEmitter {
    enabled: bool,
}

impl StreamEmitter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn emit_json(&self, json: &str) {
        if self.enabled {
            eprintln!("{}", json);
        }
    }

    pub fn emit_update_complete(&self, report: &UpdateReport, elapsed_ms: u64) {
        let json = format!(
            r#"{{"event":"update_complete","timestep":{},"move":"{}","clusters":{},"accepted":{},"rejected":{},"elapsed_ms":{}}}"#,
            report.timestep,
            if report.line { "line" } else { "pivot" },
            report.n_clusters,
            report.accepted,
            report.rejected,
            elapsed_ms
        );
        self.emit_json(&json);
    }

    pub fn emit_run_complete(
        &self,
        steps: u64,
        n_particles: usize,
        counters: &MoveCounters,
        elapsed_ms: u64,
    ) {
        let json = format!(
            r#"{{"event":"run_complete","steps":{},"particles":{},"moves":{},"pivot_acceptance":{:.6},"reflection_acceptance":{:.6},"elapsed_ms":{}}}"#,
            steps,
            n_particles,
            counters.n_moves(),
            counters.translate_acceptance(),
            counters.rotate_acceptance(),
            elapsed_ms
        );
        self.emit_json(&json);
    }
}
