use crate::domain::model::BatchReport;
#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

/// 每個階段結束時的資源與處理量
#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub documents: usize,
    pub phase_time: Duration,
    pub documents_per_second: f64,
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
    pub elapsed_time: Duration,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    phase_start: Instant,
    peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
pub struct SystemMonitor {
    state: Option<Mutex<MonitorState>>,
    pid: Option<Pid>,
    start_time: Instant,
}

#[cfg(feature = "cli")]
pub fn documents_per_second(documents: usize, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds > 0.0 {
        documents as f64 / seconds
    } else {
        0.0
    }
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let start_time = Instant::now();
        if !enabled {
            return Self {
                state: None,
                pid: None,
                start_time,
            };
        }

        // 取不到 PID 時只記錄耗時與處理量
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("Process monitoring unavailable: {}", e);
                None
            }
        };

        let mut system = System::new_with_specifics(RefreshKind::everything());
        system.refresh_all();

        Self {
            state: Some(Mutex::new(MonitorState {
                system,
                phase_start: start_time,
                peak_memory_mb: 0,
            })),
            pid,
            start_time,
        }
    }

    /// 記錄一個階段並重設階段計時
    pub fn record_phase(&self, phase: &str, documents: usize) -> Option<PhaseStats> {
        let mut state = self.state.as_ref()?.lock().ok()?;
        state.system.refresh_all();

        let (cpu_usage, memory_usage_mb) = match self.pid.and_then(|pid| state.system.process(pid))
        {
            Some(process) => (process.cpu_usage(), process.memory() / 1024 / 1024),
            None => (0.0, 0),
        };
        state.peak_memory_mb = state.peak_memory_mb.max(memory_usage_mb);

        let phase_time = state.phase_start.elapsed();
        state.phase_start = Instant::now();

        Some(PhaseStats {
            phase: phase.to_string(),
            documents,
            phase_time,
            documents_per_second: documents_per_second(documents, phase_time),
            cpu_usage,
            memory_usage_mb,
            peak_memory_mb: state.peak_memory_mb,
            elapsed_time: self.start_time.elapsed(),
        })
    }

    pub fn log_phase(&self, phase: &str, documents: usize) {
        if let Some(stats) = self.record_phase(phase, documents) {
            tracing::info!(
                "📊 {} - {} documents in {:?} ({:.1}/s), CPU: {:.1}%, Memory: {}MB, Peak: {}MB",
                stats.phase,
                stats.documents,
                stats.phase_time,
                stats.documents_per_second,
                stats.cpu_usage,
                stats.memory_usage_mb,
                stats.peak_memory_mb
            );
        }
    }

    pub fn log_summary(&self, report: &BatchReport) {
        if let Some(stats) = self.record_phase("Summary", report.total()) {
            let throughput = documents_per_second(report.total(), stats.elapsed_time);
            tracing::info!(
                "📊 Run Stats - {} converted, {} failed, Total Time: {:?} ({:.1} documents/s), Peak Memory: {}MB",
                report.converted.len(),
                report.failed.len(),
                stats.elapsed_time,
                throughput,
                stats.peak_memory_mb
            );
        }
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 非 CLI 環境提供空實現
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_phase(&self, _phase: &str, _documents: usize) {}

    pub fn log_summary(&self, _report: &BatchReport) {}
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_documents_per_second() {
        assert_eq!(documents_per_second(10, Duration::from_secs(2)), 5.0);
        assert_eq!(documents_per_second(10, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_disabled_monitor_records_nothing() {
        let monitor = SystemMonitor::default();
        assert!(monitor.record_phase("Transform", 3).is_none());
    }

    #[test]
    fn test_enabled_monitor_tracks_phase_documents() {
        let monitor = SystemMonitor::new(true);
        let extract = monitor.record_phase("Extract", 4).unwrap();
        assert_eq!(extract.phase, "Extract");
        assert_eq!(extract.documents, 4);

        let transform = monitor.record_phase("Transform", 4).unwrap();
        assert!(transform.elapsed_time >= transform.phase_time);
        assert!(transform.peak_memory_mb >= transform.memory_usage_mb);
    }
}
