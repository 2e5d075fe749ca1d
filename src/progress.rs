// Transfer-rate estimation from cumulative byte samples

use std::time::{Duration, Instant};

use crate::models::DownloadProgress;

/// Per-transfer speed and ETA estimator.
///
/// One instance per byte stream in flight; state never carries over between
/// transfers. Speed is the single-sample delta rate, which gets noisy on
/// bursty links; callers wanting stabler numbers can average the emitted
/// values without changing this contract.
#[derive(Debug, Default)]
pub struct RateEstimator {
    started: bool,
    last_instant: Option<Instant>,
    last_bytes: u64,
}

impl RateEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one cumulative sample. `total` is 0 when the content length is
    /// unknown. The first call starts the session clock and reports a
    /// zero-rate state.
    pub fn sample(&mut self, bytes: u64, total: u64) -> DownloadProgress {
        self.sample_at(Instant::now(), bytes, total)
    }

    fn sample_at(&mut self, now: Instant, bytes: u64, total: u64) -> DownloadProgress {
        if !self.started {
            self.started = true;
            self.last_instant = Some(now);
            self.last_bytes = 0;

            return DownloadProgress {
                bytes_transferred: 0,
                total_bytes: total,
                speed_kbs: 0.0,
                eta_formatted: "N/A".to_string(),
            };
        }

        let last = self.last_instant.unwrap_or(now);
        // Floor at 1ms so a burst of chunks cannot divide by zero
        let elapsed = now.duration_since(last).max(Duration::from_millis(1));
        let delta = bytes.saturating_sub(self.last_bytes);

        let speed_kbs = delta as f64 / 1024.0 / elapsed.as_secs_f64();

        let eta_seconds = if speed_kbs > 0.0 && total > 0 {
            total.saturating_sub(bytes) as f64 / 1024.0 / speed_kbs
        } else {
            0.0
        };

        self.last_instant = Some(now);
        self.last_bytes = bytes;

        DownloadProgress {
            bytes_transferred: bytes,
            total_bytes: total,
            speed_kbs,
            eta_formatted: format_eta(eta_seconds),
        }
    }

    /// Return the session to its initial state
    pub fn reset(&mut self) {
        self.started = false;
        self.last_instant = None;
        self.last_bytes = 0;
    }
}

/// Format a duration in seconds as HH:MM:SS
pub fn format_eta(seconds: f64) -> String {
    let secs = seconds.round() as u64;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_reports_zero_state() {
        let mut est = RateEstimator::new();
        let p = est.sample_at(Instant::now(), 4096, 8192);

        assert_eq!(p.bytes_transferred, 0);
        assert_eq!(p.total_bytes, 8192);
        assert_eq!(p.speed_kbs, 0.0);
        assert_eq!(p.eta_formatted, "N/A");
    }

    #[test]
    fn steady_rate_yields_one_kb_per_second() {
        let mut est = RateEstimator::new();
        let t0 = Instant::now();

        est.sample_at(t0, 0, 4096);

        let p1 = est.sample_at(t0 + Duration::from_secs(1), 1024, 4096);
        assert!((p1.speed_kbs - 1.0).abs() < 1e-9);

        let p2 = est.sample_at(t0 + Duration::from_secs(2), 2048, 4096);
        assert!((p2.speed_kbs - 1.0).abs() < 1e-9);
        assert_eq!(p2.eta_formatted, "00:00:02");
    }

    #[test]
    fn unknown_total_reports_zero_eta() {
        let mut est = RateEstimator::new();
        let t0 = Instant::now();

        est.sample_at(t0, 0, 0);
        let p = est.sample_at(t0 + Duration::from_secs(1), 2048, 0);

        assert!(p.speed_kbs > 0.0);
        assert_eq!(p.eta_formatted, "00:00:00");
    }

    #[test]
    fn reset_starts_a_fresh_session() {
        let mut est = RateEstimator::new();
        let t0 = Instant::now();

        est.sample_at(t0, 0, 1024);
        est.sample_at(t0 + Duration::from_secs(1), 512, 1024);

        est.reset();

        let p = est.sample_at(t0 + Duration::from_secs(2), 900, 1024);
        assert_eq!(p.bytes_transferred, 0);
        assert_eq!(p.speed_kbs, 0.0);
        assert_eq!(p.eta_formatted, "N/A");
    }

    #[test]
    fn eta_formatting() {
        assert_eq!(format_eta(0.0), "00:00:00");
        assert_eq!(format_eta(59.4), "00:00:59");
        assert_eq!(format_eta(61.0), "00:01:01");
        assert_eq!(format_eta(3661.0), "01:01:01");
    }
}
