//! Filtering of odometry against range data

use super::sensors::RangeScan;
use crate::config::SlipConfig;

/// Detects wheel spin without travel.
///
/// A cycle is suspect when a wide span of the scan is blocked by very short
/// returns, the scan has not changed since the previous cycle, and the wheels
/// still report motion. Suspect cycles push a streak counter up, clean cycles
/// pull it down; the guard is active while the streak reaches the debounce
/// count.
#[derive(Debug)]
pub struct SlipGuard {
    config: SlipConfig,
    previous: Option<Vec<f64>>,
    streak: u32,
}

impl SlipGuard {
    pub fn new(config: SlipConfig) -> Self {
        SlipGuard {
            config,
            previous: None,
            streak: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.config.enabled && self.streak >= self.config.debounce_cycles
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.streak = 0;
    }

    /// Feed one cycle. `wheel_travel` is the mean absolute wheel displacement
    /// in metres. Returns whether the cycle's displacement should be dropped.
    pub fn observe(&mut self, scan: &RangeScan, wheel_travel: f64) -> bool {
        if !self.config.enabled {
            return false;
        }

        let ranges: Vec<f64> = scan.ranges.iter().map(|&r| scan.effective_range(r)).collect();
        let suspect = self.blocked(scan, &ranges)
            && self.unchanged(&ranges)
            && wheel_travel > self.config.min_wheel_travel;

        if suspect {
            // Capped so the guard releases within a bounded number of clean cycles
            self.streak = (self.streak + 1).min(self.config.debounce_cycles * 2);
        } else {
            self.streak = self.streak.saturating_sub(1);
        }
        self.previous = Some(ranges);

        if self.is_active() {
            log::debug!("Slip guard active (streak {})", self.streak);
        }
        self.is_active()
    }

    fn blocked(&self, scan: &RangeScan, ranges: &[f64]) -> bool {
        let n = ranges.len();
        if n < 2 {
            return false;
        }
        // Readings are clamped up to the sensor minimum, so that counts as short
        let threshold = self.config.short_range.max(scan.min_range);
        let short: Vec<bool> = ranges.iter().map(|&r| r <= threshold).collect();
        let count = short.iter().filter(|&&s| s).count();
        if (count as f64) / (n as f64) < self.config.short_fraction {
            return false;
        }
        let run = longest_run(&short, scan.is_full_circle());
        let step = if scan.is_full_circle() {
            scan.fov / n as f64
        } else {
            scan.fov / (n - 1) as f64
        };
        let span = run.saturating_sub(1) as f64 * step;
        span >= self.config.min_span
    }

    fn unchanged(&self, ranges: &[f64]) -> bool {
        match &self.previous {
            Some(previous) if previous.len() == ranges.len() && !ranges.is_empty() => {
                let total: f64 = previous
                    .iter()
                    .zip(ranges)
                    .map(|(a, b)| (a - b).abs())
                    .sum();
                total / (ranges.len() as f64) < self.config.max_scan_change
            }
            _ => false,
        }
    }
}

/// Length of the longest run of `true`, continuing across the ends when
/// `wraps` is set.
fn longest_run(flags: &[bool], wraps: bool) -> usize {
    let n = flags.len();
    let Some(start) = flags.iter().position(|&f| !f) else {
        return n;
    };
    let (offset, len) = if wraps { (start + 1, n) } else { (0, n) };
    let mut best = 0;
    let mut current = 0;
    for i in 0..len {
        if flags[(offset + i) % n] {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}
