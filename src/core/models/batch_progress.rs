use crate::core::errors::SessionError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchProgress {
    pub running: bool,
    pub current: usize,
    pub total: usize,
    pub percent: u8,
}

impl BatchProgress {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn started(total: usize) -> Self {
        Self {
            running: true,
            current: 0,
            total,
            percent: 0,
        }
    }

    pub fn advanced(current: usize, total: usize) -> Self {
        Self {
            running: true,
            current,
            total,
            percent: Self::compute_percent(current, total),
        }
    }

    fn compute_percent(current: usize, total: usize) -> u8 {
        if total == 0 {
            return 0;
        }
        let ratio = current.min(total) as f64 / total as f64;
        (ratio * 100.0).round() as u8
    }
}

/// Outcome of one batch recognition run, per image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub recognized: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<SessionError>,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn processed_count(&self) -> usize {
        self.recognized.len() + self.skipped.len() + self.failed.len()
    }
}
