//! Progress bar utilities for CLI downloads

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::Path;

/// Bar length; fractions are shown in tenths of a percent
const BAR_LENGTH: u64 = 1000;

/// Keeps displayed progress from moving backwards.
///
/// The library forwards raw fractions, which can arrive out of order or be
/// out of range. The floor only ever moves up and stays within [0, 1].
#[derive(Debug, Default, Clone, Copy)]
pub struct ProgressFloor {
    last: f64,
}

impl ProgressFloor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw fraction, get the value to display
    pub fn update(&mut self, raw: f64) -> f64 {
        if raw.is_finite() {
            let clamped = raw.clamp(0.0, 1.0);
            if clamped > self.last {
                self.last = clamped;
            }
        }
        self.last
    }
}

/// Manages progress bars for several downloads
pub struct DownloadProgress {
    multi: MultiProgress,
}

impl DownloadProgress {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
        }
    }

    /// Create a progress bar for a resource
    pub fn add(&self, label: &str) -> ResourceBar {
        let pb = self.multi.add(ProgressBar::new(BAR_LENGTH));

        let bar_style = ProgressStyle::default_bar()
            .template("{spinner:.green} {msg:30} [{bar:40.cyan/blue}] {percent:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ");
        pb.set_style(bar_style);
        pb.set_message(label.to_string());

        ResourceBar { pb }
    }
}

impl Default for DownloadProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// One download's bar
pub struct ResourceBar {
    pb: ProgressBar,
}

impl ResourceBar {
    /// Callback to hand to the library; never shows a regression
    pub fn callback(&self) -> impl FnMut(f64) + Send + 'static {
        let pb = self.pb.clone();
        let mut floor = ProgressFloor::new();
        move |raw| {
            let shown = floor.update(raw);
            pb.set_position((shown * BAR_LENGTH as f64).round() as u64);
        }
    }

    pub fn finish(&self, path: &Path) {
        self.pb.set_position(BAR_LENGTH);
        self.pb.finish_with_message(format!(
            "{} {}",
            style("✓").green().bold(),
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default()
        ));
    }

    pub fn fail(&self, error: &str) {
        self.pb.abandon_with_message(format!(
            "{} Failed: {}",
            style("✗").red().bold(),
            error
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_never_regresses() {
        let mut floor = ProgressFloor::new();
        let shown: Vec<f64> = [0.2, 0.5, 0.4, 0.9, 0.7, 1.0]
            .into_iter()
            .map(|p| floor.update(p))
            .collect();
        assert_eq!(shown, vec![0.2, 0.5, 0.5, 0.9, 0.9, 1.0]);
    }

    #[test]
    fn floor_clamps_bad_values() {
        let mut floor = ProgressFloor::new();
        assert_eq!(floor.update(f64::NAN), 0.0);
        assert_eq!(floor.update(-0.5), 0.0);
        assert_eq!(floor.update(0.3), 0.3);
        assert_eq!(floor.update(f64::INFINITY), 0.3);
        assert_eq!(floor.update(1.7), 1.0);
    }
}
