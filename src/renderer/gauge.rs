use crate::config::DisplayConfig;
use crate::models::MemSnapshot;
use crate::renderer::format::{self, DisplayMagnitude};
use std::fmt;

/// Digit slots available for each number on the gauge.
pub const GAUGE_DIGITS: usize = 6;
/// Width of the usage bars in pixels.
pub const BAR_WIDTH_PX: u32 = 46;

/// Display-ready numbers for one row (memory or swap).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaugeRow {
    pub total: DisplayMagnitude,
    pub total_digits: Vec<u8>,
    pub shown: DisplayMagnitude,
    pub shown_digits: Vec<u8>,
    pub percent: u64,
    pub bar: (u32, u32, u32),
}

impl GaugeRow {
    fn new(total: DisplayMagnitude, shown: DisplayMagnitude, percent: u64, bar: (u32, u32, u32)) -> Self {
        Self {
            total_digits: format::to_digits(total.value, GAUGE_DIGITS),
            shown_digits: format::to_digits(shown.value, GAUGE_DIGITS),
            total,
            shown,
            percent,
            bar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaugeView {
    pub show_used: bool,
    pub memory: GaugeRow,
    pub swap: GaugeRow,
}

impl GaugeView {
    pub fn build(snapshot: &MemSnapshot, display: &DisplayConfig) -> Self {
        Self {
            show_used: display.show_used,
            memory: memory_row(snapshot, display),
            swap: swap_row(snapshot, display),
        }
    }
}

fn memory_row(snapshot: &MemSnapshot, display: &DisplayConfig) -> GaugeRow {
    // Both numbers share the unit picked for the total.
    let unit = format::choose_unit(snapshot.mem_total, display.mb);

    let mut shown = snapshot.available(display.standard_free);
    if display.show_used {
        shown = snapshot.mem_total.saturating_sub(shown);
    }

    let bar = format::bar_segments(
        snapshot.program_used(),
        snapshot.mem_buffers,
        snapshot.mem_cached,
        snapshot.mem_total,
        BAR_WIDTH_PX,
    );

    GaugeRow::new(
        format::to_magnitude(snapshot.mem_total, unit),
        format::to_magnitude(shown, unit),
        format::percentage(shown, snapshot.mem_total),
        bar,
    )
}

fn swap_row(snapshot: &MemSnapshot, display: &DisplayConfig) -> GaugeRow {
    let shown = if display.show_used {
        snapshot.swap_used
    } else {
        snapshot.swap_free
    };

    // Swap picks a unit per number.
    let total_unit = format::choose_unit(snapshot.swap_total, display.mb);
    let shown_unit = format::choose_unit(shown, display.mb);

    let (used_px, _, _) = format::bar_segments(snapshot.swap_used, 0, 0, snapshot.swap_total, BAR_WIDTH_PX);

    GaugeRow::new(
        format::to_magnitude(snapshot.swap_total, total_unit),
        format::to_magnitude(shown, shown_unit),
        format::percentage(shown, snapshot.swap_total),
        (used_px, 0, 0),
    )
}

impl fmt::Display for GaugeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.show_used { "used" } else { "free" };
        write!(
            f,
            "MEM {} {}/{} {}% | SWP {} {}/{} {}%",
            label,
            self.memory.shown,
            self.memory.total,
            self.memory.percent,
            label,
            self.swap.shown,
            self.swap.total,
            self.swap.percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> MemSnapshot {
        MemSnapshot::new(8_000_000, 2_000_000, 500_000, 1_500_000, 2_000_000, 2_000_000)
    }

    #[test]
    fn test_free_with_buffers_and_cache() {
        let view = GaugeView::build(&snapshot(), &DisplayConfig::default());

        // 8000000 kB needs seven digits, so the row switches to MB.
        assert_eq!(view.memory.total.value, 7812);
        assert_eq!(view.memory.shown.value, 3906);
        assert_eq!(view.memory.percent, 50);
        assert_eq!(view.memory.bar, (23, 2, 8));
        assert_eq!(view.memory.total_digits, vec![2, 1, 8, 7]);

        assert_eq!(view.swap.total.value, 1953);
        assert_eq!(view.swap.percent, 100);
        assert_eq!(view.swap.bar, (0, 0, 0));
    }

    #[test]
    fn test_standard_free_and_show_used() {
        let display = DisplayConfig {
            mb: false,
            show_used: true,
            standard_free: true,
        };
        let view = GaugeView::build(&snapshot(), &display);
        assert_eq!(view.memory.percent, 75);
        assert_eq!(view.swap.shown.value, 0);
        assert_eq!(view.swap.shown.unit, format::Unit::Kilobytes);
        assert_eq!(view.swap.percent, 0);
    }

    #[test]
    fn test_small_values_stay_in_kilobytes() {
        let small = MemSnapshot::new(16_384, 4_096, 0, 0, 0, 0);
        let view = GaugeView::build(&small, &DisplayConfig::default());
        assert_eq!(view.memory.total.unit, format::Unit::Kilobytes);
        assert_eq!(view.memory.total_digits, vec![4, 8, 3, 6, 1]);
        assert_eq!(view.memory.percent, 25);
        assert_eq!(view.swap.percent, 0);
        assert_eq!(view.to_string(), "MEM free 4096 kB/16384 kB 25% | SWP free 0 kB/0 kB 0%");
    }

    #[test]
    fn test_forced_megabytes() {
        let small = MemSnapshot::new(16_384, 4_096, 0, 0, 0, 0);
        let display = DisplayConfig {
            mb: true,
            ..DisplayConfig::default()
        };
        let view = GaugeView::build(&small, &display);
        assert_eq!(view.memory.total.to_string(), "16 MB");
        assert_eq!(view.memory.shown.to_string(), "4 MB");
    }
}
