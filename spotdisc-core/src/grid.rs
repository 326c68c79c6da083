//! Canonical intraday time grids and strict alignment.
//!
//! Fetched series are reindexed onto a fixed grid for one calendar day.
//! Missing labels get an explicit `None` — no interpolation, no
//! nearest-neighbor. Forward-filling exists only for the west-to-east
//! transmission column, whose upstream legitimately omits repeated values;
//! that is a documented special case, never a general fill.

use crate::series::Series;
use chrono::NaiveDate;

/// Grid step for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// 15-minute grid: 96 points, `00:00`..=`23:45`.
    QuarterHour,
    /// Hourly grid: 24 points, `00:00`..=`23:00`.
    Hour,
}

impl Granularity {
    pub fn step_minutes(self) -> u32 {
        match self {
            Granularity::QuarterHour => 15,
            Granularity::Hour => 60,
        }
    }

    pub fn points_per_day(self) -> usize {
        (24 * 60 / self.step_minutes()) as usize
    }
}

/// An ordered sequence of `HH:MM` labels with fixed step, covering one day.
///
/// Grids are cheap and regenerated per day; the date-qualified labels from
/// [`TimeGrid::datetime_labels`] are affixed only after alignment.
#[derive(Debug, Clone)]
pub struct TimeGrid {
    granularity: Granularity,
    labels: Vec<String>,
}

impl TimeGrid {
    pub fn build(granularity: Granularity) -> Self {
        let step = granularity.step_minutes();
        let labels = (0..24 * 60)
            .step_by(step as usize)
            .map(|m| format!("{:02}:{:02}", m / 60, m % 60))
            .collect();
        Self {
            granularity,
            labels,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `YYYY-MM-DD HH:MM` labels for a specific day, parallel to `labels()`.
    pub fn datetime_labels(&self, date: NaiveDate) -> Vec<String> {
        let day = date.format("%Y-%m-%d");
        self.labels.iter().map(|t| format!("{day} {t}")).collect()
    }

    /// Strict reindex of a series onto this grid.
    ///
    /// Each grid label gets either the source value (exact label match) or
    /// `None`. Source labels outside the grid are dropped.
    pub fn align(&self, series: &Series) -> Vec<Option<f64>> {
        self.labels.iter().map(|l| series.get(l)).collect()
    }
}

/// Carry the last known value forward through subsequent missing slots.
/// Leading missing slots stay missing.
pub fn forward_fill(values: &mut [Option<f64>]) {
    let mut last = None;
    for v in values.iter_mut() {
        match *v {
            Some(x) => last = Some(x),
            None => *v = last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_hour_grid_has_96_points() {
        let grid = TimeGrid::build(Granularity::QuarterHour);
        assert_eq!(grid.len(), 96);
        assert_eq!(grid.labels().first().unwrap(), "00:00");
        assert_eq!(grid.labels().last().unwrap(), "23:45");
    }

    #[test]
    fn hourly_grid_has_24_points() {
        let grid = TimeGrid::build(Granularity::Hour);
        assert_eq!(grid.len(), 24);
        assert_eq!(grid.labels().first().unwrap(), "00:00");
        assert_eq!(grid.labels().last().unwrap(), "23:00");
    }

    #[test]
    fn labels_strictly_increasing() {
        for g in [Granularity::QuarterHour, Granularity::Hour] {
            let grid = TimeGrid::build(g);
            for pair in grid.labels().windows(2) {
                assert!(pair[0] < pair[1]);
            }
        }
    }

    #[test]
    fn align_is_strict_reindex() {
        let grid = TimeGrid::build(Granularity::Hour);
        let mut s = Series::new();
        s.insert("00:00", 1.0);
        s.insert("02:00", 3.0);
        s.insert("02:30", 99.0); // off-grid, dropped

        let aligned = grid.align(&s);
        assert_eq!(aligned[0], Some(1.0));
        assert_eq!(aligned[1], None);
        assert_eq!(aligned[2], Some(3.0));
        assert!(aligned[3..].iter().all(|v| v.is_none()));
    }

    #[test]
    fn datetime_labels_carry_the_day() {
        let grid = TimeGrid::build(Granularity::Hour);
        let date = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();
        let labels = grid.datetime_labels(date);
        assert_eq!(labels[0], "2025-08-15 00:00");
        assert_eq!(labels[23], "2025-08-15 23:00");
    }

    #[test]
    fn forward_fill_carries_last_value() {
        let mut v = vec![None, Some(2.0), None, None, Some(5.0), None];
        forward_fill(&mut v);
        assert_eq!(v, vec![None, Some(2.0), Some(2.0), Some(2.0), Some(5.0), Some(5.0)]);
    }
}
