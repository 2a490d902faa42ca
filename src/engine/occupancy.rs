//! Occupancy (TACE) classification of contributors.

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use super::calendar::{Clock, DateRange};
use super::round2;
use crate::models::{Contributor, Granularity};
use crate::store::StaffingStore;

/// Below this, a contributor is underutilized.
pub const IDEAL_MIN: f64 = 70.0;
/// Above this, a contributor is overloaded.
pub const IDEAL_MAX: f64 = 90.0;
pub const CRITICAL_LOW: f64 = 50.0;
pub const CRITICAL_HIGH: f64 = 110.0;
pub const IDEAL_CENTER: f64 = (IDEAL_MIN + IDEAL_MAX) / 2.0;

/// Where a contributor's mean occupancy falls relative to the thresholds.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyStatus {
    CriticalHigh,
    Overloaded,
    Optimal,
    Underutilized,
    CriticalLow,
    /// No metric rows in the period. Not an error.
    NoData,
}

impl OccupancyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CriticalHigh => "critical_high",
            Self::Overloaded => "overloaded",
            Self::Optimal => "optimal",
            Self::Underutilized => "underutilized",
            Self::CriticalLow => "critical_low",
            Self::NoData => "no_data",
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Self::CriticalHigh | Self::CriticalLow)
    }
}

/// Classifies a mean occupancy percentage.
///
/// Critical bounds are inclusive, ideal bounds belong to `Optimal`:
/// 50 is critical low, 70 and 90 are optimal, 110 is critical high.
pub fn classify(tace: f64) -> OccupancyStatus {
    if tace >= CRITICAL_HIGH {
        OccupancyStatus::CriticalHigh
    } else if tace <= CRITICAL_LOW {
        OccupancyStatus::CriticalLow
    } else if tace > IDEAL_MAX {
        OccupancyStatus::Overloaded
    } else if tace < IDEAL_MIN {
        OccupancyStatus::Underutilized
    } else {
        OccupancyStatus::Optimal
    }
}

/// Distance from the ideal center on a 0-100 scale, saturating at 100.
pub fn severity(tace: f64) -> u32 {
    ((tace - IDEAL_CENTER).abs() * 2.0).round().min(100.0) as u32
}

/// Signed percentage points from the ideal center; positive means over capacity.
pub fn deviation(tace: f64) -> f64 {
    round2(tace - IDEAL_CENTER)
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Thresholds {
    pub ideal_min: f64,
    pub ideal_max: f64,
    pub critical_low: f64,
    pub critical_high: f64,
    pub ideal_center: f64,
}

/// Occupancy of one contributor over a period.
#[derive(Debug, Clone, Serialize)]
pub struct ContributorAnalysis {
    pub contributor: Contributor,
    /// Mean occupancy in percent, `None` when there was no data.
    pub tace: Option<f64>,
    /// Mean available days per metric row.
    pub availability: f64,
    /// Mean worked days per metric row.
    pub workload: f64,
    pub status: OccupancyStatus,
    pub severity: u32,
    pub deviation: f64,
    pub period: DateRange,
}

impl ContributorAnalysis {
    fn no_data(contributor: &Contributor, period: DateRange) -> Self {
        Self {
            contributor: contributor.clone(),
            tace: None,
            availability: 0.0,
            workload: 0.0,
            status: OccupancyStatus::NoData,
            severity: 0,
            deviation: 0.0,
            period,
        }
    }

    /// Occupancy for ordering purposes; zero when there was no data.
    pub fn tace_value(&self) -> f64 {
        self.tace.unwrap_or(0.0)
    }
}

/// Analyzed contributors partitioned by status.
///
/// `critical` holds both critical-high and critical-low contributors.
/// Contributors without data appear in no bucket.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OccupancyReport {
    /// Highest occupancy first.
    pub overloaded: Vec<ContributorAnalysis>,
    /// Lowest occupancy first.
    pub underutilized: Vec<ContributorAnalysis>,
    pub optimal: Vec<ContributorAnalysis>,
    /// Furthest from the ideal center first.
    pub critical: Vec<ContributorAnalysis>,
}

impl OccupancyReport {
    pub fn total_contributors(&self) -> usize {
        self.overloaded.len() + self.underutilized.len() + self.optimal.len() + self.critical.len()
    }

    fn push(&mut self, analysis: ContributorAnalysis) {
        match analysis.status {
            OccupancyStatus::CriticalHigh | OccupancyStatus::CriticalLow => {
                self.critical.push(analysis)
            }
            OccupancyStatus::Overloaded => self.overloaded.push(analysis),
            OccupancyStatus::Underutilized => self.underutilized.push(analysis),
            OccupancyStatus::Optimal => self.optimal.push(analysis),
            OccupancyStatus::NoData => {}
        }
    }

    fn sort(&mut self) {
        self.critical.sort_by(|a, b| {
            let da = (a.tace_value() - IDEAL_CENTER).abs();
            let db = (b.tace_value() - IDEAL_CENTER).abs();
            db.total_cmp(&da)
        });
        self.overloaded
            .sort_by(|a, b| b.tace_value().total_cmp(&a.tace_value()));
        self.underutilized
            .sort_by(|a, b| a.tace_value().total_cmp(&b.tace_value()));
    }
}

pub struct OccupancyAnalyzer<'a> {
    store: &'a dyn StaffingStore,
    clock: &'a dyn Clock,
}

impl<'a> OccupancyAnalyzer<'a> {
    pub fn new(store: &'a dyn StaffingStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            ideal_min: IDEAL_MIN,
            ideal_max: IDEAL_MAX,
            critical_low: CRITICAL_LOW,
            critical_high: CRITICAL_HIGH,
            ideal_center: IDEAL_CENTER,
        }
    }

    /// Averages the contributor's weekly metric rows over `[start, end]`.
    pub fn analyze_contributor(
        &self,
        contributor: &Contributor,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ContributorAnalysis> {
        let period = DateRange::new(start, end);
        let metrics =
            self.store
                .find_staffing_metrics(contributor.id, start, end, Granularity::Weekly)?;

        if metrics.is_empty() {
            return Ok(ContributorAnalysis::no_data(contributor, period));
        }

        let count = metrics.len() as f64;
        let (tace, available, worked) =
            metrics
                .iter()
                .fold((0.0, 0.0, 0.0), |(t, a, w), metric| {
                    (
                        t + metric.tace,
                        a + metric.available_days,
                        w + metric.worked_days,
                    )
                });

        let mean_tace = tace / count;

        Ok(ContributorAnalysis {
            contributor: contributor.clone(),
            tace: Some(round2(mean_tace)),
            availability: round2(available / count),
            workload: round2(worked / count),
            status: classify(mean_tace),
            severity: severity(mean_tace),
            deviation: deviation(mean_tace),
            period,
        })
    }

    /// Analyzes every active contributor, defaulting to the current month.
    pub fn analyze_all_contributors(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<OccupancyReport> {
        let month = DateRange::month_of(self.clock.today());
        let start = start.unwrap_or(month.start);
        let end = end.unwrap_or(month.end);

        let mut report = OccupancyReport::default();
        let mut without_data = 0;

        for contributor in self.store.find_active_contributors()? {
            let analysis = self.analyze_contributor(&contributor, start, end)?;
            if analysis.status == OccupancyStatus::NoData {
                without_data += 1;
                continue;
            }
            tracing::debug!(
                "{}: occupancy {:.2}% ({})",
                contributor.full_name(),
                analysis.tace_value(),
                analysis.status.as_str()
            );
            report.push(analysis);
        }

        report.sort();

        tracing::info!(
            "Occupancy analysis {} to {}: {} critical, {} overloaded, {} underutilized, {} optimal, {} without data",
            start,
            end,
            report.critical.len(),
            report.overloaded.len(),
            report.underutilized.len(),
            report.optimal.len(),
            without_data
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_fall_on_documented_side() {
        assert_eq!(classify(50.0), OccupancyStatus::CriticalLow);
        assert_eq!(classify(70.0), OccupancyStatus::Optimal);
        assert_eq!(classify(90.0), OccupancyStatus::Optimal);
        assert_eq!(classify(110.0), OccupancyStatus::CriticalHigh);
    }

    #[test]
    fn classifies_each_band() {
        assert_eq!(classify(0.0), OccupancyStatus::CriticalLow);
        assert_eq!(classify(50.01), OccupancyStatus::Underutilized);
        assert_eq!(classify(69.99), OccupancyStatus::Underutilized);
        assert_eq!(classify(80.0), OccupancyStatus::Optimal);
        assert_eq!(classify(90.01), OccupancyStatus::Overloaded);
        assert_eq!(classify(109.99), OccupancyStatus::Overloaded);
        assert_eq!(classify(250.0), OccupancyStatus::CriticalHigh);
    }

    #[test]
    fn severity_saturates_at_one_hundred() {
        assert_eq!(severity(80.0), 0);
        assert_eq!(severity(95.0), 30);
        assert_eq!(severity(45.0), 70);
        assert_eq!(severity(115.0), 70);
        assert_eq!(severity(130.0), 100);
        assert_eq!(severity(0.0), 100);
    }

    #[test]
    fn deviation_is_signed_and_rounded() {
        assert_eq!(deviation(110.0), 30.0);
        assert_eq!(deviation(45.0), -35.0);
        assert_eq!(deviation(83.3325), 3.33);
    }

    #[test]
    fn critical_statuses() {
        assert!(OccupancyStatus::CriticalHigh.is_critical());
        assert!(OccupancyStatus::CriticalLow.is_critical());
        assert!(!OccupancyStatus::Overloaded.is_critical());
        assert!(!OccupancyStatus::NoData.is_critical());
    }
}
