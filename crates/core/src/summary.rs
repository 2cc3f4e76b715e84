//! Revenue aggregation over a set of ledger rows.

use crate::ledger::LedgerRecord;

/// Totals for a day (or any caller-filtered record set).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DailySummary {
    /// Sum of `Total_Cost`.
    pub total_revenue: f64,
    /// Sum of `PS_Cost`.
    pub station_revenue: f64,
    /// Sum of `Service_Cost`.
    pub services_revenue: f64,
    /// Number of rows in the set.
    pub session_count: usize,
}

/// Aggregate the given records. Pure and idempotent; the caller supplies
/// the already-filtered set (one date or all).
pub fn summarize(records: &[LedgerRecord]) -> DailySummary {
    let mut summary = DailySummary {
        session_count: records.len(),
        ..DailySummary::default()
    };
    for record in records {
        summary.total_revenue += record.total_cost;
        summary.station_revenue += record.station_cost;
        summary.services_revenue += record.services_cost;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(station_cost: f64, services_cost: f64) -> LedgerRecord {
        LedgerRecord {
            date: "2026-08-30".to_string(),
            time: "18:00:00".to_string(),
            station: "PS1".to_string(),
            customer: "N/A".to_string(),
            duration: "01:00".to_string(),
            station_cost,
            services: "None".to_string(),
            services_cost,
            total_cost: station_cost + services_cost,
        }
    }

    #[test]
    fn empty_set_is_all_zero() {
        assert_eq!(summarize(&[]), DailySummary::default());
    }

    #[test]
    fn sums_every_revenue_column() {
        let records = vec![record(6000.0, 2500.0), record(0.0, 7000.0)];
        let summary = summarize(&records);
        assert_eq!(summary.total_revenue, 15500.0);
        assert_eq!(summary.station_revenue, 6000.0);
        assert_eq!(summary.services_revenue, 9500.0);
        assert_eq!(summary.session_count, 2);
    }

    #[test]
    fn summarize_is_idempotent() {
        let records = vec![record(6000.0, 2500.0), record(12000.0, 0.0)];
        assert_eq!(summarize(&records), summarize(&records));
    }
}
