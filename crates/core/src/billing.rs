//! Pure cost computation for sessions and service charges.
//!
//! Tier offers are all-or-nothing: once the elapsed duration crosses a
//! threshold the discounted rate applies to the *entire* session, so the
//! cost curve has a deliberate discontinuity at each boundary. The
//! breakdown therefore carries both the normal and the offer cost so the
//! caller can let the customer decide which one to commit.

use chrono::Duration;

use crate::{config::PriceConfig, session::ServiceCharge};

/// Which promotional tier a session qualifies for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferTier {
    /// Session of at least two hours.
    TwoHour,
    /// Session of at least three hours; takes precedence at the 3 h boundary.
    ThreeHour,
}

impl OfferTier {
    /// Display label matching the original bill wording.
    pub fn label(&self) -> &'static str {
        match self {
            OfferTier::TwoHour => "2+ Hour Offer",
            OfferTier::ThreeHour => "3+ Hour Offer",
        }
    }

    /// Hourly rate this tier unlocks.
    pub fn rate(&self, config: &PriceConfig) -> f64 {
        match self {
            OfferTier::TwoHour => config.offers.tier2_rate,
            OfferTier::ThreeHour => config.offers.tier3_rate,
        }
    }
}

/// Offer variant of a bill when the session qualifies for a tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfferQuote {
    /// The qualifying tier.
    pub tier: OfferTier,
    /// Hourly rate applied to the whole session.
    pub rate: f64,
    /// Station cost at the offer rate.
    pub station_cost: f64,
    /// Difference against the normal-rate station cost.
    pub savings: f64,
}

/// Transient cost breakdown returned by `end`; nothing is persisted until
/// the caller commits one of the two station-cost variants via `finalize`.
#[derive(Debug, Clone, PartialEq)]
pub struct BillBreakdown {
    /// Elapsed session time in whole seconds.
    pub duration_secs: i64,
    /// Elapsed session time as fractional hours.
    pub duration_hours: f64,
    /// Station cost at the normal hourly rate.
    pub normal_station_cost: f64,
    /// Offer variant when the duration qualifies for a tier.
    pub offer: Option<OfferQuote>,
    /// Sum of the attached service charges.
    pub services_cost: f64,
}

impl BillBreakdown {
    /// Whether a tier offer is available for this bill.
    pub fn offer_eligible(&self) -> bool {
        self.offer.is_some()
    }

    /// Initial state of the "apply offer" toggle: on whenever eligible.
    pub fn default_offer_choice(&self) -> bool {
        self.offer.is_some()
    }

    /// Station cost for the chosen variant. Choosing the offer on an
    /// ineligible bill falls back to the normal rate.
    pub fn station_cost(&self, offer_chosen: bool) -> f64 {
        match (&self.offer, offer_chosen) {
            (Some(offer), true) => offer.station_cost,
            _ => self.normal_station_cost,
        }
    }

    /// Grand total for the chosen variant.
    pub fn total(&self, offer_chosen: bool) -> f64 {
        self.station_cost(offer_chosen) + self.services_cost
    }

    /// Elapsed time formatted `HH:MM` for ledger rows.
    pub fn duration_label(&self) -> String {
        duration_label(self.duration_secs)
    }
}

/// Station cost for the given elapsed hours under the current prices, with
/// the qualifying offer applied automatically. Used for the live running
/// cost shown on each tick.
pub fn station_cost(duration_hours: f64, config: &PriceConfig) -> f64 {
    match offer_for(duration_hours, config) {
        Some(tier) => duration_hours * tier.rate(config),
        None => duration_hours * config.hourly_rate,
    }
}

/// Highest tier the duration qualifies for, if offers are enabled.
pub fn offer_for(duration_hours: f64, config: &PriceConfig) -> Option<OfferTier> {
    if !config.offers.enabled {
        return None;
    }
    if duration_hours >= 3.0 {
        Some(OfferTier::ThreeHour)
    } else if duration_hours >= 2.0 {
        Some(OfferTier::TwoHour)
    } else {
        None
    }
}

/// Combine elapsed time and attached charges into a full breakdown.
pub fn breakdown(
    elapsed: Duration,
    config: &PriceConfig,
    charges: &[ServiceCharge],
) -> BillBreakdown {
    let duration_secs = elapsed.num_seconds().max(0);
    let duration_hours = elapsed.num_milliseconds().max(0) as f64 / 3_600_000.0;
    let normal_station_cost = duration_hours * config.hourly_rate;
    let offer = offer_for(duration_hours, config).map(|tier| {
        let rate = tier.rate(config);
        let station_cost = duration_hours * rate;
        OfferQuote {
            tier,
            rate,
            station_cost,
            savings: normal_station_cost - station_cost,
        }
    });

    BillBreakdown {
        duration_secs,
        duration_hours,
        normal_station_cost,
        offer,
        services_cost: services_total(charges),
    }
}

/// Sum of the snapshotted unit prices.
pub fn services_total(charges: &[ServiceCharge]) -> f64 {
    charges.iter().map(|charge| charge.unit_price).sum()
}

/// Human-readable `name($price)` list for ledger rows, or `None`.
pub fn services_description(charges: &[ServiceCharge]) -> String {
    if charges.is_empty() {
        return "None".to_string();
    }
    charges
        .iter()
        .map(|charge| format!("{}(${})", charge.name, format_money(charge.unit_price)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Round a monetary value to two decimal places for persistence.
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whole-unit amount with thousands separators, e.g. `12,500`.
pub fn format_money(value: f64) -> String {
    let negative = value < 0.0;
    let whole = value.abs().round() as i64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Seconds formatted `HH:MM`, minutes truncated.
pub fn duration_label(duration_secs: i64) -> String {
    let secs = duration_secs.max(0);
    format!("{:02}:{:02}", secs / 3600, (secs % 3600) / 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    fn charge(name: &str, price: f64) -> ServiceCharge {
        ServiceCharge::new(name, price, Utc::now())
    }

    #[test]
    fn short_sessions_use_the_normal_rate() {
        let config = PriceConfig::default();
        for hours in [0.0, 0.25, 1.0, 1.999] {
            approx(station_cost(hours, &config), hours * config.hourly_rate);
            assert_eq!(offer_for(hours, &config), None);
        }
    }

    #[test]
    fn two_hour_tier_covers_the_whole_session() {
        let config = PriceConfig::default();
        for hours in [2.0, 2.5, 2.999] {
            assert_eq!(offer_for(hours, &config), Some(OfferTier::TwoHour));
            approx(station_cost(hours, &config), hours * config.offers.tier2_rate);
            assert!(station_cost(hours, &config) < hours * config.hourly_rate);
        }
    }

    #[test]
    fn three_hour_tier_wins_at_the_boundary() {
        let config = PriceConfig::default();
        assert_eq!(offer_for(3.0, &config), Some(OfferTier::ThreeHour));
        approx(station_cost(3.0, &config), 3.0 * config.offers.tier3_rate);
        approx(station_cost(4.5, &config), 4.5 * config.offers.tier3_rate);
    }

    #[test]
    fn disabled_offers_always_bill_normal_rate() {
        let mut config = PriceConfig::default();
        config.offers.enabled = false;
        for hours in [1.0, 2.5, 5.0] {
            assert_eq!(offer_for(hours, &config), None);
            approx(station_cost(hours, &config), hours * config.hourly_rate);
        }
    }

    #[test]
    fn breakdown_matches_the_125_minute_scenario() {
        let config = PriceConfig::default();
        let charges = vec![charge("coffee", 2500.0)];
        let bill = breakdown(Duration::minutes(125), &config, &charges);

        let hours = 125.0 / 60.0;
        approx(bill.duration_hours, hours);
        approx(bill.normal_station_cost, hours * 6000.0);

        let offer = bill.offer.expect("2+ hour offer expected");
        assert_eq!(offer.tier, OfferTier::TwoHour);
        approx(offer.station_cost, hours * 5000.0);
        approx(offer.savings, hours * 1000.0);

        assert!(bill.default_offer_choice());
        approx(bill.total(true), hours * 5000.0 + 2500.0);
        approx(bill.total(false), hours * 6000.0 + 2500.0);
        assert_eq!(bill.duration_label(), "02:05");
    }

    #[test]
    fn offer_choice_is_ignored_when_ineligible() {
        let config = PriceConfig::default();
        let bill = breakdown(Duration::minutes(30), &config, &[]);
        assert!(!bill.offer_eligible());
        approx(bill.total(true), bill.total(false));
    }

    #[test]
    fn services_description_lists_or_none() {
        assert_eq!(services_description(&[]), "None");
        let charges = vec![charge("coffee", 2500.0), charge("shisha", 5000.0)];
        assert_eq!(
            services_description(&charges),
            "coffee($2,500), shisha($5,000)"
        );
    }

    #[test]
    fn money_rounding_and_formatting() {
        approx(round_money(10416.666), 10416.67);
        assert_eq!(format_money(12500.0), "12,500");
        assert_eq!(format_money(999.4), "999");
        assert_eq!(format_money(1_000_000.0), "1,000,000");
    }

    #[test]
    fn duration_labels_truncate_to_minutes() {
        assert_eq!(duration_label(0), "00:00");
        assert_eq!(duration_label(59), "00:00");
        assert_eq!(duration_label(3660), "01:01");
        assert_eq!(duration_label(7500), "02:05");
    }
}
