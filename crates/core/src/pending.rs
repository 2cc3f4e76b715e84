//! Walk-up service orders waiting to be billed.
//!
//! Orders are keyed by insertion position. Re-opening an order removes it
//! from the queue and hands it back for editing; the caller re-appends the
//! edited order, and an abandoned edit is simply gone, same as the
//! original flow.

use chrono::{DateTime, Local, Utc};
use tracing::info;

use crate::{
    billing,
    error::{EngineError, EngineResult},
    ledger::{LedgerRecord, SERVICES_ONLY_LABEL},
    session::ServiceCharge,
};

/// A service-only order for a named walk-up customer.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOrder {
    /// Customer the order belongs to; never empty.
    pub customer: String,
    /// Charges with their add-time prices; never empty.
    pub charges: Vec<ServiceCharge>,
    /// When the order entered the queue.
    pub created_at: DateTime<Utc>,
}

impl PendingOrder {
    /// Sum of the snapshotted charge prices.
    pub fn total(&self) -> f64 {
        billing::services_total(&self.charges)
    }
}

/// FIFO queue of pending orders awaiting billing.
#[derive(Debug, Default)]
pub struct PendingOrderQueue {
    orders: Vec<PendingOrder>,
}

impl PendingOrderQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the queued orders in insertion order.
    pub fn orders(&self) -> &[PendingOrder] {
        &self.orders
    }

    /// Queue a new order now.
    pub fn append(&mut self, customer: &str, charges: Vec<ServiceCharge>) -> EngineResult<()> {
        self.append_at(customer, charges, Utc::now())
    }

    /// Queue a new order with an explicit creation time.
    pub fn append_at(
        &mut self,
        customer: &str,
        charges: Vec<ServiceCharge>,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let customer = customer.trim();
        if customer.is_empty() {
            return Err(EngineError::EmptyName);
        }
        if charges.is_empty() {
            return Err(EngineError::EmptyOrder);
        }
        self.orders.push(PendingOrder {
            customer: customer.to_string(),
            charges,
            created_at: now,
        });
        Ok(())
    }

    /// Drop the order at `index`; the queue is unchanged on failure.
    pub fn remove_at(&mut self, index: usize) -> EngineResult<()> {
        self.check_index(index)?;
        let order = self.orders.remove(index);
        info!("pending order for {} removed", order.customer);
        Ok(())
    }

    /// Take the order at `index` out of the queue for further editing.
    /// The caller is responsible for appending the edited order again.
    pub fn reopen(&mut self, index: usize) -> EngineResult<PendingOrder> {
        self.check_index(index)?;
        Ok(self.orders.remove(index))
    }

    /// Bill the order at `index`: remove it and produce its ledger record.
    pub fn finalize(&mut self, index: usize) -> EngineResult<LedgerRecord> {
        self.finalize_at(index, Utc::now())
    }

    /// [`Self::finalize`] against an explicit clock.
    pub fn finalize_at(&mut self, index: usize, now: DateTime<Utc>) -> EngineResult<LedgerRecord> {
        self.check_index(index)?;
        let order = self.orders.remove(index);
        let services_cost = billing::round_money(order.total());
        let local = now.with_timezone(&Local);
        let record = LedgerRecord {
            date: local.format("%Y-%m-%d").to_string(),
            time: local.format("%H:%M:%S").to_string(),
            station: SERVICES_ONLY_LABEL.to_string(),
            customer: order.customer.clone(),
            duration: "00:00".to_string(),
            station_cost: 0.0,
            services: billing::services_description(&order.charges),
            services_cost,
            total_cost: services_cost,
        };
        info!(
            "pending order for {} billed: {}",
            order.customer, record.total_cost
        );
        Ok(record)
    }

    fn check_index(&self, index: usize) -> EngineResult<()> {
        if index >= self.orders.len() {
            return Err(EngineError::IndexOutOfRange {
                index,
                len: self.orders.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge(name: &str, price: f64) -> ServiceCharge {
        ServiceCharge::new(name, price, Utc::now())
    }

    #[test]
    fn append_requires_name_and_services() {
        let mut queue = PendingOrderQueue::new();
        assert!(matches!(
            queue.append("  ", vec![charge("tea", 2000.0)]),
            Err(EngineError::EmptyName)
        ));
        assert!(matches!(
            queue.append("Alex", Vec::new()),
            Err(EngineError::EmptyOrder)
        ));
        assert!(queue.orders().is_empty());
    }

    #[test]
    fn finalize_produces_a_services_only_record() {
        let mut queue = PendingOrderQueue::new();
        queue
            .append("Alex", vec![charge("tea", 2000.0), charge("shisha", 5000.0)])
            .unwrap();

        let record = queue.finalize(0).unwrap();
        assert_eq!(record.station, SERVICES_ONLY_LABEL);
        assert_eq!(record.customer, "Alex");
        assert_eq!(record.duration, "00:00");
        assert_eq!(record.station_cost, 0.0);
        assert_eq!(record.services_cost, 7000.0);
        assert_eq!(record.total_cost, 7000.0);
        assert_eq!(record.services, "tea($2,000), shisha($5,000)");
        assert!(queue.orders().is_empty());
    }

    #[test]
    fn remove_at_out_of_range_leaves_queue_unchanged() {
        let mut queue = PendingOrderQueue::new();
        queue.append("Alex", vec![charge("tea", 2000.0)]).unwrap();

        assert!(matches!(
            queue.remove_at(3),
            Err(EngineError::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert_eq!(queue.orders().len(), 1);
        assert_eq!(queue.orders()[0].customer, "Alex");
    }

    #[test]
    fn reopen_removes_and_returns_the_order() {
        let mut queue = PendingOrderQueue::new();
        queue.append("Alex", vec![charge("tea", 2000.0)]).unwrap();
        queue.append("Sam", vec![charge("coffee", 2500.0)]).unwrap();

        let order = queue.reopen(0).unwrap();
        assert_eq!(order.customer, "Alex");
        assert_eq!(queue.orders().len(), 1);
        assert_eq!(queue.orders()[0].customer, "Sam");

        // The caller edits and re-appends.
        let mut charges = order.charges;
        charges.push(charge("matte", 5000.0));
        queue.append(&order.customer, charges).unwrap();
        assert_eq!(queue.orders()[1].total(), 7000.0);
    }

    #[test]
    fn customer_name_is_trimmed() {
        let mut queue = PendingOrderQueue::new();
        queue
            .append("  Alex  ", vec![charge("tea", 2000.0)])
            .unwrap();
        assert_eq!(queue.orders()[0].customer, "Alex");
    }
}
