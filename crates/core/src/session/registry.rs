//! Owner of the fixed station set and the start/stop lifecycle.
//!
//! Billing a session is a two-phase commit: [`SessionRegistry::end`]
//! computes a breakdown without touching the station, the caller shows it
//! (offer toggle included), and only [`SessionRegistry::finalize`] or
//! [`SessionRegistry::close`] returns the station to idle.

use chrono::{DateTime, Local, Utc};
use tracing::info;

use crate::{
    billing::{self, BillBreakdown},
    config::PriceConfig,
    error::{EngineError, EngineResult},
    events::{EngineEvent, EngineEvents},
    ledger::{LedgerRecord, ANONYMOUS_CUSTOMER},
    session::{ServiceCharge, Station, StationId},
};

/// Registry over the fixed set of stations; the only code that mutates
/// their session state. Callers get read-only snapshots.
#[derive(Debug)]
pub struct SessionRegistry {
    stations: [Station; 4],
    events: EngineEvents,
}

impl SessionRegistry {
    /// Fresh registry with every station idle.
    pub fn new(events: EngineEvents) -> Self {
        Self {
            stations: StationId::ALL.map(Station::idle),
            events,
        }
    }

    /// Registry without an event subscriber, mainly for tests.
    pub fn detached() -> Self {
        Self::new(EngineEvents::detached())
    }

    fn index(id: StationId) -> usize {
        match id {
            StationId::Ps1 => 0,
            StationId::Ps2 => 1,
            StationId::Ps3 => 2,
            StationId::Ps4 => 3,
        }
    }

    /// Read-only view of one station.
    pub fn station(&self, id: StationId) -> &Station {
        &self.stations[Self::index(id)]
    }

    /// Read-only view of all stations in display order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// The event handle this registry emits through, for components that
    /// share its channel.
    pub fn events(&self) -> &EngineEvents {
        &self.events
    }

    /// Begin a session now.
    pub fn start(&mut self, id: StationId) -> EngineResult<()> {
        self.start_at(id, Utc::now())
    }

    /// Begin a session at an explicit instant.
    pub fn start_at(&mut self, id: StationId, now: DateTime<Utc>) -> EngineResult<()> {
        let station = &mut self.stations[Self::index(id)];
        if station.is_active() {
            return Err(EngineError::AlreadyActive(id));
        }
        station.started_at = Some(now);
        station.charges.clear();
        info!("session started on {id}");
        self.events.emit(EngineEvent::SessionStarted(id));
        Ok(())
    }

    /// Attach a service to an active session, snapshotting its current price.
    pub fn add_charge(
        &mut self,
        id: StationId,
        service: &str,
        config: &PriceConfig,
    ) -> EngineResult<()> {
        self.add_charge_at(id, service, config, Utc::now())
    }

    /// [`Self::add_charge`] with an explicit timestamp.
    pub fn add_charge_at(
        &mut self,
        id: StationId,
        service: &str,
        config: &PriceConfig,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let unit_price = *config
            .services
            .get(service)
            .ok_or_else(|| EngineError::UnknownService(service.to_string()))?;
        let station = &mut self.stations[Self::index(id)];
        if !station.is_active() {
            return Err(EngineError::NotActive(id));
        }
        station
            .charges
            .push(ServiceCharge::new(service, unit_price, now));
        Ok(())
    }

    /// Remove the charge at the given display position.
    pub fn remove_charge(&mut self, id: StationId, index: usize) -> EngineResult<()> {
        let station = &mut self.stations[Self::index(id)];
        if index >= station.charges.len() {
            return Err(EngineError::IndexOutOfRange {
                index,
                len: station.charges.len(),
            });
        }
        station.charges.remove(index);
        Ok(())
    }

    /// Compute the bill for an active session without mutating the station.
    /// The station stays active until [`Self::finalize`] or [`Self::close`].
    ///
    /// The station rate is read live from `config` here, while service
    /// charges keep their add-time prices; mid-session settings edits
    /// deliberately affect only the station portion.
    pub fn end(&self, id: StationId, config: &PriceConfig) -> EngineResult<BillBreakdown> {
        self.end_at(id, config, Utc::now())
    }

    /// [`Self::end`] against an explicit clock.
    pub fn end_at(
        &self,
        id: StationId,
        config: &PriceConfig,
        now: DateTime<Utc>,
    ) -> EngineResult<BillBreakdown> {
        let station = self.station(id);
        if !station.is_active() {
            return Err(EngineError::NotActive(id));
        }
        Ok(billing::breakdown(
            station.elapsed(now),
            config,
            &station.charges,
        ))
    }

    /// Station cost plus charges so far, for the periodic tick display.
    /// `None` while the station is idle.
    pub fn running_cost(
        &self,
        id: StationId,
        config: &PriceConfig,
        now: DateTime<Utc>,
    ) -> Option<f64> {
        let station = self.station(id);
        if !station.is_active() {
            return None;
        }
        let hours = station.elapsed(now).num_milliseconds().max(0) as f64 / 3_600_000.0;
        Some(billing::station_cost(hours, config) + billing::services_total(&station.charges))
    }

    /// Commit the chosen variant of the breakdown returned by [`Self::end`]
    /// to a ledger record and reset the station to idle with an empty
    /// charge list.
    ///
    /// The figures written out are exactly the ones in `bill`, so the
    /// record always matches what the caller displayed; only the date and
    /// time stamps are taken at save time.
    pub fn finalize(
        &mut self,
        id: StationId,
        bill: &BillBreakdown,
        offer_chosen: bool,
    ) -> EngineResult<LedgerRecord> {
        self.finalize_at(id, bill, offer_chosen, Utc::now())
    }

    /// [`Self::finalize`] against an explicit clock.
    pub fn finalize_at(
        &mut self,
        id: StationId,
        bill: &BillBreakdown,
        offer_chosen: bool,
        now: DateTime<Utc>,
    ) -> EngineResult<LedgerRecord> {
        let station = &mut self.stations[Self::index(id)];
        if !station.is_active() {
            return Err(EngineError::NotActive(id));
        }

        let station_cost = billing::round_money(bill.station_cost(offer_chosen));
        let services_cost = billing::round_money(bill.services_cost);
        let local = now.with_timezone(&Local);
        let record = LedgerRecord {
            date: local.format("%Y-%m-%d").to_string(),
            time: local.format("%H:%M:%S").to_string(),
            station: id.label().to_string(),
            customer: ANONYMOUS_CUSTOMER.to_string(),
            duration: bill.duration_label(),
            station_cost,
            services: billing::services_description(&station.charges),
            services_cost,
            total_cost: billing::round_money(station_cost + services_cost),
        };

        station.reset();
        info!(
            "session on {id} billed: {} for {}",
            record.total_cost, record.duration
        );
        self.events.emit(EngineEvent::SessionClosed(id));
        Ok(record)
    }

    /// Discard an ended session without writing a bill. The station goes
    /// idle and its charges are dropped, matching the historical behaviour
    /// of leaving no audit trail for the discarded session.
    pub fn close(&mut self, id: StationId) -> EngineResult<()> {
        let station = &mut self.stations[Self::index(id)];
        if !station.is_active() {
            return Err(EngineError::NotActive(id));
        }
        station.reset();
        info!("session on {id} closed without saving");
        self.events.emit(EngineEvent::SessionClosed(id));
        Ok(())
    }
}
