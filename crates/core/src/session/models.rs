#![allow(missing_docs)]

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of one of the fixed rentable stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StationId {
    Ps1,
    Ps2,
    Ps3,
    Ps4,
}

impl StationId {
    /// Every station, in display order.
    pub const ALL: [StationId; 4] = [
        StationId::Ps1,
        StationId::Ps2,
        StationId::Ps3,
        StationId::Ps4,
    ];

    /// Label used on screen and in ledger rows.
    pub fn label(&self) -> &'static str {
        match self {
            StationId::Ps1 => "PS1",
            StationId::Ps2 => "PS2",
            StationId::Ps3 => "PS3",
            StationId::Ps4 => "PS4",
        }
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StationId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PS1" => Ok(StationId::Ps1),
            "PS2" => Ok(StationId::Ps2),
            "PS3" => Ok(StationId::Ps3),
            "PS4" => Ok(StationId::Ps4),
            other => Err(format!("unknown station '{other}'")),
        }
    }
}

/// One service added to a session or walk-up order.
///
/// The unit price is copied from the configuration at add time; later
/// settings edits never change a charge that is already on the tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCharge {
    pub name: String,
    pub unit_price: f64,
    pub added_at: DateTime<Utc>,
}

impl ServiceCharge {
    pub fn new(name: impl Into<String>, unit_price: f64, added_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            unit_price,
            added_at,
        }
    }
}

/// Session state of one rentable station.
///
/// A station is active exactly while `started_at` is set. Charges are only
/// accumulated during an active session and are cleared when the session
/// closes.
#[derive(Debug, Clone)]
pub struct Station {
    pub id: StationId,
    pub started_at: Option<DateTime<Utc>>,
    pub charges: Vec<ServiceCharge>,
}

impl Station {
    pub fn idle(id: StationId) -> Self {
        Self {
            id,
            started_at: None,
            charges: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    /// Wall-clock time since the session started, zero when idle.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.started_at
            .map(|start| now - start)
            .unwrap_or_else(Duration::zero)
    }

    pub(crate) fn reset(&mut self) {
        self.started_at = None;
        self.charges.clear();
    }
}
