/// Snapshot data model for the sustainability feed
///
/// A `MetricsSnapshot` is produced in one piece by a `MetricsSource` and is
/// never mutated afterwards. Consumers share it as `Arc<MetricsSnapshot>`.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::feed::FeedError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub emissions_series: Vec<EmissionsPoint>,
    pub energy_mix: Vec<EnergySource>,
    pub transit_usage: Vec<TransitMode>,
    pub ambient_conditions: AmbientConditions,
    pub mobility_network: MobilityNetwork,
    pub air_quality_index: u32,
    pub air_quality_readings: Vec<AirQualityReading>,
    pub initiative_impacts: Vec<InitiativeImpact>,
    pub transit_schedule: Vec<ScheduleEntry>,
    pub green_area_hectares: u32,
}

impl MetricsSnapshot {
    /// Parse a snapshot from JSON. Unknown station statuses reject the whole snapshot.
    pub fn from_json(json: &str) -> Result<Self, FeedError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Emissions for one reporting period, in tonnes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsPoint {
    pub period: String,
    pub tonnes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnergyKind {
    Renewable,
    Fossil,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySource {
    pub source: String,
    pub value: f64,
    /// Hex color, e.g. "#FFD700"
    pub color: String,
    pub kind: EnergyKind,
}

impl EnergySource {
    pub fn is_fossil(&self) -> bool {
        self.kind == EnergyKind::Fossil
    }
}

/// Transit category marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitCategory {
    /// Motorized public transport (bus, tram)
    Public,
    /// Active modes (walking, cycling)
    Active,
    /// Shared vehicles
    Shared,
}

impl TransitCategory {
    pub fn label(&self) -> &'static str {
        match self {
            TransitCategory::Public => "Public",
            TransitCategory::Active => "Active",
            TransitCategory::Shared => "Shared",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitMode {
    pub mode: String,
    pub riders: u64,
    pub category: TransitCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientConditions {
    pub temperature_c: f64,
    pub humidity_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobilityNetwork {
    pub active_stations: u32,
    pub total_stations: u32,
    pub smart_charging: u32,
    pub available_stations: u32,
    pub stations: Vec<StationRecord>,
}

impl MobilityNetwork {
    /// Whether every counter fits within `total_stations` on its own.
    ///
    /// The counters are set independently. `active + available` may exceed the
    /// total (the reference data has 25 + 7 of 30) and is not checked.
    pub fn counters_consistent(&self) -> bool {
        [self.active_stations, self.smart_charging, self.available_stations]
            .iter()
            .all(|&count| count <= self.total_stations)
    }

    pub fn counters_sum(&self) -> u64 {
        self.active_stations as u64 + self.available_stations as u64
    }

    pub fn count_with_status(&self, status: StationStatus) -> usize {
        self.stations.iter().filter(|s| s.status == status).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StationStatus {
    Active,
    Available,
    OutOfService,
}

impl StationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StationStatus::Active => "Active",
            StationStatus::Available => "Available",
            StationStatus::OutOfService => "OutOfService",
        }
    }

    pub fn all() -> &'static [StationStatus] {
        &[
            StationStatus::Active,
            StationStatus::Available,
            StationStatus::OutOfService,
        ]
    }
}

impl fmt::Display for StationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StationStatus {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Active" => Ok(StationStatus::Active),
            "Available" => Ok(StationStatus::Available),
            "OutOfService" => Ok(StationStatus::OutOfService),
            other => Err(FeedError::InvalidStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for StationStatus {
    type Error = FeedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StationStatus> for String {
    fn from(status: StationStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub id: u32,
    pub name: String,
    pub status: StationStatus,
    pub station_type: String,
    pub power: String,
}

/// One pollutant measurement; value and limit share a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReading {
    pub pollutant: String,
    pub value: f64,
    pub limit: f64,
}

/// Icon reference for an initiative, resolved to a glyph by the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactIcon {
    Zap,
    Leaf,
    Battery,
    Bus,
    Tree,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiativeImpact {
    pub initiative: String,
    /// Annual CO2 reduction in tonnes
    pub co2_reduction: u64,
    /// Annual cost savings in EUR
    pub cost_savings: u64,
    pub icon: ImpactIcon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub line: String,
    pub delay_minutes: u32,
    pub from_district: String,
    pub to_district: String,
    pub service_start: NaiveTime,
    pub service_end: NaiveTime,
}

impl ScheduleEntry {
    pub fn districts(&self) -> String {
        format!("{} → {}", self.from_district, self.to_district)
    }

    pub fn operating_hours(&self) -> String {
        format!(
            "{} - {}",
            self.service_start.format("%H:%M"),
            self.service_end.format("%H:%M")
        )
    }
}
