/// Display-ready aggregates derived from a snapshot
///
/// Every function here is pure and takes only the part of the snapshot it
/// needs. Ratios with a zero denominator return `DerivedError::DivisionByZero`
/// instead of a NaN; `DashboardSummary` turns those into `None`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::snapshot::*;
use crate::utils::{AQI_THRESHOLDS, THOUSANDS_DELIMITER};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivedError {
    #[error("cannot compute ratio: {quantity} is zero")]
    DivisionByZero { quantity: &'static str },

    #[error("need at least two periods, got {0}")]
    InsufficientHistory(usize),
}

pub type DerivedResult<T> = std::result::Result<T, DerivedError>;

fn energy_total(mix: &[EnergySource]) -> DerivedResult<f64> {
    let total: f64 = mix.iter().map(|s| s.value).sum();
    if total <= 0.0 {
        return Err(DerivedError::DivisionByZero {
            quantity: "energy mix total",
        });
    }
    Ok(total)
}

/// Share of non-fossil sources, rounded to a whole percent
pub fn renewable_share_percent(mix: &[EnergySource]) -> DerivedResult<u8> {
    let total = energy_total(mix)?;
    let renewable: f64 = mix.iter().filter(|s| !s.is_fossil()).map(|s| s.value).sum();

    Ok((renewable / total * 100.0).round().clamp(0.0, 100.0) as u8)
}

/// Share of one source in the whole mix, rounded to one decimal
pub fn energy_source_share_percent(entry: &EnergySource, mix: &[EnergySource]) -> DerivedResult<f64> {
    let total = energy_total(mix)?;
    Ok(round_one_decimal(entry.value / total * 100.0))
}

/// Saturates instead of overflowing on oversized file input
pub fn total_transit_riders(usage: &[TransitMode]) -> u64 {
    usage.iter().fold(0u64, |acc, m| acc.saturating_add(m.riders))
}

pub fn riders_by_category(usage: &[TransitMode], category: TransitCategory) -> u64 {
    usage
        .iter()
        .filter(|m| m.category == category)
        .fold(0u64, |acc, m| acc.saturating_add(m.riders))
}

/// Air quality band, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AirQualityCategory {
    VeryGood,
    Good,
    Moderate,
    Poor,
    VeryPoor,
}

impl AirQualityCategory {
    pub fn label(&self) -> &'static str {
        match self {
            AirQualityCategory::VeryGood => "Very good",
            AirQualityCategory::Good => "Good",
            AirQualityCategory::Moderate => "Moderate",
            AirQualityCategory::Poor => "Poor",
            AirQualityCategory::VeryPoor => "Very poor",
        }
    }
}

pub fn air_quality_category(aqi: u32) -> AirQualityCategory {
    AQI_THRESHOLDS
        .iter()
        .find(|(upper, _)| aqi <= *upper)
        .map(|(_, category)| *category)
        .unwrap_or(AirQualityCategory::VeryPoor)
}

/// Fill level for an AQI gauge where 200 maps to a full bar
pub fn aqi_gauge_percent(aqi: u32) -> f64 {
    (aqi as f64 / 2.0).min(100.0)
}

pub fn pollutant_compliance(reading: &AirQualityReading) -> bool {
    reading.value <= reading.limit
}

/// (compliant, exceeded) pollutant counts
pub fn pollutant_compliance_summary(readings: &[AirQualityReading]) -> (usize, usize) {
    let compliant = readings.iter().filter(|r| pollutant_compliance(r)).count();
    (compliant, readings.len() - compliant)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationUtilization {
    pub active: f64,
    pub smart_charging: f64,
    pub available: f64,
}

pub fn station_utilization_ratios(network: &MobilityNetwork) -> DerivedResult<StationUtilization> {
    if network.total_stations == 0 {
        return Err(DerivedError::DivisionByZero {
            quantity: "total station count",
        });
    }

    let total = network.total_stations as f64;
    Ok(StationUtilization {
        active: network.active_stations as f64 / total,
        smart_charging: network.smart_charging as f64 / total,
        available: network.available_stations as f64 / total,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeImpact {
    pub total_co2_reduction: u64,
    pub total_cost_savings: u64,
}

pub fn cumulative_impact(impacts: &[InitiativeImpact]) -> CumulativeImpact {
    impacts.iter().fold(CumulativeImpact::default(), |acc, item| CumulativeImpact {
        total_co2_reduction: acc.total_co2_reduction.saturating_add(item.co2_reduction),
        total_cost_savings: acc.total_cost_savings.saturating_add(item.cost_savings),
    })
}

pub fn latest_emissions(series: &[EmissionsPoint]) -> Option<f64> {
    series.last().map(|p| p.tonnes)
}

/// Change of the last period against the one before, in percent (one decimal)
pub fn emissions_change_percent(series: &[EmissionsPoint]) -> DerivedResult<f64> {
    let [.., previous, last] = series else {
        return Err(DerivedError::InsufficientHistory(series.len()));
    };

    if previous.tonnes == 0.0 {
        return Err(DerivedError::DivisionByZero {
            quantity: "previous period emissions",
        });
    }

    Ok(round_one_decimal((last.tonnes - previous.tonnes) / previous.tonnes * 100.0))
}

/// Group digits in threes from the right: 1200 -> "1.200", -53000 -> "-53.000"
pub fn format_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if n < 0 {
        grouped.push('-');
    }

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(THOUSANDS_DELIMITER);
        }
        grouped.push(c);
    }

    grouped
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ============================================================================
// Summary
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceShare {
    pub source: String,
    pub value: f64,
    pub share_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantStatus {
    pub pollutant: String,
    pub value: f64,
    pub limit: f64,
    pub compliant: bool,
}

/// Every derived value the views show, computed once per snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub latest_emissions: Option<f64>,
    pub emissions_change_percent: Option<f64>,
    pub renewable_share_percent: Option<u8>,
    pub energy_shares: Vec<SourceShare>,
    pub total_transit_riders: u64,
    pub public_riders: u64,
    pub active_riders: u64,
    pub shared_riders: u64,
    pub air_quality_index: u32,
    pub air_quality_category: AirQualityCategory,
    pub aqi_gauge_percent: f64,
    pub pollutants: Vec<PollutantStatus>,
    pub compliant_pollutants: usize,
    pub exceeded_pollutants: usize,
    pub station_utilization: Option<StationUtilization>,
    pub station_counters_consistent: bool,
    pub cumulative_impact: CumulativeImpact,
}

impl DashboardSummary {
    pub fn from_snapshot(snapshot: &MetricsSnapshot) -> Self {
        let usage = &snapshot.transit_usage;
        let readings = &snapshot.air_quality_readings;
        let (compliant_pollutants, exceeded_pollutants) = pollutant_compliance_summary(readings);

        Self {
            latest_emissions: latest_emissions(&snapshot.emissions_series),
            emissions_change_percent: emissions_change_percent(&snapshot.emissions_series).ok(),
            renewable_share_percent: renewable_share_percent(&snapshot.energy_mix).ok(),
            energy_shares: snapshot
                .energy_mix
                .iter()
                .map(|entry| SourceShare {
                    source: entry.source.clone(),
                    value: entry.value,
                    share_percent: energy_source_share_percent(entry, &snapshot.energy_mix).ok(),
                })
                .collect(),
            total_transit_riders: total_transit_riders(usage),
            public_riders: riders_by_category(usage, TransitCategory::Public),
            active_riders: riders_by_category(usage, TransitCategory::Active),
            shared_riders: riders_by_category(usage, TransitCategory::Shared),
            air_quality_index: snapshot.air_quality_index,
            air_quality_category: air_quality_category(snapshot.air_quality_index),
            aqi_gauge_percent: aqi_gauge_percent(snapshot.air_quality_index),
            pollutants: readings
                .iter()
                .map(|r| PollutantStatus {
                    pollutant: r.pollutant.clone(),
                    value: r.value,
                    limit: r.limit,
                    compliant: pollutant_compliance(r),
                })
                .collect(),
            compliant_pollutants,
            exceeded_pollutants,
            station_utilization: station_utilization_ratios(&snapshot.mobility_network).ok(),
            station_counters_consistent: snapshot.mobility_network.counters_consistent(),
            cumulative_impact: cumulative_impact(&snapshot.initiative_impacts),
        }
    }
}
