/// Snapshot sources for the sustainability feed
///
/// `MetricsSource` is the seam between the refresh loop and wherever the
/// numbers come from. Three sources ship with the crate:
/// - `ReferenceFeed`: the fixed demo dataset
/// - `JitterFeed`: the demo dataset with seeded random variation
/// - `FileFeed`: a JSON snapshot re-read from disk on every call

use chrono::{NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use super::snapshot::*;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to read snapshot file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid snapshot data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid station status {0:?} (expected Active, Available or OutOfService)")]
    InvalidStatus(String),

    #[error("file feed requires a snapshot path")]
    MissingPath,
}

/// Produces complete snapshots on demand
pub trait MetricsSource: Send {
    fn name(&self) -> &str;

    fn generate(&mut self) -> Result<MetricsSnapshot, FeedError>;
}

impl<S: MetricsSource + ?Sized> MetricsSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate(&mut self) -> Result<MetricsSnapshot, FeedError> {
        (**self).generate()
    }
}

/// Which source the application should build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    #[default]
    Reference,
    Jitter,
    File,
}

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Reference => "reference",
            FeedKind::Jitter => "jitter",
            FeedKind::File => "file",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reference" | "ref" => Ok(FeedKind::Reference),
            "jitter" | "random" => Ok(FeedKind::Jitter),
            "file" => Ok(FeedKind::File),
            other => Err(format!(
                "unknown feed '{}' (expected reference, jitter or file)",
                other
            )),
        }
    }
}

/// Options for building a source from a `FeedKind`
#[derive(Debug, Clone, Default)]
pub struct FeedOptions {
    pub file: Option<PathBuf>,
    pub seed: Option<u64>,
    pub jitter: f64,
}

pub fn open_source(kind: FeedKind, options: &FeedOptions) -> Result<Box<dyn MetricsSource>, FeedError> {
    let source: Box<dyn MetricsSource> = match kind {
        FeedKind::Reference => Box::new(ReferenceFeed::new()),
        FeedKind::Jitter => Box::new(JitterFeed::new(options.seed, options.jitter)),
        FeedKind::File => {
            let path = options.file.clone().ok_or(FeedError::MissingPath)?;
            Box::new(FileFeed::new(path))
        }
    };

    tracing::debug!(feed = source.name(), "opened metrics source");
    Ok(source)
}

// ============================================================================
// Reference dataset
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct ReferenceFeed;

impl ReferenceFeed {
    pub fn new() -> Self {
        Self
    }
}

impl MetricsSource for ReferenceFeed {
    fn name(&self) -> &str {
        "reference"
    }

    fn generate(&mut self) -> Result<MetricsSnapshot, FeedError> {
        Ok(reference_snapshot())
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

fn station(id: u32, name: &str, status: StationStatus, station_type: &str, power: &str) -> StationRecord {
    StationRecord {
        id,
        name: name.to_string(),
        status,
        station_type: station_type.to_string(),
        power: power.to_string(),
    }
}

/// The fixed demo dataset
pub fn reference_snapshot() -> MetricsSnapshot {
    let emissions_series = [
        ("Jan", 1200.0),
        ("Feb", 1150.0),
        ("Mar", 1100.0),
        ("Apr", 1050.0),
        ("May", 1000.0),
        ("Jun", 950.0),
    ]
    .into_iter()
    .map(|(period, tonnes)| EmissionsPoint {
        period: period.to_string(),
        tonnes,
    })
    .collect();

    let energy_mix = [
        ("Solar", 35.0, "#FFD700", EnergyKind::Renewable),
        ("Wind", 25.0, "#87CEEB", EnergyKind::Renewable),
        ("Hydro", 15.0, "#1E90FF", EnergyKind::Renewable),
        ("Biomass", 10.0, "#228B22", EnergyKind::Renewable),
        ("Geothermal", 5.0, "#8B4513", EnergyKind::Renewable),
        ("Fossil fuels", 10.0, "#A9A9A9", EnergyKind::Fossil),
    ]
    .into_iter()
    .map(|(source, value, color, kind)| EnergySource {
        source: source.to_string(),
        value,
        color: color.to_string(),
        kind,
    })
    .collect();

    let transit_usage = [
        ("Bus", 15_000, TransitCategory::Public),
        ("Tram", 12_000, TransitCategory::Public),
        ("Bicycle", 8_000, TransitCategory::Active),
        ("E-bike", 3_000, TransitCategory::Active),
        ("Car sharing", 5_000, TransitCategory::Shared),
        ("Walking", 10_000, TransitCategory::Active),
    ]
    .into_iter()
    .map(|(mode, riders, category)| TransitMode {
        mode: mode.to_string(),
        riders,
        category,
    })
    .collect();

    let stations = vec![
        station(1, "Hauptbahnhof", StationStatus::Active, "Fast charger", "150 kW"),
        station(2, "Rathaus", StationStatus::Available, "Standard charger", "22 kW"),
        station(3, "Stadtpark", StationStatus::Active, "Standard charger", "11 kW"),
        station(4, "Einkaufszentrum", StationStatus::OutOfService, "Fast charger", "50 kW"),
        station(5, "Schwimmbad", StationStatus::Active, "Standard charger", "22 kW"),
    ];

    let air_quality_readings = [
        ("PM2.5", 10.0, 25.0),
        ("PM10", 20.0, 50.0),
        ("NO2", 25.0, 40.0),
        ("O3", 60.0, 120.0),
    ]
    .into_iter()
    .map(|(pollutant, value, limit)| AirQualityReading {
        pollutant: pollutant.to_string(),
        value,
        limit,
    })
    .collect();

    let initiative_impacts = [
        ("LED street lighting", 500, 50_000, ImpactIcon::Zap),
        ("Building insulation", 800, 75_000, ImpactIcon::Leaf),
        ("Solar panels on public buildings", 1_200, 100_000, ImpactIcon::Battery),
        ("Electric bus fleet", 1_500, 120_000, ImpactIcon::Bus),
        ("Urban green spaces", 300, 30_000, ImpactIcon::Tree),
    ]
    .into_iter()
    .map(|(initiative, co2_reduction, cost_savings, icon)| InitiativeImpact {
        initiative: initiative.to_string(),
        co2_reduction,
        cost_savings,
        icon,
    })
    .collect();

    let transit_schedule = [
        ("Bus 101", 3, "Mitte", "Ost", hm(7, 30), hm(19, 30)),
        ("Tram 1", 0, "Ost", "West", hm(6, 0), hm(23, 0)),
        ("Bus 202", 12, "West", "Süd", hm(8, 0), hm(20, 0)),
        ("Tram 2", 7, "Süd", "Nord", hm(5, 30), hm(22, 30)),
        ("Bus 303", 1, "Nord", "Mitte", hm(7, 0), hm(19, 0)),
    ]
    .into_iter()
    .map(|(line, delay_minutes, from, to, service_start, service_end)| ScheduleEntry {
        line: line.to_string(),
        delay_minutes,
        from_district: from.to_string(),
        to_district: to.to_string(),
        service_start,
        service_end,
    })
    .collect();

    MetricsSnapshot {
        generated_at: Utc::now(),
        emissions_series,
        energy_mix,
        transit_usage,
        ambient_conditions: AmbientConditions {
            temperature_c: 22.0,
            humidity_percent: 60.0,
        },
        mobility_network: MobilityNetwork {
            active_stations: 25,
            total_stations: 30,
            smart_charging: 18,
            available_stations: 7,
            stations,
        },
        air_quality_index: 65,
        air_quality_readings,
        initiative_impacts,
        transit_schedule,
        green_area_hectares: 135,
    }
}

// ============================================================================
// Jittered dataset
// ============================================================================

/// Reference data with bounded relative noise on every measured value.
/// Labels, ordering, statuses and initiative figures are left untouched.
pub struct JitterFeed {
    rng: StdRng,
    amplitude: f64,
}

impl JitterFeed {
    pub const DEFAULT_AMPLITUDE: f64 = 0.10;

    pub fn new(seed: Option<u64>, amplitude: f64) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            rng,
            amplitude: amplitude.clamp(0.0, 0.9),
        }
    }

    fn factor(&mut self) -> f64 {
        let a = self.amplitude;
        1.0 + self.rng.gen_range(-a..=a)
    }

    fn float(&mut self, value: f64, decimals: i32) -> f64 {
        let scale = 10f64.powi(decimals);
        ((value * self.factor()).max(0.0) * scale).round() / scale
    }

    fn count(&mut self, value: u64) -> u64 {
        (value as f64 * self.factor()).round().max(0.0) as u64
    }
}

impl MetricsSource for JitterFeed {
    fn name(&self) -> &str {
        "jitter"
    }

    fn generate(&mut self) -> Result<MetricsSnapshot, FeedError> {
        let mut snapshot = reference_snapshot();

        for point in &mut snapshot.emissions_series {
            point.tonnes = self.float(point.tonnes, 0);
        }
        for source in &mut snapshot.energy_mix {
            source.value = self.float(source.value, 1);
        }
        for mode in &mut snapshot.transit_usage {
            mode.riders = self.count(mode.riders);
        }

        let ambient = snapshot.ambient_conditions;
        snapshot.ambient_conditions.temperature_c = self.float(ambient.temperature_c, 1);
        snapshot.ambient_conditions.humidity_percent = self.float(ambient.humidity_percent, 0).min(100.0);

        let network = &snapshot.mobility_network;
        let total = network.total_stations as u64;
        let (active, smart, available) = (
            network.active_stations as u64,
            network.smart_charging as u64,
            network.available_stations as u64,
        );
        snapshot.mobility_network.active_stations = self.count(active).min(total) as u32;
        snapshot.mobility_network.smart_charging = self.count(smart).min(total) as u32;
        snapshot.mobility_network.available_stations = self.count(available).min(total) as u32;

        snapshot.air_quality_index = self.count(snapshot.air_quality_index as u64) as u32;
        for reading in &mut snapshot.air_quality_readings {
            reading.value = self.float(reading.value, 1);
        }
        for entry in &mut snapshot.transit_schedule {
            entry.delay_minutes = self.count(entry.delay_minutes as u64) as u32;
        }

        Ok(snapshot)
    }
}

// ============================================================================
// File-backed dataset
// ============================================================================

/// Re-reads a JSON snapshot on every `generate()` call
#[derive(Debug, Clone)]
pub struct FileFeed {
    path: PathBuf,
}

impl FileFeed {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl MetricsSource for FileFeed {
    fn name(&self) -> &str {
        "file"
    }

    fn generate(&mut self) -> Result<MetricsSnapshot, FeedError> {
        let content = fs::read_to_string(&self.path).map_err(|source| FeedError::Io {
            path: self.path.clone(),
            source,
        })?;

        MetricsSnapshot::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::derived::total_transit_riders;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_reference_shape() {
        let snapshot = ReferenceFeed::new().generate().unwrap();

        assert_eq!(snapshot.emissions_series.len(), 6);
        assert_eq!(snapshot.energy_mix.len(), 6);
        assert_eq!(snapshot.transit_usage.len(), 6);
        assert_eq!(snapshot.mobility_network.stations.len(), 5);
        assert_eq!(snapshot.air_quality_readings.len(), 4);
        assert_eq!(snapshot.initiative_impacts.len(), 5);
        assert_eq!(snapshot.transit_schedule.len(), 5);
        assert_eq!(snapshot.emissions_series[0].period, "Jan");
        assert_eq!(snapshot.emissions_series[5].tonnes, 950.0);
    }

    #[test]
    fn test_reference_is_stable_between_calls() {
        let mut feed = ReferenceFeed::new();
        let mut first = feed.generate().unwrap();
        let second = feed.generate().unwrap();

        first.generated_at = second.generated_at;
        assert_eq!(first, second);
    }

    #[test]
    fn test_jitter_is_deterministic_per_seed() {
        let mut a = JitterFeed::new(Some(42), 0.2);
        let mut b = JitterFeed::new(Some(42), 0.2);

        let mut first = a.generate().unwrap();
        let second = b.generate().unwrap();
        first.generated_at = second.generated_at;

        assert_eq!(first, second);
    }

    #[test]
    fn test_jitter_preserves_shape_and_bounds() {
        let reference = reference_snapshot();
        let mut feed = JitterFeed::new(Some(7), 0.1);

        for _ in 0..20 {
            let snapshot = feed.generate().unwrap();
            assert_eq!(snapshot.energy_mix.len(), reference.energy_mix.len());
            assert_eq!(snapshot.mobility_network.stations, reference.mobility_network.stations);
            assert_eq!(snapshot.initiative_impacts, reference.initiative_impacts);

            let riders = total_transit_riders(&snapshot.transit_usage);
            assert!(riders >= 47_000 && riders <= 59_000, "riders out of range: {}", riders);

            let network = &snapshot.mobility_network;
            assert!(network.active_stations <= network.total_stations);
            assert!(network.available_stations <= network.total_stations);
            assert!(snapshot.ambient_conditions.humidity_percent <= 100.0);
        }
    }

    #[test]
    fn test_zero_amplitude_matches_reference() {
        let mut feed = JitterFeed::new(Some(1), 0.0);
        let mut snapshot = feed.generate().unwrap();
        let reference = reference_snapshot();
        snapshot.generated_at = reference.generated_at;

        assert_eq!(snapshot, reference);
    }

    #[test]
    fn test_file_feed_reads_snapshot() {
        let mut file = NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&reference_snapshot()).unwrap();
        write!(file, "{}", json).unwrap();

        let mut feed = FileFeed::new(file.path());
        let snapshot = feed.generate().unwrap();
        assert_eq!(snapshot.air_quality_index, 65);
    }

    #[test]
    fn test_file_feed_rejects_invalid_status() {
        let mut file = NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&reference_snapshot())
            .unwrap()
            .replace("\"Available\"", "\"Reserved\"");
        write!(file, "{}", json).unwrap();

        let err = FileFeed::new(file.path()).generate().unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
        assert!(err.to_string().contains("Reserved"));
    }

    #[test]
    fn test_file_feed_missing_file() {
        let mut feed = FileFeed::new("/nonexistent/snapshot.json");
        assert!(matches!(feed.generate(), Err(FeedError::Io { .. })));
    }

    #[test]
    fn test_feed_kind_parse() {
        assert_eq!("reference".parse::<FeedKind>().unwrap(), FeedKind::Reference);
        assert_eq!("JITTER".parse::<FeedKind>().unwrap(), FeedKind::Jitter);
        assert_eq!("file".parse::<FeedKind>().unwrap(), FeedKind::File);
        assert!("live".parse::<FeedKind>().is_err());
    }

    #[test]
    fn test_open_file_source_requires_path() {
        let options = FeedOptions::default();
        assert!(matches!(
            open_source(FeedKind::File, &options),
            Err(FeedError::MissingPath)
        ));
        assert_eq!(open_source(FeedKind::Jitter, &options).unwrap().name(), "jitter");
    }
}
