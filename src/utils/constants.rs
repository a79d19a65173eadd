/// Application-wide constants

use std::time::Duration;

use crate::core::derived::AirQualityCategory;

pub const APP_NAME: &str = "smartcity-dash";

pub const DASHBOARD_TITLE: &str = "Smart City Dashboard - Sustainability";

/// Default snapshot refresh period
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Separator inserted between digit groups by `format_thousands`
pub const THOUSANDS_DELIMITER: char = '.';

/// Inclusive AQI upper bounds, ascending; anything above the last is VeryPoor
pub const AQI_THRESHOLDS: &[(u32, AirQualityCategory)] = &[
    (50, AirQualityCategory::VeryGood),
    (100, AirQualityCategory::Good),
    (150, AirQualityCategory::Moderate),
    (200, AirQualityCategory::Poor),
];

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "SMARTCITY_DASH_CONFIG";

/// Scenario ideas listed on the impact tab
pub const SCENARIOS: &[&str] = &[
    "Impact of raising the cycling share by 10%",
    "CO2 savings from switching public buildings to 100% renewable energy",
    "Effects of a low-emission zone in the city centre",
];
