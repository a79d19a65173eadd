pub mod dashboard;

// All tabs are rendered by dashboard.rs:
// - Tab 1: Overview (headline cards, emissions trend)
// - Tab 2: Energy (mix by source, renewable share)
// - Tab 3: Transport (riders per mode, line schedule, charging stations)
// - Tab 4: Environment (temperature, humidity, AQI, pollutants)
// - Tab 5: Impact (initiatives, annual totals, scenarios)

pub use dashboard::Dashboard;
