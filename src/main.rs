use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;

use smartcity_dash::app::App;
use smartcity_dash::cli::{Cli, Commands, ConfigCommands, LogFormat, OutputFormat};
use smartcity_dash::core::derived::format_thousands;
use smartcity_dash::core::{open_source, DashboardSummary, FeedKind, MetricsSnapshot, RefreshLoop};
use smartcity_dash::utils::logging::{self, LogTarget};
use smartcity_dash::utils::{format_duration, format_timestamp, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal, so its logs go to a file
    let target = if cli.command.is_none() {
        LogTarget::File
    } else {
        LogTarget::Stderr
    };
    logging::init(cli.verbose, cli.log_format == LogFormat::Json, target)?;

    let mut config = AppConfig::load()?;
    cli.apply_overrides(&mut config);

    match cli.command {
        None => {
            // No command - run interactive TUI
            ensure_valid(&config)?;
            let mut app = App::new(&config)?;
            app.run().await?;
        }
        Some(Commands::Snapshot { format }) => {
            handle_snapshot(&config, format)?;
        }
        Some(Commands::Summary { format }) => {
            handle_summary(&config, format)?;
        }
        Some(Commands::Watch { count }) => {
            ensure_valid(&config)?;
            handle_watch(&config, count).await?;
        }
        Some(Commands::Config { command }) => {
            handle_config(command)?;
        }
        #[cfg(feature = "server")]
        Some(Commands::Serve { port, host, cors }) => {
            ensure_valid(&config)?;
            smartcity_dash::server::run(host, port, cors, &config).await?;
        }
    }

    Ok(())
}

fn ensure_valid(config: &AppConfig) -> Result<()> {
    let errors = config.validate();
    if !errors.is_empty() {
        bail!("Invalid configuration:\n  - {}", errors.join("\n  - "));
    }
    Ok(())
}

fn load_snapshot(config: &AppConfig) -> Result<MetricsSnapshot> {
    let mut source = open_source(config.feed, &config.feed_options())
        .with_context(|| format!("Failed to open {} feed", config.feed))?;

    source
        .generate()
        .with_context(|| format!("Failed to generate snapshot from {} feed", source.name()))
}

fn handle_snapshot(config: &AppConfig, format: OutputFormat) -> Result<()> {
    let snapshot = load_snapshot(config)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        OutputFormat::Text => print_snapshot(&snapshot),
    }

    Ok(())
}

fn handle_summary(config: &AppConfig, format: OutputFormat) -> Result<()> {
    let snapshot = load_snapshot(config)?;
    let summary = DashboardSummary::from_snapshot(&snapshot);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_summary(&snapshot, &summary),
    }

    Ok(())
}

async fn handle_watch(config: &AppConfig, count: Option<u64>) -> Result<()> {
    let source = open_source(config.feed, &config.feed_options())
        .with_context(|| format!("Failed to open {} feed", config.feed))?;

    let mut refresh = RefreshLoop::new(config.refresh_interval);
    let mut updates = refresh.subscribe();
    refresh
        .activate(source)
        .with_context(|| format!("Failed to load initial snapshot from {} feed", config.feed))?;

    println!(
        "Watching {} feed every {} (Ctrl+C to stop)\n",
        config.feed.to_string().cyan(),
        format_duration(refresh.period())
    );

    let mut printed = 0u64;
    loop {
        let latest = updates.borrow_and_update().clone();
        if let Some(snapshot) = latest {
            print_watch_line(&snapshot, &DashboardSummary::from_snapshot(&snapshot));
            printed += 1;
        }

        if count.is_some_and(|limit| printed >= limit) {
            break;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    refresh.deactivate();
    Ok(())
}

fn handle_config(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::View => {
            let path = AppConfig::config_path()?;
            let config = AppConfig::load_from(&path)?;

            println!("Configuration ({}):\n", path.display());
            println!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?);

            let errors = config.validate();
            if errors.is_empty() {
                println!("{}", "✓ Configuration is valid".green());
            } else {
                println!("{}", "✗ Configuration errors:".red());
                for error in errors {
                    println!("  - {}", error);
                }
            }
        }
        ConfigCommands::Path => {
            println!("{}", AppConfig::config_path()?.display());
        }
        ConfigCommands::Init { force } => {
            let path = AppConfig::config_path()?;
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            AppConfig::default().save_to(&path)?;
            println!("✓ Wrote default configuration to {}", path.display());
        }
        ConfigCommands::SetInterval { interval } => {
            let mut config = AppConfig::load()?;
            config.refresh_interval = interval;
            let path = config.save()?;
            println!("✓ Refresh interval set to {} ({})", format_duration(interval), path.display());
        }
        ConfigCommands::SetFeed { feed, file } => {
            let mut config = AppConfig::load()?;
            config.feed = feed;
            if file.is_some() {
                config.snapshot_file = file;
            }
            if feed == FeedKind::File && config.snapshot_file.is_none() {
                bail!("The file feed needs a snapshot file (use --file <path>)");
            }
            let path = config.save()?;
            println!("✓ Feed set to {} ({})", feed, path.display());
        }
    }

    Ok(())
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "n/a".to_string())
}

fn print_watch_line(snapshot: &MetricsSnapshot, summary: &DashboardSummary) {
    println!(
        "[{}] CO2 {} t | renewable {}% | riders {} | AQI {} ({}) | stations {}/{}",
        format_timestamp(snapshot.generated_at).dimmed(),
        or_na(summary.latest_emissions.map(|t| format_thousands(t.round() as i64))),
        or_na(summary.renewable_share_percent),
        format_thousands(summary.total_transit_riders as i64),
        summary.air_quality_index,
        summary.air_quality_category.label(),
        snapshot.mobility_network.active_stations,
        snapshot.mobility_network.total_stations,
    );
}

fn print_snapshot(snapshot: &MetricsSnapshot) {
    println!("{}", "Smart City Snapshot".bold().green());
    println!("Generated: {}\n", format_timestamp(snapshot.generated_at));

    println!("{}", "CO2 emissions (t)".bold());
    for point in &snapshot.emissions_series {
        println!("  {:<8} {:>8}", point.period, format_thousands(point.tonnes.round() as i64));
    }

    println!("\n{}", "Energy mix".bold());
    for source in &snapshot.energy_mix {
        println!("  {:<15} {:>6.1}  {}", source.source, source.value, source.color.dimmed());
    }

    println!("\n{}", "Transit usage".bold());
    for mode in &snapshot.transit_usage {
        println!("  {:<15} {:>8}  {}", mode.mode, format_thousands(mode.riders as i64), mode.category.label());
    }

    let ambient = &snapshot.ambient_conditions;
    println!("\n{}", "Environment".bold());
    println!("  Temperature  {:.1}°C", ambient.temperature_c);
    println!("  Humidity     {:.0}%", ambient.humidity_percent);
    println!("  AQI          {}", snapshot.air_quality_index);
    for reading in &snapshot.air_quality_readings {
        println!("  {:<8} {:>6.1} / {:.1}", reading.pollutant, reading.value, reading.limit);
    }

    let network = &snapshot.mobility_network;
    println!("\n{}", "Charging stations".bold());
    println!(
        "  {} active / {} total, {} smart charging, {} available",
        network.active_stations, network.total_stations, network.smart_charging, network.available_stations
    );
    for station in &network.stations {
        println!(
            "  #{:<3} {:<18} {:<14} {:<18} {}",
            station.id, station.name, station.status, station.station_type, station.power
        );
    }

    println!("\n{}", "Line schedule".bold());
    for entry in &snapshot.transit_schedule {
        println!(
            "  {:<8} {:<28} {}  +{} min",
            entry.line,
            entry.districts(),
            entry.operating_hours(),
            entry.delay_minutes
        );
    }

    println!("\n{}", "Initiatives".bold());
    for item in &snapshot.initiative_impacts {
        println!(
            "  {:<35} {:>7} t/yr {:>10} €/yr",
            item.initiative,
            format_thousands(item.co2_reduction as i64),
            format_thousands(item.cost_savings as i64)
        );
    }

    println!("\nGreen spaces: {} ha", snapshot.green_area_hectares);
}

fn print_summary(snapshot: &MetricsSnapshot, summary: &DashboardSummary) {
    println!("{}", "Smart City Summary".bold().green());
    println!("Generated: {}\n", format_timestamp(snapshot.generated_at));

    println!("{:<28} {}", "Latest CO2 emissions", or_na(summary.latest_emissions.map(|t| format!("{} t", format_thousands(t.round() as i64)))));
    println!("{:<28} {}", "Change vs previous month", or_na(summary.emissions_change_percent.map(|c| format!("{:+.1}%", c))));
    println!("{:<28} {}", "Renewable share", or_na(summary.renewable_share_percent.map(|p| format!("{}%", p))));
    println!("{:<28} {}", "Transit riders", format_thousands(summary.total_transit_riders as i64));
    println!(
        "{:<28} public {} / active {} / shared {}",
        "  by category",
        format_thousands(summary.public_riders as i64),
        format_thousands(summary.active_riders as i64),
        format_thousands(summary.shared_riders as i64)
    );

    let category = summary.air_quality_category.label();
    let category = if summary.exceeded_pollutants == 0 {
        category.green()
    } else {
        category.yellow()
    };
    println!("{:<28} {} ({})", "Air quality index", summary.air_quality_index, category);
    println!(
        "{:<28} {} within limit, {} exceeded",
        "Pollutants", summary.compliant_pollutants, summary.exceeded_pollutants
    );

    match summary.station_utilization {
        Some(u) => println!(
            "{:<28} active {:.3} / smart {:.3} / available {:.3}",
            "Station utilization", u.active, u.smart_charging, u.available
        ),
        None => println!("{:<28} n/a", "Station utilization"),
    }
    if !summary.station_counters_consistent {
        println!("{}", "  ! station counters exceed the total".red());
    }

    let impact = summary.cumulative_impact;
    println!(
        "{:<28} {} t CO2, {} € per year",
        "Initiative impact",
        format_thousands(impact.total_co2_reduction as i64),
        format_thousands(impact.total_cost_savings as i64)
    );
}
