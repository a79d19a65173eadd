/// Main dashboard screen

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Clear, Dataset, Gauge,
        GraphType, List, ListItem, Paragraph, Row, Table, Wrap,
    },
    Frame,
};

use crate::app::{FeedStatus, Screen};
use crate::core::derived::{format_thousands, AirQualityCategory, DashboardSummary};
use crate::core::snapshot::{EnergyKind, ImpactIcon, MetricsSnapshot, MobilityNetwork, StationStatus};
use crate::utils::{format_duration, format_timestamp, parse_hex_color, truncate_string, DASHBOARD_TITLE, SCENARIOS};

const ACCENT: Color = Color::Rgb(5, 150, 105);

/// Presentation colors for AQI bands
fn category_color(category: AirQualityCategory) -> Color {
    match category {
        AirQualityCategory::VeryGood => Color::Green,
        AirQualityCategory::Good => Color::Yellow,
        AirQualityCategory::Moderate => Color::Rgb(251, 146, 60),
        AirQualityCategory::Poor => Color::Red,
        AirQualityCategory::VeryPoor => Color::Magenta,
    }
}

fn status_glyph(status: StationStatus) -> (&'static str, Color) {
    match status {
        StationStatus::Active => ("✔", Color::Green),
        StationStatus::Available => ("◉", Color::Blue),
        StationStatus::OutOfService => ("✖", Color::Red),
    }
}

/// "3 Active, 1 Available, 1 OutOfService" over the listed stations
fn status_tally(network: &MobilityNetwork) -> String {
    StationStatus::all()
        .iter()
        .map(|status| format!("{} {}", network.count_with_status(*status), status))
        .collect::<Vec<_>>()
        .join(", ")
}

fn icon_glyph(icon: ImpactIcon) -> &'static str {
    match icon {
        ImpactIcon::Zap => "ϟ",
        ImpactIcon::Leaf => "❦",
        ImpactIcon::Battery => "▮",
        ImpactIcon::Bus => "▣",
        ImpactIcon::Tree => "♣",
    }
}

fn hex_color(hex: &str) -> Color {
    parse_hex_color(hex)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::Gray)
}

fn delay_style(minutes: u32) -> (String, Color) {
    match minutes {
        0 => ("on time".to_string(), Color::Green),
        1..=5 => (format!("+{} min", minutes), Color::Yellow),
        _ => (format!("+{} min", minutes), Color::Red),
    }
}

fn bold(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn header_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

/// A bordered metric card: title, big value, one line of detail
fn card<'a>(title: &'a str, value: String, detail: String, color: Color) -> Paragraph<'a> {
    Paragraph::new(vec![
        Line::from(Span::styled(value, bold(color))),
        Line::from(Span::styled(detail, Style::default().fg(Color::DarkGray))),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(title, Style::default().fg(Color::Gray))),
    )
}

pub struct Dashboard {
    title: String,
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            title: DASHBOARD_TITLE.to_string(),
        }
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        current_screen: Screen,
        snapshot: Option<&MetricsSnapshot>,
        summary: Option<&DashboardSummary>,
        feed: &FeedStatus,
        status_message: Option<&str>,
        show_help: bool,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Title + feed status
                Constraint::Length(3), // Menu
                Constraint::Min(0),    // Content
                Constraint::Length(3), // Footer
            ])
            .split(frame.size());

        self.render_header(frame, chunks[0], snapshot, feed);

        // Menu bar
        let menu_items: Vec<Span> = Screen::all()
            .iter()
            .enumerate()
            .flat_map(|(i, screen)| {
                let style = if *screen == current_screen {
                    Style::default()
                        .fg(Color::Black)
                        .bg(ACCENT)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                vec![
                    Span::styled(format!(" [{}] {} ", i + 1, screen.title()), style),
                    Span::raw("  "),
                ]
            })
            .collect();

        let menu = Paragraph::new(Line::from(menu_items)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(menu, chunks[1]);

        // Content area - render based on current screen
        match (snapshot, summary) {
            (Some(snapshot), Some(summary)) => match current_screen {
                Screen::Overview => self.render_overview(frame, chunks[2], snapshot, summary),
                Screen::Energy => self.render_energy(frame, chunks[2], snapshot, summary),
                Screen::Transport => self.render_transport(frame, chunks[2], snapshot, summary),
                Screen::Environment => self.render_environment(frame, chunks[2], snapshot, summary),
                Screen::Impact => self.render_impact(frame, chunks[2], snapshot, summary),
            },
            _ => {
                let waiting = Paragraph::new("Waiting for the first snapshot...")
                    .style(Style::default().fg(Color::Yellow))
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(waiting, chunks[2]);
            }
        }

        // Footer with status message or key hints
        let footer_text = match status_message {
            Some(status) => status.to_string(),
            None => "[← →/Tab] Switch tab | [1-5] Jump | [p] Pause/resume | [r] Refresh now | [?] Help | [q]uit".to_string(),
        };

        let footer = Paragraph::new(footer_text)
            .alignment(Alignment::Center)
            .style(if status_message.is_some() {
                bold(Color::Cyan)
            } else {
                Style::default()
            })
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);

        if show_help {
            self.render_help(frame);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, snapshot: Option<&MetricsSnapshot>, feed: &FeedStatus) {
        let (state, state_color) = if feed.live {
            ("LIVE", Color::Green)
        } else {
            ("PAUSED", Color::Yellow)
        };

        let updated = snapshot
            .map(|s| format_timestamp(s.generated_at))
            .unwrap_or_else(|| "never".to_string());

        let title_line = Line::from(Span::styled(self.title.as_str(), bold(ACCENT)));
        let feed_line = Line::from(vec![
            Span::styled("Feed: ", Style::default().fg(Color::Gray)),
            Span::styled(feed.feed.to_string(), Style::default().fg(Color::White)),
            Span::raw(" | "),
            Span::styled("Refresh: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("every {}", format_duration(feed.interval)), Style::default().fg(Color::White)),
            Span::raw(" | "),
            Span::styled(state, bold(state_color)),
            Span::raw(" | "),
            Span::styled("Updated: ", Style::default().fg(Color::Gray)),
            Span::styled(updated, Style::default().fg(Color::Cyan)),
            Span::styled(format!("  (#{})", feed.refreshes), Style::default().fg(Color::DarkGray)),
        ]);

        let header = Paragraph::new(vec![title_line, feed_line])
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, area);
    }

    fn render_overview(&self, frame: &mut Frame, area: Rect, snapshot: &MetricsSnapshot, summary: &DashboardSummary) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(area);

        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25); 4])
            .split(rows[0]);

        let emissions = summary
            .latest_emissions
            .map(|t| format!("{} t", format_thousands(t.round() as i64)))
            .unwrap_or_else(|| "n/a".to_string());
        let change = summary
            .emissions_change_percent
            .map(|c| format!("{:+.1}% vs previous month", c))
            .unwrap_or_else(|| "no previous month".to_string());
        frame.render_widget(card("Total CO2 emissions", emissions, change, Color::White), cards[0]);

        let renewable_sources = snapshot
            .energy_mix
            .iter()
            .filter(|s| s.kind == EnergyKind::Renewable)
            .count();
        let renewable = summary
            .renewable_share_percent
            .map(|p| format!("{}%", p))
            .unwrap_or_else(|| "n/a".to_string());
        frame.render_widget(
            card(
                "Renewable energy",
                renewable,
                format!("{} of {} sources", renewable_sources, snapshot.energy_mix.len()),
                ACCENT,
            ),
            cards[1],
        );

        frame.render_widget(
            card(
                "Public transit usage",
                format!("{} trips", format_thousands(summary.total_transit_riders as i64)),
                format!("{} by bus and tram", format_thousands(summary.public_riders as i64)),
                Color::Cyan,
            ),
            cards[2],
        );

        frame.render_widget(
            card(
                "Green spaces",
                format!("{} ha", snapshot.green_area_hectares),
                "parks and urban forest".to_string(),
                Color::Green,
            ),
            cards[3],
        );

        self.render_emissions_chart(frame, rows[1], snapshot);
    }

    fn render_emissions_chart(&self, frame: &mut Frame, area: Rect, snapshot: &MetricsSnapshot) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("CO2 emissions trend (t per month)");

        let series = &snapshot.emissions_series;
        if series.is_empty() {
            frame.render_widget(Paragraph::new("No emissions data").block(block), area);
            return;
        }

        let points: Vec<(f64, f64)> = series
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, p.tonnes))
            .collect();

        let min = series.iter().map(|p| p.tonnes).fold(f64::INFINITY, f64::min);
        let max = series.iter().map(|p| p.tonnes).fold(f64::NEG_INFINITY, f64::max);
        let (low, high) = ((min * 0.9).floor(), (max * 1.1).ceil().max(min + 1.0));

        let x_labels: Vec<Span> = series.iter().map(|p| Span::raw(p.period.clone())).collect();
        let y_labels: Vec<Span> = [low, (low + high) / 2.0, high]
            .iter()
            .map(|v| Span::raw(format_thousands(v.round() as i64)))
            .collect();

        let dataset = Dataset::default()
            .name("Emissions")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(ACCENT))
            .data(&points);

        let chart = Chart::new(vec![dataset])
            .block(block)
            .x_axis(
                Axis::default()
                    .title("Month")
                    .style(Style::default().fg(Color::Gray))
                    .bounds([0.0, (series.len().max(2) - 1) as f64])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .title("t CO2")
                    .style(Style::default().fg(Color::Gray))
                    .bounds([low, high])
                    .labels(y_labels),
            );

        frame.render_widget(chart, area);
    }

    fn render_energy(&self, frame: &mut Frame, area: Rect, snapshot: &MetricsSnapshot, summary: &DashboardSummary) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        // Share per source as colored bars (tenths of a percent)
        let bars: Vec<Bar> = snapshot
            .energy_mix
            .iter()
            .zip(&summary.energy_shares)
            .map(|(source, share)| {
                let color = hex_color(&source.color);
                let text = share
                    .share_percent
                    .map(|p| format!("{:.1}%", p))
                    .unwrap_or_else(|| "n/a".to_string());

                Bar::default()
                    .value(share.share_percent.map_or(0, |p| (p * 10.0).round() as u64))
                    .label(Line::from(truncate_string(&source.source, 12)))
                    .text_value(text)
                    .style(Style::default().fg(color))
                    .value_style(Style::default().fg(Color::Black).bg(color))
            })
            .collect();

        let chart = BarChart::default()
            .block(Block::default().borders(Borders::ALL).title("Energy consumption by source"))
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(1)
            .max(1000)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, cols[0]);

        let rows: Vec<Row> = snapshot
            .energy_mix
            .iter()
            .zip(&summary.energy_shares)
            .map(|(source, share)| {
                let kind = match source.kind {
                    EnergyKind::Renewable => Span::styled("Renewable", Style::default().fg(Color::Green)),
                    EnergyKind::Fossil => Span::styled("Fossil", Style::default().fg(Color::DarkGray)),
                };

                Row::new(vec![
                    Cell::from(Line::from(vec![
                        Span::styled("■ ", Style::default().fg(hex_color(&source.color))),
                        Span::raw(source.source.clone()),
                    ])),
                    Cell::from(format!("{:.1}", source.value)),
                    Cell::from(
                        share
                            .share_percent
                            .map(|p| format!("{:.1}%", p))
                            .unwrap_or_else(|| "n/a".to_string()),
                    ),
                    Cell::from(kind),
                ])
            })
            .collect();

        let renewable = summary
            .renewable_share_percent
            .map(|p| format!("{}%", p))
            .unwrap_or_else(|| "n/a".to_string());

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(40),
                Constraint::Percentage(15),
                Constraint::Percentage(20),
                Constraint::Percentage(25),
            ],
        )
        .header(
            Row::new(vec!["Source", "Value", "Share", "Kind"])
                .style(header_style())
                .bottom_margin(1),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Energy details - renewable share {}", renewable)),
        );
        frame.render_widget(table, cols[1]);
    }

    fn render_transport(&self, frame: &mut Frame, area: Rect, snapshot: &MetricsSnapshot, summary: &DashboardSummary) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(8),
                Constraint::Length(snapshot.transit_schedule.len() as u16 + 4),
            ])
            .split(cols[0]);

        // Riders per mode
        let bars: Vec<Bar> = snapshot
            .transit_usage
            .iter()
            .map(|mode| {
                Bar::default()
                    .value(mode.riders)
                    .label(Line::from(mode.mode.clone()))
                    .text_value(format_thousands(mode.riders as i64))
                    .style(Style::default().fg(Color::Cyan))
                    .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
            })
            .collect();

        let riders = BarChart::default()
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Transit usage - {} trips",
                format_thousands(summary.total_transit_riders as i64)
            )))
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(1)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(riders, left[0]);

        // Line schedule
        let schedule_rows: Vec<Row> = snapshot
            .transit_schedule
            .iter()
            .map(|entry| {
                let (delay, color) = delay_style(entry.delay_minutes);
                Row::new(vec![
                    Cell::from(entry.line.clone()),
                    Cell::from(entry.districts()),
                    Cell::from(entry.operating_hours()),
                    Cell::from(Span::styled(delay, Style::default().fg(color))),
                ])
            })
            .collect();

        let schedule = Table::new(
            schedule_rows,
            [
                Constraint::Length(9),
                Constraint::Min(14),
                Constraint::Length(14),
                Constraint::Length(9),
            ],
        )
        .header(Row::new(vec!["Line", "Route", "Hours", "Delay"]).style(header_style()))
        .block(Block::default().borders(Borders::ALL).title("Line schedule"));
        frame.render_widget(schedule, left[1]);

        self.render_stations(frame, cols[1], snapshot, summary);
    }

    fn render_stations(&self, frame: &mut Frame, area: Rect, snapshot: &MetricsSnapshot, summary: &DashboardSummary) {
        let network = &snapshot.mobility_network;

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);

        let utilization = summary.station_utilization;
        let gauges = [
            (
                "Active charging stations",
                utilization.map(|u| u.active),
                format!("{} / {}", network.active_stations, network.total_stations),
                Color::Blue,
            ),
            (
                "Smart charging",
                utilization.map(|u| u.smart_charging),
                format!("{} stations", network.smart_charging),
                Color::Green,
            ),
            (
                "Available stations",
                utilization.map(|u| u.available),
                format!("{}", network.available_stations),
                Color::Magenta,
            ),
        ];

        for (i, (title, ratio, label, color)) in gauges.into_iter().enumerate() {
            let label = if ratio.is_some() { label } else { "n/a (no stations)".to_string() };
            let gauge = Gauge::default()
                .block(Block::default().borders(Borders::ALL).title(title))
                .gauge_style(Style::default().fg(color).bg(Color::DarkGray))
                .ratio(ratio.unwrap_or(0.0).clamp(0.0, 1.0))
                .label(label);
            frame.render_widget(gauge, rows[i]);
        }

        let station_rows: Vec<Row> = network
            .stations
            .iter()
            .map(|station| {
                let (glyph, color) = status_glyph(station.status);
                Row::new(vec![
                    Cell::from(station.id.to_string()),
                    Cell::from(station.name.clone()),
                    Cell::from(Span::styled(
                        format!("{} {}", glyph, station.status),
                        Style::default().fg(color),
                    )),
                    Cell::from(station.station_type.clone()),
                    Cell::from(station.power.clone()),
                ])
            })
            .collect();

        let title = if summary.station_counters_consistent {
            format!("Charging stations - {}", status_tally(network))
        } else {
            format!("Charging stations - {} (counters exceed total)", status_tally(network))
        };

        let table = Table::new(
            station_rows,
            [
                Constraint::Length(3),
                Constraint::Min(12),
                Constraint::Length(15),
                Constraint::Length(17),
                Constraint::Length(7),
            ],
        )
        .header(Row::new(vec!["ID", "Name", "Status", "Type", "Power"]).style(header_style()))
        .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(table, rows[3]);
    }

    fn render_environment(&self, frame: &mut Frame, area: Rect, snapshot: &MetricsSnapshot, summary: &DashboardSummary) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(33),
                Constraint::Percentage(33),
                Constraint::Percentage(34),
            ])
            .split(rows[0]);

        let ambient = &snapshot.ambient_conditions;
        let category = summary.air_quality_category;
        let category_color = category_color(category);

        frame.render_widget(
            card(
                "Temperature",
                format!("{:.1}°C", ambient.temperature_c),
                "city average".to_string(),
                Color::Red,
            ),
            cards[0],
        );
        frame.render_widget(
            card(
                "Humidity",
                format!("{:.0}%", ambient.humidity_percent),
                "relative".to_string(),
                Color::Blue,
            ),
            cards[1],
        );
        frame.render_widget(
            card(
                "Air quality index",
                summary.air_quality_index.to_string(),
                category.label().to_string(),
                category_color,
            ),
            cards[2],
        );

        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("AQI scale (0-200+)"))
            .gauge_style(Style::default().fg(category_color).bg(Color::DarkGray))
            .ratio((summary.aqi_gauge_percent / 100.0).clamp(0.0, 1.0))
            .label(format!("{} - {}", summary.air_quality_index, category.label()));
        frame.render_widget(gauge, rows[1]);

        let pollutant_rows: Vec<Row> = summary
            .pollutants
            .iter()
            .map(|p| {
                let (text, color) = if p.compliant {
                    ("Within limit", Color::Green)
                } else {
                    ("Exceeded", Color::Red)
                };

                Row::new(vec![
                    Cell::from(p.pollutant.clone()),
                    Cell::from(format!("{:.1}", p.value)),
                    Cell::from(format!("{:.1}", p.limit)),
                    Cell::from(Span::styled(text, bold(color))),
                ])
            })
            .collect();

        let table = Table::new(
            pollutant_rows,
            [
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
            ],
        )
        .header(
            Row::new(vec!["Pollutant", "Value (µg/m³)", "Limit (µg/m³)", "Status"])
                .style(header_style())
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Air quality details - {} within limit, {} exceeded",
            summary.compliant_pollutants, summary.exceeded_pollutants
        )));
        frame.render_widget(table, rows[2]);
    }

    fn render_impact(&self, frame: &mut Frame, area: Rect, snapshot: &MetricsSnapshot, summary: &DashboardSummary) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(8),
                Constraint::Length(4),
                Constraint::Length(SCENARIOS.len() as u16 + 2),
            ])
            .split(area);

        let impact_rows: Vec<Row> = snapshot
            .initiative_impacts
            .iter()
            .map(|item| {
                Row::new(vec![
                    Cell::from(Span::styled(icon_glyph(item.icon), Style::default().fg(ACCENT))),
                    Cell::from(item.initiative.clone()),
                    Cell::from(format_thousands(item.co2_reduction as i64)),
                    Cell::from(format_thousands(item.cost_savings as i64)),
                ])
            })
            .collect();

        let table = Table::new(
            impact_rows,
            [
                Constraint::Length(2),
                Constraint::Min(20),
                Constraint::Length(20),
                Constraint::Length(20),
            ],
        )
        .header(
            Row::new(vec!["", "Initiative", "CO2 reduction (t/yr)", "Cost savings (€/yr)"])
                .style(header_style())
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title("Environmental impact analysis"));
        frame.render_widget(table, rows[0]);

        let totals = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        let impact = summary.cumulative_impact;
        frame.render_widget(
            card(
                "Annual CO2 reduction",
                format!("{} t", format_thousands(impact.total_co2_reduction as i64)),
                format!("across {} initiatives", snapshot.initiative_impacts.len()),
                ACCENT,
            ),
            totals[0],
        );
        frame.render_widget(
            card(
                "Annual cost savings",
                format!("{} €", format_thousands(impact.total_cost_savings as i64)),
                "per year".to_string(),
                Color::Yellow,
            ),
            totals[1],
        );

        let scenarios: Vec<ListItem> = SCENARIOS
            .iter()
            .map(|s| ListItem::new(format!("• {}", s)))
            .collect();
        let list = List::new(scenarios).block(Block::default().borders(Borders::ALL).title("Scenario analysis"));
        frame.render_widget(list, rows[2]);
    }

    fn render_help(&self, frame: &mut Frame) {
        // Create centered overlay
        let area = frame.size();
        let popup_width = area.width.min(64);
        let popup_height = area.height.min(18);
        let popup_area = Rect {
            x: (area.width.saturating_sub(popup_width)) / 2,
            y: (area.height.saturating_sub(popup_height)) / 2,
            width: popup_width,
            height: popup_height,
        };

        let help_text = vec![
            Line::from(Span::styled("Smart City Dashboard - Keyboard Shortcuts", bold(Color::Cyan))),
            Line::from(""),
            Line::from(Span::styled("Navigation:", header_style())),
            Line::from("  [1-5]          Jump to tab"),
            Line::from("  [← →] / [Tab]  Next/Previous tab"),
            Line::from(""),
            Line::from(Span::styled("Feed:", header_style())),
            Line::from("  [p]            Pause / resume auto-refresh"),
            Line::from("  [r]            Refresh now (restarts the timer)"),
            Line::from(""),
            Line::from(Span::styled("General:", header_style())),
            Line::from("  [?] / [F1]     Toggle this help"),
            Line::from("  [q] / [Esc]    Quit"),
        ];

        let help = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .wrap(Wrap { trim: false });

        frame.render_widget(Clear, popup_area);
        frame.render_widget(help, popup_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::feed::reference_snapshot;
    use crate::core::FeedKind;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    fn feed_status() -> FeedStatus {
        FeedStatus {
            feed: FeedKind::Reference,
            interval: Duration::from_secs(5),
            live: true,
            refreshes: 1,
        }
    }

    #[test]
    fn test_every_tab_renders() {
        let snapshot = reference_snapshot();
        let summary = DashboardSummary::from_snapshot(&snapshot);
        let dashboard = Dashboard::new();
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();

        for screen in Screen::all() {
            terminal
                .draw(|f| {
                    dashboard.render(f, *screen, Some(&snapshot), Some(&summary), &feed_status(), None, false)
                })
                .unwrap();
        }

        terminal
            .draw(|f| dashboard.render(f, Screen::Overview, Some(&snapshot), Some(&summary), &feed_status(), None, false))
            .unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("950 t"));
        assert!(text.contains("53.000 trips"));
        assert!(text.contains("90%"));
    }

    #[test]
    fn test_zero_totals_render_without_panicking() {
        let mut snapshot = reference_snapshot();
        snapshot.energy_mix.iter_mut().for_each(|s| s.value = 0.0);
        snapshot.mobility_network.total_stations = 0;
        snapshot.emissions_series.clear();
        let summary = DashboardSummary::from_snapshot(&snapshot);

        let dashboard = Dashboard::new();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        for screen in Screen::all() {
            terminal
                .draw(|f| {
                    dashboard.render(f, *screen, Some(&snapshot), Some(&summary), &feed_status(), None, true)
                })
                .unwrap();
        }
    }

    #[test]
    fn test_waiting_without_snapshot() {
        let dashboard = Dashboard::new();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|f| dashboard.render(f, Screen::Energy, None, None, &feed_status(), None, false))
            .unwrap();

        assert!(buffer_text(&terminal).contains("Waiting for the first snapshot"));
    }

    #[test]
    fn test_presentation_mappings() {
        assert_eq!(category_color(AirQualityCategory::VeryGood), Color::Green);
        assert_eq!(hex_color("#FFD700"), Color::Rgb(255, 215, 0));
        assert_eq!(hex_color("gold"), Color::Gray);
        assert_eq!(delay_style(0).0, "on time");
        assert_eq!(delay_style(12), ("+12 min".to_string(), Color::Red));
    }

    #[test]
    fn test_station_status_tally() {
        let mut network = reference_snapshot().mobility_network;
        assert_eq!(status_tally(&network), "3 Active, 1 Available, 1 OutOfService");

        network.stations.clear();
        assert_eq!(status_tally(&network), "0 Active, 0 Available, 0 OutOfService");
    }
}
