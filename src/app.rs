use crate::astro::{self, angular_diameter_arcsec};
use crate::bodies::{self, Scope, PLANET_RADII};
use crate::chart::{self, Axis, ChartOptions, PlanetPosition};
use crate::config::{self, Settings};
use crate::ephemeris::{EphemerisTable, EventKind};
use crate::plot;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fmt::Display;
use std::path::PathBuf;

/// Days searched ahead for greatest elongations.
const ELONGATION_SEARCH_DAYS: i64 = 600;
const ELONGATION_STEP_DAYS: f64 = 15.0;
/// Differences below these count as the same observing site.
const SITE_TOLERANCE_DEG: f64 = 0.01;
const SITE_TOLERANCE_M: f64 = 100.0;

#[derive(Parser, Debug)]
#[command(name = "skywatch")]
#[command(about = "Rise/set times, apparent sizes, elongations and sky charts from a loaded ephemeris")]
struct Cli {
    /// Config file (default: ./config.json, then the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ephemeris table (JSON); overrides the config's `ephemeris`
    #[arg(long, global = true)]
    ephemeris: Option<PathBuf>,

    /// Observation time, RFC 3339. Example: 2024-03-01T21:00:00+10:00
    #[arg(long, global = true, value_parser = parse_time)]
    at: Option<DateTime<Utc>>,

    /// Suppress warnings
    #[arg(long, short, global = true, default_value_t = false)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find out when certain EVENTS happen with PLANETS
    ///
    /// Reports the next event of each kind within 24 hours of the observation time.
    When {
        /// A comma separated list of planets. E.g. 'sun,moon'
        planets: String,
        /// Comma separated name of events to query. E.g. 'rise,set'
        events: String,
    },
    /// Chart where PLANETS sit around you
    Place {
        /// A comma separated list of planets. E.g. 'venus,mars'
        planets: String,
        #[command(flatten)]
        chart: ChartArgs,
    },
    /// Apparent size of planets in the sky (angular diameter in arcseconds)
    Size {
        /// A comma separated list of planets. E.g. 'venus,mars'
        planets: String,
    },
    /// Display a list of all supported planet names
    Planets,
    /// Find the greatest distances in the sky between two planets
    FindElongation {
        /// The first planet. E.g. 'venus'
        planeta: String,
        /// The second planet. E.g. 'sun'
        planetb: String,
    },
    /// Generate various charts
    Chart {
        /// The name of the chart
        #[arg(value_enum)]
        chart: ChartKind,
        /// The first planet. E.g. 'venus'
        planeta: String,
        /// The second planet. E.g. 'sun'
        planetb: String,
        /// The amount of days to step through
        #[arg(long, default_value_t = 7)]
        days: u32,
        /// The amount of hours to step by
        #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(1..))]
        step: u32,
        /// Plot width in columns (default: fit the terminal)
        #[arg(long)]
        width: Option<usize>,
        /// Plot height in rows
        #[arg(long, default_value_t = 15)]
        height: usize,
    },
}

#[derive(Args, Debug)]
struct ChartArgs {
    /// Half-width of the chart square, in cells
    #[arg(long, default_value_t = 8, allow_negative_numbers = true)]
    size: i64,
    /// Blank cells left and right of the square
    #[arg(long, default_value_t = 14)]
    pad: usize,
    /// Blank rows above and below the square
    #[arg(long, default_value_t = 3)]
    vpad: usize,
    /// Glyph for empty cells on the top and bottom edges
    #[arg(long, default_value_t = '-')]
    horizontal_char: char,
    /// Glyph for empty cells on the left and right edges
    #[arg(long, default_value_t = '|')]
    vertical_char: char,
    /// Hide the observer marker in the middle
    #[arg(long, default_value_t = false)]
    no_observer: bool,
    /// Coordinate placed around the ring
    #[arg(long, value_enum, default_value_t = Axis::Ra)]
    axis: Axis,
}

impl From<&ChartArgs> for ChartOptions {
    fn from(a: &ChartArgs) -> Self {
        ChartOptions {
            size: a.size,
            axis: a.axis,
            pad: a.pad,
            vpad: a.vpad,
            horizontal_empty: a.horizontal_char,
            vertical_empty: a.vertical_char,
            observer_marker: !a.no_observer,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ChartKind {
    /// Angular distance between two bodies over time
    Elongation,
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("{e} (expected RFC 3339, e.g. 2024-03-01T21:00:00Z)"))
}

/// `t` plus `days`, or an error when that leaves the representable calendar.
fn days_after(t: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|d| t.checked_add_signed(d))
        .ok_or_else(|| anyhow!("{days} days after {t} is out of the supported date range"))
}

fn warn(quiet: bool, msg: impl Display) {
    if !quiet {
        eprintln!("warning: {msg}");
    }
}

/// Settings, the loaded table and the observation time for one command.
struct Session {
    table: EphemerisTable,
    now: DateTime<Utc>,
    quiet: bool,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self> {
        let settings = config::resolve(cli.config.as_deref())?;
        let path = cli.ephemeris.clone().unwrap_or_else(|| settings.ephemeris.clone());
        let table = EphemerisTable::load(&path)
            .with_context(|| format!("loading ephemeris {}", path.display()))?;
        check_site(&settings, &table, cli.quiet)?;
        Ok(Self {
            table,
            now: cli.at.unwrap_or_else(Utc::now),
            quiet: cli.quiet,
        })
    }
}

/// Warns when the table was generated for another place or timezone than configured.
fn check_site(settings: &Settings, table: &EphemerisTable, quiet: bool) -> Result<()> {
    let observer = settings.observer()?;
    if let Some(site) = table.observer {
        if (site.lat - observer.lat).abs() > SITE_TOLERANCE_DEG
            || (site.long - observer.long).abs() > SITE_TOLERANCE_DEG
            || (site.elevation - observer.elevation).abs() > SITE_TOLERANCE_M
        {
            warn(
                quiet,
                format!(
                    "ephemeris was generated for {:.4}, {:.4} ({} m) but the configured observer is at {:.4}, {:.4} ({} m)",
                    site.lat, site.long, site.elevation, observer.lat, observer.long, observer.elevation
                ),
            );
        }
    }
    if let Some(tz) = &table.timezone {
        if *tz != settings.timezone {
            warn(
                quiet,
                format!("ephemeris events are for {tz} but the configured timezone is {}", settings.timezone),
            );
        }
    }
    Ok(())
}

fn when(s: &Session, planets: &str, events: &str) -> Result<Vec<String>> {
    let planets = bodies::parse_list(planets);
    bodies::check_supported(&planets, Scope::Luminaries)?;
    let kinds = bodies::parse_list(events)
        .iter()
        .map(|e| EventKind::parse(e).ok_or_else(|| anyhow!("unknown event {e}; expected rise or set")))
        .collect::<Result<Vec<_>>>()?;

    let until = days_after(s.now, 1)?;
    let mut out = Vec::new();
    for planet in &planets {
        for &kind in &kinds {
            let t = s
                .table
                .events(planet, kind, s.now, until)
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("no {} event for {planet} within a day of {}", kind.as_str(), s.now))?;
            out.push(t.format("%H:%M:%S").to_string());
        }
    }
    Ok(out)
}

fn positions(s: &Session, planets: &[String]) -> Result<Vec<PlanetPosition>> {
    planets
        .iter()
        .map(|name| {
            let o = s.table.observe(name, s.now)?;
            Ok(PlanetPosition::new(name, o.ra_deg, o.dec_deg, o.distance_km))
        })
        .collect()
}

fn place(s: &Session, planets: &str, args: &ChartArgs) -> Result<String> {
    let planets = bodies::parse_list(planets);
    bodies::check_supported(&planets, Scope::Planets)?;
    let placed = positions(s, &planets)?;
    Ok(chart::render(&placed, &ChartOptions::from(args))?)
}

fn size(s: &Session, planets: &str) -> Result<Vec<String>> {
    let planets = bodies::parse_list(planets);
    bodies::check_supported(&planets, Scope::Planets)?;
    planets
        .iter()
        .map(|name| {
            let radius = bodies::radius_km(name).with_context(|| format!("no radius for {name}"))?;
            let o = s.table.observe(name, s.now)?;
            Ok(format!("{:.6}", angular_diameter_arcsec(radius, o.distance_km)))
        })
        .collect()
}

fn find_elongation(s: &Session, a: &str, b: &str) -> Result<Vec<String>> {
    let (a, b) = (a.trim().to_lowercase(), b.trim().to_lowercase());
    let horizon = days_after(s.now, ELONGATION_SEARCH_DAYS)?;
    if horizon > s.table.end() {
        warn(s.quiet, format!("search stops at the end of the ephemeris, {}", s.table.end()));
    }
    let found = astro::greatest_elongations(&s.table, &a, &b, s.now, ELONGATION_SEARCH_DAYS, ELONGATION_STEP_DAYS)?;
    if found.is_empty() {
        warn(s.quiet, "no elongation maximum in the searched range");
    }
    Ok(found
        .iter()
        .map(|e| {
            format!(
                "{}  {:4.1}° {} elongation",
                e.time.format("%Y-%m-%d %H:%M:%S UTC"),
                e.degrees,
                e.direction.as_str()
            )
        })
        .collect())
}

fn plot_width(requested: Option<usize>) -> usize {
    requested.unwrap_or_else(|| {
        let cols = crossterm::terminal::size().map(|(c, _)| c as usize).unwrap_or(80);
        // leave room for the y-axis labels
        cols.saturating_sub(12).max(10)
    })
}

fn planet_names() -> Vec<String> {
    PLANET_RADII.iter().map(|(n, _)| n.to_string()).collect()
}

fn run_command(cli: &Cli) -> Result<String> {
    // listing names is the one command that needs no ephemeris
    if let Command::Planets = cli.command {
        return Ok(planet_names().join("\n"));
    }
    let s = Session::open(cli)?;
    Ok(execute(&s, &cli.command)?.join("\n"))
}

fn execute(s: &Session, command: &Command) -> Result<Vec<String>> {
    let lines = match command {
        Command::Planets => planet_names(),
        Command::When { planets, events } => when(s, planets, events)?,
        Command::Place { planets, chart } => vec![place(s, planets, chart)?],
        Command::Size { planets } => size(s, planets)?,
        Command::FindElongation { planeta, planetb } => find_elongation(s, planeta, planetb)?,
        Command::Chart {
            chart: ChartKind::Elongation,
            planeta,
            planetb,
            days,
            step,
            width,
            height,
        } => {
            let (a, b) = (planeta.trim().to_lowercase(), planetb.trim().to_lowercase());
            let end = days_after(s.now, *days as i64)?;
            if end > s.table.end() {
                warn(s.quiet, format!("chart stops at the end of the ephemeris, {}", s.table.end()));
            }
            let series = astro::elongation_series(&s.table, &a, &b, s.now, end, Duration::hours(*step as i64))?;
            let values: Vec<f64> = series.iter().map(|&(_, v)| v).collect();
            let title = format!("Distance between {a} and {b} as viewed from earth.");
            vec![plot::line_chart(&values, plot_width(*width), *height, &title, "°")]
        }
    };
    Ok(lines)
}

pub(crate) fn run() -> Result<()> {
    let cli = Cli::parse();
    let out = run_command(&cli)?;
    if out.is_empty() {
        return Ok(());
    }
    println!("{out}");
    Ok(())
}
