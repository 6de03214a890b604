mod config;
mod populate;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use realmkeep_common::{GameClock, ManualClock, ObjectId, RealmId, ZoneCoord};
use realmkeep_kernel::NoHooks;
use realmkeep_sweep::{DriverSummary, ShutdownSignal, SweepDriver};
use realmkeep_tools::{WorldInspector, WorldSummary};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ShardConfig;
use crate::populate::{Population, SimHooks, populate};

#[derive(Parser)]
#[command(name = "realmkeep", about = "CLI tool for realmkeep shard operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Shard config (YAML); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, crate info and the resolved shard layout
    Info,
    /// Populate a random world and run the background decay sweep against a fast game clock
    Simulate {
        /// Number of items to scatter
        #[arg(short, long, default_value = "2000")]
        items: usize,
        /// RNG seed for the population and the script outcomes
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Stop once the game clock reaches this many seconds
        #[arg(long, default_value = "3600")]
        game_secs: u64,
        /// Game seconds that pass per clock tick
        #[arg(long, default_value = "60")]
        secs_per_tick: u64,
        /// Wall milliseconds between clock ticks
        #[arg(long, default_value = "10")]
        tick_ms: u64,
        /// Override the sweep period from the config
        #[arg(long)]
        period_ms: Option<u64>,
        /// Fraction of destroy scripts that refuse
        #[arg(long, default_value = "0.1")]
        script_refusal: f64,
        /// Object types the decay policy always refuses (repeatable)
        #[arg(long, value_parser = parse_objtype)]
        protect: Vec<u32>,
    },
    /// Populate a random world, optionally sweep it, and audit every zone
    Check {
        #[arg(short, long, default_value = "2000")]
        items: usize,
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Run a full decay sweep at this game time before checking
        #[arg(long)]
        sweep_at: Option<u64>,
    },
    /// Populate a random world and inspect it
    Inspect {
        #[arg(short, long, default_value = "2000")]
        items: usize,
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Object serial (decimal or 0x-prefixed hex)
        #[arg(long, value_parser = parse_serial)]
        object: Option<ObjectId>,
        /// Zone as realm:x:y
        #[arg(long, value_parser = parse_zone)]
        zone: Option<(RealmId, ZoneCoord)>,
        /// How many upcoming decay entries to list
        #[arg(long, default_value = "10")]
        upcoming: usize,
    },
}

#[derive(Serialize)]
struct SimulationOutput {
    population: Population,
    driver: DriverSummary,
    policy_refusals: u64,
    scripts_run: u64,
    integrity_issues: usize,
    world: WorldSummary,
}

fn parse_number(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{s}': {e}"))
}

fn parse_serial(s: &str) -> Result<ObjectId, String> {
    parse_number(s).map(ObjectId)
}

fn parse_objtype(s: &str) -> Result<u32, String> {
    parse_number(s)
}

fn parse_zone(s: &str) -> Result<(RealmId, ZoneCoord), String> {
    let parts: Vec<&str> = s.split(':').collect();
    let [realm, x, y] = parts.as_slice() else {
        return Err(format!("expected realm:x:y, got '{s}'"));
    };
    let number = |v: &str| v.parse::<u32>().map_err(|e| format!("invalid zone '{s}': {e}"));
    let realm = realm
        .parse::<u16>()
        .map_err(|e| format!("invalid realm in '{s}': {e}"))?;
    Ok((RealmId(realm), ZoneCoord::new(number(*x)?, number(*y)?)))
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ShardConfig> {
    match path {
        Some(path) => {
            let config = ShardConfig::load(path)?;
            info!(path = %path.display(), realms = config.realms.len(), "config loaded");
            Ok(config)
        }
        None => Ok(ShardConfig::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            let world = config.build_world()?;
            println!("realmkeep v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: {}", realmkeep_kernel::crate_info());
            println!("zone: {}", realmkeep_zone::crate_info());
            println!("decay: {}", realmkeep_decay::crate_info());
            println!("sweep: {}", realmkeep_sweep::crate_info());
            println!("tools: {}", realmkeep_tools::crate_info());
            for realm in world.realms() {
                println!("{}", WorldInspector::realm_summary(realm));
            }
            println!(
                "driver: period={}ms zone_budget={}ms cooldown={}s descriptors={}",
                config.driver.sweep_period_ms,
                config.driver.zone_budget(world.zone_count()).as_millis(),
                config.decay.cooldown_secs,
                world.descriptors().len()
            );
        }
        Commands::Simulate {
            items,
            seed,
            game_secs,
            secs_per_tick,
            tick_ms,
            period_ms,
            script_refusal,
            protect,
        } => {
            let mut world = config.build_world()?;
            let population = populate(&mut world, seed, items, 0, game_secs)
                .context("failed to populate world")?;

            let mut driver_config = config.driver.clone();
            if let Some(period_ms) = period_ms {
                driver_config.sweep_period_ms = period_ms;
            }
            let driver = SweepDriver::new(driver_config, &world)?;
            let world = Arc::new(Mutex::new(world));
            let clock = Arc::new(ManualClock::new(0));
            let shutdown = ShutdownSignal::new();

            let ctrl_c = shutdown.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                warn!("received SIGINT, shutting down...");
                ctrl_c.trigger();
            });

            let ticker = {
                let clock = Arc::clone(&clock);
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));
                    while !shutdown.is_triggered() {
                        interval.tick().await;
                        clock.advance(secs_per_tick);
                        if clock.now() >= game_secs {
                            info!(now = clock.now(), "simulation horizon reached");
                            shutdown.trigger();
                        }
                    }
                })
            };

            let mut hooks = SimHooks::new(seed, protect, script_refusal);
            let summary = driver
                .run(Arc::clone(&world), clock, &mut hooks, shutdown.clone())
                .await;
            shutdown.trigger();
            ticker.await.ok();
            let summary = summary?;

            let world = world.lock();
            let integrity = world.integrity_check();
            let output = SimulationOutput {
                population,
                driver: summary,
                policy_refusals: hooks.refused,
                scripts_run: hooks.scripts_run,
                integrity_issues: integrity.issues.len(),
                world: WorldInspector::summary(&world),
            };
            if cli.json {
                print_json(&output)?;
            } else {
                println!(
                    "Populated: items={} structures={} contained={} npcs={} players={} scheduled={}",
                    population.items,
                    population.structures,
                    population.contained,
                    population.npcs,
                    population.players,
                    population.scheduled
                );
                println!(
                    "Driver: steps={} cycles={} destroyed={} violations={}",
                    summary.steps, summary.cycles, summary.destroyed, summary.violations
                );
                println!(
                    "Policy: refused={} scripts_run={}",
                    output.policy_refusals, output.scripts_run
                );
                println!("Statistics: {}", world.decay_statistics());
                println!("{integrity}");
                println!("{}", output.world);
            }
        }
        Commands::Check {
            items,
            seed,
            sweep_at,
        } => {
            let mut world = config.build_world()?;
            populate(&mut world, seed, items, 0, 3600).context("failed to populate world")?;
            if let Some(now) = sweep_at {
                let report = world.sweep(now, &mut NoHooks);
                info!(
                    now,
                    destroyed = report.destroyed,
                    delayed = report.delayed,
                    "sweep before check"
                );
            }
            let report = world.integrity_check();
            if cli.json {
                let issues: Vec<String> = report.issues.iter().map(ToString::to_string).collect();
                print_json(&serde_json::json!({
                    "zones_checked": report.zones_checked,
                    "handles_checked": report.handles_checked,
                    "issues": issues,
                }))?;
            } else {
                println!("{report}");
                for issue in &report.issues {
                    println!("  {issue}");
                }
            }
            if !report.is_ok() {
                bail!("{} integrity issue(s) found", report.issues.len());
            }
        }
        Commands::Inspect {
            items,
            seed,
            object,
            zone,
            upcoming,
        } => {
            let mut world = config.build_world()?;
            populate(&mut world, seed, items, 0, 3600).context("failed to populate world")?;
            let summary = WorldInspector::summary(&world);
            let object_info = object.map(|id| WorldInspector::inspect_object(&world, id));
            let zone_info =
                zone.map(|(realm, coord)| WorldInspector::inspect_zone(&world, realm, coord));
            let decay = WorldInspector::upcoming_decay(&world, upcoming);

            if cli.json {
                print_json(&serde_json::json!({
                    "summary": summary,
                    "object": object_info,
                    "zone": zone_info,
                    "upcoming_decay": decay,
                }))?;
            } else {
                println!("{summary}");
                match (object, object_info) {
                    (Some(_), Some(Some(info))) => println!("{info}"),
                    (Some(id), _) => println!("Object {id} not found"),
                    _ => {}
                }
                match (zone, zone_info) {
                    (Some((realm, coord)), Some(Some(info))) => println!(
                        "Zone {realm}:{coord}: items={} structures={} players={} npcs={}",
                        info.items.len(),
                        info.structures.len(),
                        info.players.len(),
                        info.npcs.len()
                    ),
                    (Some((realm, coord)), _) => println!("Zone {realm}:{coord} does not exist"),
                    _ => {}
                }
                for (time, id) in decay {
                    println!("  decay at {time}: {id}");
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serials_accept_hex_and_decimal() {
        assert_eq!(parse_serial("0x40000001"), Ok(ObjectId(0x4000_0001)));
        assert_eq!(parse_serial("17"), Ok(ObjectId(17)));
        assert!(parse_serial("0xZZ").is_err());
        assert_eq!(parse_objtype("0x2006"), Ok(0x2006));
    }

    #[test]
    fn zones_parse_realm_and_coords() {
        assert_eq!(
            parse_zone("1:4:7"),
            Ok((RealmId(1), ZoneCoord::new(4, 7)))
        );
        assert!(parse_zone("1:4").is_err());
        assert!(parse_zone("a:1:2").is_err());
    }

    #[test]
    fn cli_parses_simulate_flags() {
        let cli = Cli::try_parse_from([
            "realmkeep",
            "--json",
            "simulate",
            "--items",
            "50",
            "--period-ms",
            "100",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Simulate {
                items: 50,
                period_ms: Some(100),
                ..
            }
        ));
    }
}
