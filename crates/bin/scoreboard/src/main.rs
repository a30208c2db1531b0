//! # scoreboard — live scoreboard demo
//!
//! Composition root that wires all adapters together and runs the demo loop.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialize logging
//! - Open the `SQLite` store and run migrations
//! - Construct repository implementations (adapters)
//! - Construct application services, injecting repositories via port traits
//! - Print every live delivery and refresh the demo data on an interval
//! - Stop after the configured number of rounds or on Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod render;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

use scoreboard_adapter_random::RandomDataGenerator;
use scoreboard_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqlitePlayerRepository, SqliteTeamRepository,
};
use scoreboard_app::change_bus::InProcessChangeBus;
use scoreboard_app::ports::{ChangeSubscriber, PlayerRepository, TeamRepository};
use scoreboard_app::services::player_service::PlayerService;
use scoreboard_app::services::team_service::TeamService;
use scoreboard_domain::player::Player;

use crate::config::{Config, DemoConfig};

const CHANGE_BUS_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging.filter);

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
        erase_on_schema_change: config.database.erase_on_schema_change,
    }
    .build()
    .await
    .context("failed to open the database")?;
    let db = Arc::new(db);
    let report = db.migration_report();
    tracing::info!(
        applied = report.applied.len(),
        erased = report.erased,
        url = config.database_url(),
        "database ready"
    );

    // Change feed
    let bus = Arc::new(InProcessChangeBus::new(CHANGE_BUS_CAPACITY));

    // Demo data
    let generator = config
        .demo
        .seed
        .map_or_else(RandomDataGenerator::default, RandomDataGenerator::seeded)
        .with_player_names(config.demo.player_names.clone().unwrap_or_default())
        .with_team_names(config.demo.team_names.clone().unwrap_or_default());

    // Services
    let players = PlayerService::new(
        SqlitePlayerRepository::new(Arc::clone(&db), Arc::clone(&bus)),
        Arc::clone(&bus),
        generator,
    );
    let teams = TeamService::new(SqliteTeamRepository::new(db, Arc::clone(&bus)), bus);

    players
        .create_if_empty()
        .await
        .context("failed to seed demo players")?;

    run(&config.demo, &players, &teams).await
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?}: {err}");
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run<PR, TR, S>(
    demo: &DemoConfig,
    players: &PlayerService<PR, S, RandomDataGenerator>,
    teams: &TeamService<TR, S>,
) -> anyhow::Result<()>
where
    PR: PlayerRepository + Send + Sync + 'static,
    TR: TeamRepository + Send + Sync + 'static,
    S: ChangeSubscriber,
{
    let mut live = players.observe_players(demo.ordering);
    let mut ticker = tokio::time::interval(Duration::from_secs(demo.refresh_interval_secs));
    // the first tick completes immediately
    ticker.tick().await;
    let mut rounds = 0;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            delivery = live.next() => match delivery {
                Some(Ok(current)) => print_delivery(demo, teams, &current).await?,
                Some(Err(err)) => anyhow::bail!("live query failed: {err}"),
                None => break,
            },
            _ = ticker.tick() => {
                if demo.rounds != 0 && rounds >= demo.rounds {
                    tracing::info!(rounds, "demo finished");
                    break;
                }
                players.refresh().await.context("failed to refresh demo players")?;
                rounds += 1;
            },
            _ = &mut shutdown => {
                tracing::info!("interrupted, shutting down");
                break;
            },
        }
    }
    Ok(())
}

async fn print_delivery<TR, S>(
    demo: &DemoConfig,
    teams: &TeamService<TR, S>,
    players: &[Player],
) -> anyhow::Result<()>
where
    TR: TeamRepository + Send + Sync + 'static,
    S: ChangeSubscriber,
{
    let all_teams = teams.list_teams().await.context("failed to read teams")?;
    if demo.json {
        println!(
            "{}",
            render::json_line(demo.ordering, players, &all_teams)?
        );
    } else {
        println!("{}", render::table(demo.ordering, players, &all_teams));
    }
    Ok(())
}
