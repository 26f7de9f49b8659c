use std::collections::{BTreeMap, BTreeSet};

use anyhow::{anyhow, Context};
use indicatif::{ProgressIterator, ProgressStyle};
use tracing::{error, info, warn};

use crate::client::{ShotScope, StatsSource};
use crate::config::{FetchConfig, ResourceKind};
use crate::error::FetchError;
use crate::index::{GameIndex, RosterIndex, RosterMemo};
use crate::join::ShotJoin;
use crate::model::{PlayerInfo, Record, Season, ShotRecord, TabularResult};
use crate::sink::{read_json, write_json, write_shots_csv, JsonSink};

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template("{wide_bar} {pos}/{len} | elapsed: {elapsed_precise}, eta: {eta_precise}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn skip_season(what: &str, season: &Season, e: &FetchError) {
    if e.is_transport() {
        error!("Failed to fetch {} for {}, skipping season: {}", what, season, e);
    } else {
        error!("Unusable {} for {}, skipping season: {}", what, season, e);
    }
}

fn all_records(table: &TabularResult) -> Result<Vec<Record>, FetchError> {
    table.records().collect()
}

/// Every player id that appears in any season's player stats, cached in
/// `player_ids.json`. A non-empty cache is used as is.
pub(crate) async fn gather_player_ids<S: StatsSource>(
    source: &S,
    config: &FetchConfig,
) -> anyhow::Result<BTreeSet<i64>> {
    let path = config.player_ids_path();
    let cached: Vec<i64> = read_json(&path)?.unwrap_or_default();
    if !cached.is_empty() {
        info!("Using saved player ids from {} ({} players)", path.display(), cached.len());
        return Ok(cached.into_iter().collect());
    }

    info!("Gathering player ids from the API");
    let mut player_ids = BTreeSet::new();
    for season in config.seasons() {
        let result = source.fetch_player_stats(&season).await;
        config.pause(ResourceKind::PlayerStats).await;

        let ids = result.and_then(|table| {
            all_records(&table)?
                .iter()
                .map(|record| record.int("PLAYER_ID"))
                .collect::<Result<Vec<_>, _>>()
        });

        match ids {
            Ok(ids) => {
                let count = ids.len();
                player_ids.extend(ids);
                info!("{}: {} players, {} total", season, count, player_ids.len());
            }
            Err(e) => skip_season("player stats", &season, &e),
        }
    }

    write_json(&path, &player_ids).context("saving player ids")?;
    Ok(player_ids)
}

async fn fetch_player<S: StatsSource>(
    source: &S,
    config: &FetchConfig,
    player_id: i64,
) -> Result<PlayerInfo, FetchError> {
    let result = source.fetch_player_info(player_id).await;
    config.pause(ResourceKind::PlayerInfo).await;

    let table = result?;
    let record = table
        .records()
        .next()
        .ok_or(FetchError::MissingPlayer(player_id))??;
    PlayerInfo::from_record(player_id, &record)
}

/// Fetch info for every gathered player not already in the players file.
///
/// The first failed player stops the run; everything fetched so far is
/// saved first, so the next run picks up where this one stopped.
pub(crate) async fn fetch_players<S: StatsSource>(source: &S, config: &FetchConfig) -> anyhow::Result<usize> {
    let player_ids = gather_player_ids(source, config).await?;

    let mut sink: JsonSink<PlayerInfo> = JsonSink::resume(config.players_path())?;
    let fetched = sink.fetched_ids(|player| player.id);
    let remaining: Vec<i64> = player_ids
        .into_iter()
        .filter(|id| !fetched.contains(id))
        .collect();

    if remaining.is_empty() {
        info!("All {} players already saved in {}", sink.records().len(), sink.path().display());
        return Ok(0);
    }

    info!("Fetching info for {} players", remaining.len());
    for player_id in remaining.iter().progress_with_style(progress_style()) {
        match fetch_player(source, config, *player_id).await {
            Ok(player) => sink.push(player),
            Err(e) => {
                error!("Player {} failed: {}; saving progress and stopping", player_id, e);
                sink.checkpoint().context("saving progress")?;
                return Err(anyhow!(e).context(format!("fetching info for player {player_id}")));
            }
        }
    }

    sink.checkpoint().context("saving players")?;
    info!("Saved {} players to {}", sink.records().len(), sink.path().display());
    Ok(remaining.len())
}

async fn season_winners<S: StatsSource>(
    source: &S,
    config: &FetchConfig,
    season: &Season,
) -> Result<BTreeMap<String, String>, FetchError> {
    let result = source.fetch_game_log(season).await;
    config.pause(ResourceKind::GameLog).await;

    let index = GameIndex::from_game_log(&result?)?;
    let mut winners = BTreeMap::new();
    for (game_id, game) in index.games() {
        match game.winner()? {
            Some(record) => {
                winners.insert(game_id.clone(), record.text("TEAM_ABBREVIATION")?);
            }
            None => warn!("Skipping game {}: tied score", game_id),
        }
    }

    Ok(winners)
}

/// `<season>_winners.json` for every season: game id to winning team abbreviation.
pub(crate) async fn collect_winners<S: StatsSource>(source: &S, config: &FetchConfig) -> anyhow::Result<usize> {
    let mut saved = 0;
    for season in config.seasons() {
        info!("Processing season {}", season);
        match season_winners(source, config, &season).await {
            Ok(winners) => {
                let path = config.winners_path(&season);
                write_json(&path, &winners).with_context(|| format!("saving winners for {season}"))?;
                info!("Saved {} games to {}", winners.len(), path.display());
                saved += 1;
            }
            Err(e) => skip_season("game log", &season, &e),
        }
    }
    Ok(saved)
}

/// `<season>_team_stats.json` for every season.
pub(crate) async fn collect_team_stats<S: StatsSource>(source: &S, config: &FetchConfig) -> anyhow::Result<usize> {
    let mut saved = 0;
    for season in config.seasons() {
        let result = source.fetch_team_stats(&season).await;
        config.pause(ResourceKind::TeamStats).await;

        match result.and_then(|table| all_records(&table)) {
            Ok(teams) => {
                let path = config.team_stats_path(&season);
                write_json(&path, &teams).with_context(|| format!("saving team stats for {season}"))?;
                info!("Saved {} teams to {}", teams.len(), path.display());
                saved += 1;
            }
            Err(e) => skip_season("team stats", &season, &e),
        }
    }
    Ok(saved)
}

async fn scope_shots<S: StatsSource>(
    source: &S,
    config: &FetchConfig,
    rosters: &mut RosterMemo,
    scope: &ShotScope,
) -> Result<Vec<ShotRecord>, FetchError> {
    let season = scope.season();

    let result = source.fetch_game_log(&season).await;
    config.pause(ResourceKind::GameLog).await;
    let games = GameIndex::from_game_log(&result?)?;
    info!("{}: {} games indexed, {} skipped", season, games.len(), games.anomalies().len());

    let mut roster = RosterIndex::default();
    for team_id in games.teams()?.keys().progress_with_style(progress_style()) {
        match rosters.roster(source, config, season, *team_id).await {
            Ok(team) => roster.merge(team),
            Err(e) => warn!("No roster for team {} in {}, its players stay unnamed: {}", team_id, season, e),
        }
    }

    let result = source.fetch_shot_chart(scope).await;
    config.pause(ResourceKind::ShotChart).await;
    let chart = result?;

    let join = ShotJoin::new(season, &games, &roster);
    let mut shots = Vec::with_capacity(chart.rows.len());
    for (row, record) in chart.records().enumerate() {
        match record.and_then(|shot| join.join(&shot)) {
            Ok(shot) => shots.push(shot),
            Err(e) => warn!("Skipping shot row {} of {}: {}", row, scope.label(), e),
        }
    }

    info!("{}: {} of {} shots joined ({} players on rosters)", scope.label(), shots.len(), chart.rows.len(), roster.len());
    Ok(shots)
}

/// `shots_<label>.csv` for each scope. A scope whose upstream data can't be
/// fetched is skipped.
pub(crate) async fn collect_shots<S: StatsSource>(
    source: &S,
    config: &FetchConfig,
    scopes: &[ShotScope],
) -> anyhow::Result<usize> {
    let mut rosters = RosterMemo::default();
    let mut saved = 0;

    for scope in scopes {
        match scope_shots(source, config, &mut rosters, scope).await {
            Ok(shots) => {
                let path = config.shots_path(&scope.label());
                write_shots_csv(&path, &shots).with_context(|| format!("saving shots for {}", scope.label()))?;
                info!("Saved {} shots to {}", shots.len(), path.display());
                saved += 1;
            }
            Err(e) => skip_season("shots", &scope.season(), &e),
        }
    }

    Ok(saved)
}
