use anyhow::bail;
use tracing::info;

mod client;
mod config;
mod error;
mod index;
mod join;
mod model;
mod pipeline;
mod sink;

use client::{NbaStatsClient, ShotScope};
use config::FetchConfig;
use model::Season;

const USAGE: &str = "usage: nba-stats-collector <player-ids | players | winners | team-stats | shots [season] [game_id]>";

/// Scopes for the `shots` command: every configured season, one season, or one game.
fn shot_scopes(config: &FetchConfig, args: &[String]) -> anyhow::Result<Vec<ShotScope>> {
    match args {
        [] => Ok(config.seasons().into_iter().map(ShotScope::Season).collect()),
        [label, rest @ ..] => {
            let Some(season) = Season::parse(label) else {
                bail!("{label:?} is not a season label like 2023-24");
            };
            match rest {
                [] => Ok(vec![ShotScope::Season(season)]),
                [game_id] => Ok(vec![ShotScope::Game {
                    season,
                    game_id: game_id.clone(),
                }]),
                _ => bail!("{USAGE}"),
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = FetchConfig::from_env()?;
    let client = NbaStatsClient::new(&config)?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("player-ids") => {
            let ids = pipeline::gather_player_ids(&client, &config).await?;
            info!("{} player ids in {}", ids.len(), config.player_ids_path().display());
        }
        Some("players") => {
            let fetched = pipeline::fetch_players(&client, &config).await?;
            info!("Complete, {} new players saved to {}", fetched, config.players_path().display());
        }
        Some("winners") => {
            let saved = pipeline::collect_winners(&client, &config).await?;
            info!("Saved winners for {} seasons", saved);
        }
        Some("team-stats") => {
            let saved = pipeline::collect_team_stats(&client, &config).await?;
            info!("Saved team stats for {} seasons", saved);
        }
        Some("shots") => {
            let scopes = shot_scopes(&config, &args[1..])?;
            let saved = pipeline::collect_shots(&client, &config, &scopes).await?;
            info!("Saved {} of {} shot files", saved, scopes.len());
        }
        Some(other) => bail!("unknown command {other:?}\n{USAGE}"),
        None => bail!("{USAGE}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn shots_default_to_configured_seasons() {
        let config = FetchConfig {
            start_year: 2021,
            end_year: 2023,
            ..FetchConfig::default()
        };
        let scopes = shot_scopes(&config, &[]).unwrap();
        assert_eq!(
            scopes,
            [ShotScope::Season(Season::new(2021)), ShotScope::Season(Season::new(2022))]
        );
    }

    #[test]
    fn shots_for_one_season_or_game() {
        let config = FetchConfig::default();
        assert_eq!(
            shot_scopes(&config, &args(&["2023-24"])).unwrap(),
            [ShotScope::Season(Season::new(2023))]
        );
        assert_eq!(
            shot_scopes(&config, &args(&["2023-24", "0022300061"])).unwrap(),
            [ShotScope::Game {
                season: Season::new(2023),
                game_id: "0022300061".to_string()
            }]
        );
    }

    #[test]
    fn shots_reject_bad_arguments() {
        let config = FetchConfig::default();
        assert!(shot_scopes(&config, &args(&["2023"])).is_err());
        assert!(shot_scopes(&config, &args(&["2023-24", "a", "b"])).is_err());
    }
}
