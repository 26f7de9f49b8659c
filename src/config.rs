use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use crate::model::{seasons, Season};

/// Upstream resource types, each with its own courtesy delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    PlayerStats,
    PlayerInfo,
    GameLog,
    ShotChart,
    TeamRoster,
    TeamStats,
}

/// Pause inserted after each upstream call.
#[derive(Debug, Clone)]
pub struct Delays {
    pub player_stats: Duration,
    pub player_info: Duration,
    pub game_log: Duration,
    pub shot_chart: Duration,
    pub team_roster: Duration,
    pub team_stats: Duration,
}

impl Delays {
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            player_stats: Duration::ZERO,
            player_info: Duration::ZERO,
            game_log: Duration::ZERO,
            shot_chart: Duration::ZERO,
            team_roster: Duration::ZERO,
            team_stats: Duration::ZERO,
        }
    }

    pub fn for_kind(&self, kind: ResourceKind) -> Duration {
        match kind {
            ResourceKind::PlayerStats => self.player_stats,
            ResourceKind::PlayerInfo => self.player_info,
            ResourceKind::GameLog => self.game_log,
            ResourceKind::ShotChart => self.shot_chart,
            ResourceKind::TeamRoster => self.team_roster,
            ResourceKind::TeamStats => self.team_stats,
        }
    }
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            player_stats: Duration::from_millis(500),
            player_info: Duration::from_millis(200),
            game_log: Duration::from_millis(1500),
            shot_chart: Duration::from_millis(1500),
            team_roster: Duration::from_millis(600),
            team_stats: Duration::from_millis(1000),
        }
    }
}

/// Configuration for a collection run
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Root URL of the stats API
    pub base_url: String,

    /// Directory all output files are written to
    pub data_dir: PathBuf,

    /// First season's starting year
    pub start_year: i32,

    /// Starting year of the first season NOT processed
    pub end_year: i32,

    pub delays: Delays,

    /// Only the per-player info call carries a timeout
    pub player_info_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://stats.nba.com/stats".to_string(),
            data_dir: PathBuf::from("data"),
            start_year: 2003,
            end_year: 2025,
            delays: Delays::default(),
            player_info_timeout: Duration::from_secs(5),
        }
    }
}

impl FetchConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("NBA_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(url) = std::env::var("NBA_STATS_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(year) = std::env::var("NBA_START_YEAR") {
            config.start_year = year
                .parse()
                .with_context(|| format!("NBA_START_YEAR is not a year: {year:?}"))?;
        }

        if let Ok(year) = std::env::var("NBA_END_YEAR") {
            config.end_year = year
                .parse()
                .with_context(|| format!("NBA_END_YEAR is not a year: {year:?}"))?;
        }

        if let Ok(secs) = std::env::var("NBA_PLAYER_INFO_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("NBA_PLAYER_INFO_TIMEOUT_SECS is not a number: {secs:?}"))?;
            config.player_info_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn seasons(&self) -> Vec<Season> {
        seasons(self.start_year, self.end_year)
    }

    pub fn player_ids_path(&self) -> PathBuf {
        self.data_dir.join("player_ids.json")
    }

    pub fn players_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("players_{}_{}.json", self.start_year, self.end_year))
    }

    pub fn winners_path(&self, season: &Season) -> PathBuf {
        self.data_dir.join(format!("{season}_winners.json"))
    }

    pub fn team_stats_path(&self, season: &Season) -> PathBuf {
        self.data_dir.join(format!("{season}_team_stats.json"))
    }

    pub fn shots_path(&self, label: &str) -> PathBuf {
        self.data_dir.join(format!("shots_{label}.csv"))
    }

    pub async fn pause(&self, kind: ResourceKind) {
        let delay = self.delays.for_kind(kind);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_paths() {
        let config = FetchConfig::default();
        let season = Season::new(2023);

        assert_eq!(config.players_path(), PathBuf::from("data/players_2003_2025.json"));
        assert_eq!(config.winners_path(&season), PathBuf::from("data/2023-24_winners.json"));
        assert_eq!(config.shots_path("2023-24"), PathBuf::from("data/shots_2023-24.csv"));
        assert_eq!(config.seasons().len(), 22);
    }

    #[test]
    fn delays_depend_on_resource() {
        let delays = Delays::default();
        assert!(delays.for_kind(ResourceKind::GameLog) > delays.for_kind(ResourceKind::PlayerInfo));
        assert!(Delays::none().for_kind(ResourceKind::ShotChart).is_zero());
    }
}
