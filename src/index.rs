use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::warn;

use crate::client::StatsSource;
use crate::config::{FetchConfig, ResourceKind};
use crate::error::FetchError;
use crate::model::{Record, Season, TabularResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamInfo {
    pub id: i64,
    pub name: String,
    pub abbreviation: String,
}

impl TeamInfo {
    pub fn from_record(record: &Record) -> Result<Self, FetchError> {
        Ok(Self {
            id: record.int("TEAM_ID")?,
            name: record.text("TEAM_NAME")?,
            abbreviation: record.text("TEAM_ABBREVIATION")?,
        })
    }
}

/// Both team rows of one game log entry.
#[derive(Debug, Clone)]
pub struct GameEntry {
    pub home: Record,
    pub away: Record,
}

impl GameEntry {
    pub fn home_team(&self) -> Result<TeamInfo, FetchError> {
        TeamInfo::from_record(&self.home)
    }

    pub fn away_team(&self) -> Result<TeamInfo, FetchError> {
        TeamInfo::from_record(&self.away)
    }

    pub fn date(&self) -> Result<String, FetchError> {
        self.home.text("GAME_DATE")
    }

    /// The higher-scoring row. `None` on a tie.
    pub fn winner(&self) -> Result<Option<&Record>, FetchError> {
        let home = self.home.float("PTS")?;
        let away = self.away.float("PTS")?;

        Ok(if home > away {
            Some(&self.home)
        } else if away > home {
            Some(&self.away)
        } else {
            None
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyKind {
    /// Anything other than exactly two team rows.
    TeamRowCount(usize),
    /// Two rows, but the matchups don't name exactly one home side.
    HomeAwayUnresolved,
}

/// A game left out of the index. These are reported, never repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameAnomaly {
    pub game_id: String,
    pub kind: AnomalyKind,
}

impl fmt::Display for GameAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AnomalyKind::TeamRowCount(rows) => {
                write!(f, "game {} has {} team rows, expected 2", self.game_id, rows)
            }
            AnomalyKind::HomeAwayUnresolved => {
                write!(f, "game {} has no single home team row", self.game_id)
            }
        }
    }
}

fn is_home_row(record: &Record) -> Result<bool, FetchError> {
    Ok(record.text("MATCHUP")?.contains(" vs. "))
}

/// Game id to (home, away), built from one season's team game log.
#[derive(Debug, Clone, Default)]
pub struct GameIndex {
    games: BTreeMap<String, GameEntry>,
    anomalies: Vec<GameAnomaly>,
}

impl GameIndex {
    pub fn from_game_log(table: &TabularResult) -> Result<Self, FetchError> {
        let mut grouped: BTreeMap<String, Vec<Record>> = BTreeMap::new();
        for record in table.records() {
            let record = record?;
            grouped
                .entry(record.text("GAME_ID")?)
                .or_default()
                .push(record);
        }

        let mut index = GameIndex::default();
        for (game_id, rows) in grouped {
            let [first, second]: [Record; 2] = match rows.try_into() {
                Ok(pair) => pair,
                Err(rows) => {
                    index.report(game_id, AnomalyKind::TeamRowCount(rows.len()));
                    continue;
                }
            };

            let entry = match (is_home_row(&first)?, is_home_row(&second)?) {
                (true, false) => GameEntry { home: first, away: second },
                (false, true) => GameEntry { home: second, away: first },
                _ => {
                    index.report(game_id, AnomalyKind::HomeAwayUnresolved);
                    continue;
                }
            };
            index.games.insert(game_id, entry);
        }

        Ok(index)
    }

    fn report(&mut self, game_id: String, kind: AnomalyKind) {
        let anomaly = GameAnomaly { game_id, kind };
        warn!("Skipping {}", anomaly);
        self.anomalies.push(anomaly);
    }

    pub fn get(&self, game_id: &str) -> Result<&GameEntry, FetchError> {
        self.games
            .get(game_id)
            .ok_or_else(|| FetchError::MissingGame(game_id.to_string()))
    }

    pub fn games(&self) -> impl Iterator<Item = (&String, &GameEntry)> {
        self.games.iter()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn anomalies(&self) -> &[GameAnomaly] {
        &self.anomalies
    }

    /// Every team that appears in an indexed game, by id.
    pub fn teams(&self) -> Result<BTreeMap<i64, TeamInfo>, FetchError> {
        let mut teams = BTreeMap::new();
        for entry in self.games.values() {
            for team in [entry.home_team()?, entry.away_team()?] {
                teams.entry(team.id).or_insert(team);
            }
        }
        Ok(teams)
    }
}

/// Player id to roster row for one season.
#[derive(Debug, Clone, Default)]
pub struct RosterIndex {
    players: HashMap<i64, Record>,
}

impl RosterIndex {
    pub fn from_roster(table: &TabularResult) -> Result<Self, FetchError> {
        let mut players = HashMap::new();
        for record in table.records() {
            let record = record?;
            players.insert(record.int("PLAYER_ID")?, record);
        }
        Ok(Self { players })
    }

    pub fn merge(&mut self, other: &RosterIndex) {
        for (id, record) in &other.players {
            self.players.entry(*id).or_insert_with(|| record.clone());
        }
    }

    pub fn get(&self, player_id: i64) -> Result<&Record, FetchError> {
        self.players
            .get(&player_id)
            .ok_or(FetchError::MissingPlayer(player_id))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }
}

/// Rosters fetched during one run, keyed by season and team. Each key is
/// fetched at most once.
#[derive(Debug, Default)]
pub struct RosterMemo {
    rosters: HashMap<(Season, i64), RosterIndex>,
}

impl RosterMemo {
    pub(crate) async fn roster<S: StatsSource>(
        &mut self,
        source: &S,
        config: &FetchConfig,
        season: Season,
        team_id: i64,
    ) -> Result<&RosterIndex, FetchError> {
        let key = (season, team_id);
        if !self.rosters.contains_key(&key) {
            let result = source.fetch_team_roster(&season, team_id).await;
            config.pause(ResourceKind::TeamRoster).await;
            self.rosters.insert(key, RosterIndex::from_roster(&result?)?);
        }
        Ok(&self.rosters[&key])
    }
}
