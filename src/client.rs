use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::model::{Season, TabularResult};

const SEASON_TYPE: &str = "Regular Season";

/// What a shot chart request covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShotScope {
    Season(Season),
    Game { season: Season, game_id: String },
}

impl ShotScope {
    pub fn season(&self) -> Season {
        match self {
            ShotScope::Season(season) => *season,
            ShotScope::Game { season, .. } => *season,
        }
    }

    /// Output file label: the season, or the game id for single-game scopes.
    pub fn label(&self) -> String {
        match self {
            ShotScope::Season(season) => season.to_string(),
            ShotScope::Game { game_id, .. } => game_id.clone(),
        }
    }
}

/// The upstream statistics service. One call per method, each answering with
/// the one result set it is named after.
pub(crate) trait StatsSource {
    async fn fetch_player_stats(&self, season: &Season) -> Result<TabularResult, FetchError>;

    async fn fetch_player_info(&self, player_id: i64) -> Result<TabularResult, FetchError>;

    async fn fetch_game_log(&self, season: &Season) -> Result<TabularResult, FetchError>;

    async fn fetch_shot_chart(&self, scope: &ShotScope) -> Result<TabularResult, FetchError>;

    async fn fetch_team_roster(&self, season: &Season, team_id: i64) -> Result<TabularResult, FetchError>;

    async fn fetch_team_stats(&self, season: &Season) -> Result<TabularResult, FetchError>;
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(rename = "resultSets", default)]
    result_sets: Vec<TabularResult>,
    #[serde(rename = "resultSet", default)]
    result_set: Option<TabularResult>,
}

impl StatsResponse {
    fn take(self, endpoint: &str, name: &str) -> Result<TabularResult, FetchError> {
        self.result_sets
            .into_iter()
            .chain(self.result_set)
            .find(|set| set.name == name)
            .ok_or_else(|| FetchError::MissingResultSet {
                endpoint: endpoint.to_string(),
                name: name.to_string(),
            })
    }
}

/// HTTP client for stats.nba.com
pub struct NbaStatsClient {
    client: Client,
    base_url: String,
    player_info_timeout: Duration,
}

impl NbaStatsClient {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
            ),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.nba.com/"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://www.nba.com"));
        headers.insert("x-nba-stats-origin", HeaderValue::from_static("stats"));
        headers.insert("x-nba-stats-token", HeaderValue::from_static("true"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|source| FetchError::Transport {
                endpoint: "client".to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            player_info_timeout: config.player_info_timeout,
        })
    }

    async fn get(
        &self,
        endpoint: &str,
        result_set: &str,
        params: &[(&str, String)],
        timeout: Option<Duration>,
    ) -> Result<TabularResult, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("GET {} {:?}", url, params);

        let transport = |source| FetchError::Transport {
            endpoint: endpoint.to_string(),
            source,
        };

        let mut request = self.client.get(&url).query(params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(transport)?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                endpoint: endpoint.to_string(),
                status: response.status(),
            });
        }

        let body: StatsResponse = response.json().await.map_err(transport)?;
        body.take(endpoint, result_set)
    }
}

fn params(defaults: &[(&'static str, &'static str)], overrides: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
    let mut params: Vec<(&'static str, String)> = defaults
        .iter()
        .map(|(key, value)| (*key, value.to_string()))
        .collect();

    for (key, value) in overrides {
        match params.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value.clone(),
            None => params.push((*key, value.clone())),
        }
    }

    params
}

const DASH_DEFAULTS: &[(&str, &str)] = &[
    ("Conference", ""),
    ("DateFrom", ""),
    ("DateTo", ""),
    ("Division", ""),
    ("GameScope", ""),
    ("GameSegment", ""),
    ("LastNGames", "0"),
    ("LeagueID", "00"),
    ("Location", ""),
    ("MeasureType", "Base"),
    ("Month", "0"),
    ("OpponentTeamID", "0"),
    ("Outcome", ""),
    ("PORound", "0"),
    ("PaceAdjust", "N"),
    ("PerMode", "PerGame"),
    ("Period", "0"),
    ("PlayerExperience", ""),
    ("PlayerPosition", ""),
    ("PlusMinus", "N"),
    ("Rank", "N"),
    ("SeasonSegment", ""),
    ("SeasonType", SEASON_TYPE),
    ("ShotClockRange", ""),
    ("StarterBench", ""),
    ("TeamID", "0"),
    ("TwoWay", "0"),
    ("VsConference", ""),
    ("VsDivision", ""),
];

const PLAYER_DASH_EXTRA: &[(&str, &str)] = &[
    ("College", ""),
    ("Country", ""),
    ("DraftPick", ""),
    ("DraftYear", ""),
    ("Height", ""),
    ("Weight", ""),
];

const GAME_LOG_DEFAULTS: &[(&str, &str)] = &[
    ("Counter", "0"),
    ("DateFrom", ""),
    ("DateTo", ""),
    ("Direction", "ASC"),
    ("LeagueID", "00"),
    ("PlayerOrTeam", "T"),
    ("SeasonType", SEASON_TYPE),
    ("Sorter", "DATE"),
];

const SHOT_CHART_DEFAULTS: &[(&str, &str)] = &[
    ("AheadBehind", ""),
    ("ClutchTime", ""),
    ("ContextFilter", ""),
    ("ContextMeasure", "FGA"),
    ("DateFrom", ""),
    ("DateTo", ""),
    ("EndPeriod", ""),
    ("EndRange", ""),
    ("GameID", ""),
    ("GameSegment", ""),
    ("LastNGames", "0"),
    ("LeagueID", "00"),
    ("Location", ""),
    ("Month", "0"),
    ("OpponentTeamID", "0"),
    ("Outcome", ""),
    ("Period", "0"),
    ("PlayerID", "0"),
    ("PlayerPosition", ""),
    ("PointDiff", ""),
    ("Position", ""),
    ("RangeType", ""),
    ("RookieYear", ""),
    ("SeasonSegment", ""),
    ("SeasonType", SEASON_TYPE),
    ("StartPeriod", ""),
    ("StartRange", ""),
    ("TeamID", "0"),
    ("VsConference", ""),
    ("VsDivision", ""),
];

impl StatsSource for NbaStatsClient {
    async fn fetch_player_stats(&self, season: &Season) -> Result<TabularResult, FetchError> {
        let mut defaults = DASH_DEFAULTS.to_vec();
        defaults.extend_from_slice(PLAYER_DASH_EXTRA);
        let params = params(&defaults, &[("Season", season.to_string())]);
        self.get("leaguedashplayerstats", "LeagueDashPlayerStats", &params, None)
            .await
    }

    async fn fetch_player_info(&self, player_id: i64) -> Result<TabularResult, FetchError> {
        let params = params(
            &[("LeagueID", "")],
            &[("PlayerID", player_id.to_string())],
        );
        self.get(
            "commonplayerinfo",
            "CommonPlayerInfo",
            &params,
            Some(self.player_info_timeout),
        )
        .await
    }

    async fn fetch_game_log(&self, season: &Season) -> Result<TabularResult, FetchError> {
        let params = params(GAME_LOG_DEFAULTS, &[("Season", season.to_string())]);
        self.get("leaguegamelog", "LeagueGameLog", &params, None).await
    }

    async fn fetch_shot_chart(&self, scope: &ShotScope) -> Result<TabularResult, FetchError> {
        let mut overrides = vec![("Season", scope.season().to_string())];
        if let ShotScope::Game { game_id, .. } = scope {
            overrides.push(("GameID", game_id.clone()));
        }
        let params = params(SHOT_CHART_DEFAULTS, &overrides);
        self.get("shotchartdetail", "Shot_Chart_Detail", &params, None)
            .await
    }

    async fn fetch_team_roster(&self, season: &Season, team_id: i64) -> Result<TabularResult, FetchError> {
        let params = params(
            &[("LeagueID", "00")],
            &[("Season", season.to_string()), ("TeamID", team_id.to_string())],
        );
        self.get("commonteamroster", "CommonTeamRoster", &params, None)
            .await
    }

    async fn fetch_team_stats(&self, season: &Season) -> Result<TabularResult, FetchError> {
        let params = params(DASH_DEFAULTS, &[("Season", season.to_string())]);
        self.get("leaguedashteamstats", "LeagueDashTeamStats", &params, None)
            .await
    }
}
