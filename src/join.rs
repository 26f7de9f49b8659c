use tracing::debug;

use crate::error::FetchError;
use crate::index::{GameIndex, RosterIndex};
use crate::model::{
    convert_location, position_group, reformat_date, split_zone, strip_game_id, Record, Season,
    ShotRecord,
};

/// Lookups shared by every shot of one season.
pub struct ShotJoin<'a> {
    pub season: Season,
    pub games: &'a GameIndex,
    pub roster: &'a RosterIndex,
}

impl<'a> ShotJoin<'a> {
    pub fn new(season: Season, games: &'a GameIndex, roster: &'a RosterIndex) -> Self {
        Self { season, games, roster }
    }

    /// Flatten one shot chart row into an output record.
    ///
    /// An unknown game, an unparseable game date or a malformed zone area
    /// fails the row. An unknown player only blanks the player columns.
    pub fn join(&self, shot: &Record) -> Result<ShotRecord, FetchError> {
        let game_id = shot.text("GAME_ID")?;
        let game = self.games.get(&game_id)?;
        let home = game.home_team()?;
        let away = game.away_team()?;

        let team_id = shot.int("TEAM_ID")?;
        let team = if team_id == home.id { &home } else { &away };

        let player_id = shot.int("PLAYER_ID")?;
        let (player_name, position) = match self.roster.get(player_id) {
            Ok(player) => (player.text("PLAYER")?, player.text("POSITION")?),
            Err(e) => {
                debug!("{}; leaving name and position empty", e);
                (String::new(), String::new())
            }
        };

        let game_date = reformat_date(&game_id, &game.date()?)?;
        let (zone_name, zone_abb) = split_zone(&shot.text("SHOT_ZONE_AREA")?)?;
        let (loc_x, loc_y) = convert_location(shot.float("LOC_X")?, shot.float("LOC_Y")?);

        Ok(ShotRecord {
            season_1: self.season.end_year(),
            season_2: self.season.to_string(),
            team_id,
            team_name: team.name.clone(),
            player_id,
            player_name,
            position_group: position_group(&position).to_string(),
            position,
            game_date,
            game_id: strip_game_id(&game_id).to_string(),
            home_team: home.abbreviation.clone(),
            away_team: away.abbreviation.clone(),
            event_type: shot.text("EVENT_TYPE")?,
            shot_made: shot.int("SHOT_MADE_FLAG")? == 1,
            action_type: shot.text("ACTION_TYPE")?,
            shot_type: shot.text("SHOT_TYPE")?,
            basic_zone: shot.text("SHOT_ZONE_BASIC")?,
            zone_name,
            zone_abb,
            zone_range: shot.text("SHOT_ZONE_RANGE")?,
            loc_x,
            loc_y,
            shot_distance: shot.int("SHOT_DISTANCE")?,
            quarter: shot.int("PERIOD")?,
            mins_left: shot.int("MINUTES_REMAINING")?,
            secs_left: shot.int("SECONDS_REMAINING")?,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    use crate::model::TabularResult;

    pub const LOG_HEADERS: [&str; 7] = [
        "TEAM_ID",
        "TEAM_ABBREVIATION",
        "TEAM_NAME",
        "GAME_ID",
        "GAME_DATE",
        "MATCHUP",
        "PTS",
    ];

    pub const SHOT_HEADERS: [&str; 18] = [
        "GAME_ID",
        "PLAYER_ID",
        "PLAYER_NAME",
        "TEAM_ID",
        "TEAM_NAME",
        "PERIOD",
        "MINUTES_REMAINING",
        "SECONDS_REMAINING",
        "EVENT_TYPE",
        "ACTION_TYPE",
        "SHOT_TYPE",
        "SHOT_ZONE_BASIC",
        "SHOT_ZONE_AREA",
        "SHOT_ZONE_RANGE",
        "SHOT_DISTANCE",
        "LOC_X",
        "LOC_Y",
        "SHOT_MADE_FLAG",
    ];

    pub const ROSTER_HEADERS: [&str; 4] = ["TeamID", "PLAYER", "POSITION", "PLAYER_ID"];

    /// MIA hosts BOS on 2023-10-25, 110-98.
    pub fn game_log() -> TabularResult {
        TabularResult::new(
            "LeagueGameLog",
            &LOG_HEADERS,
            vec![
                vec![json!(1610612748), json!("MIA"), json!("Miami Heat"), json!("0022300061"), json!("2023-10-25"), json!("MIA vs. BOS"), json!(110)],
                vec![json!(1610612738), json!("BOS"), json!("Boston Celtics"), json!("0022300061"), json!("2023-10-25"), json!("BOS @ MIA"), json!(98)],
            ],
        )
    }

    pub fn team_roster(team_id: i64) -> TabularResult {
        let rows = if team_id == 1610612748 {
            vec![vec![json!(team_id), json!("Bam Adebayo"), json!("C-F"), json!(1628389)]]
        } else {
            vec![vec![json!(team_id), json!("Jrue Holiday"), json!("G"), json!(201950)]]
        };
        TabularResult::new("CommonTeamRoster", &ROSTER_HEADERS, rows)
    }

    pub fn shot_row(game_id: &str, player_id: i64, team_id: i64, area: &str) -> Vec<Value> {
        vec![
            json!(game_id),
            json!(player_id),
            json!("Shot Chart Name"),
            json!(team_id),
            json!("Shot Chart Team"),
            json!(2),
            json!(7),
            json!(41),
            json!("Made Shot"),
            json!("Jump Shot"),
            json!("2PT Field Goal"),
            json!("Mid-Range"),
            json!(area),
            json!("8-16 ft."),
            json!(12),
            json!(100),
            json!(50),
            json!(1),
        ]
    }

    pub fn shot_chart(rows: Vec<Vec<Value>>) -> TabularResult {
        TabularResult::new("Shot_Chart_Detail", &SHOT_HEADERS, rows)
    }
}
