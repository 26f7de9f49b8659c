use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::FetchError;

/// Prefix carried by upstream game ids that the shot CSV leaves out.
pub const GAME_ID_PREFIX: &str = "00";

/// First match wins, so two-letter positions must come before the bare letters.
const POSITION_GROUPS: [(&str, &str); 7] = [
    ("C", "C"),
    ("PF", "F"),
    ("SF", "F"),
    ("SG", "G"),
    ("PG", "G"),
    ("G", "G"),
    ("F", "F"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Season {
    start_year: i32,
}

impl Season {
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    pub fn end_year(&self) -> i32 {
        self.start_year + 1
    }

    /// Parse a `YYYY-YY` label, rejecting labels whose suffix is not the following year.
    pub fn parse(label: &str) -> Option<Self> {
        let (start, end) = label.split_once('-')?;
        if start.len() != 4 || end.len() != 2 {
            return None;
        }
        let start_year = start.parse().ok()?;
        (season_label(start_year) == label).then_some(Season::new(start_year))
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}",
            self.start_year,
            (self.start_year + 1).rem_euclid(100)
        )
    }
}

pub fn season_label(start_year: i32) -> String {
    Season::new(start_year).to_string()
}

/// Seasons starting in `[start_year, end_year_exclusive)`, in order.
pub fn seasons(start_year: i32, end_year_exclusive: i32) -> Vec<Season> {
    (start_year..end_year_exclusive).map(Season::new).collect()
}

/// One result set as the stats API returns it: column names plus value rows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TabularResult {
    #[serde(default)]
    pub name: String,
    pub headers: Vec<String>,
    #[serde(rename = "rowSet")]
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl TabularResult {
    #[cfg(test)]
    pub fn new(name: &str, headers: &[&str], rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    /// Zip the header with each row, in row order.
    pub fn records(&self) -> impl Iterator<Item = Result<Record, FetchError>> + '_ {
        self.rows.iter().enumerate().map(move |(index, row)| {
            if row.len() != self.headers.len() {
                return Err(FetchError::ShapeMismatch {
                    row: index,
                    expected: self.headers.len(),
                    actual: row.len(),
                });
            }

            Ok(Record(
                self.headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect(),
            ))
        })
    }
}

/// Column name to value, for a single row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(serde_json::Map<String, serde_json::Value>);

impl Record {
    pub fn get(&self, column: &str) -> Result<&serde_json::Value, FetchError> {
        self.0
            .get(column)
            .ok_or_else(|| FetchError::MissingField(column.to_string()))
    }

    /// The value rendered as a string; null becomes empty.
    pub fn text(&self, column: &str) -> Result<String, FetchError> {
        Ok(match self.get(column)? {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn int(&self, column: &str) -> Result<i64, FetchError> {
        let value = self.get(column)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| FetchError::MissingField(column.to_string()))
    }

    pub fn float(&self, column: &str) -> Result<f64, FetchError> {
        let value = self.get(column)?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| FetchError::MissingField(column.to_string()))
    }
}

impl FromIterator<(String, serde_json::Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, serde_json::Value)>>(iter: I) -> Self {
        Record(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: i64,
    pub name: String,
    pub height: String,
    pub weight: String,
    pub birthdate: String,
}

impl PlayerInfo {
    pub fn from_record(id: i64, record: &Record) -> Result<Self, FetchError> {
        Ok(Self {
            id,
            name: record.text("DISPLAY_FIRST_LAST")?,
            height: record.text("HEIGHT")?,
            weight: record.text("WEIGHT")?,
            birthdate: record.text("BIRTHDATE")?,
        })
    }
}

/// Column order of the shots CSV. Matches the field order of [`ShotRecord`].
pub const SHOT_COLUMNS: [&str; 26] = [
    "SEASON_1",
    "SEASON_2",
    "TEAM_ID",
    "TEAM_NAME",
    "PLAYER_ID",
    "PLAYER_NAME",
    "POSITION_GROUP",
    "POSITION",
    "GAME_DATE",
    "GAME_ID",
    "HOME_TEAM",
    "AWAY_TEAM",
    "EVENT_TYPE",
    "SHOT_MADE",
    "ACTION_TYPE",
    "SHOT_TYPE",
    "BASIC_ZONE",
    "ZONE_NAME",
    "ZONE_ABB",
    "ZONE_RANGE",
    "LOC_X",
    "LOC_Y",
    "SHOT_DISTANCE",
    "QUARTER",
    "MINS_LEFT",
    "SECS_LEFT",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ShotRecord {
    pub season_1: i32,
    pub season_2: String,
    pub team_id: i64,
    pub team_name: String,
    pub player_id: i64,
    pub player_name: String,
    pub position_group: String,
    pub position: String,
    pub game_date: String,
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub event_type: String,
    #[serde(serialize_with = "upper_bool")]
    pub shot_made: bool,
    pub action_type: String,
    pub shot_type: String,
    pub basic_zone: String,
    pub zone_name: String,
    pub zone_abb: String,
    pub zone_range: String,
    pub loc_x: f64,
    pub loc_y: f64,
    pub shot_distance: i64,
    pub quarter: i64,
    pub mins_left: i64,
    pub secs_left: i64,
}

fn upper_bool<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *value { "TRUE" } else { "FALSE" })
}

fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // collapse -0.0
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Raw shot-chart units (tenths of a foot, hoop at origin) to the output court space.
pub fn convert_location(x: f64, y: f64) -> (f64, f64) {
    (round2(x * -0.1), round2(y * 0.1 + 5.25))
}

pub fn position_group(position: &str) -> &'static str {
    POSITION_GROUPS
        .iter()
        .find(|(prefix, _)| position.starts_with(prefix))
        .map(|(_, group)| *group)
        .unwrap_or("")
}

/// Split `"Left Side(L)"` into `("Left Side", "L")`.
pub fn split_zone(area: &str) -> Result<(String, String), FetchError> {
    let open = area
        .find('(')
        .ok_or_else(|| FetchError::ZoneParse(area.to_string()))?;
    let close = area[open..]
        .find(')')
        .map(|offset| open + offset)
        .ok_or_else(|| FetchError::ZoneParse(area.to_string()))?;

    Ok((
        area[..open].to_string(),
        area[open + 1..close].to_string(),
    ))
}

/// `YYYY-MM-DD` (optionally followed by a `T` time part) to `MM-DD-YYYY`.
pub fn reformat_date(game_id: &str, value: &str) -> Result<String, FetchError> {
    let day = value.split_once('T').map_or(value, |(day, _)| day);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(|date| date.format("%m-%d-%Y").to_string())
        .map_err(|_| FetchError::DateFormat {
            game_id: game_id.to_string(),
            value: value.to_string(),
        })
}

pub fn strip_game_id(game_id: &str) -> &str {
    game_id.strip_prefix(GAME_ID_PREFIX).unwrap_or(game_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn season_labels() {
        assert_eq!(season_label(2003), "2003-04");
        assert_eq!(season_label(2099), "2099-00");
        assert_eq!(season_label(1999), "1999-00");
        assert_eq!(season_label(2009), "2009-10");
    }

    #[test]
    fn season_range_is_half_open_and_ordered() {
        let labels: Vec<String> = seasons(2021, 2024).iter().map(|s| s.to_string()).collect();
        assert_eq!(labels, ["2021-22", "2022-23", "2023-24"]);
        assert!(seasons(2024, 2024).is_empty());
    }

    #[test]
    fn season_parse() {
        assert_eq!(Season::parse("2023-24"), Some(Season::new(2023)));
        assert_eq!(Season::parse("2023-25"), None);
        assert_eq!(Season::parse("23-24"), None);
        assert_eq!(Season::new(2023).end_year(), 2024);
    }

    #[test]
    fn records_zip_header_with_rows() {
        let table = TabularResult::new("T", &["A", "B"], vec![vec![json!(1), json!(2)], vec![json!(3), json!("x")]]);
        let records: Vec<Record> = table.records().collect::<Result<_, _>>().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(serde_json::to_value(&records[0]).unwrap(), json!({"A": 1, "B": 2}));
        assert_eq!(records[1].int("A").unwrap(), 3);
        assert_eq!(records[1].text("B").unwrap(), "x");
    }

    #[test]
    fn records_keep_header_order() {
        let table = TabularResult::new("T", &["W", "TEAM_ID", "A"], vec![vec![json!(1), json!(2), json!(3)]]);
        let record = table.records().next().unwrap().unwrap();

        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"W":1,"TEAM_ID":2,"A":3}"#);
    }

    #[test]
    fn records_reject_short_rows() {
        let table = TabularResult::new("T", &["A", "B"], vec![vec![json!(1), json!(2)], vec![json!(1)]]);
        let results: Vec<_> = table.records().collect();

        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(FetchError::ShapeMismatch { row: 1, expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn record_accessors() {
        let record: Record = [
            ("N".to_string(), json!(null)),
            ("F".to_string(), json!(12.5)),
            ("I".to_string(), json!("42")),
        ]
        .into_iter()
        .collect();

        assert_eq!(record.text("N").unwrap(), "");
        assert_eq!(record.float("F").unwrap(), 12.5);
        assert_eq!(record.int("I").unwrap(), 42);
        assert!(matches!(record.int("F"), Err(FetchError::MissingField(_))));
        assert!(matches!(record.get("Z"), Err(FetchError::MissingField(c)) if c == "Z"));
    }

    #[test]
    fn location_conversion() {
        assert_eq!(convert_location(100.0, 50.0), (-10.0, 10.25));
        assert_eq!(convert_location(0.0, 0.0), (0.0, 5.25));
        assert_eq!(convert_location(-7.0, -3.0), (0.7, 4.95));
        assert!(convert_location(0.0, 0.0).0.is_sign_positive());
    }

    #[test]
    fn position_groups_first_match_wins() {
        assert_eq!(position_group("PG"), "G");
        assert_eq!(position_group("SF"), "F");
        assert_eq!(position_group("C"), "C");
        assert_eq!(position_group("C-F"), "C");
        assert_eq!(position_group("G-F"), "G");
        assert_eq!(position_group("F-C"), "F");
        assert_eq!(position_group(""), "");
        assert_eq!(position_group("X"), "");
    }

    #[test]
    fn zone_split() {
        assert_eq!(
            split_zone("Left Side(L)").unwrap(),
            ("Left Side".to_string(), "L".to_string())
        );
        assert_eq!(
            split_zone("Right Side Center(RC)").unwrap(),
            ("Right Side Center".to_string(), "RC".to_string())
        );
        assert!(matches!(split_zone("Center"), Err(FetchError::ZoneParse(_))));
        assert!(matches!(split_zone("Center(C"), Err(FetchError::ZoneParse(_))));
    }

    #[test]
    fn dates_are_reformatted() {
        assert_eq!(reformat_date("g", "2023-10-24").unwrap(), "10-24-2023");
        assert_eq!(reformat_date("g", "2023-10-24T00:00:00").unwrap(), "10-24-2023");
        assert!(reformat_date("g", "2023-10-24garbage").is_err());
        assert!(reformat_date("g", "2023-10-24 00:00:00").is_err());
        assert!(matches!(
            reformat_date("0022300001", "Oct 24, 2023"),
            Err(FetchError::DateFormat { game_id, .. }) if game_id == "0022300001"
        ));
    }

    #[test]
    fn game_id_prefix() {
        assert_eq!(strip_game_id("0022300001"), "22300001");
        assert_eq!(strip_game_id("22300001"), "22300001");
    }
}
