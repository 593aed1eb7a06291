pub mod client;
pub mod wire;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Domain types shared by the backend payloads and the terminal client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sport {
    #[default]
    Football,
    Basketball,
}

impl Sport {
    /// Enumeration order; the first entry is the form default.
    pub const ALL: [Sport; 2] = [Sport::Football, Sport::Basketball];

    pub fn label(&self) -> &'static str {
        match self {
            Sport::Football => "FOOTBALL",
            Sport::Basketball => "BASKETBALL",
        }
    }

    /// Cycles through `ALL`, wrapping at the end.
    pub fn next(self) -> Self {
        match self {
            Sport::Football => Sport::Basketball,
            Sport::Basketball => Sport::Football,
        }
    }
}

/// Outcome category of a betting market on a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Specifier {
    Win,
    Draw,
    Lose,
}

impl Specifier {
    pub const ALL: [Specifier; 3] = [Specifier::Win, Specifier::Draw, Specifier::Lose];

    pub fn label(&self) -> &'static str {
        match self {
            Specifier::Win => "WIN",
            Specifier::Draw => "DRAW",
            Specifier::Lose => "LOSE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchOdds {
    pub specifier: Specifier,
    pub odd: f64,
}

/// A match record as held by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub match_id: String,
    #[serde(default)]
    pub match_owner: String,
    #[serde(default)]
    pub description: Option<String>,
    pub match_date: NaiveDate,
    pub match_time: NaiveTime,
    pub team_a: String,
    pub team_b: String,
    pub sport: Sport,
    #[serde(default)]
    pub odds: Vec<MatchOdds>,
}

impl Match {
    pub fn odd_value(&self, spec: Specifier) -> Option<f64> {
        self.odds.iter().find(|o| o.specifier == spec).map(|o| o.odd)
    }
}

/// Body of the create and update calls. Date and time stay textual so the
/// backend owns their validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMatchRequest {
    pub match_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub match_date: String,
    pub match_time: String,
    pub team_a: String,
    pub team_b: String,
    pub sport: Sport,
    pub odds: Vec<MatchOdds>,
}

impl SaveMatchRequest {
    /// Snapshot an existing record into an editable payload. The time keeps
    /// its seconds, as the backend returns it.
    pub fn from_match(record: &Match) -> Self {
        Self {
            match_id: record.match_id.clone(),
            description: record.description.clone().unwrap_or_default(),
            match_date: record.match_date.format("%Y-%m-%d").to_string(),
            match_time: record.match_time.format("%H:%M:%S").to_string(),
            team_a: record.team_a.clone(),
            team_b: record.team_b.clone(),
            sport: record.sport,
            odds: record.odds.clone(),
        }
    }

    pub fn odd_value(&self, spec: Specifier) -> Option<f64> {
        self.odds.iter().find(|o| o.specifier == spec).map(|o| o.odd)
    }

    /// Upsert by specifier: overwrite the matching entry in place, or append.
    pub fn set_odd_value(&mut self, spec: Specifier, value: f64) {
        match self.odds.iter_mut().find(|o| o.specifier == spec) {
            Some(existing) => existing.odd = value,
            None => self.odds.push(MatchOdds { specifier: spec, odd: value }),
        }
    }

    pub fn remove_odd(&mut self, spec: Specifier) {
        self.odds.retain(|o| o.specifier != spec);
    }

    /// Collapse duplicate specifiers; the later entry wins but keeps the
    /// position of the first occurrence.
    pub fn upsert_odds(&mut self) {
        let entries = std::mem::take(&mut self.odds);
        for entry in entries {
            self.set_odd_value(entry.specifier, entry.odd);
        }
    }
}

// ---------------------------------------------------------------------------
// Pagination and sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Fields the backend accepts as `sortBy`. Anything else is answered in
/// date-descending order regardless of the requested direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    MatchDate,
    Owner,
    Sport,
}

impl SortField {
    pub const ALL: [SortField; 3] = [SortField::MatchDate, SortField::Owner, SortField::Sport];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::MatchDate => "matchDate",
            SortField::Owner => "owner",
            SortField::Sport => "sport",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortField::MatchDate => "Date",
            SortField::Owner => "Owner",
            SortField::Sport => "Sport",
        }
    }
}

/// Parameters of one list call. Pagination and sorting happen server-side.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchQuery {
    pub page: usize,
    pub size: usize,
    pub sort_by: SortField,
    pub direction: SortDirection,
    pub owner: Option<String>,
    pub sport: Option<Sport>,
    pub match_date: Option<NaiveDate>,
}

impl Default for MatchQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 5,
            sort_by: SortField::MatchDate,
            direction: SortDirection::Desc,
            owner: None,
            sport: None,
            match_date: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchPage {
    pub items: Vec<Match>,
    pub total_pages: usize,
}

/// Backend identifiers are numeric; the client carries them as strings.
fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_odd_value_appends_then_overwrites() {
        let mut req = SaveMatchRequest::default();
        req.set_odd_value(Specifier::Win, 1.5);
        assert_eq!(req.odds, vec![MatchOdds { specifier: Specifier::Win, odd: 1.5 }]);

        req.set_odd_value(Specifier::Win, 1.8);
        assert_eq!(req.odds.len(), 1);
        assert_eq!(req.odd_value(Specifier::Win), Some(1.8));
        assert_eq!(req.odd_value(Specifier::Draw), None);
    }

    #[test]
    fn upsert_odds_keeps_last_write_per_specifier() {
        let mut req = SaveMatchRequest {
            odds: vec![
                MatchOdds { specifier: Specifier::Win, odd: 1.2 },
                MatchOdds { specifier: Specifier::Lose, odd: 4.0 },
                MatchOdds { specifier: Specifier::Win, odd: 1.9 },
            ],
            ..Default::default()
        };
        req.upsert_odds();
        assert_eq!(
            req.odds,
            vec![
                MatchOdds { specifier: Specifier::Win, odd: 1.9 },
                MatchOdds { specifier: Specifier::Lose, odd: 4.0 },
            ]
        );
    }

    #[test]
    fn match_accepts_numeric_id_and_time_with_seconds() {
        let raw = r#"{
            "matchId": 42,
            "matchOwner": "alice",
            "description": null,
            "matchDate": "2025-07-17",
            "matchTime": "17:13:00",
            "teamA": "PAO",
            "teamB": "OSFP",
            "sport": "BASKETBALL",
            "odds": [{"specifier": "WIN", "odd": 1.5}]
        }"#;
        let record: Match = serde_json::from_str(raw).unwrap();
        assert_eq!(record.match_id, "42");
        assert_eq!(record.sport, Sport::Basketball);
        assert_eq!(record.odd_value(Specifier::Win), Some(1.5));

        let draft = SaveMatchRequest::from_match(&record);
        assert_eq!(draft.match_time, "17:13:00");
        assert_eq!(draft.match_date, "2025-07-17");
        assert!(draft.description.is_empty());
    }

    #[test]
    fn save_request_omits_empty_description() {
        let req = SaveMatchRequest {
            match_id: "7".into(),
            match_date: "2025-08-22".into(),
            match_time: "20:45".into(),
            team_a: "A".into(),
            team_b: "B".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["sport"], "FOOTBALL");
        assert_eq!(json["teamA"], "A");
    }

    #[test]
    fn sort_direction_toggles() {
        assert_eq!(SortDirection::Asc.toggled(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.toggled(), SortDirection::Asc);
        assert_eq!(Sport::ALL[0], Sport::default());
    }
}
