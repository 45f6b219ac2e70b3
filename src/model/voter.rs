use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::candidate::Category;
use crate::storage::{Persisted, USER_SESSION_KEY};

pub const MIN_DNI_LENGTH: usize = 7;
pub const MAX_DNI_LENGTH: usize = 10;

/// A national identity number: 7 to 10 ASCII digits.
///
/// Nothing checks that the number belongs to a real person.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Dni(String);

impl FromStr for Dni {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !(MIN_DNI_LENGTH..=MAX_DNI_LENGTH).contains(&s.len()) {
            return Err(format!(
                "DNI must have between {MIN_DNI_LENGTH} and {MAX_DNI_LENGTH} digits"
            ));
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err("DNI must contain only digits".to_string());
        }
        Ok(Self(s.to_string()))
    }
}

impl Deref for Dni {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Dni {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sign-in request body for voters. Parsed into a [`Dni`] by the route.
#[derive(Clone, Deserialize, Serialize)]
pub struct DniRequest {
    pub dni: String,
}

/// The voter currently signed in, and which offices they have voted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterSession {
    pub dni: String,
    pub voted_presidencia: bool,
    pub voted_alcaldia: bool,
}

impl VoterSession {
    /// Derive the session flags from what the voter has already recorded.
    pub fn from_record(dni: &str, record: &VoteRecord) -> Self {
        Self {
            dni: dni.to_string(),
            voted_presidencia: record.choice(Category::Presidencia).is_some(),
            voted_alcaldia: record.choice(Category::Alcaldia).is_some(),
        }
    }

    pub fn has_voted(&self, category: Category) -> bool {
        match category {
            Category::Presidencia => self.voted_presidencia,
            Category::Alcaldia => self.voted_alcaldia,
        }
    }

    pub fn mark_voted(&mut self, category: Category) {
        match category {
            Category::Presidencia => self.voted_presidencia = true,
            Category::Alcaldia => self.voted_alcaldia = true,
        }
    }
}

impl Persisted for VoterSession {
    const KEY: &'static str = USER_SESSION_KEY;
}

/// The candidate a single voter picked in each category, stored under
/// `votes_<dni>` as e.g. `{"presidencia":"p1"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    presidencia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alcaldia: Option<String>,
}

impl VoteRecord {
    /// The chosen candidate ID. An empty ID counts as no choice.
    pub fn choice(&self, category: Category) -> Option<&str> {
        let slot = match category {
            Category::Presidencia => &self.presidencia,
            Category::Alcaldia => &self.alcaldia,
        };
        slot.as_deref().filter(|id| !id.is_empty())
    }

    /// Record a choice. Returns false, leaving the record untouched, if the
    /// category already has one.
    pub fn record(&mut self, category: Category, candidate_id: &str) -> bool {
        if self.choice(category).is_some() {
            return false;
        }
        let slot = match category {
            Category::Presidencia => &mut self.presidencia,
            Category::Alcaldia => &mut self.alcaldia,
        };
        *slot = Some(candidate_id.to_string());
        true
    }

    /// Fill categories missing here from `other`. Existing choices win.
    pub fn merged_with(mut self, other: &VoteRecord) -> Self {
        for category in Category::ALL {
            if let Some(id) = other.choice(category) {
                self.record(category, id);
            }
        }
        self
    }
}

/// A voter's choices as reported back to them; absent categories are `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserVotes {
    pub presidencia: Option<String>,
    pub alcaldia: Option<String>,
}

impl From<&VoteRecord> for UserVotes {
    fn from(record: &VoteRecord) -> Self {
        Self {
            presidencia: record.choice(Category::Presidencia).map(str::to_string),
            alcaldia: record.choice(Category::Alcaldia).map(str::to_string),
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl DniRequest {
        pub fn example() -> Self {
            Self {
                dni: "1234567".into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::{serde_json, serde_json::json};

    use super::*;

    #[test]
    fn dni_length_and_digits() {
        assert!("1234567".parse::<Dni>().is_ok());
        assert!("1234567890".parse::<Dni>().is_ok());
        assert!("123456".parse::<Dni>().is_err());
        assert!("12345678901".parse::<Dni>().is_err());
        assert!("12345a7".parse::<Dni>().is_err());
        assert!("".parse::<Dni>().is_err());
    }

    #[test]
    fn record_never_overwrites() {
        let mut record = VoteRecord::default();
        assert!(record.record(Category::Presidencia, "p1"));
        assert!(!record.record(Category::Presidencia, "p2"));
        assert_eq!(record.choice(Category::Presidencia), Some("p1"));
        assert_eq!(record.choice(Category::Alcaldia), None);
    }

    #[test]
    fn record_wire_format() {
        let mut record = VoteRecord::default();
        record.record(Category::Presidencia, "p1");
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "presidencia": "p1" })
        );

        let parsed: VoteRecord = serde_json::from_str(r#"{"alcaldia":"a2"}"#).unwrap();
        assert_eq!(parsed.choice(Category::Alcaldia), Some("a2"));
        assert_eq!(
            serde_json::to_value(UserVotes::from(&parsed)).unwrap(),
            json!({ "presidencia": null, "alcaldia": "a2" })
        );
    }

    #[test]
    fn empty_choice_is_not_a_vote() {
        let record: VoteRecord = serde_json::from_str(r#"{"presidencia":""}"#).unwrap();
        let session = VoterSession::from_record("1234567", &record);
        assert!(!session.voted_presidencia);
    }

    #[test]
    fn merge_prefers_existing_choices() {
        let mut stored = VoteRecord::default();
        stored.record(Category::Presidencia, "p1");
        let mut cached = VoteRecord::default();
        cached.record(Category::Presidencia, "p2");
        cached.record(Category::Alcaldia, "a1");

        let merged = stored.merged_with(&cached);
        assert_eq!(merged.choice(Category::Presidencia), Some("p1"));
        assert_eq!(merged.choice(Category::Alcaldia), Some("a1"));
    }

    #[test]
    fn session_flags() {
        let mut session = VoterSession::from_record("1234567", &VoteRecord::default());
        assert!(!session.has_voted(Category::Alcaldia));
        session.mark_voted(Category::Alcaldia);
        assert!(session.has_voted(Category::Alcaldia));
        assert!(!session.has_voted(Category::Presidencia));
        assert_eq!(
            serde_json::to_value(&session).unwrap(),
            json!({ "dni": "1234567", "votedPresidencia": false, "votedAlcaldia": true })
        );
    }
}
