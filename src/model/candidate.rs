use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rocket::form::FromFormField;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::{Persisted, CANDIDATES_KEY};

/// The offices being voted for.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, FromFormField,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// President.
    #[field(value = "presidencia")]
    Presidencia,
    /// Mayor.
    #[field(value = "alcaldia")]
    Alcaldia,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Presidencia, Category::Alcaldia];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Presidencia => "presidencia",
            Self::Alcaldia => "alcaldia",
        }
    }

    /// First letter of the category name, used to prefix candidate IDs.
    pub fn initial(self) -> char {
        match self {
            Self::Presidencia => 'p',
            Self::Alcaldia => 'a',
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// A candidate standing for one office, with their running vote count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub party: String,
    pub description: String,
    pub image: String,
    pub category: Category,
    pub votes: u64,
}

impl Candidate {
    /// Create a candidate with a fresh unique ID and no votes.
    pub fn from_new(new: NewCandidate) -> Self {
        let id = format!("{}{}", new.category.initial(), Uuid::new_v4().simple());
        Self {
            id,
            name: new.name,
            party: new.party,
            description: new.description,
            image: new.image,
            category: new.category,
            votes: 0,
        }
    }

    /// Overwrite every field present in `update`.
    pub fn apply(&mut self, update: CandidateUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(party) = update.party {
            self.party = party;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(image) = update.image {
            self.image = image;
        }
        if let Some(votes) = update.votes {
            self.votes = votes;
        }
    }
}

impl Persisted for Vec<Candidate> {
    const KEY: &'static str = CANDIDATES_KEY;
}

/// A candidate as submitted by an administrator: no ID and no votes yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCandidate {
    pub name: String,
    pub party: String,
    pub description: String,
    pub image: String,
    pub category: Category,
}

impl NewCandidate {
    /// Every text field must be non-blank.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("name", &self.name),
            ("party", &self.party),
            ("description", &self.description),
            ("image", &self.image),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(format!("Candidate {field} must not be empty")),
            None => Ok(()),
        }
    }
}

/// A partial edit of a candidate. The category cannot change after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes: Option<u64>,
}

impl CandidateUpdate {
    /// Text fields that are present must be non-blank.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("name", &self.name),
            ("party", &self.party),
            ("description", &self.description),
            ("image", &self.image),
        ];
        for (field, value) in fields {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(format!("Candidate {field} must not be empty"));
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    #[test]
    fn category_wire_format() {
        assert_eq!(
            serde_json::to_string(&Category::Presidencia).unwrap(),
            r#""presidencia""#
        );
        assert_eq!(
            serde_json::from_str::<Category>(r#""alcaldia""#).unwrap(),
            Category::Alcaldia
        );
        assert_eq!("alcaldia".parse::<Category>(), Ok(Category::Alcaldia));
        assert!("Alcaldia".parse::<Category>().is_err());
    }

    #[test]
    fn new_candidates_get_prefixed_unique_ids() {
        let first = Candidate::from_new(NewCandidate::example());
        let second = Candidate::from_new(NewCandidate::example());

        assert!(first.id.starts_with('a'));
        assert_ne!(first.id, second.id);
        assert_eq!(first.votes, 0);
        assert_eq!(first.category, Category::Alcaldia);
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut candidate = Candidate::from_new(NewCandidate::example());
        let before = candidate.clone();

        candidate.apply(CandidateUpdate {
            votes: Some(5),
            ..Default::default()
        });

        assert_eq!(candidate.votes, 5);
        assert_eq!(candidate.name, before.name);
        assert_eq!(candidate.party, before.party);
        assert_eq!(candidate.description, before.description);
        assert_eq!(candidate.image, before.image);
        assert_eq!(candidate.category, before.category);
    }

    #[test]
    fn update_ignores_category_in_payload() {
        let update: CandidateUpdate =
            serde_json::from_str(r#"{"name":"Nuevo","category":"presidencia"}"#).unwrap();
        assert_eq!(update.name.as_deref(), Some("Nuevo"));
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut new = NewCandidate::example();
        assert!(new.validate().is_ok());
        new.party = "   ".to_string();
        assert_eq!(
            new.validate(),
            Err("Candidate party must not be empty".to_string())
        );

        let update = CandidateUpdate {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
        assert!(CandidateUpdate::default().validate().is_ok());
    }
}
