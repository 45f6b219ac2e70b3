//! Result views computed from the candidate list on every request.

use data_encoding::BASE64;
use serde::{Deserialize, Serialize};

use crate::model::candidate::{Candidate, Category};

/// File name offered for the results image download.
pub const EXPORT_FILE_NAME: &str = "resultados-electorales.png";

/// Hours of the simulated turnout curve, with the share of the final total
/// reached at each one, in tenths.
const TIMELINE: [(&str, u64); 6] = [
    ("08:00", 1),
    ("10:00", 3),
    ("12:00", 5),
    ("14:00", 7),
    ("16:00", 9),
    ("18:00", 10),
];

/// Candidates in `category`, or all of them for `None`, in collection order.
pub fn by_category(candidates: &[Candidate], category: Option<Category>) -> Vec<&Candidate> {
    candidates
        .iter()
        .filter(|c| category.map_or(true, |cat| c.category == cat))
        .collect()
}

/// Most votes first. Equal counts keep their relative order.
pub fn sorted_by_votes<'a>(candidates: &[&'a Candidate]) -> Vec<&'a Candidate> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| b.votes.cmp(&a.votes));
    sorted
}

/// Sum of the votes, capped at `u64::MAX`.
pub fn total_votes(candidates: &[&Candidate]) -> u64 {
    candidates
        .iter()
        .fold(0u64, |total, c| total.saturating_add(c.votes))
}

/// Share of `total` as a percentage with one decimal, or `"0"` if nobody voted.
/// Halves round up, so 0.25 shows as `0.3`.
pub fn percentage(votes: u64, total: u64) -> String {
    if total == 0 {
        return "0".to_string();
    }
    let share = votes as f64 / total as f64 * 100.0;
    format!("{:.1}", (share * 10.0).round() / 10.0)
}

/// The candidate with the most votes; the first one seen wins a tie.
pub fn leader<'a>(candidates: &[&'a Candidate]) -> Option<&'a Candidate> {
    candidates.iter().copied().fold(None, |best, c| match best {
        Some(best) if best.votes >= c.votes => Some(best),
        _ => Some(c),
    })
}

pub fn max_votes(candidates: &[&Candidate]) -> u64 {
    candidates.iter().map(|c| c.votes).max().unwrap_or(0)
}

/// One line of the results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub id: String,
    pub name: String,
    pub party: String,
    pub category: Category,
    pub votes: u64,
    pub percentage: String,
}

/// Vote totals for each office and overall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub presidencia: u64,
    pub alcaldia: u64,
    pub all: u64,
}

/// A point on the simulated turnout curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub time: String,
    pub votes: u64,
}

/// Everything the results dashboards show for one filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsSummary {
    pub category: Option<Category>,
    pub total_votes: u64,
    pub candidate_count: usize,
    pub leader: String,
    pub max_votes: u64,
    pub rows: Vec<ResultRow>,
    pub totals: CategoryTotals,
    pub timeline: Vec<TimelinePoint>,
}

impl ResultsSummary {
    pub fn new(candidates: &[Candidate], category: Option<Category>) -> Self {
        let in_scope = by_category(candidates, category);
        let total = total_votes(&in_scope);

        let rows = sorted_by_votes(&in_scope)
            .into_iter()
            .map(|c| ResultRow {
                id: c.id.clone(),
                name: c.name.clone(),
                party: c.party.clone(),
                category: c.category,
                votes: c.votes,
                percentage: percentage(c.votes, total),
            })
            .collect();

        let presidencia = total_votes(&by_category(candidates, Some(Category::Presidencia)));
        let alcaldia = total_votes(&by_category(candidates, Some(Category::Alcaldia)));

        let timeline = TIMELINE
            .iter()
            .map(|(time, tenths)| TimelinePoint {
                time: time.to_string(),
                votes: (u128::from(total) * u128::from(*tenths) / 10) as u64,
            })
            .collect();

        Self {
            category,
            total_votes: total,
            candidate_count: in_scope.len(),
            leader: leader(&in_scope)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "N/A".to_string()),
            max_votes: max_votes(&in_scope),
            rows,
            totals: CategoryTotals {
                presidencia,
                alcaldia,
                all: presidencia.saturating_add(alcaldia),
            },
            timeline,
        }
    }
}

/// A blank 1x1 PNG offered as the "export results" image.
const PLACEHOLDER_PNG: &[u8] =
    b"iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

pub fn export_placeholder_png() -> Vec<u8> {
    // The embedded constant is valid base64.
    BASE64.decode(PLACEHOLDER_PNG).unwrap_or_default()
}
