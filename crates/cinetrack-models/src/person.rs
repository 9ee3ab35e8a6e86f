use serde::{Deserialize, Serialize};
use crate::content::MediaType;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub biography: String,
    pub birthday: Option<String>,
    pub deathday: Option<String>,
    pub place_of_birth: Option<String>,
    pub profile_path: Option<String>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub known_for_department: Option<String>,
}

/// A cast credit from `/person/{id}/combined_credits`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonCredit {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub character: Option<String>,
    pub poster_path: Option<String>,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub popularity: f64,
}

impl PersonCredit {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PersonCredits {
    #[serde(default)]
    pub cast: Vec<PersonCredit>,
}

impl PersonCredits {
    /// Most popular credits that have a poster to show
    pub fn known_for(&self, limit: usize) -> Vec<&PersonCredit> {
        let mut credits: Vec<&PersonCredit> = self
            .cast
            .iter()
            .filter(|credit| credit.poster_path.is_some())
            .collect();
        credits.sort_by(|a, b| {
            b.popularity
                .partial_cmp(&a.popularity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        credits.truncate(limit);
        credits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credit(id: u64, popularity: f64, poster: bool) -> PersonCredit {
        PersonCredit {
            id,
            title: Some(format!("Movie {}", id)),
            name: None,
            character: None,
            poster_path: poster.then(|| format!("/{}.jpg", id)),
            media_type: MediaType::Movie,
            release_date: None,
            first_air_date: None,
            popularity,
        }
    }

    #[test]
    fn test_known_for_filters_and_sorts() {
        let credits = PersonCredits {
            cast: vec![
                credit(1, 5.0, true),
                credit(2, 50.0, false),
                credit(3, 20.0, true),
                credit(4, 10.0, true),
            ],
        };

        let known: Vec<u64> = credits.known_for(2).iter().map(|c| c.id).collect();
        assert_eq!(known, vec![3, 4]);
    }
}
