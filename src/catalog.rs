//src/catalog.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("I/O error reading exercise catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse exercise catalog (JSON): {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Read-only exercise metadata as served by the exercise API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogExercise {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "category")]
    pub body_part: String,
    #[serde(default)]
    pub equipment: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub secondary_muscles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CatalogExercise {
    /// Case-insensitive substring match on name, body part, equipment and muscles.
    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        [&self.name, &self.body_part, &self.equipment, &self.target]
            .into_iter()
            .chain(self.secondary_muscles.iter())
            .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    exercises: Vec<CatalogExercise>,
}

impl Catalog {
    pub fn new(exercises: Vec<CatalogExercise>) -> Self {
        Self { exercises }
    }

    /// Loads a JSON array of exercises, e.g. a saved API response.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        let exercises: Vec<CatalogExercise> = serde_json::from_str(&content)?;
        Ok(Self { exercises })
    }

    pub fn all(&self) -> &[CatalogExercise] {
        &self.exercises
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// Free-text search. A blank query returns the whole catalog.
    pub fn search(&self, query: &str) -> Vec<&CatalogExercise> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.exercises.iter().collect();
        }
        self.exercises
            .iter()
            .filter(|exercise| exercise.matches(&needle))
            .collect()
    }

    /// Looks up by exact id first, then by case-insensitive name.
    pub fn find(&self, identifier: &str) -> Option<&CatalogExercise> {
        let trimmed = identifier.trim();
        self.exercises
            .iter()
            .find(|exercise| exercise.id == trimmed)
            .or_else(|| {
                self.exercises
                    .iter()
                    .find(|exercise| exercise.name.eq_ignore_ascii_case(trimmed))
            })
    }

    /// Built-in exercises used when no catalog file is configured.
    pub fn sample() -> Self {
        let entry = |id: &str,
                     name: &str,
                     body_part: &str,
                     equipment: &str,
                     target: &str,
                     secondary: &[&str]| CatalogExercise {
            id: id.to_string(),
            name: name.to_string(),
            body_part: body_part.to_string(),
            equipment: equipment.to_string(),
            target: target.to_string(),
            secondary_muscles: secondary.iter().map(|m| (*m).to_string()).collect(),
            image: None,
        };

        Self::new(vec![
            entry(
                "0001",
                "Barbell Bench Press",
                "chest",
                "barbell",
                "pectorals",
                &["triceps", "shoulders"],
            ),
            entry(
                "0002",
                "Push-up",
                "chest",
                "body weight",
                "pectorals",
                &["triceps", "core"],
            ),
            entry(
                "0003",
                "Barbell Squat",
                "upper legs",
                "barbell",
                "quads",
                &["glutes", "hamstrings"],
            ),
            entry(
                "0004",
                "Walking Lunge",
                "upper legs",
                "dumbbell",
                "glutes",
                &["quads", "hamstrings"],
            ),
            entry(
                "0005",
                "Deadlift",
                "back",
                "barbell",
                "spine",
                &["glutes", "hamstrings", "lats"],
            ),
            entry(
                "0006",
                "Pull-up",
                "back",
                "body weight",
                "lats",
                &["biceps", "forearms"],
            ),
            entry(
                "0007",
                "Bent Over Row",
                "back",
                "barbell",
                "upper back",
                &["biceps", "lats"],
            ),
            entry(
                "0008",
                "Overhead Press",
                "shoulders",
                "barbell",
                "delts",
                &["triceps", "upper back"],
            ),
            entry(
                "0009",
                "Lateral Raise",
                "shoulders",
                "dumbbell",
                "delts",
                &["traps"],
            ),
            entry(
                "0010",
                "Biceps Curl",
                "upper arms",
                "dumbbell",
                "biceps",
                &["forearms"],
            ),
            entry(
                "0011",
                "Triceps Dip",
                "upper arms",
                "body weight",
                "triceps",
                &["chest", "shoulders"],
            ),
            entry(
                "0012",
                "Standing Calf Raise",
                "lower legs",
                "body weight",
                "calves",
                &[],
            ),
            entry(
                "0013",
                "Plank",
                "waist",
                "body weight",
                "abs",
                &["shoulders", "glutes"],
            ),
            entry(
                "0014",
                "Russian Twist",
                "waist",
                "medicine ball",
                "obliques",
                &["abs"],
            ),
            entry(
                "0015",
                "Jump Rope",
                "cardio",
                "rope",
                "cardiovascular system",
                &["calves"],
            ),
        ])
    }
}
