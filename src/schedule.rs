//src/schedule.rs
use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::{Index, IndexMut, RangeInclusive};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::catalog::CatalogExercise;

pub const DEFAULT_SETS: u32 = 3;
pub const DEFAULT_REPS: u32 = 10;

/// Sets offered by the editor menus. Not enforced on stored data.
pub const SET_CHOICES: RangeInclusive<u32> = 1..=6;
/// Reps offered by the editor menus. Not enforced on stored data.
pub const REP_CHOICES: [u32; 8] = [5, 8, 10, 12, 15, 20, 25, 30];

/// Generates a time-ordered identifier for schedules and schedule entries.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Weekday {
    #[default]
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Position in the canonical Monday-first week.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One exercise placed on a day. The catalog fields are a snapshot taken when
/// the exercise was added and are never re-synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleExercise {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "bodyPart")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub sets: u32,
    pub reps: u32,
}

impl ScheduleExercise {
    pub fn from_catalog(exercise: &CatalogExercise, sets: u32, reps: u32) -> Self {
        Self {
            id: new_id(),
            name: exercise.name.clone(),
            category: exercise.body_part.clone(),
            image: exercise.image.clone(),
            sets,
            reps,
        }
    }

    pub fn apply(&mut self, patch: ExercisePatch) {
        if let Some(sets) = patch.sets {
            self.sets = sets;
        }
        if let Some(reps) = patch.reps {
            self.reps = reps;
        }
    }
}

/// Partial update for a `ScheduleExercise`. `None` leaves the field alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExercisePatch {
    pub sets: Option<u32>,
    pub reps: Option<u32>,
}

impl ExercisePatch {
    pub const fn sets(sets: u32) -> Self {
        Self {
            sets: Some(sets),
            reps: None,
        }
    }

    pub const fn reps(reps: u32) -> Self {
        Self {
            sets: None,
            reps: Some(reps),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.sets.is_none() && self.reps.is_none()
    }
}

/// Seven exercise lists, one per weekday. Empty days keep their slot so they
/// can be repopulated.
///
/// Stored as a JSON object keyed by weekday name, all seven keys in
/// Monday-first order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekPlan([Vec<ScheduleExercise>; 7]);

impl WeekPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weekdays with at least one exercise, Monday first.
    pub fn active_days(&self) -> Vec<Weekday> {
        Weekday::iter().filter(|day| !self[*day].is_empty()).collect()
    }

    pub fn first_active_day(&self) -> Option<Weekday> {
        Weekday::iter().find(|day| !self[*day].is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Vec::is_empty)
    }

    pub fn total_exercises(&self) -> usize {
        self.0.iter().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &[ScheduleExercise])> {
        Weekday::iter().map(move |day| (day, self[day].as_slice()))
    }
}

impl Index<Weekday> for WeekPlan {
    type Output = Vec<ScheduleExercise>;

    fn index(&self, day: Weekday) -> &Self::Output {
        &self.0[day.index()]
    }
}

impl IndexMut<Weekday> for WeekPlan {
    fn index_mut(&mut self, day: Weekday) -> &mut Self::Output {
        &mut self.0[day.index()]
    }
}

impl Serialize for WeekPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(7))?;
        for (day, exercises) in self.iter() {
            map.serialize_entry(&day, exercises)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WeekPlan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut by_day: HashMap<Weekday, Vec<ScheduleExercise>> =
            HashMap::deserialize(deserializer)?;
        let mut plan = Self::default();
        for day in Weekday::iter() {
            if let Some(exercises) = by_day.remove(&day) {
                plan[day] = exercises;
            }
        }
        Ok(plan)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub name: String,
    /// Derived from `exercises` on every save.
    #[serde(default)]
    pub days: Vec<Weekday>,
    #[serde(default)]
    pub exercises: WeekPlan,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(name: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            days: Vec::new(),
            exercises: WeekPlan::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Recomputes `days` from the populated weekdays.
    pub fn refresh_days(&mut self) {
        self.days = self.exercises.active_days();
    }

    pub fn has_exercises(&self) -> bool {
        !self.exercises.is_empty()
    }
}
