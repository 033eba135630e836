//src/editor.rs
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::CatalogExercise;
use crate::schedule::{
    ExercisePatch, Schedule, ScheduleExercise, Weekday, DEFAULT_REPS, DEFAULT_SETS,
};
use crate::store::{ScheduleStore, StoreError};

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Schedule not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    ValidationFailed(String),
    #[error("Failed to persist schedules: {0}")]
    PersistenceFailed(#[from] StoreError),
}

/// How loudly an editor error should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The view can't continue; the caller navigates back to the list.
    Info,
    Warning,
    Error,
}

impl EditorError {
    pub const fn severity(&self) -> Severity {
        match self {
            Self::NotFound(_) => Severity::Info,
            Self::ValidationFailed(_) => Severity::Warning,
            Self::PersistenceFailed(_) => Severity::Error,
        }
    }

    /// False when the editor has nothing left to edit.
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::NotFound(_))
    }
}

/// Yes/no prompt used before destructive actions.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// Result of [`ScheduleEditor::delete`]. Only a cancelled delete hands the
/// editor back.
pub enum DeleteOutcome<'s, S: ScheduleStore + ?Sized> {
    /// Record removed; the caller should leave the editor.
    Deleted,
    Cancelled(ScheduleEditor<'s, S>),
}

/// Working copy of one schedule plus the day currently shown.
///
/// Edits only touch the working copy. `save` and `delete` are the only
/// operations that reach the store, and both rewrite the full schedule list.
pub struct ScheduleEditor<'s, S: ScheduleStore + ?Sized> {
    store: &'s S,
    working: Schedule,
    committed: Schedule,
    selected_day: Weekday,
}

impl<'s, S: ScheduleStore + ?Sized> ScheduleEditor<'s, S> {
    /// Loads the schedule with `schedule_id`. Unreadable storage is treated
    /// the same as a missing record.
    pub fn load(store: &'s S, schedule_id: &str) -> Result<Self, EditorError> {
        let schedules = store.read_all().map_err(|e| {
            warn!(error = %e, schedule_id, "could not read schedules, treating as not found");
            EditorError::NotFound(schedule_id.to_string())
        })?;
        let schedule = schedules
            .into_iter()
            .find(|s| s.id == schedule_id)
            .ok_or_else(|| EditorError::NotFound(schedule_id.to_string()))?;

        let selected_day = schedule.exercises.first_active_day().unwrap_or_default();
        debug!(schedule_id, %selected_day, "loaded schedule into editor");
        Ok(Self {
            store,
            committed: schedule.clone(),
            working: schedule,
            selected_day,
        })
    }

    pub const fn schedule(&self) -> &Schedule {
        &self.working
    }

    pub const fn selected_day(&self) -> Weekday {
        self.selected_day
    }

    pub fn select_day(&mut self, day: Weekday) {
        self.selected_day = day;
    }

    pub fn exercises_for(&self, day: Weekday) -> &[ScheduleExercise] {
        &self.working.exercises[day]
    }

    pub fn selected_exercises(&self) -> &[ScheduleExercise] {
        self.exercises_for(self.selected_day)
    }

    /// True when the working copy differs from what was last loaded or saved.
    pub fn is_dirty(&self) -> bool {
        self.working != self.committed
    }

    /// # Errors
    /// `ValidationFailed` if the trimmed name is empty.
    pub fn rename(&mut self, name: &str) -> Result<(), EditorError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(EditorError::ValidationFailed(
                "Schedule name cannot be empty.".to_string(),
            ));
        }
        self.working.name = trimmed.to_string();
        Ok(())
    }

    /// Appends a snapshot of `exercise` to `day` and returns the new entry's id.
    /// Adding the same catalog exercise twice creates two independent entries.
    pub fn add_exercise(
        &mut self,
        day: Weekday,
        exercise: &CatalogExercise,
        sets: Option<u32>,
        reps: Option<u32>,
    ) -> String {
        let entry = ScheduleExercise::from_catalog(
            exercise,
            sets.unwrap_or(DEFAULT_SETS),
            reps.unwrap_or(DEFAULT_REPS),
        );
        let id = entry.id.clone();
        debug!(%day, exercise = %entry.name, entry_id = %id, "added exercise");
        self.working.exercises[day].push(entry);
        id
    }

    /// Merges `patch` into the entry with `exercise_id` on `day`. Returns
    /// false, and changes nothing, when there is no such entry.
    pub fn update_exercise(
        &mut self,
        day: Weekday,
        exercise_id: &str,
        patch: ExercisePatch,
    ) -> bool {
        match self.working.exercises[day]
            .iter_mut()
            .find(|e| e.id == exercise_id)
        {
            Some(entry) => {
                entry.apply(patch);
                true
            }
            None => {
                debug!(%day, exercise_id, "update ignored, entry not on this day");
                false
            }
        }
    }

    /// Removes the entry with `exercise_id` from `day`. Returns whether
    /// anything was removed.
    pub fn remove_exercise(&mut self, day: Weekday, exercise_id: &str) -> bool {
        let exercises = &mut self.working.exercises[day];
        let before = exercises.len();
        exercises.retain(|e| e.id != exercise_id);
        before != exercises.len()
    }

    /// Recomputes the active days, stamps `updated_at` and writes the full
    /// schedule list back.
    ///
    /// # Errors
    /// - `ValidationFailed` when no day has an exercise; the store is not touched.
    /// - `NotFound` when the record was removed from the store since `load`;
    ///   nothing is written.
    /// - `PersistenceFailed` when reading or writing the list fails; the
    ///   working copy is left as it was.
    pub fn save(&mut self) -> Result<&Schedule, EditorError> {
        if !self.working.has_exercises() {
            warn!(schedule_id = %self.working.id, "refusing to save schedule without exercises");
            return Err(EditorError::ValidationFailed(
                "Add at least one exercise to a day before saving.".to_string(),
            ));
        }

        let mut candidate = self.working.clone();
        candidate.refresh_days();
        candidate.updated_at = Utc::now();

        let mut schedules = self.store.read_all()?;
        let Some(slot) = schedules.iter_mut().find(|s| s.id == candidate.id) else {
            warn!(schedule_id = %candidate.id, "schedule missing from store, not saving");
            return Err(EditorError::NotFound(candidate.id));
        };
        *slot = candidate.clone();
        self.store.write_all(&schedules)?;

        info!(schedule_id = %candidate.id, days = ?candidate.days, "saved schedule");
        self.committed = candidate.clone();
        self.working = candidate;
        Ok(&self.working)
    }

    /// Removes the schedule from the store after `confirm` agrees. The editor
    /// is consumed; it comes back only when the delete is cancelled or fails.
    ///
    /// # Errors
    /// `PersistenceFailed` if the list can't be read or rewritten, paired with
    /// the untouched editor so the caller can retry.
    pub fn delete<C: Confirm + ?Sized>(
        self,
        confirm: &mut C,
    ) -> Result<DeleteOutcome<'s, S>, (Self, EditorError)> {
        let message = format!(
            "Delete schedule '{}'? This cannot be undone.",
            self.working.name
        );
        if !confirm.confirm(&message) {
            debug!(schedule_id = %self.working.id, "delete cancelled");
            return Ok(DeleteOutcome::Cancelled(self));
        }

        let mut schedules = match self.store.read_all() {
            Ok(schedules) => schedules,
            Err(e) => return Err((self, e.into())),
        };
        schedules.retain(|s| s.id != self.working.id);
        if let Err(e) = self.store.write_all(&schedules) {
            return Err((self, e.into()));
        }
        info!(schedule_id = %self.working.id, "deleted schedule");
        Ok(DeleteOutcome::Deleted)
    }
}
