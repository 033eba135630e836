use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::info;

// --- Declare modules ---
pub mod catalog;
mod config;
pub mod db;
pub mod editor;
pub mod schedule;
pub mod store;

// --- Expose public types ---
pub use catalog::{Catalog, CatalogError, CatalogExercise};
pub use config::{
    get_config_path as get_config_path_util, load as load_config_util, parse_color,
    save as save_config_util, Config, Error as ConfigError, StandardColor, Theme,
    DEFAULT_SCHEDULE_NAME,
};
pub use db::{get_db_path as get_db_path_util, DbError};
pub use editor::{Confirm, DeleteOutcome, EditorError, ScheduleEditor, Severity};
pub use schedule::{
    ExercisePatch, Schedule, ScheduleExercise, WeekPlan, Weekday, DEFAULT_REPS, DEFAULT_SETS,
    REP_CHOICES, SET_CHOICES,
};
pub use store::{MemoryStore, ScheduleStore, SqliteStore, StoreError, SCHEDULES_KEY};

pub struct AppService<S: ScheduleStore = SqliteStore> {
    pub config: Config,
    pub store: S,
    pub catalog: Catalog,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

/// The store-backed service the binary uses.
pub type ScheduleService = AppService<SqliteStore>;

impl AppService<SqliteStore> {
    /// Initializes the application service.
    /// # Errors
    /// Returns `anyhow::Error` if config/db path determination, loading, or initialization fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;

        let db_path = match &config.db_path {
            Some(path) => path.clone(),
            None => db::get_db_path().context("Failed to determine database path")?,
        };
        let conn = db::open_db(&db_path)
            .with_context(|| format!("Failed to open database at {db_path:?}"))?;
        let store = SqliteStore::new(conn).context("Failed to initialize database schema")?;

        let catalog = load_catalog(&config)?;

        Ok(Self {
            config,
            store,
            catalog,
            db_path,
            config_path,
        })
    }
}

/// Builds the catalog named in the config, or the built-in one.
/// # Errors
/// Returns `anyhow::Error` if the configured catalog file can't be read.
pub fn load_catalog(config: &Config) -> Result<Catalog> {
    match &config.catalog_path {
        Some(path) => Catalog::from_json_file(path)
            .with_context(|| format!("Failed to load exercise catalog from {path:?}")),
        None => Ok(Catalog::sample()),
    }
}

impl<S: ScheduleStore> AppService<S> {
    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save(&self.config_path, &self.config)
    }

    /// # Errors
    /// - `ConfigError::InvalidDefaultSets` if `sets` is outside the set menu.
    /// - `ConfigError` variants if saving fails.
    pub fn set_default_sets(&mut self, sets: u32) -> Result<(), ConfigError> {
        self.config.set_default_sets(sets)?;
        self.save_config()
    }

    /// # Errors
    /// - `ConfigError::InvalidDefaultReps` if `reps` is outside the rep menu.
    /// - `ConfigError` variants if saving fails.
    pub fn set_default_reps(&mut self, reps: u32) -> Result<(), ConfigError> {
        self.config.set_default_reps(reps)?;
        self.save_config()
    }

    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_confirm_delete(&mut self, enabled: bool) -> Result<(), ConfigError> {
        self.config.confirm_delete = enabled;
        self.save_config()
    }

    /// Creates an empty schedule and appends it to the stored list.
    /// A missing or blank name falls back to the configured placeholder.
    /// # Errors
    /// Returns `anyhow::Error` if the list can't be read or written.
    pub fn create_schedule(&self, name: Option<&str>) -> Result<Schedule> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(self.config.placeholder_name.as_str());
        let schedule = Schedule::new(name, Utc::now());

        let mut schedules = self
            .store
            .read_all()
            .context("Failed to read stored schedules")?;
        schedules.push(schedule.clone());
        self.store
            .write_all(&schedules)
            .context("Failed to store new schedule")?;

        info!(schedule_id = %schedule.id, name = %schedule.name, "created schedule");
        Ok(schedule)
    }

    /// All schedules in stored order.
    /// # Errors
    /// Returns `anyhow::Error` if the store can't be read.
    pub fn list_schedules(&self) -> Result<Vec<Schedule>> {
        self.store
            .read_all()
            .context("Failed to read stored schedules")
    }

    /// Opens an editor on the schedule with `schedule_id`.
    /// # Errors
    /// Returns `EditorError::NotFound` if there is no such schedule.
    pub fn open_editor(&self, schedule_id: &str) -> Result<ScheduleEditor<'_, S>, EditorError> {
        ScheduleEditor::load(&self.store, schedule_id.trim())
    }

    pub fn search_catalog(&self, query: &str) -> Vec<&CatalogExercise> {
        self.catalog.search(query)
    }

    /// Resolves a catalog id or name.
    /// # Errors
    /// Returns `anyhow::Error` if the identifier is empty or matches nothing.
    pub fn find_catalog_exercise(&self, identifier: &str) -> Result<&CatalogExercise> {
        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            bail!("Exercise identifier cannot be empty.");
        }
        self.catalog
            .find(trimmed)
            .with_context(|| format!("Exercise '{trimmed}' is not in the catalog"))
    }

    /// Adds a catalog exercise to `day`, using the configured defaults for
    /// any missing sets/reps, and saves. Returns the new entry's id.
    /// # Errors
    /// Returns `anyhow::Error` wrapping `EditorError` if loading or saving fails,
    /// or if the exercise isn't in the catalog.
    pub fn add_to_schedule(
        &self,
        schedule_id: &str,
        day: Weekday,
        exercise_identifier: &str,
        sets: Option<u32>,
        reps: Option<u32>,
    ) -> Result<String> {
        let exercise = self.find_catalog_exercise(exercise_identifier)?;
        let mut editor = self.open_editor(schedule_id)?;
        let entry_id = editor.add_exercise(
            day,
            exercise,
            Some(sets.unwrap_or(self.config.default_sets)),
            Some(reps.unwrap_or(self.config.default_reps)),
        );
        editor.save()?;
        Ok(entry_id)
    }
}
