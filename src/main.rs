//src/main.rs
mod cli;

use anyhow::{bail, Context, Result};
use chrono::Local;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::io::{self, stdin, stdout, Write};
use std::process::ExitCode;
use strum::IntoEnumIterator;
use tracing_subscriber::EnvFilter;

use workout_schedule_lib::{
    CatalogExercise, DeleteOutcome, EditorError, ExercisePatch, Schedule, ScheduleService,
    Severity, Weekday,
};

fn main() -> ExitCode {
    let cli_args = cli::parse_args();
    init_logging(cli_args.verbose);

    match run(cli_args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so table and CSV output stays clean.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli_args: cli::Cli) -> Result<()> {
    let export_csv = cli_args.export_csv;

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();
        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    let mut service =
        ScheduleService::initialize().context("Failed to initialize application service")?;

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            unreachable!("Completion generation should have exited already");
        }
        cli::Commands::Create { name } => {
            let schedule = service.create_schedule(name.as_deref())?;
            println!("Created schedule '{}' ID: {}", schedule.name, schedule.id);
            println!("Add exercises with: add {} --day Monday --exercise <name>", schedule.id);
        }
        cli::Commands::List => {
            let schedules = service.list_schedules()?;
            if export_csv {
                print_schedule_list_csv(&schedules)?;
            } else if schedules.is_empty() {
                println!("No schedules yet. Create one with 'create'.");
            } else {
                print_schedule_list_table(&schedules, service.config.header_color());
            }
        }
        cli::Commands::Show { id, day } => {
            let mut editor = match service.open_editor(&id) {
                Ok(editor) => editor,
                Err(e) => return report_editor_error(e),
            };
            let days: Vec<Weekday> = match day {
                Some(d) => {
                    editor.select_day(d);
                    vec![editor.selected_day()]
                }
                None => Weekday::iter().collect(),
            };
            if export_csv {
                print_schedule_csv(editor.schedule(), &days)?;
            } else {
                print_schedule(
                    editor.schedule(),
                    &days,
                    editor.selected_day(),
                    service.config.header_color(),
                );
            }
        }
        cli::Commands::Add {
            id,
            day,
            exercise,
            sets,
            reps,
        } => match service.add_to_schedule(&id, day, &exercise, sets, reps) {
            Ok(entry_id) => println!("Added '{}' to {day}. Entry ID: {entry_id}", exercise.trim()),
            Err(e) => match e.downcast::<EditorError>() {
                Ok(editor_err) => return report_editor_error(editor_err),
                Err(other) => bail!("Error adding exercise: {other:#}"),
            },
        },
        cli::Commands::Update {
            id,
            day,
            exercise_id,
            sets,
            reps,
        } => {
            let patch = ExercisePatch { sets, reps };
            if patch.is_empty() {
                bail!("Nothing to update. Pass --sets and/or --reps.");
            }
            let mut editor = match service.open_editor(&id) {
                Ok(editor) => editor,
                Err(e) => return report_editor_error(e),
            };
            if !editor.update_exercise(day, &exercise_id, patch) {
                println!("No exercise with ID {exercise_id} on {day}. Nothing changed.");
                return Ok(());
            }
            match editor.save() {
                Ok(_) => println!("Updated exercise {exercise_id} on {day}."),
                Err(e) => return report_editor_error(e),
            }
        }
        cli::Commands::Remove {
            id,
            day,
            exercise_id,
        } => {
            let mut editor = match service.open_editor(&id) {
                Ok(editor) => editor,
                Err(e) => return report_editor_error(e),
            };
            if !editor.remove_exercise(day, &exercise_id) {
                println!("No exercise with ID {exercise_id} on {day}. Nothing changed.");
                return Ok(());
            }
            match editor.save() {
                Ok(saved) => println!(
                    "Removed exercise {exercise_id} from {day}. Active days: {}",
                    format_days(&saved.days)
                ),
                Err(e) => return report_editor_error(e),
            }
        }
        cli::Commands::Rename { id, name } => {
            let mut editor = match service.open_editor(&id) {
                Ok(editor) => editor,
                Err(e) => return report_editor_error(e),
            };
            if let Err(e) = editor.rename(&name) {
                return report_editor_error(e);
            }
            match editor.save() {
                Ok(saved) => println!("Renamed schedule {} to '{}'.", saved.id, saved.name),
                Err(e) => return report_editor_error(e),
            }
        }
        cli::Commands::Delete { id, yes } => {
            let ask = service.config.confirm_delete && !yes;
            let editor = match service.open_editor(&id) {
                Ok(editor) => editor,
                Err(e) => return report_editor_error(e),
            };
            let mut confirm = |message: &str| !ask || prompt_yes_no(message);
            match editor.delete(&mut confirm) {
                Ok(DeleteOutcome::Deleted) => println!("Deleted schedule {id}."),
                Ok(DeleteOutcome::Cancelled(_)) => println!("Delete cancelled."),
                Err((_, e)) => return report_editor_error(e),
            }
        }
        cli::Commands::Catalog { query } => {
            let results = service.search_catalog(query.as_deref().unwrap_or(""));
            if export_csv {
                print_catalog_csv(&results)?;
            } else if results.is_empty() {
                println!("No exercises match.");
            } else {
                print_catalog_table(&results, service.config.header_color());
            }
        }
        cli::Commands::DbPath => {
            println!("Database file is located at: {:?}", service.get_db_path());
        }
        cli::Commands::ConfigPath => {
            println!("Config file is located at: {:?}", service.get_config_path());
        }
        cli::Commands::SetDefaultSets { sets } => match service.set_default_sets(sets) {
            Ok(()) => println!("Set default sets to {sets}. Config updated."),
            Err(e) => bail!("Error setting default sets: {e}"),
        },
        cli::Commands::SetDefaultReps { reps } => match service.set_default_reps(reps) {
            Ok(()) => println!("Set default reps to {reps}. Config updated."),
            Err(e) => bail!("Error setting default reps: {e}"),
        },
        cli::Commands::SetConfirmDelete { enabled } => match service.set_confirm_delete(enabled) {
            Ok(()) => println!(
                "Delete confirmation {}. Config updated.",
                if enabled { "enabled" } else { "disabled" }
            ),
            Err(e) => bail!("Error updating delete confirmation: {e}"),
        },
    }

    Ok(())
}

// --- CLI Specific Helper Functions ---

/// Prints an editor error at its severity. Validation problems are only
/// warnings; everything else fails the command.
fn report_editor_error(e: EditorError) -> Result<()> {
    match e.severity() {
        Severity::Info => {
            println!("{e}. Use 'list' to see available schedules.");
            bail!("schedule not found")
        }
        Severity::Warning => {
            println!("Warning: {e}");
            Ok(())
        }
        Severity::Error => bail!("{e}. Your changes were not saved; try again."),
    }
}

fn prompt_yes_no(message: &str) -> bool {
    print!("{message} (y/N): ");
    if stdout().flush().is_err() {
        return false;
    }
    let mut input = String::new();
    if stdin().read_line(&mut input).is_err() {
        return false;
    }
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

fn format_days(days: &[Weekday]) -> String {
    if days.is_empty() {
        "-".to_string()
    } else {
        days.iter()
            .map(|d| d.as_ref()[..3].to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn print_schedule_list_table(schedules: &[Schedule], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Name").fg(header_color),
            Cell::new("Days").fg(header_color),
            Cell::new("Exercises").fg(header_color),
            Cell::new("Updated").fg(header_color),
        ]);

    for schedule in schedules {
        table.add_row(vec![
            Cell::new(&schedule.id),
            Cell::new(&schedule.name),
            Cell::new(format_days(&schedule.days)),
            Cell::new(schedule.exercises.total_exercises().to_string()),
            Cell::new(
                schedule
                    .updated_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
            ),
        ]);
    }
    println!("{table}");
}

fn print_schedule(schedule: &Schedule, days: &[Weekday], selected: Weekday, header_color: Color) {
    println!("\n{} ({})", schedule.name, schedule.id);
    println!("Active days: {}", format_days(&schedule.days));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Day").fg(header_color),
            Cell::new("Entry ID").fg(header_color),
            Cell::new("Exercise").fg(header_color),
            Cell::new("Category").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new("Reps").fg(header_color),
        ]);

    for &day in days {
        let exercises = &schedule.exercises[day];
        let mut day_cell = Cell::new(day.to_string());
        if day == selected {
            day_cell = day_cell.add_attribute(Attribute::Bold);
        }
        if exercises.is_empty() {
            table.add_row(vec![
                day_cell,
                Cell::new("-"),
                Cell::new("Rest day"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
            ]);
            continue;
        }
        for (i, exercise) in exercises.iter().enumerate() {
            let day_label = if i == 0 { day_cell.clone() } else { Cell::new("") };
            table.add_row(vec![
                day_label,
                Cell::new(&exercise.id),
                Cell::new(&exercise.name),
                Cell::new(&exercise.category),
                Cell::new(exercise.sets.to_string()),
                Cell::new(exercise.reps.to_string()),
            ]);
        }
    }
    println!("{table}");
}

fn print_catalog_table(exercises: &[&CatalogExercise], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Name").fg(header_color),
            Cell::new("Body Part").fg(header_color),
            Cell::new("Equipment").fg(header_color),
            Cell::new("Muscles").fg(header_color),
        ]);

    for exercise in exercises {
        let mut muscles = vec![exercise.target.clone()];
        muscles.extend(exercise.secondary_muscles.iter().cloned());
        table.add_row(vec![
            Cell::new(&exercise.id),
            Cell::new(&exercise.name),
            Cell::new(&exercise.body_part),
            Cell::new(&exercise.equipment),
            Cell::new(muscles.join(", ")),
        ]);
    }
    println!("{table}");
}

fn print_schedule_list_csv(schedules: &[Schedule]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record([
        "ID",
        "Name",
        "Days",
        "Exercise_Count",
        "Created_Local",
        "Updated_Local",
    ])?;

    for schedule in schedules {
        let days: Vec<&str> = schedule.days.iter().map(|d| d.as_ref()).collect();
        writer.write_record(&[
            schedule.id.clone(),
            schedule.name.clone(),
            days.join(";"),
            schedule.exercises.total_exercises().to_string(),
            schedule.created_at.with_timezone(&Local).to_rfc3339(),
            schedule.updated_at.with_timezone(&Local).to_rfc3339(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_schedule_csv(schedule: &Schedule, days: &[Weekday]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record([
        "Schedule_ID",
        "Day",
        "Entry_ID",
        "Exercise",
        "Category",
        "Sets",
        "Reps",
    ])?;

    for &day in days {
        for exercise in &schedule.exercises[day] {
            writer.write_record(&[
                schedule.id.clone(),
                day.to_string(),
                exercise.id.clone(),
                exercise.name.clone(),
                exercise.category.clone(),
                exercise.sets.to_string(),
                exercise.reps.to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn print_catalog_csv(exercises: &[&CatalogExercise]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record([
        "ID",
        "Name",
        "Body_Part",
        "Equipment",
        "Target",
        "Secondary_Muscles",
    ])?;

    for exercise in exercises {
        let secondary = exercise.secondary_muscles.join(";");
        writer.write_record(&[
            exercise.id.as_str(),
            exercise.name.as_str(),
            exercise.body_part.as_str(),
            exercise.equipment.as_str(),
            exercise.target.as_str(),
            secondary.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
