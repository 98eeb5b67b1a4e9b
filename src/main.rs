use std::{fmt::Display, path::PathBuf};

use clap::{Parser, Subcommand};
use colored::*;
use jiff::civil::DateTime;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::{
    config::Config,
    models::task::TaskId,
    repository::TaskRepository,
    services::{
        confirm::{AssumeYes, Confirm},
        tags::{distinct_tags, tag_counts},
        tasks::{
            AddTaskError, AddTaskParameters, ClearOutcome, DeleteOutcome, EditTaskError,
            EditTaskParameters, add_task, clear_all_tasks, delete_task, edit_task,
        },
        view::compute_view,
    },
    storage::{Storage, json::JsonFileStorage},
    ui::TerminalConfirm,
};

mod config;
mod models;
mod repository;
mod services;
mod storage;
mod ui;

#[derive(Parser)]
#[command(
    name = "todos",
    about = "A small to-do list with tags, deadlines and pinned tasks"
)]
struct Cli {
    /// Path of the task store
    #[arg(long, global = true, env = "TODOS_STORE")]
    store: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    yes: bool,

    /// Days a task may stay overdue before it is removed
    #[arg(
        long,
        global = true,
        env = "TODOS_EXPIRY_THRESHOLD_DAYS",
        value_parser = clap::value_parser!(i64).range(0..)
    )]
    expiry_threshold_days: Option<i64>,

    /// Seconds between sweeps in watch mode
    #[arg(
        long,
        global = true,
        env = "TODOS_SWEEP_INTERVAL_SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    sweep_interval_secs: Option<u64>,

    /// Deadlines this many days away are highlighted
    #[arg(long, global = true, env = "TODOS_DUE_SOON_DAYS")]
    due_soon_days: Option<i64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show tasks, pinned and urgent ones first
    List {
        /// Only show tasks containing this text
        #[arg(short, long, default_value = "")]
        search: String,

        /// Only show tasks with this tag
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Add a new task
    Add {
        /// What needs doing
        text: String,

        /// Label the task
        #[arg(short, long)]
        tag: Option<String>,

        /// Deadline as YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        deadline: Option<String>,

        /// Do not set a deadline
        #[arg(long, conflicts_with = "deadline")]
        no_deadline: bool,
    },

    /// Edit a task
    Edit {
        /// Task id
        id: TaskId,

        /// New text
        #[arg(long)]
        text: Option<String>,

        /// New tag (an empty value removes it)
        #[arg(short, long)]
        tag: Option<String>,

        /// New deadline as YYYY-MM-DD
        #[arg(short, long)]
        deadline: Option<String>,

        /// Remove the deadline
        #[arg(long, conflicts_with = "deadline")]
        no_deadline: bool,
    },

    /// Delete a task
    Delete { id: TaskId },

    /// Mark a task as done, or as not done if it already is
    Done { id: TaskId },

    /// Pin a task to the top, or unpin it
    Pin { id: TaskId },

    /// Delete every task
    Clear,

    /// List the tags in use
    Tags,

    /// Remove tasks overdue for longer than the expiry threshold
    Sweep,

    /// Keep the list on screen, sweeping and refreshing periodically
    Watch {
        /// Only show tasks containing this text
        #[arg(short, long, default_value = "")]
        search: String,

        /// Only show tasks with this tag
        #[arg(short, long)]
        tag: Option<String>,
    },
}

fn report(context: &str, error: impl Display) {
    eprintln!("Error: {}: {}", context, error);
}

fn fail(context: &str, error: impl Display) -> ! {
    report(context, error);
    std::process::exit(1);
}

fn now() -> DateTime {
    jiff::Zoned::now().datetime()
}

fn report_missing(id: TaskId) {
    println!("{}", format!("No task with id {}", id).yellow());
}

fn show_list<S: Storage>(
    repository: &TaskRepository<S>,
    config: &Config,
    search: &str,
    tag: Option<&str>,
    now: DateTime,
) {
    let tag = tag.filter(|t| !t.is_empty());
    if let Some(tag) = tag {
        let available = distinct_tags(repository.tasks());
        if !available.iter().any(|known| known == tag) {
            println!("No tasks with tag '{}'", tag);
            if !available.is_empty() {
                println!("\nAvailable tags:");
                for known in available {
                    println!("  - {}", known);
                }
            }
            return;
        }
    }

    let view = compute_view(repository.tasks(), search, tag, now);
    let title = match tag {
        Some(tag) => format!("#{}", tag),
        None => String::from("To-do"),
    };

    ui::render_view(&view, &title, now, config.due_soon_days);
    ui::render_search_status(search, view.len());
}

/// Sweeps overdue tasks and reports them. Returns whether saving failed.
fn sweep<S: Storage>(
    repository: &mut TaskRepository<S>,
    config: &Config,
    now: DateTime,
) -> bool {
    match repository.sweep_expired(now, config.expiry_threshold_days) {
        Ok(removed) => {
            for task in &removed {
                println!(
                    "{}",
                    format!(
                        "Removed \"{}\" (overdue for more than {} days)",
                        task.text, config.expiry_threshold_days
                    )
                    .dimmed()
                );
            }
            false
        }
        Err(e) => {
            report("Failed to save after removing overdue tasks", e);
            true
        }
    }
}

fn watch<S: Storage>(
    repository: &mut TaskRepository<S>,
    config: &Config,
    search: &str,
    tag: Option<&str>,
) -> ! {
    loop {
        let now = now();
        if let Err(e) = repository.refresh(now, config.expiry_threshold_days) {
            error!(error = %e, "failed to refresh tasks");
        }

        // Clear the screen and move the cursor home
        print!("\x1B[2J\x1B[H");
        show_list(repository, config, search, tag, now);
        println!(
            "  {}",
            format!(
                "Refreshing every {}s, press Ctrl-C to stop",
                config.sweep_interval.as_secs()
            )
            .dimmed()
        );

        std::thread::sleep(config.sweep_interval);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::from_overrides(
        cli.store,
        cli.expiry_threshold_days,
        cli.sweep_interval_secs,
        cli.due_soon_days,
        cli.yes,
    );

    let storage = JsonFileStorage::new(config.store_path.clone());
    let mut repository = match TaskRepository::open(storage) {
        Ok(repository) => repository,
        Err(e) => fail("Failed to load tasks", e),
    };

    let mut confirm: Box<dyn Confirm> = if config.assume_yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalConfirm)
    };

    let now = now();
    let today = now.date();

    // A failed save is reported and retried once on close before exiting
    let mut save_failed = false;

    // Overdue tasks are swept on every start, before anything is shown
    if !matches!(cli.command, Some(Commands::Sweep) | Some(Commands::Watch { .. })) {
        save_failed |= sweep(&mut repository, &config, now);
    }

    match cli.command {
        None => show_list(&repository, &config, "", None, now),
        Some(Commands::List { search, tag }) => {
            show_list(&repository, &config, &search, tag.as_deref(), now)
        }
        Some(Commands::Add {
            text,
            tag,
            deadline,
            no_deadline,
        }) => {
            let params = AddTaskParameters {
                text,
                tag,
                deadline,
                no_deadline,
            };
            match add_task(&mut repository, params, today) {
                Ok(Some(task)) => println!("✓ Added {}: {}", task.id, task.text.bold()),
                Ok(None) => fail("Failed to add task", "no task id is available"),
                Err(AddTaskError::Form(e)) => fail("Invalid task", e),
                Err(AddTaskError::Storage(e)) => {
                    report("Failed to save task", e);
                    save_failed = true;
                }
            }
        }
        Some(Commands::Edit {
            id,
            text,
            tag,
            deadline,
            no_deadline,
        }) => {
            let params = EditTaskParameters {
                id,
                text,
                tag,
                deadline,
                no_deadline,
            };
            match edit_task(&mut repository, params, today) {
                Ok(Some(task)) => println!("✓ Updated {}: {}", task.id, task.text.bold()),
                Ok(None) => report_missing(id),
                Err(EditTaskError::Form(e)) => fail("Invalid task", e),
                Err(EditTaskError::Storage(e)) => {
                    report("Failed to save task", e);
                    save_failed = true;
                }
            }
        }
        Some(Commands::Delete { id }) => match delete_task(&mut repository, &mut confirm, id) {
            Ok(DeleteOutcome::Deleted(task)) => println!("✓ Deleted: {}", task.text),
            Ok(DeleteOutcome::Declined) => println!("Nothing deleted"),
            Ok(DeleteOutcome::NotFound) => report_missing(id),
            Err(e) => {
                report("Failed to delete task", e);
                save_failed = true;
            }
        },
        Some(Commands::Done { id }) => match repository.toggle_completed(id) {
            Ok(Some(task)) if task.completed => println!("✓ Completed: {}", task.text),
            Ok(Some(task)) => println!("○ Reopened: {}", task.text),
            Ok(None) => report_missing(id),
            Err(e) => {
                report("Failed to save task", e);
                save_failed = true;
            }
        },
        Some(Commands::Pin { id }) => match repository.toggle_pinned(id) {
            Ok(Some(task)) if task.is_pinned => println!("★ Pinned: {}", task.text),
            Ok(Some(task)) => println!("Unpinned: {}", task.text),
            Ok(None) => report_missing(id),
            Err(e) => {
                report("Failed to save task", e);
                save_failed = true;
            }
        },
        Some(Commands::Clear) => match clear_all_tasks(&mut repository, &mut confirm) {
            Ok(ClearOutcome::Cleared(count)) => {
                println!("✓ Cleared {} {}", count, if count == 1 { "task" } else { "tasks" })
            }
            Ok(ClearOutcome::Declined) => println!("Nothing cleared"),
            Ok(ClearOutcome::AlreadyEmpty) => println!("There are no tasks to clear"),
            Err(e) => {
                report("Failed to clear tasks", e);
                save_failed = true;
            }
        },
        Some(Commands::Tags) => ui::render_tags(&tag_counts(repository.tasks())),
        Some(Commands::Sweep) => {
            let before = repository.len();
            save_failed |= sweep(&mut repository, &config, now);
            let removed = before - repository.len();
            if removed == 0 {
                println!("No tasks overdue for more than {} days", config.expiry_threshold_days);
            }
        }
        Some(Commands::Watch { search, tag }) => {
            watch(&mut repository, &config, &search, tag.as_deref())
        }
    }

    match repository.close() {
        Err(e) => fail("Failed to save tasks", e),
        Ok(()) if save_failed => eprintln!("Changes were saved on a second attempt"),
        Ok(()) => {}
    }
}
