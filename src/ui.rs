use std::io::{self, BufRead, Write};

use colored::*;
use jiff::civil::DateTime;

use crate::{
    models::{
        expiry::{ExpiryStatus, classify},
        task::Task,
    },
    services::confirm::Confirm,
};

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Get the appropriate status glyph for a task
pub fn get_status_glyph(task: &Task, expiry: Option<ExpiryStatus>) -> ColoredString {
    if task.completed {
        "✓".dimmed()
    } else if expiry.is_some_and(|status| status.is_expired) {
        "●".red()
    } else {
        "○".normal()
    }
}

/// Human-readable deadline annotation, e.g. "2026-10-21 (due in 2 days)"
pub fn describe_deadline(task: &Task, now: DateTime, due_soon_days: i64) -> Option<String> {
    let deadline = task.deadline?;
    let status = classify(Some(deadline), now)?;
    let date = deadline.strftime("%Y-%m-%d").to_string();

    let described = if status.is_today {
        format!("{} (due today)", date)
    } else if status.is_expired {
        let days = status.days_overdue();
        let unit = if days == 1 { "day" } else { "days" };
        format!("{} (overdue by {} {})", date, days, unit)
    } else if status.days_remaining == 1 {
        format!("{} (due tomorrow)", date)
    } else if status.is_due_soon(due_soon_days) {
        format!("{} (due in {} days)", date, status.days_remaining)
    } else {
        date
    };

    Some(described)
}

fn style_deadline(text: &str, status: ExpiryStatus, due_soon_days: i64) -> ColoredString {
    if status.is_today {
        text.yellow().bold()
    } else if status.is_expired {
        text.red()
    } else if status.is_due_soon(due_soon_days) {
        text.yellow()
    } else {
        text.normal()
    }
}

/// Render a single task line with ID, glyph, text, and right-aligned tag and deadline
pub fn render_task_line(task: &Task, now: DateTime, due_soon_days: i64) {
    let terminal_width = get_terminal_width();
    let expiry = classify(task.deadline, now);

    let pin = if task.is_pinned { "★" } else { " " };
    let id_str = task.id.to_string();
    let glyph = get_status_glyph(task, expiry);

    let left_section = format!("  {} {}  {}  {}", pin, id_str.dimmed(), glyph, task.text);
    let left_visible_len = format!("  {} {}  {}  {}", pin, id_str, " ", task.text)
        .chars()
        .count();

    let styled_left = if task.completed {
        left_section.dimmed()
    } else if task.is_pinned {
        left_section.bold()
    } else {
        left_section.normal()
    };

    let mut right_plain = vec![];
    let mut right_styled = vec![];
    if let Some(tag) = &task.tag {
        let tag = format!("#{}", tag);
        right_plain.push(tag.clone());
        right_styled.push(tag.blue().to_string());
    }
    if let (Some(deadline), Some(status)) = (describe_deadline(task, now, due_soon_days), expiry) {
        right_styled.push(style_deadline(&deadline, status, due_soon_days).to_string());
        right_plain.push(deadline);
    }

    if right_plain.is_empty() {
        println!("{}", styled_left);
        return;
    }

    let separator = format!("  {}  ", "·".dimmed());
    let right_visible_len = right_plain.join("  ·  ").chars().count();
    let total_content = left_visible_len + right_visible_len;

    if total_content + 4 < terminal_width {
        let padding = terminal_width - total_content - 2;
        println!(
            "{}{}{}",
            styled_left,
            " ".repeat(padding),
            right_styled.join(&separator)
        );
    } else {
        // Not enough space for right alignment, put the details underneath
        println!("{}", styled_left);
        println!("        {}", right_styled.join(&separator));
    }
}

/// Render a view header with title and count
pub fn render_view_header(title: &str, count: usize) {
    let task_word = if count == 1 { "task" } else { "tasks" };
    println!("\n  {} ({} {})\n", title.cyan().bold(), count, task_word);
}

/// Render the computed view, or the empty state when nothing matches
pub fn render_view(view: &[&Task], title: &str, now: DateTime, due_soon_days: i64) {
    if view.is_empty() {
        render_empty_state();
        return;
    }

    render_view_header(title, view.len());
    for task in view {
        render_task_line(task, now, due_soon_days);
    }
    println!();
}

pub fn render_empty_state() {
    println!("\n  {}\n", "Nothing to do. Add a task with `todos add`.".dimmed());
}

/// Render how many tasks a search matched
pub fn render_search_status(search_term: &str, result_count: usize) {
    if search_term.is_empty() {
        return;
    }

    if result_count > 0 {
        let result_word = if result_count == 1 {
            "result"
        } else {
            "results"
        };
        println!(
            "  {}",
            format!("Found {} {} for \"{}\"", result_count, result_word, search_term).green()
        );
    } else {
        println!(
            "  {}",
            format!("No matches for \"{}\"", search_term).yellow()
        );
    }
}

/// Render the tag list with per-tag task counts
pub fn render_tags(tags: &[(String, usize)]) {
    if tags.is_empty() {
        println!("No tags yet");
        return;
    }

    println!(
        "{} ({} {})\n",
        "TAGS".cyan(),
        tags.len(),
        if tags.len() == 1 { "tag" } else { "tags" }
    );

    for (tag, count) in tags {
        println!(
            "  {} {} {}",
            "•".green(),
            tag.bold(),
            format!("({} {})", count, if *count == 1 { "task" } else { "tasks" }).dimmed()
        );
    }
}

/// Asks on stdout and reads the answer from stdin. Anything other than
/// `y`/`yes` (including end of input) counts as no.
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, message: &str) -> bool {
        print!("{} {} ", message.bold(), "[y/N]".dimmed());
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_yes(&answer),
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
