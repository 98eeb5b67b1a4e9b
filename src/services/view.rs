use std::cmp::Ordering;

use jiff::civil::DateTime;

use crate::models::{
    expiry::{ExpiryStatus, classify},
    task::Task,
};

/// Builds the ordered list of tasks to display.
///
/// Tasks are filtered by a case-insensitive search on their text, then by an
/// exact tag (ignored when empty), then ordered:
///
/// 1. pinned before unpinned;
/// 2. expired deadlines first, the most overdue at the top;
/// 3. other deadlines, the soonest first;
/// 4. tasks without a deadline, the most recently created first.
///
/// The sort is stable, so ties keep collection order. The input slice is left
/// untouched.
pub fn compute_view<'a>(
    tasks: &'a [Task],
    search_term: &str,
    selected_tag: Option<&str>,
    now: DateTime,
) -> Vec<&'a Task> {
    let search_term = search_term.to_lowercase();
    let selected_tag = selected_tag.filter(|tag| !tag.is_empty());

    let mut entries: Vec<(&Task, Option<ExpiryStatus>)> = tasks
        .iter()
        .filter(|task| matches_search(task, &search_term))
        .filter(|task| selected_tag.is_none_or(|tag| task.has_tag(tag)))
        .map(|task| (task, classify(task.deadline, now)))
        .collect();

    entries.sort_by(|(a, a_expiry), (b, b_expiry)| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| compare_deadlines(a, *a_expiry, b, *b_expiry))
    });

    entries.into_iter().map(|(task, _)| task).collect()
}

/// `search_term` must already be lowercase.
fn matches_search(task: &Task, search_term: &str) -> bool {
    search_term.is_empty() || task.text.to_lowercase().contains(search_term)
}

fn compare_deadlines(
    a: &Task,
    a_expiry: Option<ExpiryStatus>,
    b: &Task,
    b_expiry: Option<ExpiryStatus>,
) -> Ordering {
    match (a_expiry, b_expiry) {
        (Some(a_status), Some(b_status)) => match (a_status.is_expired, b_status.is_expired) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => a_status.days_remaining.cmp(&b_status.days_remaining),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.created_at.cmp(&a.created_at),
    }
}
