use crate::models::task::Task;

/// Distinct non-empty tags in order of first appearance.
pub fn distinct_tags(tasks: &[Task]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    for tag in tasks
        .iter()
        .filter_map(|task| task.tag.as_deref())
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
    {
        if !tags.iter().any(|known| known == tag) {
            tags.push(tag.to_string());
        }
    }

    tags
}

/// Number of tasks carrying each tag, in the order of `distinct_tags`.
pub fn tag_counts(tasks: &[Task]) -> Vec<(String, usize)> {
    distinct_tags(tasks)
        .into_iter()
        .map(|tag| {
            let count = tasks.iter().filter(|task| task.has_tag(&tag)).count();
            (tag, count)
        })
        .collect()
}
