use jiff::civil::Date;
use thiserror::Error;

use crate::models::task::{Task, normalize_tag};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Task text cannot be empty")]
    EmptyText,

    #[error("Invalid deadline date '{0}': {1}")]
    InvalidDeadline(String, String),

    #[error("Deadline {deadline} is before the earliest allowed date {minimum}")]
    DeadlineBeforeMinimum { deadline: Date, minimum: Date },
}

/// Validated values ready to be handed to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInput {
    pub text: String,
    pub tag: Option<String>,
    pub deadline: Option<Date>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// The create/edit form for a task.
///
/// A form is either submitted, producing a [`TaskInput`], or dropped, which
/// discards it.
#[derive(Debug, Clone)]
pub struct TaskForm {
    mode: FormMode,
    text: String,
    tag: String,
    deadline: Option<Date>,
    min_deadline: Option<Date>,
}

impl TaskForm {
    /// An empty form whose deadline defaults to, and cannot be earlier than, `today`.
    pub fn create(today: Date) -> Self {
        Self {
            mode: FormMode::Create,
            text: String::new(),
            tag: String::new(),
            deadline: Some(today),
            min_deadline: Some(today),
        }
    }

    /// A form pre-filled with the task's values. A missing deadline defaults
    /// to `today`.
    pub fn edit(task: &Task, today: Date) -> Self {
        Self {
            mode: FormMode::Edit,
            text: task.text.clone(),
            tag: task.tag.clone().unwrap_or_default(),
            deadline: Some(task.deadline.unwrap_or(today)),
            min_deadline: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_deadline(mut self, deadline: Date) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn without_deadline(mut self) -> Self {
        self.deadline = None;
        self
    }

    pub fn submit(self) -> Result<TaskInput, FormError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(FormError::EmptyText);
        }

        if self.mode == FormMode::Create
            && let (Some(deadline), Some(minimum)) = (self.deadline, self.min_deadline)
            && deadline < minimum
        {
            return Err(FormError::DeadlineBeforeMinimum { deadline, minimum });
        }

        Ok(TaskInput {
            text: text.to_string(),
            tag: normalize_tag(Some(&self.tag)),
            deadline: self.deadline,
        })
    }
}

/// Parses a `YYYY-MM-DD` deadline.
pub fn parse_deadline(value: &str) -> Result<Date, FormError> {
    value
        .trim()
        .parse::<Date>()
        .map_err(|e| FormError::InvalidDeadline(value.to_string(), e.to_string()))
}

#[cfg(test)]
impl TaskForm {
    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn deadline(&self) -> Option<Date> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;
    use jiff::civil::date;

    fn today() -> Date {
        date(2026, 10, 19)
    }

    #[test]
    fn test_create_form_defaults() {
        let form = TaskForm::create(today());

        assert_eq!(form.mode(), FormMode::Create);
        assert_eq!(form.text(), "");
        assert_eq!(form.tag(), "");
        assert_eq!(form.deadline(), Some(today()));
    }

    #[test]
    fn test_submit_trims_and_normalizes() {
        let input = TaskForm::create(today())
            .with_text("  Buy milk  ")
            .with_tag("   ")
            .submit()
            .unwrap();

        assert_eq!(
            input,
            TaskInput {
                text: String::from("Buy milk"),
                tag: None,
                deadline: Some(today()),
            }
        );
    }

    #[test]
    fn test_submit_rejects_empty_text() {
        let result = TaskForm::create(today()).with_text("   ").submit();

        assert_eq!(result, Err(FormError::EmptyText));
    }

    #[test]
    fn test_create_rejects_past_deadline() {
        let result = TaskForm::create(today())
            .with_text("Late")
            .with_deadline(date(2026, 10, 18))
            .submit();

        assert!(matches!(
            result,
            Err(FormError::DeadlineBeforeMinimum { .. })
        ));
    }

    #[test]
    fn test_create_without_deadline() {
        let input = TaskForm::create(today())
            .with_text("Whenever")
            .without_deadline()
            .submit()
            .unwrap();

        assert_eq!(input.deadline, None);
    }

    #[test]
    fn test_edit_form_is_prefilled() {
        let mut task = Task::new(
            1,
            String::from("Call mom"),
            Some(String::from("family")),
            Some(date(2026, 10, 1)),
            Timestamp::UNIX_EPOCH,
        );

        let form = TaskForm::edit(&task, today());
        assert_eq!(form.mode(), FormMode::Edit);
        assert_eq!(form.text(), "Call mom");
        assert_eq!(form.tag(), "family");
        assert_eq!(form.deadline(), Some(date(2026, 10, 1)));

        // Editing keeps an overdue deadline valid.
        assert!(form.submit().is_ok());

        task.deadline = None;
        task.tag = None;
        let form = TaskForm::edit(&task, today());
        assert_eq!(form.tag(), "");
        assert_eq!(form.deadline(), Some(today()));
    }

    #[test]
    fn test_parse_deadline() {
        assert_eq!(parse_deadline("2026-10-20"), Ok(date(2026, 10, 20)));
        assert!(matches!(
            parse_deadline("next week"),
            Err(FormError::InvalidDeadline(..))
        ));
        assert!(matches!(
            parse_deadline("2026-02-30"),
            Err(FormError::InvalidDeadline(..))
        ));
    }
}
