use jiff::civil::Date;
use thiserror::Error;

use crate::{
    models::task::{Task, TaskId},
    repository::TaskRepository,
    services::{
        confirm::Confirm,
        form::{FormError, TaskForm, parse_deadline},
    },
    storage::{Storage, StorageError},
};

#[derive(Debug, Error)]
pub enum AddTaskError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct AddTaskParameters {
    pub text: String,
    pub tag: Option<String>,
    pub deadline: Option<String>,
    pub no_deadline: bool,
}

/// Fills a fresh create form with the parameters and adds the submitted task.
pub fn add_task<S: Storage>(
    repository: &mut TaskRepository<S>,
    parameters: AddTaskParameters,
    today: Date,
) -> Result<Option<Task>, AddTaskError> {
    let form = fill_form(
        TaskForm::create(today).with_text(parameters.text),
        parameters.tag,
        parameters.deadline,
        parameters.no_deadline,
    )?;
    let input = form.submit()?;

    Ok(repository.add(&input.text, input.tag.as_deref(), input.deadline)?)
}

#[derive(Debug, Error)]
pub enum EditTaskError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct EditTaskParameters {
    pub id: TaskId,
    pub text: Option<String>,
    pub tag: Option<String>,
    pub deadline: Option<String>,
    pub no_deadline: bool,
}

/// Opens the edit form pre-filled with the task, applies the given changes and
/// saves the submitted values. Returns `None` when the task does not exist.
pub fn edit_task<S: Storage>(
    repository: &mut TaskRepository<S>,
    parameters: EditTaskParameters,
    today: Date,
) -> Result<Option<Task>, EditTaskError> {
    let Some(task) = repository.get(parameters.id) else {
        return Ok(None);
    };

    let mut form = TaskForm::edit(task, today);
    if let Some(text) = parameters.text {
        form = form.with_text(text);
    }
    let form = fill_form(
        form,
        parameters.tag,
        parameters.deadline,
        parameters.no_deadline,
    )?;
    let input = form.submit()?;

    Ok(repository.update(
        parameters.id,
        &input.text,
        input.tag.as_deref(),
        input.deadline,
    )?)
}

fn fill_form(
    mut form: TaskForm,
    tag: Option<String>,
    deadline: Option<String>,
    no_deadline: bool,
) -> Result<TaskForm, FormError> {
    if let Some(tag) = tag {
        form = form.with_tag(tag);
    }
    if no_deadline {
        form = form.without_deadline();
    } else if let Some(deadline) = deadline {
        form = form.with_deadline(parse_deadline(&deadline)?);
    }
    Ok(form)
}

#[derive(Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(Task),
    Declined,
    NotFound,
}

/// Deletes a task after the user confirms. A missing task is not asked about.
pub fn delete_task<S: Storage>(
    repository: &mut TaskRepository<S>,
    confirm: &mut impl Confirm,
    id: TaskId,
) -> Result<DeleteOutcome, StorageError> {
    let Some(task) = repository.get(id) else {
        return Ok(DeleteOutcome::NotFound);
    };

    if !confirm.confirm(&format!("Delete \"{}\"?", task.text)) {
        return Ok(DeleteOutcome::Declined);
    }

    Ok(match repository.delete(id)? {
        Some(task) => DeleteOutcome::Deleted(task),
        None => DeleteOutcome::NotFound,
    })
}

#[derive(Debug, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared(usize),
    Declined,
    AlreadyEmpty,
}

/// Removes every task after the user confirms. Nothing is asked when there
/// are no tasks.
pub fn clear_all_tasks<S: Storage>(
    repository: &mut TaskRepository<S>,
    confirm: &mut impl Confirm,
) -> Result<ClearOutcome, StorageError> {
    if repository.is_empty() {
        return Ok(ClearOutcome::AlreadyEmpty);
    }

    if !confirm.confirm("Clear all tasks? This cannot be undone!") {
        return Ok(ClearOutcome::Declined);
    }

    Ok(ClearOutcome::Cleared(repository.clear_all()?))
}
