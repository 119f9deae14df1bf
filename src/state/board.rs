//! Kanban board state: columns, tasks, comments, attachments.
//!
//! SYSTEM CONTEXT
//! ==============
//! There is no board backend yet. The store holds mock data and every action
//! awaits a configurable delay so callers exercise the same async flow they
//! will use once the board is served over HTTP.

#[cfg(test)]
#[path = "board_test.rs"]
mod board_test;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::net::types::UserId;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
    /// Hex color, e.g. `#4A90E2`.
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub user_id: UserId,
    pub text: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

impl Comment {
    /// New comment stamped with the current UTC time.
    #[must_use]
    pub fn new(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            id: format!("comment-{}", uuid::Uuid::new_v4()),
            user_id,
            text: text.into(),
            timestamp: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `YYYY-MM-DD`, if scheduled.
    #[serde(default)]
    pub due_date: Option<String>,
    /// Completion percentage, 0..=100.
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub name: String,
    pub tasks: Vec<Task>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    pub columns: Vec<Column>,
}

/// Fields for a task created in a column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: Option<String>,
    pub priority: Priority,
    pub assigned_to: Option<UserId>,
    pub labels: Vec<Label>,
}

/// Partial update of the task with `id`. `None` leaves a field unchanged;
/// `assigned_to: Some(None)` unassigns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub progress: Option<u8>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<Option<UserId>>,
    pub labels: Option<Vec<Label>>,
}

impl TaskPatch {
    fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(progress) = self.progress {
            task.progress = clamp_progress(progress);
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(assigned_to) = self.assigned_to {
            task.assigned_to = assigned_to;
        }
        if let Some(labels) = self.labels {
            task.labels = labels;
        }
    }
}

fn clamp_progress(progress: u8) -> u8 {
    progress.min(100)
}

// =============================================================================
// SAMPLE DATA
// =============================================================================

fn label(text: &str, color: &str) -> Label {
    Label { text: text.to_owned(), color: color.to_owned() }
}

impl Board {
    /// The demo board shown before a board backend exists.
    #[must_use]
    pub fn sample() -> Self {
        let todo = Column {
            id: "col-1".to_owned(),
            name: "To Do".to_owned(),
            tasks: vec![
                Task {
                    id: "task-1".to_owned(),
                    title: "Setup project structure".to_owned(),
                    description: "Create the initial file and folder structure for the project.".to_owned(),
                    due_date: Some("2024-06-15".to_owned()),
                    progress: 100,
                    priority: Priority::Medium,
                    assigned_to: Some(UserId::from(2)),
                    labels: vec![label("Setup", "#4A90E2")],
                    comments: vec![Comment {
                        id: "comment-1".to_owned(),
                        user_id: UserId::from(1),
                        text: "Initial setup complete.".to_owned(),
                        timestamp: "2024-06-14T10:00:00Z".to_owned(),
                    }],
                    attachments: Vec::new(),
                },
                Task {
                    id: "task-2".to_owned(),
                    title: "Create basic components".to_owned(),
                    description: "Build the basic components like Board, Column, and TaskCard.".to_owned(),
                    due_date: Some("2024-06-18".to_owned()),
                    progress: 80,
                    priority: Priority::Low,
                    assigned_to: Some(UserId::from(2)),
                    labels: vec![label("Frontend", "#50E3C2")],
                    comments: Vec::new(),
                    attachments: Vec::new(),
                },
            ],
        };
        let in_progress = Column {
            id: "col-2".to_owned(),
            name: "In Progress".to_owned(),
            tasks: vec![Task {
                id: "task-3".to_owned(),
                title: "Design the UI".to_owned(),
                description: "Create mockups and design system for the application.".to_owned(),
                due_date: Some("2024-06-25".to_owned()),
                progress: 40,
                priority: Priority::High,
                assigned_to: Some(UserId::from(1)),
                labels: vec![label("Design", "#9013FE"), label("Urgent", "#D0021B")],
                comments: Vec::new(),
                attachments: Vec::new(),
            }],
        };
        let done = Column { id: "col-3".to_owned(), name: "Done".to_owned(), tasks: Vec::new() };

        Self { id: "board-1".to_owned(), name: "My Project Board".to_owned(), columns: vec![todo, in_progress, done] }
    }

    #[must_use]
    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.columns.iter().flat_map(|c| c.tasks.iter()).find(|t| t.id == task_id)
    }

    fn find_task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.columns.iter_mut().flat_map(|c| c.tasks.iter_mut()).find(|t| t.id == task_id)
    }

    /// Tasks assigned to `user_id`, in column order.
    #[must_use]
    pub fn tasks_assigned_to(&self, user_id: &UserId) -> Vec<&Task> {
        self.columns
            .iter()
            .flat_map(|c| c.tasks.iter())
            .filter(|t| t.assigned_to.as_ref() == Some(user_id))
            .collect()
    }
}

// =============================================================================
// STORE
// =============================================================================

pub struct BoardStore {
    board: Board,
    latency: Duration,
}

impl BoardStore {
    #[must_use]
    pub fn new(board: Board, latency: Duration) -> Self {
        Self { board, latency }
    }

    /// Store seeded with [`Board::sample`].
    #[must_use]
    pub fn sample(latency: Duration) -> Self {
        Self::new(Board::sample(), latency)
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    pub async fn fetch_board(&self) -> Board {
        self.simulate_latency().await;
        self.board.clone()
    }

    /// Append a new task to `column_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::ColumnNotFound`] for an unknown column.
    pub async fn add_task(&mut self, column_id: &str, new_task: NewTask) -> Result<Task, BoardError> {
        self.simulate_latency().await;
        let column = self
            .board
            .columns
            .iter_mut()
            .find(|c| c.id == column_id)
            .ok_or_else(|| BoardError::ColumnNotFound(column_id.to_owned()))?;

        let task = Task {
            id: format!("task-{}", uuid::Uuid::new_v4()),
            title: new_task.title,
            description: new_task.description,
            due_date: new_task.due_date,
            progress: 0,
            priority: new_task.priority,
            assigned_to: new_task.assigned_to,
            labels: new_task.labels,
            comments: Vec::new(),
            attachments: Vec::new(),
        };
        column.tasks.push(task.clone());
        tracing::debug!(task_id = %task.id, column_id, "task added");
        Ok(task)
    }

    /// Merge `patch` into the task it names, wherever that task lives.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for an unknown task.
    pub async fn update_task(&mut self, patch: TaskPatch) -> Result<Task, BoardError> {
        self.simulate_latency().await;
        let task = self
            .board
            .find_task_mut(&patch.id)
            .ok_or_else(|| BoardError::TaskNotFound(patch.id.clone()))?;
        patch.apply(task);
        Ok(task.clone())
    }

    /// Add a comment; newest comments come first.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for an unknown task.
    pub async fn add_comment(&mut self, task_id: &str, comment: Comment) -> Result<Task, BoardError> {
        self.simulate_latency().await;
        let task = self
            .board
            .find_task_mut(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_owned()))?;
        task.comments.insert(0, comment);
        Ok(task.clone())
    }

    /// Append an attachment.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::TaskNotFound`] for an unknown task.
    pub async fn add_attachment(&mut self, task_id: &str, attachment: Attachment) -> Result<Task, BoardError> {
        self.simulate_latency().await;
        let task = self
            .board
            .find_task_mut(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_owned()))?;
        task.attachments.push(attachment);
        Ok(task.clone())
    }
}
