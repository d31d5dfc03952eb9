use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use agrisync_core::{DomainError, DomainResult, Entity, TaskId, UserId, require_text};

const TITLE_MAX_CHARS: usize = 200;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "status: \"{s}\" is not a valid choice (expected one of: todo, in_progress, done)"
                ))
            })
    }
}

impl core::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of farm work, optionally assigned to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub assigned_to: Option<UserId>,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

impl Entity for Task {
    type Id = TaskId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Task {
    /// Status-only updates are open to the assignee and to admins.
    pub fn ensure_can_update_status(&self, actor: UserId, is_admin: bool) -> DomainResult<()> {
        if is_admin || self.assigned_to == Some(actor) {
            return Ok(());
        }
        Err(DomainError::forbidden(
            "only the assignee or an admin may update this task's status",
        ))
    }
}

/// Validated attributes for creating or replacing a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub assigned_to: Option<UserId>,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
}

impl NewTask {
    pub fn new(
        title: &str,
        description: Option<&str>,
        assigned_to: Option<UserId>,
        due_date: Option<NaiveDate>,
        status: Option<&str>,
    ) -> DomainResult<Self> {
        let status = match status {
            Some(s) => TaskStatus::parse(s)?,
            None => TaskStatus::default(),
        };
        Ok(Self {
            title: require_text("title", title, TITLE_MAX_CHARS)?,
            description: description.unwrap_or_default().trim().to_string(),
            assigned_to,
            due_date,
            status,
        })
    }
}

/// Partial update for a task.
///
/// The nested options distinguish "leave as is" (`None`) from "clear"
/// (`Some(None)`) for the nullable attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<Option<UserId>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub status: Option<String>,
}

impl TaskPatch {
    pub fn apply(&self, current: &Task) -> DomainResult<NewTask> {
        NewTask::new(
            self.title.as_deref().unwrap_or(&current.title),
            Some(self.description.as_deref().unwrap_or(&current.description)),
            self.assigned_to.unwrap_or(current.assigned_to),
            self.due_date.unwrap_or(current.due_date),
            Some(self.status.as_deref().unwrap_or(current.status.as_str())),
        )
    }

    /// A patch that only touches the status.
    pub fn status_only(status: &str) -> Self {
        Self {
            status: Some(status.to_string()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(assigned_to: Option<i64>) -> Task {
        Task {
            id: TaskId::new(1),
            title: "Irrigate north field".to_string(),
            description: String::new(),
            assigned_to: assigned_to.map(UserId::new),
            due_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            status: TaskStatus::Todo,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn new_task_defaults() {
        let t = NewTask::new("Weed", None, None, None, None).unwrap();
        assert_eq!(t.status, TaskStatus::Todo);
        assert_eq!(t.description, "");
        assert_eq!(t.assigned_to, None);
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(TaskStatus::parse("in_progress").unwrap(), TaskStatus::InProgress);
        assert!(TaskStatus::parse("In Progress").is_err());
        assert_eq!(TaskStatus::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn title_is_bounded() {
        let long = "x".repeat(201);
        assert!(matches!(
            NewTask::new(&long, None, None, None, None),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn assignee_or_admin_may_update_status() {
        let t = task(Some(5));
        assert!(t.ensure_can_update_status(UserId::new(5), false).is_ok());
        assert!(t.ensure_can_update_status(UserId::new(9), true).is_ok());
        match t.ensure_can_update_status(UserId::new(9), false) {
            Err(DomainError::Forbidden(_)) => {}
            other => panic!("expected forbidden, got {other:?}"),
        }
    }

    #[test]
    fn unassigned_task_status_is_admin_only() {
        let t = task(None);
        assert!(t.ensure_can_update_status(UserId::new(5), false).is_err());
    }

    #[test]
    fn status_only_patch_keeps_everything_else() {
        let t = task(Some(5));
        let next = TaskPatch::status_only("done").apply(&t).unwrap();
        assert_eq!(next.status, TaskStatus::Done);
        assert_eq!(next.title, t.title);
        assert_eq!(next.assigned_to, t.assigned_to);
        assert_eq!(next.due_date, t.due_date);
    }

    #[test]
    fn patch_can_clear_assignee() {
        let t = task(Some(5));
        let next = TaskPatch {
            assigned_to: Some(None),
            ..TaskPatch::default()
        }
        .apply(&t)
        .unwrap();
        assert_eq!(next.assigned_to, None);
    }
}
