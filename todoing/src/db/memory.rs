//! In-memory store implementations used by the test suites.
//!
//! They mirror the Postgres repositories closely enough that handler tests can
//! run without a database: ownership scoping, unique violations on users, and
//! the list orderings all behave the same. Insertion sequence numbers break
//! ordering ties, which matters under a fixed clock where every row shares one
//! timestamp.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        RwLock,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{
    errors::{DbError, Result},
    handlers::{ReportStore, TaskStore, UserStore},
    models::{
        reports::{ReportCreateDBRequest, ReportDBResponse},
        tasks::{TaskCreateDBRequest, TaskDBResponse, TaskUpdateDBRequest},
        users::{UserCreateDBRequest, UserDBResponse},
    },
};

fn unique_violation(constraint: &str) -> DbError {
    DbError::UniqueViolation {
        constraint: Some(constraint.to_string()),
        table: Some("users".to_string()),
        message: format!("duplicate key value violates unique constraint \"{constraint}\""),
    }
}

fn lock_poisoned() -> DbError {
    DbError::Other(anyhow::anyhow!("memory store lock poisoned"))
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, UserDBResponse>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, request: &UserCreateDBRequest, now: DateTime<Utc>) -> Result<UserDBResponse> {
        let mut users = self.users.write().map_err(|_| lock_poisoned())?;

        if users.values().any(|u| u.username == request.username) {
            return Err(unique_violation("users_username_key"));
        }
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&request.email))
        {
            return Err(unique_violation("users_email_lower_key"));
        }

        let user = UserDBResponse {
            id: Uuid::new_v4(),
            username: request.username.clone(),
            email: request.email.clone(),
            password_hash: request.password_hash.clone(),
            created_at: now,
            last_login: None,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<UserDBResponse>> {
        let users = self.users.read().map_err(|_| lock_poisoned())?;
        Ok(users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<UserDBResponse>> {
        let users = self.users.read().map_err(|_| lock_poisoned())?;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserDBResponse>> {
        let users = self.users.read().map_err(|_| lock_poisoned())?;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut users = self.users.write().map_err(|_| lock_poisoned())?;
        if let Some(user) = users.get_mut(&id) {
            user.last_login = Some(at);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, (u64, TaskDBResponse)>>,
    sequence: AtomicU64,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create(&self, request: &TaskCreateDBRequest, now: DateTime<Utc>) -> Result<TaskDBResponse> {
        let task = TaskDBResponse {
            id: Uuid::new_v4(),
            title: request.title.clone(),
            description: request.description.clone(),
            status: request.status,
            priority: request.priority,
            assignee: request.assignee.clone(),
            created_by: request.created_by,
            deadline: request.deadline,
            scheduled_date: request.scheduled_date,
            comments: request.comments.clone(),
            created_at: now,
            updated_at: now,
        };

        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let mut tasks = self.tasks.write().map_err(|_| lock_poisoned())?;
        tasks.insert(task.id, (seq, task.clone()));
        Ok(task)
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<TaskDBResponse>> {
        let tasks = self.tasks.read().map_err(|_| lock_poisoned())?;
        Ok(tasks
            .get(&id)
            .filter(|(_, t)| t.created_by == owner)
            .map(|(_, t)| t.clone()))
    }

    async fn list(&self, owner: Uuid) -> Result<Vec<TaskDBResponse>> {
        let tasks = self.tasks.read().map_err(|_| lock_poisoned())?;
        let mut owned: Vec<_> = tasks
            .values()
            .filter(|(_, t)| t.created_by == owner)
            .cloned()
            .collect();
        owned.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| seq_b.cmp(seq_a))
        });
        Ok(owned.into_iter().map(|(_, t)| t).collect())
    }

    async fn list_created_between(
        &self,
        owner: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TaskDBResponse>> {
        let tasks = self.tasks.read().map_err(|_| lock_poisoned())?;
        let mut owned: Vec<_> = tasks
            .values()
            .filter(|(_, t)| t.created_by == owner && t.created_at >= from && t.created_at <= to)
            .cloned()
            .collect();
        owned.sort_by(|(seq_a, a), (seq_b, b)| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| seq_a.cmp(seq_b))
        });
        Ok(owned.into_iter().map(|(_, t)| t).collect())
    }

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        request: &TaskUpdateDBRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<TaskDBResponse>> {
        let mut tasks = self.tasks.write().map_err(|_| lock_poisoned())?;
        let Some((_, task)) = tasks.get_mut(&id).filter(|(_, t)| t.created_by == owner) else {
            return Ok(None);
        };

        if request.is_empty() {
            return Ok(Some(task.clone()));
        }

        if let Some(title) = &request.title {
            task.title = title.clone();
        }
        if let Some(description) = &request.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = request.status {
            task.status = status;
        }
        if let Some(priority) = request.priority {
            task.priority = priority;
        }
        if let Some(assignee) = &request.assignee {
            task.assignee = assignee.clone();
        }
        if let Some(deadline) = request.deadline {
            task.deadline = Some(deadline);
        }
        if let Some(scheduled_date) = request.scheduled_date {
            task.scheduled_date = Some(scheduled_date);
        }
        task.updated_at = now;

        Ok(Some(task.clone()))
    }

    async fn add_comment(
        &self,
        owner: Uuid,
        id: Uuid,
        comment: &crate::api::models::tasks::TaskComment,
        now: DateTime<Utc>,
    ) -> Result<Option<TaskDBResponse>> {
        let mut tasks = self.tasks.write().map_err(|_| lock_poisoned())?;
        let Some((_, task)) = tasks.get_mut(&id).filter(|(_, t)| t.created_by == owner) else {
            return Ok(None);
        };

        task.comments.push(comment.clone());
        task.updated_at = now;
        Ok(Some(task.clone()))
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool> {
        let mut tasks = self.tasks.write().map_err(|_| lock_poisoned())?;
        let owned = tasks
            .get(&id)
            .is_some_and(|(_, t)| t.created_by == owner);
        if owned {
            tasks.remove(&id);
        }
        Ok(owned)
    }
}

#[derive(Default)]
pub struct MemoryReportStore {
    reports: RwLock<HashMap<Uuid, (u64, ReportDBResponse)>>,
    sequence: AtomicU64,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn create(&self, request: &ReportCreateDBRequest, now: DateTime<Utc>) -> Result<ReportDBResponse> {
        let report = ReportDBResponse {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            report_type: request.report_type,
            period: request.period.clone(),
            title: request.title.clone(),
            content: request.content.clone(),
            polished_content: None,
            task_ids: request.task_ids.clone(),
            statistics: request.statistics,
            created_at: now,
            updated_at: now,
        };

        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let mut reports = self.reports.write().map_err(|_| lock_poisoned())?;
        reports.insert(report.id, (seq, report.clone()));
        Ok(report)
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<ReportDBResponse>> {
        let reports = self.reports.read().map_err(|_| lock_poisoned())?;
        Ok(reports
            .get(&id)
            .filter(|(_, r)| r.user_id == owner)
            .map(|(_, r)| r.clone()))
    }

    async fn list(&self, owner: Uuid) -> Result<Vec<ReportDBResponse>> {
        let reports = self.reports.read().map_err(|_| lock_poisoned())?;
        let mut owned: Vec<_> = reports
            .values()
            .filter(|(_, r)| r.user_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| seq_b.cmp(seq_a))
        });
        Ok(owned.into_iter().map(|(_, r)| r).collect())
    }

    async fn set_polished(
        &self,
        owner: Uuid,
        id: Uuid,
        polished: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ReportDBResponse>> {
        let mut reports = self.reports.write().map_err(|_| lock_poisoned())?;
        let Some((_, report)) = reports.get_mut(&id).filter(|(_, r)| r.user_id == owner) else {
            return Ok(None);
        };

        report.polished_content = Some(polished.to_string());
        report.updated_at = now;
        Ok(Some(report.clone()))
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool> {
        let mut reports = self.reports.write().map_err(|_| lock_poisoned())?;
        let owned = reports
            .get(&id)
            .is_some_and(|(_, r)| r.user_id == owner);
        if owned {
            reports.remove(&id);
        }
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::tasks::{TaskPriority, TaskStatus};

    fn task_request(owner: Uuid, title: &str) -> TaskCreateDBRequest {
        TaskCreateDBRequest {
            title: title.to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            assignee: None,
            created_by: owner,
            deadline: None,
            scheduled_date: None,
            comments: vec![],
        }
    }

    #[tokio::test]
    async fn duplicate_username_and_email_are_rejected() {
        let store = MemoryUserStore::new();
        let now = Utc::now();
        store
            .create(
                &UserCreateDBRequest {
                    username: "alice".to_string(),
                    email: "alice@example.com".to_string(),
                    password_hash: "h".to_string(),
                },
                now,
            )
            .await
            .unwrap();

        let same_name = store
            .create(
                &UserCreateDBRequest {
                    username: "alice".to_string(),
                    email: "other@example.com".to_string(),
                    password_hash: "h".to_string(),
                },
                now,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            same_name,
            DbError::UniqueViolation { constraint: Some(ref c), .. } if c == "users_username_key"
        ));

        let same_email = store
            .create(
                &UserCreateDBRequest {
                    username: "bob".to_string(),
                    email: "ALICE@example.com".to_string(),
                    password_hash: "h".to_string(),
                },
                now,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            same_email,
            DbError::UniqueViolation { constraint: Some(ref c), .. } if c == "users_email_lower_key"
        ));
    }

    #[tokio::test]
    async fn list_is_newest_first_with_stable_tie_break() {
        let store = MemoryTaskStore::new();
        let owner = Uuid::new_v4();
        let now = Utc::now();

        let first = store.create(&task_request(owner, "first"), now).await.unwrap();
        let second = store.create(&task_request(owner, "second"), now).await.unwrap();
        let third = store.create(&task_request(owner, "third"), now).await.unwrap();

        let listed = store.list(owner).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[tokio::test]
    async fn ownership_is_enforced_on_every_operation() {
        let store = MemoryTaskStore::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let now = Utc::now();

        let task = store.create(&task_request(owner, "mine"), now).await.unwrap();

        assert!(store.get(stranger, task.id).await.unwrap().is_none());
        assert!(store
            .update(stranger, task.id, &TaskUpdateDBRequest::default(), now)
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete(stranger, task.id).await.unwrap());
        assert!(store.get(owner, task.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_clears_assignee_when_asked() {
        let store = MemoryTaskStore::new();
        let owner = Uuid::new_v4();
        let now = Utc::now();

        let mut request = task_request(owner, "t");
        request.assignee = Some("bob".to_string());
        let task = store.create(&request, now).await.unwrap();
        assert_eq!(task.assignee.as_deref(), Some("bob"));

        let updated = store
            .update(
                owner,
                task.id,
                &TaskUpdateDBRequest {
                    assignee: Some(None),
                    ..Default::default()
                },
                now,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.assignee, None);
    }
}
