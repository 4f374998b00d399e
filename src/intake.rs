//! Complaint intake and lifecycle service.
//!
//! Accepts submissions, allocates tracking tokens, runs the best-effort
//! automatic assignment on submission, and handles the lifecycle updates
//! (status changes, thread messages, identity reveal) the engine is not
//! responsible for.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::config::DEFAULT_TOKEN_ATTEMPTS;
use crate::database::Database;
use crate::distribution::DistributionEngine;
use crate::error::{ErrorContext, RedressalError, Result};
use crate::models::{
    AssignmentType, Complaint, Message, NewComplaint, Priority, SenderRole, Status, StudentInfo,
};

/// What the student gets back after submitting.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub id: String,
    pub token: String,
    /// Status at creation time. Assignment runs after submission and is
    /// best-effort; the receipt does not wait on it.
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

/// Public tracking view for a token, with internal notes filtered out.
#[derive(Debug, Clone)]
pub struct TrackingView {
    pub status: Status,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

/// Intake service for complaint submission and lifecycle updates.
pub struct IntakeService {
    db: Arc<Database>,
    engine: Arc<DistributionEngine>,
    token_attempts: u32,
}

impl IntakeService {
    /// Create a new intake service.
    pub fn new(db: Arc<Database>, engine: Arc<DistributionEngine>) -> Self {
        Self {
            db,
            engine,
            token_attempts: DEFAULT_TOKEN_ATTEMPTS,
        }
    }

    /// Override the tracking-token retry budget.
    pub fn with_token_attempts(mut self, token_attempts: u32) -> Self {
        self.token_attempts = token_attempts;
        self
    }

    /// Submit a new complaint.
    ///
    /// Submission succeeds regardless of the automatic assignment outcome;
    /// an unassignable complaint stays `received` and remains eligible for
    /// manual or batch assignment later.
    pub async fn submit(&self, new: NewComplaint) -> Result<SubmissionReceipt> {
        if new.title.trim().is_empty() && new.description.trim().is_empty() {
            return Err(RedressalError::InvalidInput(
                "Title or description is required".to_string(),
            ));
        }
        let Some(category) = new.category else {
            return Err(RedressalError::InvalidInput(
                "Category is required".to_string(),
            ));
        };

        let token = self.generate_unique_token().await?;

        // Anonymous submissions carry no student attribution at all.
        let student_info = if new.anonymous { None } else { new.student_info };
        let department = new.department.clone().or_else(|| {
            student_info
                .as_ref()
                .and_then(|info| info.department.clone())
        });

        let now = Utc::now();
        let complaint = Complaint {
            id: Uuid::new_v4().to_string(),
            token: token.clone(),
            title: if new.title.trim().is_empty() {
                "Complaint".to_string()
            } else {
                new.title
            },
            description: new.description,
            category,
            status: Status::Received,
            priority: new.priority.unwrap_or(Priority::Normal),
            department,
            is_anonymous: new.anonymous,
            identity_revealed: false,
            revealed_by: None,
            revealed_at: None,
            student_info,
            assigned_to: None,
            assigned_by: None,
            assignment_type: AssignmentType::Auto,
            assigned_at: None,
            resolution: None,
            resolved_at: None,
            resolved_by: None,
            created_at: now,
            updated_at: now,
        };

        self.db.create_complaint(&complaint).await?;
        tracing::info!(
            complaint_id = %complaint.id,
            token = %complaint.token,
            category = %complaint.category.as_str(),
            anonymous = complaint.is_anonymous,
            "Complaint submitted"
        );

        // Best-effort automatic assignment. Failure is logged, not surfaced.
        if let Err(err) = self
            .engine
            .assign_complaint(&complaint.id, None, None)
            .await
        {
            err.log_with_context(
                &ErrorContext::new("auto_assign_on_submit").with_complaint_id(&complaint.id),
            );
        }

        Ok(SubmissionReceipt {
            id: complaint.id,
            token,
            status: Status::Received,
            created_at: now,
        })
    }

    /// Look up a complaint by its public tracking token.
    pub async fn track(&self, token: &str) -> Result<TrackingView> {
        let complaint = self
            .db
            .get_complaint_by_token(token)
            .await?
            .ok_or_else(|| RedressalError::NotFound("Complaint not found".to_string()))?;

        let messages = self.db.messages(&complaint.id, true).await?;

        Ok(TrackingView {
            status: complaint.status,
            priority: complaint.priority,
            title: complaint.title,
            description: complaint.description,
            created_at: complaint.created_at,
            updated_at: complaint.updated_at,
            messages,
        })
    }

    /// Append a message to a complaint's thread.
    pub async fn add_message(
        &self,
        complaint_id: &str,
        body: &str,
        sender: SenderRole,
        sender_name: Option<&str>,
        visible: bool,
    ) -> Result<Message> {
        if self.db.get_complaint(complaint_id).await?.is_none() {
            return Err(RedressalError::NotFound("Complaint not found".to_string()));
        }
        self.db
            .add_message(complaint_id, body, sender, sender_name, visible)
            .await
    }

    /// Update a complaint's status.
    ///
    /// Transitions into `resolved`/`closed` record the resolution fields and
    /// release the assigned admin's caseload through the engine.
    pub async fn update_status(
        &self,
        complaint_id: &str,
        status: Status,
        resolution: Option<&str>,
        resolved_by: Option<&str>,
    ) -> Result<Complaint> {
        let complaint = self
            .db
            .get_complaint(complaint_id)
            .await?
            .ok_or_else(|| RedressalError::NotFound("Complaint not found".to_string()))?;

        let now = Utc::now().to_rfc3339();
        if status.releases_caseload() {
            sqlx::query(
                "UPDATE complaints
                 SET status = ?, resolution = ?, resolved_at = ?, resolved_by = ?, updated_at = ?
                 WHERE id = ?",
            )
            .bind(status.as_str())
            .bind(resolution)
            .bind(&now)
            .bind(resolved_by)
            .bind(&now)
            .bind(complaint_id)
            .execute(self.db.pool())
            .await
            .map_err(|e| RedressalError::Database(format!("Failed to update status: {}", e)))?;

            if complaint.assigned_to.is_some() {
                self.engine.release_on_resolution(complaint_id).await?;
            }
        } else {
            sqlx::query("UPDATE complaints SET status = ?, updated_at = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(&now)
                .bind(complaint_id)
                .execute(self.db.pool())
                .await
                .map_err(|e| RedressalError::Database(format!("Failed to update status: {}", e)))?;
        }

        tracing::info!(
            complaint_id = %complaint_id,
            from = %complaint.status.as_str(),
            to = %status.as_str(),
            "Complaint status updated"
        );

        self.db
            .get_complaint(complaint_id)
            .await?
            .ok_or_else(|| RedressalError::NotFound("Complaint not found".to_string()))
    }

    /// Reveal the identity behind an anonymous complaint. One-way.
    pub async fn reveal_identity(
        &self,
        complaint_id: &str,
        super_admin_id: &str,
    ) -> Result<Option<StudentInfo>> {
        let complaint = self
            .db
            .get_complaint(complaint_id)
            .await?
            .ok_or_else(|| RedressalError::NotFound("Complaint not found".to_string()))?;

        if !complaint.is_anonymous {
            return Err(RedressalError::InvalidInput(
                "This complaint is not anonymous".to_string(),
            ));
        }

        sqlx::query(
            "UPDATE complaints SET identity_revealed = 1, revealed_by = ?, revealed_at = ? WHERE id = ?",
        )
        .bind(super_admin_id)
        .bind(Utc::now().to_rfc3339())
        .bind(complaint_id)
        .execute(self.db.pool())
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to reveal identity: {}", e)))?;

        tracing::info!(
            complaint_id = %complaint_id,
            revealed_by = %super_admin_id,
            "Student identity revealed"
        );

        Ok(complaint.student_info)
    }

    /// Generate a 6-digit tracking token not yet in use.
    async fn generate_unique_token(&self) -> Result<String> {
        for _ in 0..self.token_attempts {
            let token = {
                let mut rng = rand::thread_rng();
                format!("{:06}", rng.gen_range(100_000..1_000_000))
            };
            if !self.db.token_exists(&token).await? {
                return Ok(token);
            }
        }
        Err(RedressalError::TokenExhausted)
    }
}
