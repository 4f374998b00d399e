//! Complaint distribution engine.
//!
//! Matches incoming complaints to admins through a three-tier fallback
//! (specialization + locality, specialization only, anyone active with
//! spare capacity), tracks admin caseload, and handles manual
//! reassignment between admins.
//!
//! The engine is the sole writer of a complaint's assignment fields and of
//! admin caseload counters. Each operation applies its complaint write and
//! caseload write(s) inside a single transaction, and every caseload
//! mutation is an in-database read-modify-write, never a write-back of a
//! value read earlier.

use std::sync::Arc;

use chrono::Utc;

use crate::database::Database;
use crate::error::{RedressalError, Result};
use crate::models::{Admin, AssignmentType, Category, Complaint};

/// Summary of a successful assignment.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub admin_id: String,
    pub admin_name: String,
    pub admin_email: String,
    pub admin_department: String,
    pub assignment_type: AssignmentType,
}

/// Summary of a successful forward.
#[derive(Debug, Clone)]
pub struct ForwardOutcome {
    pub admin_id: String,
    pub admin_name: String,
    pub admin_email: String,
    pub admin_department: String,
}

/// Result of a batch auto-assignment pass.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub total: usize,
    pub assigned: usize,
    pub failed: usize,
    pub errors: Vec<BatchError>,
}

/// One complaint that could not be assigned during a batch pass.
#[derive(Debug, Clone)]
pub struct BatchError {
    pub complaint_id: String,
    pub token: String,
    pub error: String,
}

/// Pick the best admin from the capacity pool for a complaint.
///
/// `pool` must already be restricted to active admins below their ceiling
/// and ordered by caseload ascending, registration time ascending, so the
/// first admin surviving a tier's filter is the winner.
///
/// Tiers, strict precedence:
/// 1. specialization match, and branch/semester match where the student's
///    department/semester are known
/// 2. specialization match only
/// 3. any admin in the pool
///
/// Specialization and locality are preferred but never block assignment
/// outright; routing broadly beats leaving a complaint unassigned.
pub fn select_candidate<'a>(
    pool: &'a [Admin],
    category: Category,
    department: Option<&str>,
    semester: Option<u8>,
) -> Option<&'a Admin> {
    let locality = |admin: &Admin| {
        let branch_ok = match department {
            Some(dept) => admin.branches.as_deref() == Some(dept),
            None => true,
        };
        let semester_ok = match semester {
            Some(sem) => admin.semesters == Some(sem),
            None => true,
        };
        branch_ok && semester_ok
    };

    if let Some(admin) = pool
        .iter()
        .find(|&a| a.handles(category) && locality(a))
    {
        return Some(admin);
    }

    if let Some(admin) = pool.iter().find(|&a| a.handles(category)) {
        return Some(admin);
    }

    pool.first()
}

/// Distribution engine over the admin directory and complaint store.
pub struct DistributionEngine {
    db: Arc<Database>,
}

impl DistributionEngine {
    /// Create a new distribution engine.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Find the best admin for a complaint without assigning it.
    pub async fn find_best_admin(&self, complaint: &Complaint) -> Result<Admin> {
        let pool = self.db.eligible_admins().await?;

        let info = complaint.student_info.as_ref();
        let department = info.and_then(|i| i.department.as_deref());
        let semester = info.and_then(|i| i.semester);

        select_candidate(&pool, complaint.category, department, semester)
            .cloned()
            .ok_or(RedressalError::NoCandidateAvailable)
    }

    /// Assign a complaint to an admin.
    ///
    /// With `admin_id` this is a manual assignment: the admin is loaded
    /// directly and no capacity check is made (operator override is
    /// always honored). Without it, the engine selects a candidate via
    /// the tiered fallback.
    pub async fn assign_complaint(
        &self,
        complaint_id: &str,
        admin_id: Option<&str>,
        assigned_by: Option<&str>,
    ) -> Result<Assignment> {
        let complaint = self
            .db
            .get_complaint(complaint_id)
            .await?
            .ok_or_else(|| RedressalError::NotFound("Complaint not found".to_string()))?;

        let (admin, assignment_type) = match admin_id {
            Some(admin_id) => {
                let admin = self
                    .db
                    .get_admin(admin_id)
                    .await?
                    .ok_or_else(|| RedressalError::NotFound("Admin not found".to_string()))?;
                (admin, AssignmentType::Manual)
            }
            None => (self.find_best_admin(&complaint).await?, AssignmentType::Auto),
        };

        let now = Utc::now().to_rfc3339();
        let mut tx = self.db.pool().begin().await.map_err(|e| {
            RedressalError::Database(format!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query(
            "UPDATE complaints
             SET assigned_to = ?, assigned_by = ?, assignment_type = ?, assigned_at = ?,
                 status = 'assigned', updated_at = ?
             WHERE id = ?",
        )
        .bind(&admin.id)
        .bind(assigned_by)
        .bind(assignment_type.as_str())
        .bind(&now)
        .bind(&now)
        .bind(complaint_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to assign complaint: {}", e)))?;

        sqlx::query("UPDATE admins SET current_case_load = current_case_load + 1 WHERE id = ?")
            .bind(&admin.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                RedressalError::Database(format!("Failed to increment caseload: {}", e))
            })?;

        tx.commit()
            .await
            .map_err(|e| RedressalError::Database(format!("Failed to commit assignment: {}", e)))?;

        tracing::info!(
            complaint_id = %complaint_id,
            token = %complaint.token,
            admin_id = %admin.id,
            assignment_type = %assignment_type.as_str(),
            "Complaint assigned"
        );

        Ok(Assignment {
            admin_id: admin.id,
            admin_name: admin.name,
            admin_email: admin.email,
            admin_department: admin.department,
            assignment_type,
        })
    }

    /// Forward an already-assigned complaint to another admin.
    ///
    /// Unlike manual assignment, the destination's capacity IS checked
    /// here. On success the complaint moves, the audit trail gains one
    /// entry, one unit of caseload moves from source to destination, and a
    /// visible system message records the handoff. On failure nothing
    /// changes.
    pub async fn forward_complaint(
        &self,
        complaint_id: &str,
        from_admin_id: &str,
        to_admin_id: &str,
        reason: &str,
    ) -> Result<ForwardOutcome> {
        let complaint = self.db.get_complaint(complaint_id).await?;
        let from_admin = self.db.get_admin(from_admin_id).await?;
        let to_admin = self.db.get_admin(to_admin_id).await?;

        let (Some(complaint), Some(from_admin), Some(to_admin)) =
            (complaint, from_admin, to_admin)
        else {
            return Err(RedressalError::NotFound(
                "Invalid complaint or admin reference".to_string(),
            ));
        };

        if !to_admin.has_capacity() {
            return Err(RedressalError::CapacityExceeded {
                admin_id: to_admin.id,
            });
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = self.db.pool().begin().await.map_err(|e| {
            RedressalError::Database(format!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query(
            "UPDATE complaints SET assigned_to = ?, status = 'forwarded', updated_at = ? WHERE id = ?",
        )
        .bind(&to_admin.id)
        .bind(&now)
        .bind(complaint_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to forward complaint: {}", e)))?;

        sqlx::query(
            "INSERT INTO forward_history (complaint_id, from_admin, to_admin, reason, forwarded_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(complaint_id)
        .bind(&from_admin.id)
        .bind(&to_admin.id)
        .bind(reason)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to record forward: {}", e)))?;

        sqlx::query(
            "UPDATE admins SET current_case_load = MAX(0, current_case_load - 1) WHERE id = ?",
        )
        .bind(&from_admin.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to decrement caseload: {}", e)))?;

        sqlx::query("UPDATE admins SET current_case_load = current_case_load + 1 WHERE id = ?")
            .bind(&to_admin.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                RedressalError::Database(format!("Failed to increment caseload: {}", e))
            })?;

        // System-authored handoff notice, always visible to the student.
        let notice = format!(
            "Complaint forwarded from {} to {}. Reason: {}",
            from_admin.name, to_admin.name, reason
        );
        sqlx::query(
            "INSERT INTO complaint_messages (complaint_id, body, sender, sender_name, visible, created_at)
             VALUES (?, ?, 'admin', 'System', 1, ?)",
        )
        .bind(complaint_id)
        .bind(&notice)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to add forward notice: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| RedressalError::Database(format!("Failed to commit forward: {}", e)))?;

        tracing::info!(
            complaint_id = %complaint_id,
            token = %complaint.token,
            from_admin = %from_admin.id,
            to_admin = %to_admin.id,
            "Complaint forwarded"
        );

        Ok(ForwardOutcome {
            admin_id: to_admin.id,
            admin_name: to_admin.name,
            admin_email: to_admin.email,
            admin_department: to_admin.department,
        })
    }

    /// Release the assigned admin's caseload when a complaint is resolved
    /// or closed.
    ///
    /// Status mutation itself lives with the caller; this is the side
    /// effect it must trigger. Besides forwarding, this is the only path
    /// by which caseload decreases.
    pub async fn release_on_resolution(&self, complaint_id: &str) -> Result<()> {
        let complaint = self
            .db
            .get_complaint(complaint_id)
            .await?
            .ok_or_else(|| RedressalError::NotFound("Complaint not found".to_string()))?;

        match complaint.assigned_to {
            Some(admin_id) => {
                self.db.adjust_case_load(&admin_id, -1).await?;
                tracing::info!(
                    complaint_id = %complaint_id,
                    admin_id = %admin_id,
                    "Caseload released on resolution"
                );
            }
            None => {
                tracing::debug!(
                    complaint_id = %complaint_id,
                    "Resolution of unassigned complaint, nothing to release"
                );
            }
        }

        Ok(())
    }

    /// Attempt automatic assignment of every unassigned complaint.
    ///
    /// A single best-effort pass: each complaint is attempted exactly once
    /// and one failure never aborts the batch.
    pub async fn auto_assign_unassigned(&self) -> Result<BatchReport> {
        let unassigned = self.db.unassigned_complaints(None).await?;

        let mut report = BatchReport {
            total: unassigned.len(),
            ..Default::default()
        };

        for complaint in unassigned {
            match self.assign_complaint(&complaint.id, None, None).await {
                Ok(_) => report.assigned += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(
                        complaint_id = %complaint.id,
                        token = %complaint.token,
                        error = %err,
                        "Batch assignment failed for complaint"
                    );
                    report.errors.push(BatchError {
                        complaint_id: complaint.id,
                        token: complaint.token,
                        error: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            total = report.total,
            assigned = report.assigned,
            failed = report.failed,
            "Batch auto-assignment completed"
        );

        Ok(report)
    }
}
