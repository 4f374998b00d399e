//! Assignment statistics aggregation.
//!
//! Aggregates are computed on demand from the complaint and admin stores.
//! Reads are unsynchronized snapshots; running concurrently with
//! assignments may observe slightly stale counters. Any internal failure
//! degrades to a zero-valued, structurally valid report, because the
//! operator dashboards depend on always receiving one.

use std::sync::Arc;

use serde::Serialize;
use sqlx::Row;

use crate::database::Database;
use crate::error::{ErrorContext, RedressalError, Result};

/// Complaint-level aggregate counts.
#[derive(Debug, Clone, Serialize)]
pub struct ComplaintStats {
    pub total: u64,
    pub assigned: u64,
    pub unassigned: u64,
    pub resolved: u64,
    pub in_progress: u64,
    /// Assigned share as a rounded percentage string, "0%" on an empty store.
    pub assignment_rate: String,
}

impl Default for ComplaintStats {
    fn default() -> Self {
        Self {
            total: 0,
            assigned: 0,
            unassigned: 0,
            resolved: 0,
            in_progress: 0,
            assignment_rate: "0%".to_string(),
        }
    }
}

/// Per-category aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub count: u64,
    pub assigned_count: u64,
}

/// One admin's caseload row.
#[derive(Debug, Clone, Serialize)]
pub struct AdminCaseLoad {
    pub id: String,
    pub name: String,
    pub email: String,
    pub current_case_load: u32,
    pub max_case_load: u32,
    /// Assigned complaints not yet resolved. Closed complaints still count
    /// here; see DESIGN.md.
    pub active_complaints: u64,
}

/// Admin-pool aggregate.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminStats {
    pub total: u64,
    pub active: u64,
    pub total_case_load: u64,
    /// Mean caseload across active admins, 0 when there are none.
    pub avg_case_load: f64,
    pub case_loads: Vec<AdminCaseLoad>,
}

/// Full assignment statistics report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssignmentStats {
    pub complaints: ComplaintStats,
    pub categories: Vec<CategoryStats>,
    pub admins: AdminStats,
}

/// Statistics collector over the complaint and admin stores.
pub struct StatsCollector {
    db: Arc<Database>,
}

impl StatsCollector {
    /// Create a new statistics collector.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Compute the full assignment statistics report.
    ///
    /// Never fails: internal errors are logged and a zeroed report is
    /// returned instead.
    pub async fn assignment_stats(&self) -> AssignmentStats {
        match self.compute().await {
            Ok(stats) => stats,
            Err(err) => {
                err.log_with_context(&ErrorContext::new("assignment_stats"));
                AssignmentStats::default()
            }
        }
    }

    async fn compute(&self) -> Result<AssignmentStats> {
        let complaints = self.complaint_stats().await?;
        let categories = self.category_stats().await?;
        let admins = self.admin_stats().await?;

        Ok(AssignmentStats {
            complaints,
            categories,
            admins,
        })
    }

    async fn complaint_stats(&self) -> Result<ComplaintStats> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total,
                    COALESCE(SUM(assigned_to IS NOT NULL), 0) AS assigned,
                    COALESCE(SUM(status = 'resolved'), 0) AS resolved,
                    COALESCE(SUM(status = 'in_progress'), 0) AS in_progress
             FROM complaints",
        )
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to aggregate complaints: {}", e)))?;

        let total = row.get::<i64, _>("total") as u64;
        let assigned = row.get::<i64, _>("assigned") as u64;

        let assignment_rate = if total > 0 {
            format!(
                "{}%",
                ((assigned as f64 / total as f64) * 100.0).round() as i64
            )
        } else {
            "0%".to_string()
        };

        Ok(ComplaintStats {
            total,
            assigned,
            unassigned: total - assigned,
            resolved: row.get::<i64, _>("resolved") as u64,
            in_progress: row.get::<i64, _>("in_progress") as u64,
            assignment_rate,
        })
    }

    async fn category_stats(&self) -> Result<Vec<CategoryStats>> {
        let rows = sqlx::query(
            "SELECT category,
                    COUNT(*) AS count,
                    COALESCE(SUM(assigned_to IS NOT NULL), 0) AS assigned_count
             FROM complaints
             GROUP BY category
             ORDER BY count DESC",
        )
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to aggregate categories: {}", e)))?;

        Ok(rows
            .iter()
            .map(|row| CategoryStats {
                category: row.get("category"),
                count: row.get::<i64, _>("count") as u64,
                assigned_count: row.get::<i64, _>("assigned_count") as u64,
            })
            .collect())
    }

    async fn admin_stats(&self) -> Result<AdminStats> {
        let counts = sqlx::query(
            "SELECT COUNT(*) AS total, COALESCE(SUM(is_active), 0) AS active FROM admins",
        )
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to count admins: {}", e)))?;

        // Caseload rows cover active admins only. A complaint counts as
        // active until it reaches `resolved`; `closed` still counts.
        let rows = sqlx::query(
            "SELECT a.id, a.name, a.email, a.current_case_load, a.max_case_load,
                    (SELECT COUNT(*) FROM complaints c
                     WHERE c.assigned_to = a.id AND c.status != 'resolved') AS active_complaints
             FROM admins a
             WHERE a.is_active = 1
             ORDER BY a.current_case_load ASC, a.created_at ASC",
        )
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to aggregate admins: {}", e)))?;

        let case_loads: Vec<AdminCaseLoad> = rows
            .iter()
            .map(|row| AdminCaseLoad {
                id: row.get("id"),
                name: row.get("name"),
                email: row.get("email"),
                current_case_load: row.get::<i64, _>("current_case_load") as u32,
                max_case_load: row.get::<i64, _>("max_case_load") as u32,
                active_complaints: row.get::<i64, _>("active_complaints") as u64,
            })
            .collect();

        let active = counts.get::<i64, _>("active") as u64;
        let total_case_load: u64 = case_loads.iter().map(|c| c.current_case_load as u64).sum();
        let avg_case_load = if active > 0 {
            let avg = total_case_load as f64 / active as f64;
            (avg * 100.0).round() / 100.0
        } else {
            0.0
        };

        Ok(AdminStats {
            total: counts.get::<i64, _>("total") as u64,
            active,
            total_case_load,
            avg_case_load,
            case_loads,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DistributionEngine;
    use crate::intake::IntakeService;
    use crate::models::{AdminRole, Category, NewAdmin, NewComplaint, Status};

    async fn fixture() -> (Arc<Database>, IntakeService, StatsCollector) {
        let db = Arc::new(Database::in_memory().await.expect("should create db"));
        let engine = Arc::new(DistributionEngine::new(db.clone()));
        let intake = IntakeService::new(db.clone(), engine);
        let stats = StatsCollector::new(db.clone());
        (db, intake, stats)
    }

    fn complaint(category: Category) -> NewComplaint {
        NewComplaint {
            title: "Stats fixture".to_string(),
            category: Some(category),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn empty_system_reports_zeroes_without_error() {
        let (_db, _intake, stats) = fixture().await;

        let report = stats.assignment_stats().await;
        assert_eq!(report.complaints.total, 0);
        assert_eq!(report.complaints.assignment_rate, "0%");
        assert!(report.categories.is_empty());
        assert_eq!(report.admins.total, 0);
        assert_eq!(report.admins.avg_case_load, 0.0);
        assert!(report.admins.case_loads.is_empty());
    }

    #[tokio::test]
    async fn populated_system_aggregates() {
        let (db, intake, stats) = fixture().await;

        let admin = db
            .register_admin(NewAdmin {
                name: "Desk".to_string(),
                email: "desk@univ.edu".to_string(),
                employee_id: "EMP200".to_string(),
                department: "Admin".to_string(),
                role: AdminRole::Admin,
                specializations: vec![Category::Academic],
                branches: None,
                semesters: None,
                max_case_load: 10,
            })
            .await
            .unwrap();

        // Three academic complaints get assigned; one sports complaint
        // finds no specialist but tier 3 still routes it to the same admin;
        // kill the pool afterwards so the last complaint stays unassigned.
        for _ in 0..3 {
            intake.submit(complaint(Category::Academic)).await.unwrap();
        }
        intake.submit(complaint(Category::Sports)).await.unwrap();
        db.set_admin_active(&admin.id, false).await.unwrap();
        intake.submit(complaint(Category::General)).await.unwrap();
        db.set_admin_active(&admin.id, true).await.unwrap();

        let report = stats.assignment_stats().await;
        assert_eq!(report.complaints.total, 5);
        assert_eq!(report.complaints.assigned, 4);
        assert_eq!(report.complaints.unassigned, 1);
        assert_eq!(report.complaints.assignment_rate, "80%");

        // Categories ordered by volume.
        assert_eq!(report.categories[0].category, "academic");
        assert_eq!(report.categories[0].count, 3);
        assert_eq!(report.categories[0].assigned_count, 3);

        assert_eq!(report.admins.total, 1);
        assert_eq!(report.admins.active, 1);
        assert_eq!(report.admins.total_case_load, 4);
        assert_eq!(report.admins.avg_case_load, 4.0);
        assert_eq!(report.admins.case_loads.len(), 1);
        assert_eq!(report.admins.case_loads[0].active_complaints, 4);
    }

    #[tokio::test]
    async fn closed_complaints_still_count_as_active_for_admin_load() {
        let (db, intake, stats) = fixture().await;

        db.register_admin(NewAdmin {
            name: "Desk".to_string(),
            email: "desk@univ.edu".to_string(),
            employee_id: "EMP201".to_string(),
            department: "Admin".to_string(),
            role: AdminRole::Admin,
            specializations: vec![Category::General],
            branches: None,
            semesters: None,
            max_case_load: 10,
        })
        .await
        .unwrap();

        let resolved = intake.submit(complaint(Category::General)).await.unwrap();
        let closed = intake.submit(complaint(Category::General)).await.unwrap();
        let open = intake.submit(complaint(Category::General)).await.unwrap();

        intake
            .update_status(&resolved.id, Status::Resolved, Some("done"), None)
            .await
            .unwrap();
        intake
            .update_status(&closed.id, Status::Closed, None, None)
            .await
            .unwrap();
        intake
            .update_status(&open.id, Status::InProgress, None, None)
            .await
            .unwrap();

        let report = stats.assignment_stats().await;
        // Only `resolved` is excluded from the per-admin active count.
        assert_eq!(report.admins.case_loads[0].active_complaints, 2);
        assert_eq!(report.complaints.resolved, 1);
        assert_eq!(report.complaints.in_progress, 1);
    }

    #[tokio::test]
    async fn inactive_admins_are_counted_but_not_listed() {
        let (db, _intake, stats) = fixture().await;

        let a = db
            .register_admin(NewAdmin {
                name: "Active".to_string(),
                email: "a@univ.edu".to_string(),
                employee_id: "EMP210".to_string(),
                department: "Admin".to_string(),
                role: AdminRole::Admin,
                specializations: vec![],
                branches: None,
                semesters: None,
                max_case_load: 10,
            })
            .await
            .unwrap();
        let b = db
            .register_admin(NewAdmin {
                name: "Inactive".to_string(),
                email: "b@univ.edu".to_string(),
                employee_id: "EMP211".to_string(),
                department: "Admin".to_string(),
                role: AdminRole::Admin,
                specializations: vec![],
                branches: None,
                semesters: None,
                max_case_load: 10,
            })
            .await
            .unwrap();
        db.set_admin_active(&b.id, false).await.unwrap();
        db.adjust_case_load(&a.id, 3).await.unwrap();

        let report = stats.assignment_stats().await;
        assert_eq!(report.admins.total, 2);
        assert_eq!(report.admins.active, 1);
        assert_eq!(report.admins.case_loads.len(), 1);
        assert_eq!(report.admins.case_loads[0].name, "Active");
        // Averages run over active admins only.
        assert_eq!(report.admins.avg_case_load, 3.0);
    }

    #[tokio::test]
    async fn internal_failure_degrades_to_zeroed_report() {
        let (db, _intake, stats) = fixture().await;

        // Break the store out from under the collector.
        sqlx::query("DROP TABLE complaints")
            .execute(db.pool())
            .await
            .expect("should drop");

        let report = stats.assignment_stats().await;
        assert_eq!(report.complaints.total, 0);
        assert_eq!(report.complaints.assignment_rate, "0%");
        assert!(report.categories.is_empty());
        assert_eq!(report.admins.total, 0);
    }
}
