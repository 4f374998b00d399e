//! SQLite database for persistent storage.
//!
//! Holds the two collections the distribution engine works over: admins
//! (the capacity pool) and complaints (with their message threads and
//! forwarding audit trail).

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use crate::error::{RedressalError, Result};
use crate::models::{
    Admin, AdminRole, AssignmentType, Category, Complaint, ForwardRecord, Message, NewAdmin,
    Priority, SenderRole, Status, StudentInfo,
};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection.
    ///
    /// Creates the database file and initializes schema if needed.
    pub async fn new(path: &str) -> Result<Self> {
        let db_path = Path::new(path);

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    RedressalError::Database(format!(
                        "Failed to create database directory: {}",
                        e
                    ))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                RedressalError::Database(format!("Failed to connect to database: {}", e))
            })?;

        let db = Self { pool };
        db.initialize_schema().await?;

        Ok(db)
    }

    /// Create an in-memory database for testing.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                RedressalError::Database(format!("Failed to create in-memory db: {}", e))
            })?;

        let db = Self { pool };
        db.initialize_schema().await?;

        Ok(db)
    }

    /// Initialize database schema.
    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                RedressalError::Database(format!("Failed to initialize schema: {}", e))
            })?;

        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check if the database is healthy.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RedressalError::Database(format!("Health check failed: {}", e)))?;

        Ok(())
    }

    // ========== Admin directory ==========

    /// Register a new admin. Email and employee id must be unique.
    pub async fn register_admin(&self, new: NewAdmin) -> Result<Admin> {
        let admin = Admin {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            email: new.email,
            employee_id: new.employee_id,
            department: new.department,
            role: new.role,
            specializations: new.specializations,
            branches: new.branches,
            semesters: new.semesters,
            is_active: true,
            max_case_load: new.max_case_load,
            current_case_load: 0,
            created_at: Utc::now(),
        };

        let specializations = serde_json::to_string(
            &admin
                .specializations
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>(),
        )?;

        sqlx::query(
            "INSERT INTO admins (id, name, email, employee_id, department, role, specializations,
                                 branches, semesters, is_active, max_case_load, current_case_load, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&admin.id)
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.employee_id)
        .bind(&admin.department)
        .bind(admin.role.as_str())
        .bind(&specializations)
        .bind(&admin.branches)
        .bind(admin.semesters.map(|s| s as i64))
        .bind(admin.is_active as i64)
        .bind(admin.max_case_load as i64)
        .bind(admin.current_case_load as i64)
        .bind(admin.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to register admin: {}", e)))?;

        Ok(admin)
    }

    /// Get an admin by id.
    pub async fn get_admin(&self, admin_id: &str) -> Result<Option<Admin>> {
        let row = sqlx::query(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE id = ?"
        ))
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to get admin: {}", e)))?;

        row.map(|r| admin_from_row(&r)).transpose()
    }

    /// List all admins, least loaded first.
    pub async fn list_admins(&self) -> Result<Vec<Admin>> {
        let rows = sqlx::query(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins ORDER BY current_case_load ASC, created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to list admins: {}", e)))?;

        rows.iter().map(admin_from_row).collect()
    }

    /// The capacity pool: active admins below their caseload ceiling,
    /// ordered by current caseload then registration time.
    ///
    /// Tier filtering by specialization/branch/semester happens in the
    /// engine, over this pool.
    pub async fn eligible_admins(&self) -> Result<Vec<Admin>> {
        let rows = sqlx::query(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins
             WHERE is_active = 1 AND current_case_load < max_case_load
             ORDER BY current_case_load ASC, created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to query eligible admins: {}", e)))?;

        rows.iter().map(admin_from_row).collect()
    }

    /// Toggle an admin's assignment eligibility.
    pub async fn set_admin_active(&self, admin_id: &str, is_active: bool) -> Result<()> {
        let result = sqlx::query("UPDATE admins SET is_active = ? WHERE id = ?")
            .bind(is_active as i64)
            .bind(admin_id)
            .execute(&self.pool)
            .await
            .map_err(|e| RedressalError::Database(format!("Failed to update admin: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(RedressalError::NotFound("Admin not found".to_string()));
        }
        Ok(())
    }

    /// Adjust an admin's caseload counter by `delta`, floored at zero.
    ///
    /// The adjustment is a single SQL read-modify-write so concurrent
    /// operations on the same counter serialize in the database.
    pub async fn adjust_case_load(&self, admin_id: &str, delta: i64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE admins SET current_case_load = MAX(0, current_case_load + ?) WHERE id = ?",
        )
        .bind(delta)
        .bind(admin_id)
        .execute(&self.pool)
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to adjust caseload: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(RedressalError::NotFound("Admin not found".to_string()));
        }
        Ok(())
    }

    // ========== Complaint store ==========

    /// Insert a freshly submitted complaint.
    pub async fn create_complaint(&self, complaint: &Complaint) -> Result<()> {
        let info = complaint.student_info.clone().unwrap_or_default();

        sqlx::query(
            "INSERT INTO complaints (id, token, title, description, category, status, priority,
                                     department, is_anonymous, identity_revealed,
                                     student_name, student_roll_no, student_department,
                                     student_semester, student_phone, student_email,
                                     assignment_type, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&complaint.id)
        .bind(&complaint.token)
        .bind(&complaint.title)
        .bind(&complaint.description)
        .bind(complaint.category.as_str())
        .bind(complaint.status.as_str())
        .bind(complaint.priority.as_str())
        .bind(&complaint.department)
        .bind(complaint.is_anonymous as i64)
        .bind(complaint.identity_revealed as i64)
        .bind(&info.name)
        .bind(&info.roll_no)
        .bind(&info.department)
        .bind(info.semester.map(|s| s as i64))
        .bind(&info.phone)
        .bind(&info.email)
        .bind(complaint.assignment_type.as_str())
        .bind(complaint.created_at.to_rfc3339())
        .bind(complaint.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to create complaint: {}", e)))?;

        Ok(())
    }

    /// Get a complaint by id.
    pub async fn get_complaint(&self, complaint_id: &str) -> Result<Option<Complaint>> {
        let row = sqlx::query(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE id = ?"
        ))
        .bind(complaint_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to get complaint: {}", e)))?;

        row.map(|r| complaint_from_row(&r)).transpose()
    }

    /// Get a complaint by its public tracking token.
    pub async fn get_complaint_by_token(&self, token: &str) -> Result<Option<Complaint>> {
        let row = sqlx::query(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE token = ?"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to get complaint: {}", e)))?;

        row.map(|r| complaint_from_row(&r)).transpose()
    }

    /// Whether a tracking token is already taken.
    pub async fn token_exists(&self, token: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM complaints WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RedressalError::Database(format!("Failed to check token: {}", e)))?;

        Ok(row.is_some())
    }

    /// Complaints with no assigned admin, newest first, optionally filtered
    /// by category.
    pub async fn unassigned_complaints(
        &self,
        category: Option<Category>,
    ) -> Result<Vec<Complaint>> {
        let rows = match category {
            Some(category) => sqlx::query(&format!(
                "SELECT {COMPLAINT_COLUMNS} FROM complaints
                 WHERE assigned_to IS NULL AND category = ?
                 ORDER BY created_at DESC"
            ))
            .bind(category.as_str())
            .fetch_all(&self.pool)
            .await,
            None => sqlx::query(&format!(
                "SELECT {COMPLAINT_COLUMNS} FROM complaints
                 WHERE assigned_to IS NULL
                 ORDER BY created_at DESC"
            ))
            .fetch_all(&self.pool)
            .await,
        }
        .map_err(|e| RedressalError::Database(format!("Failed to list unassigned: {}", e)))?;

        rows.iter().map(complaint_from_row).collect()
    }

    /// Complaints assigned to a specific admin, newest first, optionally
    /// filtered by status.
    pub async fn complaints_for_admin(
        &self,
        admin_id: &str,
        status: Option<Status>,
    ) -> Result<Vec<Complaint>> {
        let rows = match status {
            Some(status) => sqlx::query(&format!(
                "SELECT {COMPLAINT_COLUMNS} FROM complaints
                 WHERE assigned_to = ? AND status = ?
                 ORDER BY created_at DESC"
            ))
            .bind(admin_id)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await,
            None => sqlx::query(&format!(
                "SELECT {COMPLAINT_COLUMNS} FROM complaints
                 WHERE assigned_to = ?
                 ORDER BY created_at DESC"
            ))
            .bind(admin_id)
            .fetch_all(&self.pool)
            .await,
        }
        .map_err(|e| RedressalError::Database(format!("Failed to list complaints: {}", e)))?;

        rows.iter().map(complaint_from_row).collect()
    }

    // ========== Message thread ==========

    /// Append a message to a complaint's thread.
    pub async fn add_message(
        &self,
        complaint_id: &str,
        body: &str,
        sender: SenderRole,
        sender_name: Option<&str>,
        visible: bool,
    ) -> Result<Message> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO complaint_messages (complaint_id, body, sender, sender_name, visible, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(complaint_id)
        .bind(body)
        .bind(sender.as_str())
        .bind(sender_name)
        .bind(visible as i64)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to add message: {}", e)))?;

        Ok(Message {
            id: result.last_insert_rowid(),
            complaint_id: complaint_id.to_string(),
            body: body.to_string(),
            sender,
            sender_name: sender_name.map(String::from),
            visible,
            created_at,
        })
    }

    /// Fetch a complaint's message thread in order, optionally restricted to
    /// messages visible to the student.
    pub async fn messages(&self, complaint_id: &str, visible_only: bool) -> Result<Vec<Message>> {
        let sql = if visible_only {
            "SELECT id, complaint_id, body, sender, sender_name, visible, created_at
             FROM complaint_messages WHERE complaint_id = ? AND visible = 1 ORDER BY id ASC"
        } else {
            "SELECT id, complaint_id, body, sender, sender_name, visible, created_at
             FROM complaint_messages WHERE complaint_id = ? ORDER BY id ASC"
        };

        let rows = sqlx::query(sql)
            .bind(complaint_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RedressalError::Database(format!("Failed to get messages: {}", e)))?;

        Ok(rows
            .iter()
            .map(|row| Message {
                id: row.get("id"),
                complaint_id: row.get("complaint_id"),
                body: row.get("body"),
                sender: SenderRole::parse(row.get("sender")),
                sender_name: row.get("sender_name"),
                visible: row.get::<i64, _>("visible") != 0,
                created_at: parse_timestamp(row.get("created_at")),
            })
            .collect())
    }

    // ========== Forward history ==========

    /// Fetch a complaint's forwarding audit trail in order.
    pub async fn forward_history(&self, complaint_id: &str) -> Result<Vec<ForwardRecord>> {
        let rows = sqlx::query(
            "SELECT id, complaint_id, from_admin, to_admin, reason, forwarded_at
             FROM forward_history WHERE complaint_id = ? ORDER BY id ASC",
        )
        .bind(complaint_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RedressalError::Database(format!("Failed to get forward history: {}", e)))?;

        Ok(rows
            .iter()
            .map(|row| ForwardRecord {
                id: row.get("id"),
                complaint_id: row.get("complaint_id"),
                from_admin: row.get("from_admin"),
                to_admin: row.get("to_admin"),
                reason: row.get("reason"),
                forwarded_at: parse_timestamp(row.get("forwarded_at")),
            })
            .collect())
    }
}

const ADMIN_COLUMNS: &str = "id, name, email, employee_id, department, role, specializations, \
                             branches, semesters, is_active, max_case_load, current_case_load, created_at";

const COMPLAINT_COLUMNS: &str = "id, token, title, description, category, status, priority, \
                                 department, is_anonymous, identity_revealed, revealed_by, revealed_at, \
                                 student_name, student_roll_no, student_department, student_semester, \
                                 student_phone, student_email, assigned_to, assigned_by, assignment_type, \
                                 assigned_at, resolution, resolved_at, resolved_by, created_at, updated_at";

/// Map an admin row to the domain type.
pub(crate) fn admin_from_row(row: &SqliteRow) -> Result<Admin> {
    let specializations: Vec<String> = serde_json::from_str(row.get("specializations"))?;

    Ok(Admin {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        employee_id: row.get("employee_id"),
        department: row.get("department"),
        role: AdminRole::parse(row.get("role")),
        specializations: specializations.iter().map(|s| Category::parse(s)).collect(),
        branches: row.get("branches"),
        semesters: row.get::<Option<i64>, _>("semesters").map(|s| s as u8),
        is_active: row.get::<i64, _>("is_active") != 0,
        max_case_load: row.get::<i64, _>("max_case_load") as u32,
        current_case_load: row.get::<i64, _>("current_case_load") as u32,
        created_at: parse_timestamp(row.get("created_at")),
    })
}

/// Map a complaint row to the domain type.
pub(crate) fn complaint_from_row(row: &SqliteRow) -> Result<Complaint> {
    let is_anonymous = row.get::<i64, _>("is_anonymous") != 0;

    let student_info = if is_anonymous {
        None
    } else {
        let info = StudentInfo {
            name: row.get("student_name"),
            roll_no: row.get("student_roll_no"),
            department: row.get("student_department"),
            semester: row
                .get::<Option<i64>, _>("student_semester")
                .map(|s| s as u8),
            phone: row.get("student_phone"),
            email: row.get("student_email"),
        };
        if info == StudentInfo::default() {
            None
        } else {
            Some(info)
        }
    };

    Ok(Complaint {
        id: row.get("id"),
        token: row.get("token"),
        title: row.get("title"),
        description: row.get("description"),
        category: Category::parse(row.get("category")),
        status: Status::parse(row.get("status")),
        priority: Priority::parse(row.get("priority")),
        department: row.get("department"),
        is_anonymous,
        identity_revealed: row.get::<i64, _>("identity_revealed") != 0,
        revealed_by: row.get("revealed_by"),
        revealed_at: parse_optional_timestamp(row.get("revealed_at")),
        student_info,
        assigned_to: row.get("assigned_to"),
        assigned_by: row.get("assigned_by"),
        assignment_type: AssignmentType::parse(row.get("assignment_type")),
        assigned_at: parse_optional_timestamp(row.get("assigned_at")),
        resolution: row.get("resolution"),
        resolved_at: parse_optional_timestamp(row.get("resolved_at")),
        resolved_by: row.get("resolved_by"),
        created_at: parse_timestamp(row.get("created_at")),
        updated_at: parse_timestamp(row.get("updated_at")),
    })
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_optional_timestamp(s: Option<&str>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

const SCHEMA: &str = r#"
-- Admin directory: the capacity pool
CREATE TABLE IF NOT EXISTS admins (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    employee_id TEXT NOT NULL UNIQUE,
    department TEXT NOT NULL,
    role TEXT DEFAULT 'admin',
    specializations TEXT NOT NULL DEFAULT '[]',
    branches TEXT,
    semesters INTEGER,
    is_active INTEGER DEFAULT 1,
    max_case_load INTEGER DEFAULT 50,
    current_case_load INTEGER DEFAULT 0,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
);

-- Complaints
CREATE TABLE IF NOT EXISTS complaints (
    id TEXT PRIMARY KEY,
    token TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    description TEXT DEFAULT '',
    category TEXT DEFAULT 'general',
    status TEXT DEFAULT 'received',
    priority TEXT DEFAULT 'normal',
    department TEXT,
    is_anonymous INTEGER DEFAULT 0,
    identity_revealed INTEGER DEFAULT 0,
    revealed_by TEXT,
    revealed_at TEXT,
    student_name TEXT,
    student_roll_no TEXT,
    student_department TEXT,
    student_semester INTEGER,
    student_phone TEXT,
    student_email TEXT,
    assigned_to TEXT,
    assigned_by TEXT,
    assignment_type TEXT DEFAULT 'auto',
    assigned_at TEXT,
    resolution TEXT,
    resolved_at TEXT,
    resolved_by TEXT,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (assigned_to) REFERENCES admins(id),
    FOREIGN KEY (assigned_by) REFERENCES admins(id)
);

-- Message thread, append only
CREATE TABLE IF NOT EXISTS complaint_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    complaint_id TEXT NOT NULL,
    body TEXT NOT NULL,
    sender TEXT DEFAULT 'admin',
    sender_name TEXT,
    visible INTEGER DEFAULT 1,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (complaint_id) REFERENCES complaints(id)
);

-- Forwarding audit trail, append only
CREATE TABLE IF NOT EXISTS forward_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    complaint_id TEXT NOT NULL,
    from_admin TEXT NOT NULL,
    to_admin TEXT NOT NULL,
    reason TEXT DEFAULT '',
    forwarded_at TEXT DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (complaint_id) REFERENCES complaints(id),
    FOREIGN KEY (from_admin) REFERENCES admins(id),
    FOREIGN KEY (to_admin) REFERENCES admins(id)
);

CREATE INDEX IF NOT EXISTS idx_complaints_category_status ON complaints(category, status);
CREATE INDEX IF NOT EXISTS idx_complaints_assigned_status ON complaints(assigned_to, status);
CREATE INDEX IF NOT EXISTS idx_admins_active ON admins(is_active);
CREATE INDEX IF NOT EXISTS idx_messages_complaint ON complaint_messages(complaint_id);
CREATE INDEX IF NOT EXISTS idx_forwards_complaint ON forward_history(complaint_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdminRole, Category, NewAdmin};

    async fn seed_complaint(db: &Database, id: &str, token: &str) {
        let now = Utc::now();
        db.create_complaint(&Complaint {
            id: id.to_string(),
            token: token.to_string(),
            title: "Seed complaint".to_string(),
            description: String::new(),
            category: Category::General,
            status: Status::Received,
            priority: Priority::Normal,
            department: None,
            is_anonymous: true,
            identity_revealed: false,
            revealed_by: None,
            revealed_at: None,
            student_info: None,
            assigned_to: None,
            assigned_by: None,
            assignment_type: AssignmentType::Auto,
            assigned_at: None,
            resolution: None,
            resolved_at: None,
            resolved_by: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("should create complaint");
    }

    fn new_admin(email: &str, employee_id: &str) -> NewAdmin {
        NewAdmin {
            name: "Test Admin".to_string(),
            email: email.to_string(),
            employee_id: employee_id.to_string(),
            department: "CSE".to_string(),
            role: AdminRole::Admin,
            specializations: vec![Category::Academic],
            branches: None,
            semesters: None,
            max_case_load: 5,
        }
    }

    #[tokio::test]
    async fn file_backed_database_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("should create tempdir");
        let path = dir.path().join("nested").join("redressal.db");

        let db = Database::new(path.to_str().expect("utf8 path"))
            .await
            .expect("should create db");
        db.health_check().await.expect("should be healthy");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn register_and_fetch_admin() {
        let db = Database::in_memory().await.expect("should create db");

        let admin = db
            .register_admin(new_admin("a@univ.edu", "EMP001"))
            .await
            .expect("should register");

        let fetched = db
            .get_admin(&admin.id)
            .await
            .expect("should fetch")
            .expect("should exist");
        assert_eq!(fetched.email, "a@univ.edu");
        assert_eq!(fetched.specializations, vec![Category::Academic]);
        assert_eq!(fetched.current_case_load, 0);
        assert!(fetched.is_active);
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let db = Database::in_memory().await.expect("should create db");

        db.register_admin(new_admin("dup@univ.edu", "EMP001"))
            .await
            .expect("should register");
        let err = db
            .register_admin(new_admin("dup@univ.edu", "EMP002"))
            .await
            .expect_err("duplicate email should fail");
        assert!(matches!(err, RedressalError::Database(_)));
    }

    #[tokio::test]
    async fn caseload_adjustment_floors_at_zero() {
        let db = Database::in_memory().await.expect("should create db");
        let admin = db
            .register_admin(new_admin("b@univ.edu", "EMP002"))
            .await
            .expect("should register");

        db.adjust_case_load(&admin.id, -3)
            .await
            .expect("should adjust");
        let fetched = db.get_admin(&admin.id).await.unwrap().unwrap();
        assert_eq!(fetched.current_case_load, 0);

        db.adjust_case_load(&admin.id, 2)
            .await
            .expect("should adjust");
        let fetched = db.get_admin(&admin.id).await.unwrap().unwrap();
        assert_eq!(fetched.current_case_load, 2);
    }

    #[tokio::test]
    async fn adjust_caseload_unknown_admin() {
        let db = Database::in_memory().await.expect("should create db");
        let err = db
            .adjust_case_load("missing", 1)
            .await
            .expect_err("should fail");
        assert!(matches!(err, RedressalError::NotFound(_)));
    }

    #[tokio::test]
    async fn eligible_admins_excludes_inactive_and_full() {
        let db = Database::in_memory().await.expect("should create db");

        let active = db
            .register_admin(new_admin("active@univ.edu", "EMP010"))
            .await
            .unwrap();
        let inactive = db
            .register_admin(new_admin("inactive@univ.edu", "EMP011"))
            .await
            .unwrap();
        let full = db
            .register_admin(new_admin("full@univ.edu", "EMP012"))
            .await
            .unwrap();

        db.set_admin_active(&inactive.id, false).await.unwrap();
        db.adjust_case_load(&full.id, 5).await.unwrap(); // max_case_load is 5

        let pool = db.eligible_admins().await.expect("should query");
        let ids: Vec<&str> = pool.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec![active.id.as_str()]);
    }

    #[tokio::test]
    async fn eligible_admins_ordered_by_caseload_then_registration() {
        let db = Database::in_memory().await.expect("should create db");

        let first = db
            .register_admin(new_admin("first@univ.edu", "EMP020"))
            .await
            .unwrap();
        let second = db
            .register_admin(new_admin("second@univ.edu", "EMP021"))
            .await
            .unwrap();
        let loaded = db
            .register_admin(new_admin("loaded@univ.edu", "EMP022"))
            .await
            .unwrap();
        db.adjust_case_load(&loaded.id, 3).await.unwrap();

        let pool = db.eligible_admins().await.expect("should query");
        let ids: Vec<&str> = pool.iter().map(|a| a.id.as_str()).collect();
        // Equal caseloads break ties by registration time, earliest first.
        assert_eq!(
            ids,
            vec![first.id.as_str(), second.id.as_str(), loaded.id.as_str()]
        );
    }

    #[tokio::test]
    async fn message_thread_append_and_visibility() {
        let db = Database::in_memory().await.expect("should create db");
        seed_complaint(&db, "cmp-1", "100001").await;

        db.add_message("cmp-1", "internal note", SenderRole::Admin, Some("Staff"), false)
            .await
            .expect("should add");
        db.add_message("cmp-1", "update for student", SenderRole::Admin, None, true)
            .await
            .expect("should add");

        let all = db.messages("cmp-1", false).await.expect("should fetch");
        assert_eq!(all.len(), 2);

        let visible = db.messages("cmp-1", true).await.expect("should fetch");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].body, "update for student");
    }
}
