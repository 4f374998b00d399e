//! Core data models for the redressal service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Complaint category, doubling as an admin specialization tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Academic,
    Sports,
    Harassment,
    Exam,
    General,
}

impl Category {
    /// Parse from storage string. Unknown values fall back to general,
    /// matching the intake default.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "academic" => Self::Academic,
            "sports" => Self::Sports,
            // "harass" is a legacy spelling still present in old records.
            "harass" | "harassment" => Self::Harassment,
            "exam" => Self::Exam,
            _ => Self::General,
        }
    }

    /// Convert to storage string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Sports => "sports",
            Self::Harassment => "harassment",
            Self::Exam => "exam",
            Self::General => "general",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::General
    }
}

/// Complaint priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "urgent" => Self::Urgent,
            _ => Self::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

/// Complaint lifecycle status.
///
/// received → assigned → in_progress → resolved/closed, with forwarded
/// reachable from assigned/in_progress when the complaint changes hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Received,
    Assigned,
    InProgress,
    Resolved,
    Closed,
    Forwarded,
}

impl Status {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "assigned" => Self::Assigned,
            "in_progress" => Self::InProgress,
            "resolved" => Self::Resolved,
            "closed" => Self::Closed,
            "forwarded" => Self::Forwarded,
            _ => Self::Received,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::Forwarded => "forwarded",
        }
    }

    /// Statuses that release the assigned admin's caseload.
    pub fn releases_caseload(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }

    /// Statuses that require a non-null assignee.
    pub fn requires_assignee(&self) -> bool {
        !matches!(self, Self::Received)
    }
}

/// How a complaint was matched to its admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentType {
    Auto,
    Manual,
}

impl AssignmentType {
    pub fn parse(s: &str) -> Self {
        match s {
            "manual" => Self::Manual,
            _ => Self::Auto,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }
}

/// Who authored a thread message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    Admin,
    Student,
    SuperAdmin,
}

impl SenderRole {
    pub fn parse(s: &str) -> Self {
        match s {
            "student" => Self::Student,
            "super_admin" => Self::SuperAdmin,
            _ => Self::Admin,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
            Self::SuperAdmin => "super_admin",
        }
    }
}

/// Staff role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    Admin,
    SuperAdmin,
}

impl AdminRole {
    pub fn parse(s: &str) -> Self {
        match s {
            "super_admin" => Self::SuperAdmin,
            _ => Self::Admin,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

/// A staff member eligible for complaint assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: String,
    pub name: String,
    pub email: String,
    pub employee_id: String,
    pub department: String,
    pub role: AdminRole,
    /// Complaint categories this admin handles.
    pub specializations: Vec<Category>,
    /// Branch/department they cover (e.g. "CSE"), if restricted.
    pub branches: Option<String>,
    /// Semester they primarily handle (1-8), if restricted.
    pub semesters: Option<u8>,
    pub is_active: bool,
    pub max_case_load: u32,
    pub current_case_load: u32,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    /// Whether this admin can take on another complaint.
    pub fn has_capacity(&self) -> bool {
        self.current_case_load < self.max_case_load
    }

    /// Whether this admin is specialized in the given category.
    pub fn handles(&self, category: Category) -> bool {
        self.specializations.contains(&category)
    }
}

/// New admin registration data.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub name: String,
    pub email: String,
    pub employee_id: String,
    pub department: String,
    pub role: AdminRole,
    pub specializations: Vec<Category>,
    pub branches: Option<String>,
    pub semesters: Option<u8>,
    pub max_case_load: u32,
}

/// Student attribution attached to a non-anonymous complaint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInfo {
    pub name: Option<String>,
    pub roll_no: Option<String>,
    pub department: Option<String>,
    pub semester: Option<u8>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// One submitted grievance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    pub id: String,
    /// 6-digit public tracking token, unique and immutable.
    pub token: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub status: Status,
    pub priority: Priority,
    /// Department the complaint is about (not necessarily the student's).
    pub department: Option<String>,
    pub is_anonymous: bool,
    pub identity_revealed: bool,
    pub revealed_by: Option<String>,
    pub revealed_at: Option<DateTime<Utc>>,
    /// Absent when the complaint is anonymous.
    pub student_info: Option<StudentInfo>,
    pub assigned_to: Option<String>,
    /// Set only for manual assignment.
    pub assigned_by: Option<String>,
    pub assignment_type: AssignmentType,
    pub assigned_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Complaint {
    /// Whether this complaint is waiting for an admin.
    pub fn is_unassigned(&self) -> bool {
        self.assigned_to.is_none()
    }
}

/// Complaint submission payload.
#[derive(Debug, Clone, Default)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub department: Option<String>,
    pub anonymous: bool,
    pub student_info: Option<StudentInfo>,
}

/// One entry in a complaint's message thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub complaint_id: String,
    pub body: String,
    pub sender: SenderRole,
    pub sender_name: Option<String>,
    pub visible: bool,
    pub created_at: DateTime<Utc>,
}

/// One hop in a complaint's forwarding audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardRecord {
    pub id: i64,
    pub complaint_id: String,
    pub from_admin: String,
    pub to_admin: String,
    pub reason: String,
    pub forwarded_at: DateTime<Utc>,
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Category parsing never panics and always lands on a known variant;
        /// unrecognized input degrades to the general bucket.
        #[test]
        fn prop_category_parse_total(s in ".*") {
            let category = Category::parse(&s);
            let known = ["academic", "sports", "harassment", "exam", "general"];
            prop_assert!(known.contains(&category.as_str()));
        }

        /// Capacity is strictly load-below-ceiling, regardless of values.
        #[test]
        fn prop_capacity_matches_loads(current in 0u32..200, max in 1u32..200) {
            let admin = Admin {
                id: "a".to_string(),
                name: "n".to_string(),
                email: "e".to_string(),
                employee_id: "emp".to_string(),
                department: "d".to_string(),
                role: AdminRole::Admin,
                specializations: vec![],
                branches: None,
                semesters: None,
                is_active: true,
                max_case_load: max,
                current_case_load: current,
                created_at: chrono::Utc::now(),
            };
            prop_assert_eq!(admin.has_capacity(), current < max);
        }
    }
}
