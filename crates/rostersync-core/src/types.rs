//! Domain types for roster reconciliation.
//!
//! Strongly typed identifiers for every stored entity, plus the user,
//! course, enrolment and group records the collaborator stores exchange.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Error type for ID parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse
    pub id_type: &'static str,
    /// The underlying UUID parse error message
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID using UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns a reference to the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Consumes the ID and returns the inner UUID.
            #[must_use]
            pub fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        message: e.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Identifier of a user account.
    UserId
);

define_id!(
    /// Identifier of a course.
    CourseId
);

define_id!(
    /// Identifier of a permission context (role assignments are scoped to one).
    ContextId
);

define_id!(
    /// Identifier of a role.
    RoleId
);

define_id!(
    /// Identifier of a course group.
    GroupId
);

define_id!(
    /// Identifier of a course grouping.
    GroupingId
);

define_id!(
    /// Identifier of a group-to-grouping link.
    LinkId
);

define_id!(
    /// Identifier of an enrolment method instance attached to a course.
    EnrolInstanceId
);

// ============================================================================
// Identifier field
// ============================================================================

/// User field the roster's first column is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierField {
    /// Login name.
    #[default]
    Username,
    /// Institutional ID number.
    IdNumber,
    /// Email address.
    Email,
}

impl IdentifierField {
    /// Column name used by stores.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierField::Username => "username",
            IdentifierField::IdNumber => "idnumber",
            IdentifierField::Email => "email",
        }
    }

    /// Parse from user input.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "username" => Ok(IdentifierField::Username),
            "idnumber" | "id_number" | "id-number" => Ok(IdentifierField::IdNumber),
            "email" => Ok(IdentifierField::Email),
            other => Err(format!(
                "Invalid identifier field '{other}'. Valid values: username, idnumber, email"
            )),
        }
    }
}

impl Display for IdentifierField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Records
// ============================================================================

/// A user account. Resolved by the engine, never created by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub id_number: Option<String>,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    /// Value of the given identifier field, if set.
    #[must_use]
    pub fn identifier(&self, field: IdentifierField) -> Option<&str> {
        match field {
            IdentifierField::Username => Some(self.username.as_str()),
            IdentifierField::IdNumber => self.id_number.as_deref(),
            IdentifierField::Email => self.email.as_deref(),
        }
    }

    /// "First Last", falling back to the username when both are blank.
    #[must_use]
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// A course and the context its role assignments live in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub context_id: ContextId,
    pub short_name: String,
}

/// Enrolment mechanism attached to a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrolMethod {
    /// Users are enrolled without external sync.
    #[default]
    Manual,
}

impl EnrolMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrolMethod::Manual => "manual",
        }
    }
}

/// An enrolment method instance of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolInstance {
    pub id: EnrolInstanceId,
    pub course_id: CourseId,
    pub method: EnrolMethod,
    /// Default enrolment length in seconds; zero means unbounded.
    pub enrol_period_secs: i64,
}

impl EnrolInstance {
    /// Enrolment length, if the instance defines one.
    #[must_use]
    pub fn enrol_period(&self) -> Option<Duration> {
        (self.enrol_period_secs > 0).then(|| Duration::seconds(self.enrol_period_secs))
    }
}

/// A course group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub course_id: CourseId,
    pub name: String,
    pub lang: String,
}

/// Input for creating a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub course_id: CourseId,
    pub name: String,
    /// Locale tag active when the group was created.
    pub lang: String,
}

/// A course grouping: a named container of groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub id: GroupingId,
    pub course_id: CourseId,
    pub name: String,
}

/// Input for creating a grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGrouping {
    pub course_id: CourseId,
    pub name: String,
}

/// Enrolment window for a new enrolment. `end == None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrolWindow {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

// ============================================================================
// Roster rows
// ============================================================================

/// Raw fields of one roster record as produced by a record source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord {
    /// 1-based line number in the source, for reporting.
    pub line_number: u64,
    pub fields: Vec<String>,
}

impl RawRecord {
    #[must_use]
    pub fn new(line_number: u64, fields: Vec<String>) -> Self {
        Self {
            line_number,
            fields,
        }
    }
}

/// Characters stripped from roster cells before use.
pub const QUOTE_CHARS: &[char] = &['"'];

/// Strip quote characters and surrounding whitespace from a roster cell.
#[must_use]
pub fn normalize_cell(raw: &str) -> String {
    raw.trim().replace(QUOTE_CHARS, "").trim().to_string()
}

/// A normalized roster row: identifier plus (possibly empty) group name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line_number: u64,
    pub identifier: String,
    pub group_name: String,
}

impl Row {
    /// Build a row from a raw record. Returns `None` for records with no fields.
    #[must_use]
    pub fn from_record(record: &RawRecord) -> Option<Self> {
        let first = record.fields.first()?;
        Some(Self {
            line_number: record.line_number,
            identifier: normalize_cell(first),
            group_name: record
                .fields
                .get(1)
                .map(|g| normalize_cell(g))
                .unwrap_or_default(),
        })
    }
}
