//! User model and related types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Borrower roles. The role alone decides how many loans a user may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Librarian,
}

impl Role {
    /// Maximum number of simultaneous active loans
    pub const fn borrow_limit(self) -> usize {
        match self {
            Role::Student => 2,
            Role::Faculty => 10,
            Role::Librarian => 0,
        }
    }

    /// Single-letter tag used in the users file
    pub const fn tag(self) -> &'static str {
        match self {
            Role::Student => "A",
            Role::Faculty => "P",
            Role::Librarian => "B",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "A" => Some(Role::Student),
            "P" => Some(Role::Faculty),
            "B" => Some(Role::Librarian),
            _ => None,
        }
    }

    /// Number of role-specific columns after the password in the users file
    pub const fn extra_fields(self) -> usize {
        match self {
            Role::Student => 2,
            Role::Faculty => 1,
            Role::Librarian => 2,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Librarian => "librarian",
        };
        write!(f, "{}", label)
    }
}

/// Borrow limit for a role
pub const fn limit_for(role: Role) -> usize {
    role.borrow_limit()
}

/// Role-specific data carried by each user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RoleProfile {
    Student {
        matricula: String,
        course: String,
    },
    Faculty {
        department: String,
    },
    Librarian {
        phone: String,
        #[serde(default)]
        total_returns_processed: u32,
    },
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Student { .. } => Role::Student,
            RoleProfile::Faculty { .. } => Role::Faculty,
            RoleProfile::Librarian { .. } => Role::Librarian,
        }
    }

    /// Free-text fields, in file column order
    pub fn text_fields(&self) -> Vec<&str> {
        match self {
            RoleProfile::Student { matricula, course } => vec![matricula.as_str(), course.as_str()],
            RoleProfile::Faculty { department } => vec![department.as_str()],
            RoleProfile::Librarian { phone, .. } => vec![phone.as_str()],
        }
    }
}

/// A registered user.
///
/// `password` holds an Argon2 PHC string for accounts registered through the
/// service, or the legacy plaintext value for accounts imported from old files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub email: String,
    pub password: String,
    pub blocked: bool,
    pub profile: RoleProfile,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        profile: RoleProfile,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            blocked: false,
            profile,
        }
    }

    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn borrow_limit(&self) -> usize {
        limit_for(self.role())
    }
}

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub profile: RoleProfile,
}
