//! User directory snapshot: one `roleTag,name,email,password,<role fields>` line per user
//!
//! A `!` after the role tag (e.g. `A!`) marks a blocked account.

use std::collections::HashSet;

use crate::{
    error::{AppError, AppResult},
    models::{Role, RoleProfile, User},
};

const BLOCKED_MARKER: char = '!';

pub fn parse(content: &str, file: &str) -> AppResult<Vec<User>> {
    let mut users = Vec::new();
    let mut seen = HashSet::new();

    for (index, line) in content.lines().enumerate() {
        let record = index + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let user = parse_line(line).map_err(|reason| AppError::corrupt(file, record, reason))?;
        if !seen.insert(user.email.clone()) {
            return Err(AppError::corrupt(
                file,
                record,
                format!("duplicate email {}", user.email),
            ));
        }
        users.push(user);
    }

    Ok(users)
}

/// Role columns are taken from the end of the line, so the password may
/// itself contain commas.
fn parse_line(line: &str) -> Result<User, String> {
    let fields: Vec<&str> = line.split(',').collect();

    let raw_tag = fields.first().copied().unwrap_or_default().trim();
    let (tag, blocked) = match raw_tag.strip_suffix(BLOCKED_MARKER) {
        Some(tag) => (tag, true),
        None => (raw_tag, false),
    };
    let role = Role::from_tag(tag).ok_or_else(|| format!("unknown user type '{}'", raw_tag))?;

    let expected = 4 + role.extra_fields();
    if fields.len() < expected {
        return Err(format!(
            "{} record needs {} fields, found {}",
            role,
            expected,
            fields.len()
        ));
    }

    let (head, tail) = fields.split_at(fields.len() - role.extra_fields());
    let name = head[1].trim();
    let email = head[2].trim();
    let password = head[3..].join(",");
    if email.is_empty() {
        return Err("empty email".to_string());
    }

    let profile = match role {
        Role::Student => RoleProfile::Student {
            matricula: tail[0].trim().to_string(),
            course: tail[1].trim().to_string(),
        },
        Role::Faculty => RoleProfile::Faculty {
            department: tail[0].trim().to_string(),
        },
        Role::Librarian => RoleProfile::Librarian {
            phone: tail[0].trim().to_string(),
            total_returns_processed: tail[1].trim().parse().map_err(|_| {
                format!("invalid return count '{}'", tail[1].trim())
            })?,
        },
    };

    Ok(User {
        name: name.to_string(),
        email: email.to_string(),
        password,
        blocked,
        profile,
    })
}

pub fn format(users: &[User]) -> String {
    let mut out = String::new();
    for user in users {
        out.push_str(user.role().tag());
        if user.blocked {
            out.push(BLOCKED_MARKER);
        }
        out.push_str(&format!(",{},{},{}", user.name, user.email, user.password));
        match &user.profile {
            RoleProfile::Student { matricula, course } => {
                out.push_str(&format!(",{},{}", matricula, course))
            }
            RoleProfile::Faculty { department } => out.push_str(&format!(",{}", department)),
            RoleProfile::Librarian {
                phone,
                total_returns_processed,
            } => out.push_str(&format!(",{},{}", phone, total_returns_processed)),
        }
        out.push('\n');
    }
    out
}
