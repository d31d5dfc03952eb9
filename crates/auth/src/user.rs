//! Stored user accounts.
//!
//! Users exist so tasks can be assigned; credentials and token issuance for
//! end users are handled outside this service.

use serde::Serialize;

use agrisync_core::{DomainError, DomainResult, Entity, UserId, require_text};

use crate::Role;

const USERNAME_MAX_CHARS: usize = 150;
const EMAIL_MAX_CHARS: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Validated attributes for creating a user.
///
/// Usernames may contain letters, digits and `@ . + - _`. Uniqueness is
/// enforced by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl NewUser {
    pub fn new(username: &str, email: Option<&str>, role: Option<&str>) -> DomainResult<Self> {
        let username = require_text("username", username, USERNAME_MAX_CHARS)?;
        if let Some(bad) = username
            .chars()
            .find(|c| !(c.is_alphanumeric() || "@.+-_".contains(*c)))
        {
            return Err(DomainError::validation(format!(
                "username: character '{bad}' is not allowed"
            )));
        }

        let email = email.unwrap_or_default().trim().to_string();
        if !email.is_empty() {
            if email.chars().count() > EMAIL_MAX_CHARS {
                return Err(DomainError::validation(format!(
                    "email cannot be longer than {EMAIL_MAX_CHARS} characters"
                )));
            }
            match email.split_once('@') {
                Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
                _ => return Err(DomainError::validation("email: enter a valid email address")),
            }
        }

        let role = match role {
            Some(r) => Role::assignable(r)?,
            None => Role::default(),
        };

        Ok(Self {
            username,
            email,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_worker_with_blank_email() {
        let u = NewUser::new("amina", None, None).unwrap();
        assert_eq!(u.role, Role::WORKER);
        assert_eq!(u.email, "");
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(matches!(
            NewUser::new("amina", None, Some("owner")),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn validates_username_characters() {
        assert!(NewUser::new("j.doe+farm@x", None, None).is_ok());
        assert!(NewUser::new("j doe", None, None).is_err());
    }

    #[test]
    fn validates_email_shape() {
        assert!(NewUser::new("a", Some("a@farm.example"), None).is_ok());
        assert!(NewUser::new("a", Some("not-an-email"), None).is_err());
        assert!(NewUser::new("a", Some("@farm.example"), None).is_err());
    }
}
