use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::domain::{Role, User, UserId};
use super::repository::{RepositoryError, UserDirectory};

/// The signed-in user, passed explicitly to every service call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user: User,
}

impl Session {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no user registered for {0}")]
    UnknownEmail(String),
    #[error("no user holds the {} role", .0.label())]
    UnknownRole(Role),
    #[error(transparent)]
    Directory(#[from] RepositoryError),
}

/// Role-selection login over the user directory. There are no credentials.
pub struct AuthService<U> {
    directory: Arc<U>,
}

impl<U> AuthService<U>
where
    U: UserDirectory + 'static,
{
    pub fn new(directory: Arc<U>) -> Self {
        Self { directory }
    }

    pub fn login(&self, email: &str) -> Result<Session, AuthError> {
        let user = self
            .directory
            .find_by_email(email)?
            .ok_or_else(|| AuthError::UnknownEmail(email.trim().to_string()))?;
        info!(user_id = %user.id.0, role = user.role.label(), "user signed in");
        Ok(Session::new(user))
    }

    pub fn login_as(&self, role: Role) -> Result<Session, AuthError> {
        let user = self
            .directory
            .find_by_role(role)?
            .ok_or(AuthError::UnknownRole(role))?;
        info!(user_id = %user.id.0, role = role.label(), "user signed in by role");
        Ok(Session::new(user))
    }

    /// Resolve the session for a previously issued user id, if it is still known.
    pub fn current(&self, user_id: &UserId) -> Result<Option<Session>, AuthError> {
        Ok(self.directory.fetch(user_id)?.map(Session::new))
    }

    pub fn logout(&self, session: Session) {
        info!(user_id = %session.user.id.0, "user signed out");
    }
}
