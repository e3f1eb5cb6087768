//! Login gate and the persisted "current user" marker.
//!
//! # Invariants
//! - Credentials are matched by plain equality on the user id and password.
//! - Marker file I/O failures are logged and never fail a login or logout.
//! - A restored marker naming a user that no longer exists is discarded.

use crate::error::AuthError;
use crate::model::{User, UserId};
use log::{info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct SessionGate {
    marker_path: Option<PathBuf>,
    current: Option<UserId>,
}

impl SessionGate {
    /// Gate without persistence; the session ends with the process.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate that mirrors the logged-in user id into `path`.
    pub fn with_marker(path: impl Into<PathBuf>) -> Self {
        Self {
            marker_path: Some(path.into()),
            current: None,
        }
    }

    pub fn current_user_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_user<'a>(&self, users: &'a [User]) -> Option<&'a User> {
        let id = self.current.as_deref()?;
        users.iter().find(|user| user.id == id)
    }

    /// Checks `password` against the account named by `identifier`.
    pub fn login(
        &mut self,
        users: &[User],
        identifier: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let user = match users.iter().find(|user| user.id == identifier) {
            Some(user) => user,
            None => {
                warn!("event=session_login module=session status=rejected reason=unknown_user");
                return Err(AuthError::UnknownUser(identifier.to_string()));
            }
        };
        if user.password != password {
            warn!(
                "event=session_login module=session status=rejected reason=password_mismatch user_id={}",
                user.id
            );
            return Err(AuthError::PasswordMismatch);
        }

        self.current = Some(user.id.clone());
        if let Some(path) = &self.marker_path {
            if let Err(err) = fs::write(path, &user.id) {
                warn!(
                    "event=session_marker module=session status=error op=write path={} error={}",
                    path.display(),
                    err
                );
            }
        }
        info!(
            "event=session_login module=session status=ok user_id={}",
            user.id
        );
        Ok(user.clone())
    }

    /// Ends the session and clears the marker.
    pub fn logout(&mut self) {
        let previous = self.current.take();
        if let Some(path) = &self.marker_path {
            remove_marker(path);
        }
        info!(
            "event=session_logout module=session status=ok had_session={}",
            previous.is_some()
        );
    }

    /// Re-establishes the session recorded in the marker, if still valid.
    pub fn restore(&mut self, users: &[User]) -> Option<User> {
        let path = self.marker_path.clone()?;
        let stored = match fs::read_to_string(&path) {
            Ok(text) => text.trim().to_string(),
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(
                    "event=session_marker module=session status=error op=read path={} error={}",
                    path.display(),
                    err
                );
                return None;
            }
        };

        match users.iter().find(|user| user.id == stored) {
            Some(user) => {
                self.current = Some(user.id.clone());
                info!(
                    "event=session_restore module=session status=ok user_id={}",
                    user.id
                );
                Some(user.clone())
            }
            None => {
                remove_marker(&path);
                info!("event=session_restore module=session status=dropped reason=unknown_user");
                None
            }
        }
    }
}

fn remove_marker(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!(
            "event=session_marker module=session status=error op=remove path={} error={}",
            path.display(),
            err
        ),
    }
}
