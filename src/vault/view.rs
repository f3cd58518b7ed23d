//! Client state for the vault: which screen is showing and who is signed in.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::store::{LocalVault, VaultRecord, VaultSession};
use super::VaultError;
use crate::models::RecordFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthForm {
    Login,
    Register,
}

/// The screen the client is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientView {
    SignedOut { form: AuthForm },
    Dashboard,
    /// `None` while filling a new record.
    EditingRecord { record_id: Option<Uuid> },
}

/// Owns the optional session and the current view. Every transition goes
/// through a method here.
pub struct VaultController {
    vault: LocalVault,
    session: Option<VaultSession>,
    view: ClientView,
}

impl VaultController {
    pub fn new(vault: LocalVault) -> Self {
        Self {
            vault,
            session: None,
            view: ClientView::SignedOut { form: AuthForm::Login },
        }
    }

    pub fn view(&self) -> ClientView {
        self.view
    }

    pub fn current_user(&self) -> Option<&str> {
        self.session.as_ref().map(VaultSession::username)
    }

    pub fn show_login(&mut self) {
        if self.session.is_none() {
            self.view = ClientView::SignedOut { form: AuthForm::Login };
        }
    }

    pub fn show_register(&mut self) {
        if self.session.is_none() {
            self.view = ClientView::SignedOut { form: AuthForm::Register };
        }
    }

    /// Register, then switch to the login form.
    pub fn register(
        &mut self,
        username: &str,
        password: &str,
        confirmation: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VaultError> {
        self.vault.register(username, password, confirmation, now)?;
        self.view = ClientView::SignedOut { form: AuthForm::Login };
        Ok(())
    }

    pub fn login(&mut self, username: &str, password: &str, now: DateTime<Utc>) -> Result<(), VaultError> {
        let session = self.vault.login(username, password, now)?;
        self.session = Some(session);
        self.view = ClientView::Dashboard;
        Ok(())
    }

    pub fn logout(&mut self) {
        self.session = None;
        self.view = ClientView::SignedOut { form: AuthForm::Login };
    }

    /// Sign out if the session outlived its lifetime. Returns whether a
    /// session is still active.
    pub fn check_session(&mut self, now: DateTime<Utc>) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        if session.is_expired(now) {
            tracing::info!("Vault session expired");
            self.logout();
            return false;
        }
        true
    }

    pub fn records(&mut self, now: DateTime<Utc>) -> Result<Vec<VaultRecord>, VaultError> {
        self.ensure_active(now)?;
        let session = self.session.as_ref().ok_or(VaultError::NotSignedIn)?;
        self.vault.list_records(session, now)
    }

    pub fn new_record(&mut self, now: DateTime<Utc>) -> Result<(), VaultError> {
        self.ensure_active(now)?;
        self.view = ClientView::EditingRecord { record_id: None };
        Ok(())
    }

    /// Open an existing record for editing and return its current content.
    pub fn edit_record(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<VaultRecord, VaultError> {
        self.ensure_active(now)?;
        let session = self.session.as_ref().ok_or(VaultError::NotSignedIn)?;
        let record = self.vault.get_record(session, &id, now)?;
        self.view = ClientView::EditingRecord { record_id: Some(id) };
        Ok(record)
    }

    /// Save the open form and return to the dashboard.
    pub fn submit_form(&mut self, data: RecordFields, now: DateTime<Utc>) -> Result<VaultRecord, VaultError> {
        let ClientView::EditingRecord { record_id } = self.view else {
            return Err(VaultError::NotEditing);
        };
        self.ensure_active(now)?;
        let session = self.session.as_ref().ok_or(VaultError::NotSignedIn)?;
        let record = self.vault.save_record(session, record_id, data, now)?;
        self.view = ClientView::Dashboard;
        Ok(record)
    }

    pub fn cancel_edit(&mut self) {
        if matches!(self.view, ClientView::EditingRecord { .. }) {
            self.view = ClientView::Dashboard;
        }
    }

    pub fn delete_record(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<(), VaultError> {
        self.ensure_active(now)?;
        let session = self.session.as_ref().ok_or(VaultError::NotSignedIn)?;
        self.vault.delete_record(session, &id, now)
    }

    fn ensure_active(&mut self, now: DateTime<Utc>) -> Result<(), VaultError> {
        if self.session.is_none() {
            return Err(VaultError::NotSignedIn);
        }
        if !self.check_session(now) {
            return Err(VaultError::SessionExpired);
        }
        Ok(())
    }
}
