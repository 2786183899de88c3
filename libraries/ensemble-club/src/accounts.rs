//! Accounts: registration, approval, login, admin user management and
//! profile self-edit
//!
//! In local mode a registration waits in the signup list and names are
//! unique across users and signups. In cloud mode a registration is an
//! unapproved user record and email addresses are the unique login.

use crate::club::{Changes, Club};
use ensemble_core::types::ADMIN_NAME;
use ensemble_core::{
    Action, Actor, AuthFailure, Backend, ClubError, LogAction, MemberPart, Result,
    Role, Signup, User, UserId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

/// Self-service registration form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
    pub confirm: String,
    #[serde(default)]
    pub dept: String,
    #[serde(flatten)]
    pub part: MemberPart,
}

/// What happened to a registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RegistrationOutcome {
    /// Filed for admin review
    Pending { id: UserId },
    /// Usable right away
    Approved { id: UserId },
}

/// Admin "add user" form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
    #[serde(default)]
    pub dept: String,
    #[serde(flatten)]
    pub part: MemberPart,
}

/// Admin "edit user" form; an empty password keeps the current one
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEdit {
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub dept: String,
    #[serde(flatten)]
    pub part: MemberPart,
}

/// Profile self-edit form. Password fields are all empty unless the
/// member is changing their password.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEdit {
    pub name: String,
    #[serde(default)]
    pub dept: String,
    #[serde(flatten)]
    pub part: MemberPart,
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl ProfileEdit {
    fn changes_password(&self) -> bool {
        !(self.current_password.is_empty()
            && self.new_password.is_empty()
            && self.confirm_password.is_empty())
    }
}

fn required_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ClubError::validation("name is required"));
    }
    Ok(name.to_string())
}

fn normalized_email(email: Option<&str>) -> Result<String> {
    let email = email.map(str::trim).unwrap_or_default().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ClubError::validation("a valid email address is required"));
    }
    Ok(email)
}

fn part_label(part: &MemberPart) -> String {
    part.label().to_string()
}

impl Club {
    // ========================================================================
    // Reads
    // ========================================================================

    /// Accounts snapshot (admin view)
    pub async fn users(&self, actor: &Actor) -> Result<Vec<User>> {
        self.policy.authorize(Some(actor), Action::ManageUsers)?;
        Ok(self.state.lock().await.users.clone())
    }

    /// Registrations waiting for approval, in either mode
    pub async fn pending_signups(&self, actor: &Actor) -> Result<Vec<Signup>> {
        self.policy.authorize(Some(actor), Action::ReviewSignups)?;
        let state = self.state.lock().await;
        Ok(match self.config.mode {
            Backend::Local => state.signups.clone(),
            Backend::Cloud => state
                .users
                .iter()
                .filter(|u| !u.approved)
                .map(|u| Signup {
                    id: u.id.clone(),
                    name: u.name.clone(),
                    hash: String::new(),
                    dept: u.dept.clone(),
                    part: u.part.clone(),
                    created_at: u.created_at,
                })
                .collect(),
        })
    }

    // ========================================================================
    // Registration and approval
    // ========================================================================

    /// File a self-service registration.
    pub async fn register(&self, form: Registration) -> Result<RegistrationOutcome> {
        let name = required_name(&form.name)?;
        if form.password.is_empty() || form.confirm.is_empty() {
            return Err(ClubError::validation("name and password are required"));
        }
        if form.password != form.confirm {
            return Err(ClubError::validation("passwords do not match"));
        }
        form.part.validate()?;
        let email = match self.config.mode {
            Backend::Local => None,
            Backend::Cloud => Some(normalized_email(form.email.as_deref())?),
        };

        let mut state = self.lock().await;
        let mut users = self.load_users().await?;
        let mut signups = self.load_signups().await?;
        match &email {
            None => {
                if users.iter().any(|u| u.name == name) {
                    return Err(ClubError::conflict("name is already registered"));
                }
                if signups.iter().any(|s| s.name == name) {
                    return Err(ClubError::conflict("name is already waiting for approval"));
                }
            }
            Some(email) => {
                if users.iter().any(|u| u.email.as_deref() == Some(email.as_str())) {
                    return Err(ClubError::conflict("email is already registered"));
                }
            }
        }

        let hash = self.hasher.hash(&form.password).await?;
        let now = Utc::now();
        let meta = json!({ "name": name, "dept": form.dept.trim(), "part": part_label(&form.part) });

        // Local registrations with approval on go to the signup list
        if email.is_none() && self.config.require_approval {
            let signup = Signup {
                id: UserId::generate(),
                name,
                hash,
                dept: form.dept.trim().to_string(),
                part: form.part,
                created_at: now,
            };
            let id = signup.id.clone();
            signups.push(signup);
            let changes = Changes::default().signups(signups);
            self.commit(&mut state, changes, None, LogAction::SignupRequested, meta)
                .await?;
            return Ok(RegistrationOutcome::Pending { id });
        }

        let is_admin = email.as_deref().is_some_and(|e| self.config.is_admin_email(e));
        let approved = is_admin || !self.config.require_approval;
        let user = User {
            id: UserId::generate(),
            name,
            email,
            hash,
            dept: form.dept.trim().to_string(),
            part: form.part,
            created_at: now,
            role: if is_admin { Role::Admin } else { Role::Member },
            approved,
        };
        let id = user.id.clone();
        users.push(user);

        let action = if approved {
            LogAction::SignupAutoApproved
        } else {
            LogAction::SignupRequested
        };
        let changes = Changes::default().users(users);
        self.commit(&mut state, changes, None, action, meta).await?;
        Ok(if approved {
            RegistrationOutcome::Approved { id }
        } else {
            RegistrationOutcome::Pending { id }
        })
    }

    /// Approve a pending registration.
    ///
    /// A request that has already been handled, or whose name was taken in
    /// the meantime, is a conflict.
    pub async fn approve_signup(&self, actor: &Actor, id: &UserId) -> Result<User> {
        self.policy.authorize(Some(actor), Action::ReviewSignups)?;

        let mut state = self.lock().await;
        let mut users = self.load_users().await?;
        let (user, changes) = match self.config.mode {
            Backend::Local => {
                let mut signups = self.load_signups().await?;
                let idx = signups
                    .iter()
                    .position(|s| &s.id == id)
                    .ok_or_else(|| ClubError::conflict("signup was already handled"))?;
                if users.iter().any(|u| u.name == signups[idx].name) {
                    return Err(ClubError::conflict("an account with this name already exists"));
                }
                let user = signups.remove(idx).into_user(Utc::now());
                users.push(user.clone());
                (user, Changes::default().users(users).signups(signups))
            }
            Backend::Cloud => {
                let user = users
                    .iter_mut()
                    .find(|u| &u.id == id && !u.approved)
                    .ok_or_else(|| ClubError::conflict("signup was already handled"))?;
                user.approved = true;
                let user = user.clone();
                (user, Changes::default().users(users))
            }
        };

        let meta = json!({ "name": user.name, "dept": user.dept, "part": part_label(&user.part) });
        self.commit(&mut state, changes, Some(actor), LogAction::SignupApproved, meta)
            .await?;
        info!(name = %user.name, "Signup approved");
        Ok(user)
    }

    /// Discard a pending registration.
    pub async fn reject_signup(&self, actor: &Actor, id: &UserId) -> Result<()> {
        self.policy.authorize(Some(actor), Action::ReviewSignups)?;

        let mut state = self.lock().await;
        let (name, changes) = match self.config.mode {
            Backend::Local => {
                let mut signups = self.load_signups().await?;
                let idx = signups
                    .iter()
                    .position(|s| &s.id == id)
                    .ok_or_else(|| ClubError::conflict("signup was already handled"))?;
                let removed = signups.remove(idx);
                (removed.name, Changes::default().signups(signups))
            }
            Backend::Cloud => {
                let mut users = self.load_users().await?;
                let idx = users
                    .iter()
                    .position(|u| &u.id == id && !u.approved)
                    .ok_or_else(|| ClubError::conflict("signup was already handled"))?;
                let removed = users.remove(idx);
                (removed.name, Changes::default().users(users))
            }
        };

        let meta = json!({ "name": name });
        self.commit(&mut state, changes, Some(actor), LogAction::SignupRejected, meta)
            .await
    }

    // ========================================================================
    // Login
    // ========================================================================

    /// Check a credential and return the identity it belongs to.
    ///
    /// `login` is the display name in local mode and the email address in
    /// cloud mode. The failure says which of unknown, pending or wrong
    /// password applies.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<Actor> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Err(ClubError::validation("name and password are required"));
        }

        let state = self.state.lock().await;
        let user = match self.config.mode {
            Backend::Local => {
                if login == ADMIN_NAME {
                    if password != self.config.admin_password {
                        return Err(AuthFailure::WrongPassword.into());
                    }
                    let admin = state
                        .users
                        .iter()
                        .find(|u| u.name == ADMIN_NAME)
                        .ok_or(AuthFailure::UnknownUser)?;
                    return Ok(Actor::from(admin));
                }
                match state.users.iter().find(|u| u.name == login) {
                    Some(user) => user.clone(),
                    None if state.signups.iter().any(|s| s.name == login) => {
                        return Err(AuthFailure::PendingApproval.into());
                    }
                    None => return Err(AuthFailure::UnknownUser.into()),
                }
            }
            Backend::Cloud => {
                let email = login.to_lowercase();
                state
                    .users
                    .iter()
                    .find(|u| u.email.as_deref() == Some(email.as_str()))
                    .cloned()
                    .ok_or(AuthFailure::UnknownUser)?
            }
        };
        drop(state);

        if !self.hasher.verify(password, &user.hash).await? {
            return Err(AuthFailure::WrongPassword.into());
        }
        // Checked on every sign-in, never cached
        if !user.approved {
            return Err(AuthFailure::PendingApproval.into());
        }
        debug!(name = %user.name, "Authenticated");
        Ok(Actor::from(&user))
    }

    // ========================================================================
    // Admin user management
    // ========================================================================

    fn ensure_unique_name(
        &self,
        users: &[User],
        signups: &[Signup],
        name: &str,
        except: Option<&UserId>,
    ) -> Result<()> {
        let taken = users
            .iter()
            .any(|u| u.name == name && Some(&u.id) != except)
            || (self.config.mode == Backend::Local && signups.iter().any(|s| s.name == name));
        if taken {
            Err(ClubError::conflict("name already exists"))
        } else {
            Ok(())
        }
    }

    pub async fn create_user(&self, actor: &Actor, form: NewUser) -> Result<User> {
        self.policy.authorize(Some(actor), Action::ManageUsers)?;
        let name = required_name(&form.name)?;
        form.part.validate()?;
        if form.password.is_empty() {
            return Err(ClubError::validation("a password is required for new users"));
        }
        let email = match self.config.mode {
            Backend::Local => None,
            Backend::Cloud => Some(normalized_email(form.email.as_deref())?),
        };

        let mut state = self.lock().await;
        let mut users = self.load_users().await?;
        let signups = self.load_signups().await?;
        match &email {
            None => self.ensure_unique_name(&users, &signups, &name, None)?,
            Some(email) => {
                if users.iter().any(|u| u.email.as_deref() == Some(email.as_str())) {
                    return Err(ClubError::conflict("email is already registered"));
                }
            }
        }

        let user = User {
            id: UserId::generate(),
            name,
            email,
            hash: self.hasher.hash(&form.password).await?,
            dept: form.dept.trim().to_string(),
            part: form.part,
            created_at: Utc::now(),
            role: Role::Member,
            approved: true,
        };
        users.push(user.clone());

        let meta = json!({ "name": user.name });
        let changes = Changes::default().users(users);
        self.commit(&mut state, changes, Some(actor), LogAction::UserAdded, meta)
            .await?;
        Ok(user)
    }

    pub async fn update_user(&self, actor: &Actor, id: &UserId, form: UserEdit) -> Result<User> {
        self.policy.authorize(Some(actor), Action::ManageUsers)?;
        let name = required_name(&form.name)?;
        form.part.validate()?;

        let mut state = self.lock().await;
        let mut users = self.load_users().await?;
        let signups = self.load_signups().await?;
        let target = find_user(&users, id)?;
        if target.is_admin() {
            return Err(ClubError::protected_account(
                "the admin account is managed separately",
            ));
        }
        let old_name = target.name.clone();
        if name != old_name {
            self.ensure_unique_name(&users, &signups, &name, Some(id))?;
        }
        let hash = if form.password.is_empty() {
            None
        } else {
            Some(self.hasher.hash(&form.password).await?)
        };

        let user = users
            .iter_mut()
            .find(|u| &u.id == id)
            .ok_or_else(|| ClubError::not_found("User", id.as_str()))?;
        user.name = name;
        user.dept = form.dept.trim().to_string();
        user.part = form.part;
        if let Some(hash) = hash {
            user.hash = hash;
        }
        let user = user.clone();

        let meta = json!({ "oldName": old_name, "newName": user.name });
        let changes = Changes::default().users(users);
        self.commit(&mut state, changes, Some(actor), LogAction::UserEdited, meta)
            .await?;
        Ok(user)
    }

    /// Set a member's password. The admin credential cannot be reset here.
    pub async fn reset_password(&self, actor: &Actor, id: &UserId, password: &str) -> Result<()> {
        self.policy.authorize(Some(actor), Action::ManageUsers)?;
        if password.is_empty() {
            return Err(ClubError::validation("a new password is required"));
        }

        let mut state = self.lock().await;
        let mut users = self.load_users().await?;
        if find_user(&users, id)?.is_admin() {
            return Err(ClubError::protected_account(
                "the admin password cannot be reset here",
            ));
        }
        let hash = self.hasher.hash(password).await?;
        let user = users
            .iter_mut()
            .find(|u| &u.id == id)
            .ok_or_else(|| ClubError::not_found("User", id.as_str()))?;
        user.hash = hash;
        let meta = json!({ "name": user.name });
        let changes = Changes::default().users(users);
        self.commit(&mut state, changes, Some(actor), LogAction::PasswordReset, meta)
            .await
    }

    /// Delete an account. The admin account cannot be deleted.
    pub async fn delete_user(&self, actor: &Actor, id: &UserId) -> Result<User> {
        self.policy.authorize(Some(actor), Action::ManageUsers)?;

        let mut state = self.lock().await;
        let mut users = self.load_users().await?;
        if find_user(&users, id)?.is_admin() {
            return Err(ClubError::protected_account(
                "the admin account cannot be deleted",
            ));
        }
        let idx = users
            .iter()
            .position(|u| &u.id == id)
            .ok_or_else(|| ClubError::not_found("User", id.as_str()))?;
        let removed = users.remove(idx);

        let meta = json!({ "name": removed.name });
        let changes = Changes::default().users(users);
        self.commit(&mut state, changes, Some(actor), LogAction::UserDeleted, meta)
            .await?;
        Ok(removed)
    }

    // ========================================================================
    // Profile self-edit
    // ========================================================================

    /// Edit one's own account.
    ///
    /// The admin may change department and part only; renaming it or
    /// changing its password here is refused.
    pub async fn update_profile(&self, actor: &Actor, form: ProfileEdit) -> Result<User> {
        let name = required_name(&form.name)?;
        form.part.validate()?;

        let mut state = self.lock().await;
        let mut users = self.load_users().await?;
        let signups = self.load_signups().await?;
        let current = find_user(&users, &actor.id)?.clone();

        if current.is_admin() {
            if name != current.name {
                return Err(ClubError::protected_account("the admin account cannot be renamed"));
            }
            if form.changes_password() {
                return Err(ClubError::protected_account(
                    "the admin password cannot be changed here",
                ));
            }
        } else if name != current.name {
            self.ensure_unique_name(&users, &signups, &name, Some(&actor.id))?;
        }

        let new_hash = if form.changes_password() {
            Some(self.checked_password_change(&current, &form).await?)
        } else {
            None
        };

        let user = users
            .iter_mut()
            .find(|u| u.id == actor.id)
            .ok_or(AuthFailure::NotSignedIn)?;
        user.name = name;
        user.dept = form.dept.trim().to_string();
        user.part = form.part;
        let password_changed = new_hash.is_some();
        if let Some(hash) = new_hash {
            user.hash = hash;
        }
        let user = user.clone();

        let mut entries = Vec::with_capacity(2);
        if password_changed {
            entries.push((LogAction::SelfPasswordChanged, json!({ "name": user.name })));
        }
        entries.push((
            LogAction::SelfEdited,
            json!({ "oldName": current.name, "newName": user.name }),
        ));

        // Log under the new name so the entry matches the session
        let acting = Actor::from(&user);
        let changes = Changes::default().users(users);
        self.commit_all(&mut state, changes, Some(&acting), entries).await?;
        Ok(user)
    }

    async fn checked_password_change(&self, current: &User, form: &ProfileEdit) -> Result<String> {
        if form.current_password.is_empty() {
            return Err(ClubError::validation("enter the current password"));
        }
        if !self.hasher.verify(&form.current_password, &current.hash).await? {
            return Err(AuthFailure::WrongPassword.into());
        }
        if form.new_password.is_empty() {
            return Err(ClubError::validation("enter the new password"));
        }
        if form.new_password != form.confirm_password {
            return Err(ClubError::validation("new passwords do not match"));
        }
        self.hasher.hash(&form.new_password).await
    }
}

fn find_user<'a>(users: &'a [User], id: &UserId) -> Result<&'a User> {
    users
        .iter()
        .find(|u| &u.id == id)
        .ok_or_else(|| ClubError::not_found("User", id.as_str()))
}
