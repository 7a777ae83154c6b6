// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use defivelo_domain::Canton;
use defivelo_persistence::{AccountData, LoginSessionData, Persistence};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::error::AuthError;

/// Account roles for authorization.
///
/// Roles apply to intranet login accounts, never to volunteer profiles:
/// most volunteers in the directory have no account at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Full structural and corrective authority everywhere.
    ///
    /// Power users manage accounts, seasons in every canton, and may
    /// perform any action a coordinator can.
    PowerUser,
    /// Manages a set of cantons.
    ///
    /// Coordinators run the planning workflow for their cantons: sessions,
    /// staff assignment, timesheet validation, and invoicing for the
    /// organizations there.
    Coordinator,
    /// A volunteer's own login, linked to a volunteer profile.
    ///
    /// Collaborators declare their own availability and read their own
    /// assignments and timesheets.
    Collaborator,
}

impl Role {
    /// Converts this role to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PowerUser => "PowerUser",
            Self::Coordinator => "Coordinator",
            Self::Collaborator => "Collaborator",
        }
    }

    /// Parses a stored role string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a known role.
    pub fn parse(s: &str) -> Result<Self, AuthError> {
        match s {
            "PowerUser" => Ok(Self::PowerUser),
            "Coordinator" => Ok(Self::Coordinator),
            "Collaborator" => Ok(Self::Collaborator),
            _ => Err(AuthError::AuthenticationFailed {
                reason: format!("Invalid role: {s}"),
            }),
        }
    }
}

/// An authenticated intranet account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    /// The account's database ID.
    pub account_id: i64,
    /// The account's display name.
    pub display_name: String,
    /// The account's role.
    pub role: Role,
    /// The cantons a coordinator manages. Empty for other roles.
    pub managed_cantons: Vec<Canton>,
    /// The linked volunteer profile, for collaborator accounts.
    pub profile_id: Option<i64>,
}

impl AuthenticatedAccount {
    /// Builds an authenticated account from stored account data.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored role or canton list is corrupt.
    pub fn from_account_data(account: &AccountData) -> Result<Self, AuthError> {
        let role: Role = Role::parse(&account.role)?;
        let managed_cantons: Vec<Canton> = Canton::parse_list(&account.managed_cantons)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Corrupt managed canton list: {e}"),
            })?;
        Ok(Self {
            account_id: account.account_id,
            display_name: account.display_name.clone(),
            role,
            managed_cantons,
            profile_id: account.profile_id,
        })
    }

    /// Returns whether this account has the power user role.
    #[must_use]
    pub fn is_power_user(&self) -> bool {
        self.role == Role::PowerUser
    }

    /// Returns whether this account has authority over the given canton.
    ///
    /// Power users manage every canton; coordinators manage their list;
    /// collaborators manage none.
    #[must_use]
    pub fn manages_canton(&self, canton: &Canton) -> bool {
        match self.role {
            Role::PowerUser => true,
            Role::Coordinator => self.managed_cantons.contains(canton),
            Role::Collaborator => false,
        }
    }

    /// Returns whether this account is the collaborator login of the given
    /// volunteer profile.
    #[must_use]
    pub fn owns_profile(&self, profile_id: i64) -> bool {
        self.profile_id == Some(profile_id)
    }
}

/// Authorization service for enforcing role-based, canton-scoped access.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Checks that the account has the power user role.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is not a power user.
    pub fn require_power_user(
        account: &AuthenticatedAccount,
        action: &str,
    ) -> Result<(), AuthError> {
        if account.is_power_user() {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: String::from(action),
                required: String::from("the PowerUser role"),
            })
        }
    }

    /// Checks that the account is staff (power user or coordinator).
    ///
    /// # Errors
    ///
    /// Returns an error if the account is a collaborator.
    pub fn require_staff(account: &AuthenticatedAccount, action: &str) -> Result<(), AuthError> {
        match account.role {
            Role::PowerUser | Role::Coordinator => Ok(()),
            Role::Collaborator => Err(AuthError::Unauthorized {
                action: String::from(action),
                required: String::from("a staff role"),
            }),
        }
    }

    /// Checks that the account has authority over one canton.
    ///
    /// # Errors
    ///
    /// Returns an error if the canton is outside the account's scope.
    pub fn require_canton(
        account: &AuthenticatedAccount,
        canton: &Canton,
        action: &str,
    ) -> Result<(), AuthError> {
        if account.manages_canton(canton) {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: String::from(action),
                required: format!("authority over canton {canton}"),
            })
        }
    }

    /// Checks that the account has authority over every listed canton.
    ///
    /// Used for season-wide operations such as lifecycle transitions.
    ///
    /// # Errors
    ///
    /// Returns an error if any canton is outside the account's scope.
    pub fn require_all_cantons(
        account: &AuthenticatedAccount,
        cantons: &[Canton],
        action: &str,
    ) -> Result<(), AuthError> {
        for canton in cantons {
            Self::require_canton(account, canton, action)?;
        }
        Ok(())
    }

    /// Checks that the account may act on a volunteer profile's data.
    ///
    /// Collaborators may act on their own linked profile; staff need
    /// authority over the profile's canton.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile is outside the account's scope.
    pub fn require_profile_access(
        account: &AuthenticatedAccount,
        profile_id: i64,
        profile_canton: &Canton,
        action: &str,
    ) -> Result<(), AuthError> {
        if account.owns_profile(profile_id) || account.manages_canton(profile_canton) {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: String::from(action),
                required: String::from("your own profile or authority over its canton"),
            })
        }
    }
}

/// Session-token based authentication service.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Session expiration duration (30 days).
    const SESSION_EXPIRATION: Duration = Duration::days(30);

    /// Authenticates an account by login email and password, creating a
    /// login session on success.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `login_email` - The account login email
    /// * `password` - The cleartext password to verify
    ///
    /// # Returns
    ///
    /// A tuple of (`session_token`, `authenticated_account`).
    ///
    /// # Errors
    ///
    /// Returns an error if the account is unknown, disabled, or the
    /// password does not match. The reason is deliberately uniform for
    /// unknown accounts and wrong passwords.
    pub fn login(
        persistence: &mut Persistence,
        login_email: &str,
        password: &str,
    ) -> Result<(String, AuthenticatedAccount), AuthError> {
        let account: AccountData = persistence
            .get_account_by_login(login_email)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Database error: {e}"),
            })?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid credentials"),
            })?;

        if account.is_disabled {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Account is disabled"),
            });
        }

        let password_matches: bool = persistence
            .verify_password(password, &account.password_hash)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Password verification error: {e}"),
            })?;
        if !password_matches {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Invalid credentials"),
            });
        }

        let authenticated: AuthenticatedAccount =
            AuthenticatedAccount::from_account_data(&account)?;

        let session_token: String = Self::generate_session_token();
        let expires_at: OffsetDateTime = OffsetDateTime::now_utc() + Self::SESSION_EXPIRATION;
        let expires_at_str: String =
            expires_at
                .format(&Rfc3339)
                .map_err(|e| AuthError::AuthenticationFailed {
                    reason: format!("Failed to format expiration time: {e}"),
                })?;

        persistence
            .create_login_session(&session_token, account.account_id, &expires_at_str)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to create login session: {e}"),
            })?;
        persistence
            .update_last_login(account.account_id)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to update last login: {e}"),
            })?;

        debug!("Account {} logged in", account.account_id);
        Ok((session_token, authenticated))
    }

    /// Validates a session token and returns the authenticated account.
    ///
    /// Touches the session's activity timestamp on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown or expired, or the
    /// account has been disabled since login.
    pub fn validate_session(
        persistence: &mut Persistence,
        session_token: &str,
    ) -> Result<AuthenticatedAccount, AuthError> {
        let session: LoginSessionData = persistence
            .get_login_session_by_token(session_token)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Database error: {e}"),
            })?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            })?;

        let expires_at: OffsetDateTime = OffsetDateTime::parse(&session.expires_at, &Rfc3339)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to parse session expiration: {e}"),
            })?;
        if OffsetDateTime::now_utc() > expires_at {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        let account: AccountData = persistence
            .get_account_by_id(session.account_id)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Database error: {e}"),
            })?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Account not found"),
            })?;

        if account.is_disabled {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Account is disabled"),
            });
        }

        persistence
            .update_login_session_activity(session.login_session_id)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to update session activity: {e}"),
            })?;

        AuthenticatedAccount::from_account_data(&account)
    }

    /// Logs out by deleting the login session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be deleted.
    pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), AuthError> {
        persistence
            .delete_login_session(session_token)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to delete login session: {e}"),
            })
    }

    /// Generates a random session token.
    fn generate_session_token() -> String {
        let high: u128 = rand::random();
        let low: u128 = rand::random();
        format!("{high:032x}{low:032x}")
    }
}

/// Generates a random calendar feed token for a new volunteer profile.
///
/// Feed URLs are capability URLs: whoever holds the token may read the
/// feed, so the token carries the same entropy as a session token.
#[must_use]
pub fn generate_calendar_token() -> String {
    let value: u128 = rand::random();
    format!("{value:032x}")
}
