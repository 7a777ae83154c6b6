// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A volunteer's declared availability for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    /// The volunteer wants to work this session.
    Yes,
    /// The volunteer can work this session if nobody else is found.
    IfNeeded,
    /// The volunteer is not available.
    No,
}

impl Availability {
    /// Returns the string representation of this availability.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::IfNeeded => "IfNeeded",
            Self::No => "No",
        }
    }

    /// Returns whether a volunteer with this availability may be chosen.
    #[must_use]
    pub const fn is_choosable(&self) -> bool {
        matches!(self, Self::Yes | Self::IfNeeded)
    }
}

impl FromStr for Availability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Yes" => Ok(Self::Yes),
            "IfNeeded" => Ok(Self::IfNeeded),
            "No" => Ok(Self::No),
            _ => Err(DomainError::InvalidName(format!(
                "Unknown availability: {s}"
            ))),
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The role a volunteer has been chosen for on a session.
///
/// Set by a coordinator during the `Running` phase; `NotChosen` until then.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChosenRole {
    /// Not (yet) chosen for this session.
    #[default]
    NotChosen,
    /// Chosen as a helper.
    Helper,
    /// Chosen as the qualification leader.
    Leader,
    /// Chosen as the subject-matter actor.
    Actor,
}

impl ChosenRole {
    /// Returns the string representation of this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotChosen => "NotChosen",
            Self::Helper => "Helper",
            Self::Leader => "Leader",
            Self::Actor => "Actor",
        }
    }
}

impl FromStr for ChosenRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NotChosen" => Ok(Self::NotChosen),
            "Helper" => Ok(Self::Helper),
            "Leader" => Ok(Self::Leader),
            "Actor" => Ok(Self::Actor),
            _ => Err(DomainError::InvalidName(format!("Unknown chosen role: {s}"))),
        }
    }
}

impl std::fmt::Display for ChosenRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One volunteer's availability record for one session.
///
/// Unique per `(profile, session)`. Carries both the declared availability
/// and the role the volunteer was eventually chosen for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAvailability {
    /// Canonical identifier assigned by the database.
    pub availability_id: Option<i64>,
    /// The volunteer profile this record belongs to.
    pub profile_id: i64,
    /// The session this record belongs to.
    pub session_id: i64,
    /// The declared availability.
    pub availability: Availability,
    /// The role the volunteer was chosen for, if any.
    pub chosen_as: ChosenRole,
}

impl SessionAvailability {
    /// Creates a new availability declaration with no chosen role.
    #[must_use]
    pub const fn new(profile_id: i64, session_id: i64, availability: Availability) -> Self {
        Self {
            availability_id: None,
            profile_id,
            session_id,
            availability,
            chosen_as: ChosenRole::NotChosen,
        }
    }

    /// Chooses this volunteer for a role on the session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotAvailable` if the declared availability is
    /// `No` and the requested role is anything other than `NotChosen`.
    pub fn choose(&mut self, role: ChosenRole) -> Result<(), DomainError> {
        if role != ChosenRole::NotChosen && !self.availability.is_choosable() {
            return Err(DomainError::NotAvailable {
                profile_id: self.profile_id,
                session_id: self.session_id,
            });
        }
        self.chosen_as = role;
        Ok(())
    }
}
