// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A Swiss canton code.
///
/// Cantons are the scoping and permission unit throughout the system:
/// seasons cover a set of cantons, coordinator accounts manage a set of
/// cantons, and organizations and volunteer profiles are affiliated with
/// exactly one canton.
///
/// Codes are exactly two letters, normalized to uppercase (`VD`, `GE`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Canton {
    code: String,
}

impl Canton {
    /// Creates a new `Canton` from a two-letter code.
    ///
    /// The code is normalized to uppercase.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCanton` if the code is not exactly two
    /// ASCII letters.
    pub fn new(code: &str) -> Result<Self, DomainError> {
        let trimmed = code.trim();
        if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::InvalidCanton(code.to_string()));
        }
        Ok(Self {
            code: trimmed.to_uppercase(),
        })
    }

    /// Returns the canton code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Parses a comma-separated list of canton codes.
    ///
    /// Empty segments are ignored, so `"VD,GE,"` parses to two cantons.
    ///
    /// # Errors
    ///
    /// Returns an error if any segment is not a valid canton code.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, DomainError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::new)
            .collect()
    }

    /// Formats a list of cantons back into comma-separated storage form.
    #[must_use]
    pub fn format_list(cantons: &[Self]) -> String {
        cantons
            .iter()
            .map(Self::code)
            .collect::<Vec<&str>>()
            .join(",")
    }
}

impl FromStr for Canton {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Canton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// A partner organization (typically a school) where sessions take place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Canonical identifier assigned by the database.
    /// `None` indicates the organization has not been persisted yet.
    pub organization_id: Option<i64>,
    /// The organization's display name.
    pub name: String,
    /// Street address.
    pub address_street: String,
    /// Postal code.
    pub address_zip: String,
    /// City.
    pub address_city: String,
    /// The canton the organization belongs to.
    pub canton: Canton,
    /// Optional on-site coordinator contact name.
    pub coordinator_name: Option<String>,
}

impl Organization {
    /// Creates a new `Organization` without a persisted ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty.
    pub fn new(
        name: String,
        address_street: String,
        address_zip: String,
        address_city: String,
        canton: Canton,
        coordinator_name: Option<String>,
    ) -> Result<Self, DomainError> {
        crate::validation::validate_person_name(&name)?;
        Ok(Self {
            organization_id: None,
            name,
            address_street,
            address_zip,
            address_city,
            canton,
            coordinator_name,
        })
    }
}

/// A volunteer directory record.
///
/// Profiles are the people who work sessions. They are distinct from
/// intranet login accounts: a collaborator account links to its profile,
/// but many profiles never log in at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerProfile {
    /// Canonical identifier assigned by the database.
    /// `None` indicates the profile has not been persisted yet.
    pub profile_id: Option<i64>,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Contact email address.
    pub email: String,
    /// The canton the volunteer is affiliated with.
    pub canton: Canton,
    /// Whether the volunteer may be assigned as a qualification leader.
    pub can_lead: bool,
    /// Whether the volunteer may be assigned as the subject-matter actor.
    pub is_actor: bool,
    /// Whether the volunteer brings their own bike.
    pub has_bike: bool,
}

impl VolunteerProfile {
    /// Creates a new `VolunteerProfile` without a persisted ID.
    ///
    /// # Errors
    ///
    /// Returns an error if a name field is empty or the email is malformed.
    pub fn new(
        first_name: String,
        last_name: String,
        email: String,
        canton: Canton,
        can_lead: bool,
        is_actor: bool,
        has_bike: bool,
    ) -> Result<Self, DomainError> {
        crate::validation::validate_person_name(&first_name)?;
        crate::validation::validate_person_name(&last_name)?;
        crate::validation::validate_email(&email)?;
        Ok(Self {
            profile_id: None,
            first_name,
            last_name,
            email,
            canton,
            can_lead,
            is_actor,
            has_bike,
        })
    }

    /// Returns "Last, First" for sorting and display in rosters.
    #[must_use]
    pub fn sort_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}
