// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::availability::SessionAvailability;
use crate::error::DomainError;
use crate::types::VolunteerProfile;
use serde::{Deserialize, Serialize};
use time::{Date, Time};

/// Maximum number of participants per school class.
pub const MAX_PARTICIPANTS_PER_CLASS: u16 = 30;

/// Maximum number of helpers per qualification.
pub const MAX_HELPERS: usize = 2;

/// One scheduled course event at a partner organization.
///
/// A session belongs to a season when its day falls inside the season's
/// date range and its organization's canton is covered by the season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Canonical identifier assigned by the database.
    pub session_id: Option<i64>,
    /// The organization hosting the session.
    pub organization_id: i64,
    /// The calendar day of the session.
    pub day: Date,
    /// Start time.
    pub begin_time: Time,
    /// End time. Must be after `begin_time`.
    pub end_time: Time,
    /// Free-form fallback plan in case of bad weather.
    pub fallback_plan: Option<String>,
}

impl Session {
    /// Creates a new session without a persisted ID.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSessionTimes` if the end time is not
    /// after the begin time.
    pub fn new(
        organization_id: i64,
        day: Date,
        begin_time: Time,
        end_time: Time,
        fallback_plan: Option<String>,
    ) -> Result<Self, DomainError> {
        if end_time <= begin_time {
            return Err(DomainError::InvalidSessionTimes);
        }
        Ok(Self {
            session_id: None,
            organization_id,
            day,
            begin_time,
            end_time,
            fallback_plan,
        })
    }
}

/// The staffing roles assigned to one qualification.
///
/// Used as the input to `validate_staffing`; the persisted qualification
/// stores the same IDs as nullable foreign keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StaffAssignment {
    /// The leader, if assigned.
    pub leader_id: Option<i64>,
    /// The helpers, at most two.
    pub helper_ids: Vec<i64>,
    /// The subject-matter actor, if assigned.
    pub actor_id: Option<i64>,
}

impl StaffAssignment {
    /// Returns all assigned profile IDs in a single list.
    #[must_use]
    pub fn all_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::with_capacity(MAX_HELPERS + 2);
        if let Some(id) = self.leader_id {
            ids.push(id);
        }
        ids.extend(&self.helper_ids);
        if let Some(id) = self.actor_id {
            ids.push(id);
        }
        ids
    }
}

/// One school-class staffing record within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualification {
    /// Canonical identifier assigned by the database.
    pub qualification_id: Option<i64>,
    /// The session this qualification belongs to.
    pub session_id: i64,
    /// The school class name, unique within the session.
    pub class_name: String,
    /// Number of participants (1 to `MAX_PARTICIPANTS_PER_CLASS`).
    pub n_participants: u16,
    /// Number of rental bikes needed. At most `n_participants`.
    pub n_bikes: u16,
    /// Number of helmets needed. At most `n_participants`.
    pub n_helmets: u16,
    /// The assigned staff.
    pub staff: StaffAssignment,
}

impl Qualification {
    /// Creates a new unstaffed qualification.
    ///
    /// # Errors
    ///
    /// Returns an error if the class name is empty, the participant count
    /// is out of range, or equipment counts exceed the participant count.
    pub fn new(
        session_id: i64,
        class_name: String,
        n_participants: u16,
        n_bikes: u16,
        n_helmets: u16,
    ) -> Result<Self, DomainError> {
        crate::validation::validate_class_name(&class_name)?;
        if n_participants == 0 || n_participants > MAX_PARTICIPANTS_PER_CLASS {
            return Err(DomainError::InvalidParticipantCount {
                count: n_participants,
                max: MAX_PARTICIPANTS_PER_CLASS,
            });
        }
        if n_bikes > n_participants {
            return Err(DomainError::EquipmentExceedsParticipants {
                kind: "bikes",
                count: n_bikes,
                participants: n_participants,
            });
        }
        if n_helmets > n_participants {
            return Err(DomainError::EquipmentExceedsParticipants {
                kind: "helmets",
                count: n_helmets,
                participants: n_participants,
            });
        }
        Ok(Self {
            qualification_id: None,
            session_id,
            class_name,
            n_participants,
            n_bikes,
            n_helmets,
            staff: StaffAssignment::default(),
        })
    }

    /// Returns whether this qualification is fully staffed.
    ///
    /// Complete means a leader and at least one helper are assigned.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.staff.leader_id.is_some() && !self.staff.helper_ids.is_empty()
    }
}

/// Validates a staffing assignment against the session's availabilities
/// and the volunteers' capability flags.
///
/// Rules enforced:
/// - at most 2 helpers;
/// - all assigned people are distinct;
/// - every assigned person declared `Yes` or `IfNeeded` availability for
///   the session;
/// - the leader has `can_lead`, the actor has `is_actor`.
///
/// # Arguments
///
/// * `session_id` - The session being staffed
/// * `staff` - The requested assignment
/// * `availabilities` - All availability records for the session
/// * `profiles` - The profiles referenced by the assignment
///
/// # Errors
///
/// Returns the first violated rule as a `DomainError`.
pub fn validate_staffing(
    session_id: i64,
    staff: &StaffAssignment,
    availabilities: &[SessionAvailability],
    profiles: &[VolunteerProfile],
) -> Result<(), DomainError> {
    if staff.helper_ids.len() > MAX_HELPERS {
        return Err(DomainError::TooManyHelpers {
            count: staff.helper_ids.len(),
        });
    }

    let all_ids = staff.all_ids();
    for (i, id) in all_ids.iter().enumerate() {
        if all_ids[..i].contains(id) {
            return Err(DomainError::DuplicateStaffAssignment { profile_id: *id });
        }
    }

    for id in &all_ids {
        let available = availabilities.iter().any(|a| {
            a.session_id == session_id && a.profile_id == *id && a.availability.is_choosable()
        });
        if !available {
            return Err(DomainError::NotAvailable {
                profile_id: *id,
                session_id,
            });
        }
    }

    if let Some(leader_id) = staff.leader_id {
        let qualified = profiles
            .iter()
            .any(|p| p.profile_id == Some(leader_id) && p.can_lead);
        if !qualified {
            return Err(DomainError::LeaderNotQualified {
                profile_id: leader_id,
            });
        }
    }

    if let Some(actor_id) = staff.actor_id {
        let qualified = profiles
            .iter()
            .any(|p| p.profile_id == Some(actor_id) && p.is_actor);
        if !qualified {
            return Err(DomainError::ActorNotQualified {
                profile_id: actor_id,
            });
        }
    }

    Ok(())
}
