// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request and response DTOs for the API boundary.
//!
//! These types are the API contract. Dates are `YYYY-MM-DD` strings and
//! times of day `HH:MM` strings; money is always integer centimes. Domain
//! types never cross this boundary directly.

use serde::{Deserialize, Serialize};

// ============================================================================
// Authentication & accounts
// ============================================================================

/// Request to log in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// The account login email.
    pub login_email: String,
    /// The cleartext password.
    pub password: String,
}

/// Response for a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// The bearer session token.
    pub session_token: String,
    /// The authenticated account.
    pub account: AccountInfo,
}

/// Response for the current account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    /// The authenticated account.
    pub account: AccountInfo,
}

/// Serializable account representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_id: i64,
    pub login_email: String,
    pub display_name: String,
    pub role: String,
    pub managed_cantons: Vec<String>,
    pub profile_id: Option<i64>,
    pub is_disabled: bool,
    pub last_login_at: Option<String>,
}

/// Request to create an intranet account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub login_email: String,
    pub display_name: String,
    pub password: String,
    pub password_confirmation: String,
    pub role: String,
    pub managed_cantons: Vec<String>,
    pub profile_id: Option<i64>,
}

/// Response for a successful account creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountResponse {
    pub account_id: i64,
    pub message: String,
}

/// Request to update an account's role, name, and canton scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAccountRequest {
    pub display_name: String,
    pub role: String,
    pub managed_cantons: Vec<String>,
    pub profile_id: Option<i64>,
}

/// Request to change one's own password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirmation: String,
}

/// Request to reset another account's password (power user).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub account_id: i64,
    pub new_password: String,
    pub new_password_confirmation: String,
}

/// Generic message-only response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response listing all accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAccountsResponse {
    pub accounts: Vec<AccountInfo>,
}

// ============================================================================
// Directory
// ============================================================================

/// Serializable organization representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationInfo {
    pub organization_id: i64,
    pub name: String,
    pub address_street: String,
    pub address_zip: String,
    pub address_city: String,
    pub canton: String,
    pub coordinator_name: Option<String>,
}

/// Request payload for creating or updating an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveOrganizationRequest {
    pub name: String,
    pub address_street: String,
    pub address_zip: String,
    pub address_city: String,
    pub canton: String,
    pub coordinator_name: Option<String>,
}

/// Response for a successful organization creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganizationResponse {
    pub organization_id: i64,
    pub message: String,
}

/// Response listing organizations visible to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOrganizationsResponse {
    pub organizations: Vec<OrganizationInfo>,
}

/// Serializable volunteer profile representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub profile_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub canton: String,
    pub can_lead: bool,
    pub is_actor: bool,
    pub has_bike: bool,
}

/// Request payload for creating or updating a volunteer profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub canton: String,
    pub can_lead: bool,
    pub is_actor: bool,
    pub has_bike: bool,
}

/// Response for a successful profile creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfileResponse {
    pub profile_id: i64,
    /// The generated calendar feed token.
    pub calendar_token: String,
    pub message: String,
}

/// Response listing volunteer profiles visible to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListProfilesResponse {
    pub profiles: Vec<ProfileInfo>,
}

// ============================================================================
// Seasons, sessions & qualifications
// ============================================================================

/// Serializable season representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonInfo {
    pub season_id: i64,
    pub year: u16,
    pub month_start: u8,
    pub n_months: u8,
    pub cantons: Vec<String>,
    pub state: String,
    /// First day of the season, `YYYY-MM-DD`.
    pub begin: String,
    /// Last day of the season, `YYYY-MM-DD`.
    pub end: String,
    pub cost_per_participant_cents: i64,
    pub cost_per_bike_cents: i64,
}

/// Request to create a season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSeasonRequest {
    pub year: u16,
    pub month_start: u8,
    pub n_months: u8,
    pub cantons: Vec<String>,
    /// Overrides the default participant price when set.
    pub cost_per_participant_cents: Option<i64>,
    /// Overrides the default bike price when set.
    pub cost_per_bike_cents: Option<i64>,
}

/// Response for a successful season creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSeasonResponse {
    pub season_id: i64,
    pub message: String,
}

/// Request to update a season's structural fields and prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSeasonRequest {
    pub year: u16,
    pub month_start: u8,
    pub n_months: u8,
    pub cantons: Vec<String>,
    pub cost_per_participant_cents: i64,
    pub cost_per_bike_cents: i64,
}

/// Request to advance a season to its next lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionSeasonRequest {
    /// The requested target state.
    pub target_state: String,
}

/// Response for a successful season transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionSeasonResponse {
    pub season_id: i64,
    pub state: String,
    pub message: String,
}

/// Response listing seasons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSeasonsResponse {
    pub seasons: Vec<SeasonInfo>,
}

/// Serializable session representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: i64,
    pub organization_id: i64,
    /// `YYYY-MM-DD`.
    pub day: String,
    /// `HH:MM`.
    pub begin_time: String,
    /// `HH:MM`.
    pub end_time: String,
    pub fallback_plan: Option<String>,
}

/// Request payload for creating or updating a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSessionRequest {
    pub organization_id: i64,
    /// `YYYY-MM-DD`.
    pub day: String,
    /// `HH:MM`.
    pub begin_time: String,
    /// `HH:MM`.
    pub end_time: String,
    pub fallback_plan: Option<String>,
}

/// Response for a successful session creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: i64,
    pub message: String,
}

/// Response listing the sessions of a season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionInfo>,
}

/// Serializable qualification representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationInfo {
    pub qualification_id: i64,
    pub session_id: i64,
    pub class_name: String,
    pub n_participants: u16,
    pub n_bikes: u16,
    pub n_helmets: u16,
    pub leader_id: Option<i64>,
    pub helper_ids: Vec<i64>,
    pub actor_id: Option<i64>,
    /// Whether a leader and at least one helper are assigned.
    pub is_complete: bool,
}

/// Request to create a qualification within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQualificationRequest {
    pub class_name: String,
    pub n_participants: u16,
    pub n_bikes: u16,
    pub n_helmets: u16,
}

/// Response for a successful qualification creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQualificationResponse {
    pub qualification_id: i64,
    pub message: String,
}

/// Request to update a qualification's class data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateQualificationRequest {
    pub class_name: String,
    pub n_participants: u16,
    pub n_bikes: u16,
    pub n_helmets: u16,
}

/// Request to replace a qualification's staff assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignStaffRequest {
    pub leader_id: Option<i64>,
    pub helper_ids: Vec<i64>,
    pub actor_id: Option<i64>,
}

/// Response listing the qualifications of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListQualificationsResponse {
    pub qualifications: Vec<QualificationInfo>,
}

// ============================================================================
// Availability
// ============================================================================

/// Serializable availability record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityInfo {
    pub availability_id: i64,
    pub profile_id: i64,
    pub session_id: i64,
    /// `Yes`, `IfNeeded`, or `No`.
    pub availability: String,
    /// `NotChosen`, `Helper`, `Leader`, or `Actor`.
    pub chosen_as: String,
}

/// Request to declare availability for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclareAvailabilityRequest {
    pub profile_id: i64,
    pub session_id: i64,
    /// `Yes`, `IfNeeded`, or `No`.
    pub availability: String,
}

/// Response for a successful availability declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclareAvailabilityResponse {
    pub availability_id: i64,
    pub message: String,
}

/// Request to choose a volunteer for a role on a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChooseStaffRequest {
    pub profile_id: i64,
    pub session_id: i64,
    /// `NotChosen`, `Helper`, `Leader`, or `Actor`.
    pub role: String,
}

/// Response listing a session's availability records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAvailabilitiesResponse {
    pub availabilities: Vec<AvailabilityInfo>,
}

/// The session x profile matrix used by the assignment view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityGridResponse {
    /// The season's sessions, ordered by day and begin time.
    pub sessions: Vec<SessionInfo>,
    /// The profiles of the season's cantons, ordered by name.
    pub profiles: Vec<ProfileInfo>,
    /// All availability entries for the listed sessions.
    pub entries: Vec<AvailabilityInfo>,
}

// ============================================================================
// Timesheets & invoices
// ============================================================================

/// Serializable timesheet entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimesheetInfo {
    /// Present only for persisted (validated) entries.
    pub timesheet_id: Option<i64>,
    pub profile_id: i64,
    /// `YYYY-MM-DD`.
    pub day: String,
    pub n_leader: u16,
    pub n_helper: u16,
    pub n_actor: u16,
    pub amount_cents: i64,
    pub validated: bool,
}

/// Response listing timesheet entries over a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTimesheetsResponse {
    pub entries: Vec<TimesheetInfo>,
}

/// Request to validate one volunteer's timesheet for one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateTimesheetRequest {
    pub profile_id: i64,
    /// `YYYY-MM-DD`.
    pub day: String,
}

/// Response for a successful timesheet validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateTimesheetResponse {
    pub timesheet_id: i64,
    pub amount_cents: i64,
    pub message: String,
}

/// Serializable invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLineInfo {
    pub session_id: i64,
    /// `YYYY-MM-DD`.
    pub day: String,
    pub n_participants: u16,
    pub n_bikes: u16,
    pub cost_participants_cents: i64,
    pub cost_bikes_cents: i64,
    pub bike_reduction_percent: i64,
    pub cost_bikes_reduced_cents: i64,
    pub total_cents: i64,
}

/// Serializable invoice with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceInfo {
    pub invoice_id: i64,
    pub reference: String,
    pub season_id: i64,
    pub organization_id: i64,
    pub status: String,
    pub created_at: String,
    pub lines: Vec<InvoiceLineInfo>,
    pub total_cents: i64,
}

/// Request to create an invoice for one organization in one season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoiceRequest {
    pub season_id: i64,
    pub organization_id: i64,
}

/// Response for a successful invoice creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoiceResponse {
    pub invoice_id: i64,
    pub reference: String,
    pub total_cents: i64,
    pub message: String,
}

/// Request to advance an invoice's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionInvoiceRequest {
    /// The requested target status.
    pub target_status: String,
}

/// Response for a successful invoice status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionInvoiceResponse {
    pub invoice_id: i64,
    pub status: String,
    pub message: String,
}

/// Response listing the invoices of a season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListInvoicesResponse {
    pub invoices: Vec<InvoiceInfo>,
}
