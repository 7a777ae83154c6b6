// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! Every handler authorizes the authenticated account first, then
//! translates the request into domain types, enforces the season lifecycle
//! gate for its phase, and performs the persistence calls. Domain and
//! persistence errors are translated at this boundary.

use std::collections::BTreeMap;
use std::str::FromStr;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Time};
use tracing::info;

use defivelo_domain::{
    Availability, Canton, ChosenRole, DayRoleCounts, DomainError, InvoiceLine, InvoiceStatus,
    Organization, Qualification, Season, SeasonState, Session, SessionAvailability,
    SessionBilling, StaffAssignment, TimesheetEntry, VolunteerProfile, compute_invoice_lines,
    compute_timesheet_entry, validate_staffing,
};
use defivelo_persistence::{AccountData, InvoiceData, Persistence};

use crate::auth::{AuthenticatedAccount, AuthorizationService, Role, generate_calendar_token};
use crate::error::{ApiError, translate_domain_error, translate_persistence_error};
use crate::password_policy::PasswordPolicy;
use crate::request_response::{
    AccountInfo, AssignStaffRequest, AvailabilityGridResponse, AvailabilityInfo,
    ChangePasswordRequest, ChooseStaffRequest, CreateAccountRequest, CreateAccountResponse,
    CreateInvoiceRequest, CreateInvoiceResponse, CreateOrganizationResponse,
    CreateProfileResponse, CreateQualificationRequest, CreateQualificationResponse,
    CreateSeasonRequest, CreateSeasonResponse, CreateSessionResponse, DeclareAvailabilityRequest,
    DeclareAvailabilityResponse, InvoiceInfo, InvoiceLineInfo, ListAccountsResponse,
    ListAvailabilitiesResponse, ListInvoicesResponse, ListOrganizationsResponse,
    ListProfilesResponse, ListQualificationsResponse, ListSeasonsResponse, ListSessionsResponse,
    ListTimesheetsResponse, MessageResponse, OrganizationInfo, ProfileInfo, QualificationInfo,
    ResetPasswordRequest, SaveOrganizationRequest, SaveProfileRequest, SaveSessionRequest,
    SeasonInfo, SessionInfo, TimesheetInfo, TransitionInvoiceRequest, TransitionInvoiceResponse,
    TransitionSeasonRequest, TransitionSeasonResponse, UpdateAccountRequest,
    UpdateQualificationRequest, UpdateSeasonRequest, ValidateTimesheetRequest,
    ValidateTimesheetResponse, WhoAmIResponse,
};

const DAY_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[hour]:[minute]");

// ============================================================================
// Conversion helpers
// ============================================================================

/// Parses a `YYYY-MM-DD` request field.
pub(crate) fn parse_day_field(field: &str, value: &str) -> Result<Date, ApiError> {
    Date::parse(value, &DAY_FORMAT).map_err(|e| ApiError::InvalidInput {
        field: String::from(field),
        message: format!("Failed to parse date '{value}': {e}"),
    })
}

fn parse_time_field(field: &str, value: &str) -> Result<Time, ApiError> {
    Time::parse(value, &TIME_FORMAT).map_err(|e| ApiError::InvalidInput {
        field: String::from(field),
        message: format!("Failed to parse time '{value}': {e}"),
    })
}

pub(crate) fn format_day(day: Date) -> Result<String, ApiError> {
    day.format(&DAY_FORMAT).map_err(|e| ApiError::Internal {
        message: format!("Failed to format date: {e}"),
    })
}

pub(crate) fn format_time(value: Time) -> Result<String, ApiError> {
    value.format(&TIME_FORMAT).map_err(|e| ApiError::Internal {
        message: format!("Failed to format time: {e}"),
    })
}

fn parse_canton_field(field: &str, code: &str) -> Result<Canton, ApiError> {
    Canton::new(code).map_err(|_| ApiError::InvalidInput {
        field: String::from(field),
        message: format!("Invalid canton code '{code}': must be two letters"),
    })
}

fn parse_canton_list(field: &str, codes: &[String]) -> Result<Vec<Canton>, ApiError> {
    codes
        .iter()
        .map(|code| parse_canton_field(field, code))
        .collect()
}

fn canton_codes(cantons: &[Canton]) -> Vec<String> {
    cantons.iter().map(|c| c.code().to_string()).collect()
}

/// Extracts a persisted ID that the database is guaranteed to have set.
fn require_id(id: Option<i64>, what: &str) -> Result<i64, ApiError> {
    id.ok_or_else(|| ApiError::Internal {
        message: format!("{what} is missing its database ID"),
    })
}

fn account_info(account: &AccountData) -> Result<AccountInfo, ApiError> {
    let managed_cantons: Vec<Canton> =
        Canton::parse_list(&account.managed_cantons).map_err(translate_domain_error)?;
    Ok(AccountInfo {
        account_id: account.account_id,
        login_email: account.login_email.clone(),
        display_name: account.display_name.clone(),
        role: account.role.clone(),
        managed_cantons: canton_codes(&managed_cantons),
        profile_id: account.profile_id,
        is_disabled: account.is_disabled,
        last_login_at: account.last_login_at.clone(),
    })
}

fn organization_info(organization: &Organization) -> Result<OrganizationInfo, ApiError> {
    Ok(OrganizationInfo {
        organization_id: require_id(organization.organization_id, "Organization")?,
        name: organization.name.clone(),
        address_street: organization.address_street.clone(),
        address_zip: organization.address_zip.clone(),
        address_city: organization.address_city.clone(),
        canton: organization.canton.code().to_string(),
        coordinator_name: organization.coordinator_name.clone(),
    })
}

fn profile_info(profile: &VolunteerProfile) -> Result<ProfileInfo, ApiError> {
    Ok(ProfileInfo {
        profile_id: require_id(profile.profile_id, "Profile")?,
        first_name: profile.first_name.clone(),
        last_name: profile.last_name.clone(),
        email: profile.email.clone(),
        canton: profile.canton.code().to_string(),
        can_lead: profile.can_lead,
        is_actor: profile.is_actor,
        has_bike: profile.has_bike,
    })
}

fn season_info(season: &Season) -> Result<SeasonInfo, ApiError> {
    let begin: Date = season.begin().map_err(translate_domain_error)?;
    let end: Date = season.end().map_err(translate_domain_error)?;
    Ok(SeasonInfo {
        season_id: require_id(season.season_id, "Season")?,
        year: season.year,
        month_start: season.month_start,
        n_months: season.n_months,
        cantons: canton_codes(&season.cantons),
        state: season.state.to_string(),
        begin: format_day(begin)?,
        end: format_day(end)?,
        cost_per_participant_cents: season.cost_per_participant_cents,
        cost_per_bike_cents: season.cost_per_bike_cents,
    })
}

fn session_info(session: &Session) -> Result<SessionInfo, ApiError> {
    Ok(SessionInfo {
        session_id: require_id(session.session_id, "Session")?,
        organization_id: session.organization_id,
        day: format_day(session.day)?,
        begin_time: format_time(session.begin_time)?,
        end_time: format_time(session.end_time)?,
        fallback_plan: session.fallback_plan.clone(),
    })
}

fn qualification_info(qualification: &Qualification) -> Result<QualificationInfo, ApiError> {
    Ok(QualificationInfo {
        qualification_id: require_id(qualification.qualification_id, "Qualification")?,
        session_id: qualification.session_id,
        class_name: qualification.class_name.clone(),
        n_participants: qualification.n_participants,
        n_bikes: qualification.n_bikes,
        n_helmets: qualification.n_helmets,
        leader_id: qualification.staff.leader_id,
        helper_ids: qualification.staff.helper_ids.clone(),
        actor_id: qualification.staff.actor_id,
        is_complete: qualification.is_complete(),
    })
}

fn availability_info(record: &SessionAvailability) -> Result<AvailabilityInfo, ApiError> {
    Ok(AvailabilityInfo {
        availability_id: require_id(record.availability_id, "Availability")?,
        profile_id: record.profile_id,
        session_id: record.session_id,
        availability: record.availability.to_string(),
        chosen_as: record.chosen_as.to_string(),
    })
}

fn invoice_line_info(line: &InvoiceLine) -> Result<InvoiceLineInfo, ApiError> {
    Ok(InvoiceLineInfo {
        session_id: line.session_id,
        day: format_day(line.day)?,
        n_participants: line.n_participants,
        n_bikes: line.n_bikes,
        cost_participants_cents: line.cost_participants_cents,
        cost_bikes_cents: line.cost_bikes_cents,
        bike_reduction_percent: line.bike_reduction_percent,
        cost_bikes_reduced_cents: line.cost_bikes_reduced_cents,
        total_cents: line.total_cents(),
    })
}

fn invoice_info(
    persistence: &mut Persistence,
    invoice: &InvoiceData,
) -> Result<InvoiceInfo, ApiError> {
    let lines: Vec<InvoiceLine> = persistence
        .list_invoice_lines(invoice.invoice_id)
        .map_err(translate_persistence_error)?;
    let line_infos: Vec<InvoiceLineInfo> = lines
        .iter()
        .map(invoice_line_info)
        .collect::<Result<_, _>>()?;
    let total_cents: i64 = lines.iter().map(InvoiceLine::total_cents).sum();
    Ok(InvoiceInfo {
        invoice_id: invoice.invoice_id,
        reference: invoice.reference.clone(),
        season_id: invoice.season_id,
        organization_id: invoice.organization_id,
        status: invoice.status.clone(),
        created_at: invoice.created_at.clone(),
        lines: line_infos,
        total_cents,
    })
}

// ============================================================================
// Season lifecycle gates
// ============================================================================

/// Returns the seasons a session belongs to: day within the season's range
/// and organization canton covered.
fn seasons_covering(
    persistence: &mut Persistence,
    session: &Session,
    organization_canton: &Canton,
) -> Result<Vec<Season>, ApiError> {
    let seasons: Vec<Season> = persistence
        .list_seasons()
        .map_err(translate_persistence_error)?;
    let mut covering: Vec<Season> = Vec::new();
    for season in seasons {
        let contains: bool = season
            .contains_day(session.day)
            .map_err(translate_domain_error)?;
        if contains && season.covers_canton(organization_canton) {
            covering.push(season);
        }
    }
    Ok(covering)
}

/// Rejects structural changes to a session once any covering season has
/// advanced past `Open`.
fn require_structural_phase(
    persistence: &mut Persistence,
    session: &Session,
    organization_canton: &Canton,
    operation: &'static str,
) -> Result<(), ApiError> {
    let covering: Vec<Season> = seasons_covering(persistence, session, organization_canton)?;
    for season in &covering {
        if !season.state.allows_structural_changes() {
            return Err(translate_domain_error(DomainError::SeasonStateForbids {
                state: season.state,
                operation,
            }));
        }
    }
    Ok(())
}

/// Requires that at least one covering season is in the given phase.
fn require_covering_phase(
    persistence: &mut Persistence,
    session: &Session,
    organization_canton: &Canton,
    phase: fn(&SeasonState) -> bool,
    operation: &str,
) -> Result<(), ApiError> {
    let covering: Vec<Season> = seasons_covering(persistence, session, organization_canton)?;
    if covering.iter().any(|s| phase(&s.state)) {
        Ok(())
    } else {
        Err(ApiError::DomainRuleViolation {
            rule: String::from("season_lifecycle"),
            message: format!("No season covering this session currently allows '{operation}'"),
        })
    }
}

// ============================================================================
// Accounts
// ============================================================================

/// Returns the caller's own account.
///
/// # Errors
///
/// Returns an error if the account record cannot be loaded.
pub fn whoami(
    persistence: &mut Persistence,
    account: &AuthenticatedAccount,
) -> Result<WhoAmIResponse, ApiError> {
    let data: AccountData = persistence
        .get_account_by_id(account.account_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::Internal {
            message: String::from("Authenticated account no longer exists"),
        })?;
    Ok(WhoAmIResponse {
        account: account_info(&data)?,
    })
}

/// Creates an intranet account. Power user only.
///
/// # Errors
///
/// Returns an error if unauthorized, the password violates policy, or the
/// login email is already taken.
pub fn create_account(
    persistence: &mut Persistence,
    request: CreateAccountRequest,
    account: &AuthenticatedAccount,
) -> Result<CreateAccountResponse, ApiError> {
    AuthorizationService::require_power_user(account, "create_account")?;

    let role: Role = Role::parse(&request.role).map_err(|_| ApiError::InvalidInput {
        field: String::from("role"),
        message: format!("Unknown role: {}", request.role),
    })?;
    if role == Role::Collaborator && request.profile_id.is_none() {
        return Err(ApiError::InvalidInput {
            field: String::from("profile_id"),
            message: String::from("A collaborator account must be linked to a volunteer profile"),
        });
    }

    defivelo_domain::validate_email(&request.login_email).map_err(translate_domain_error)?;
    defivelo_domain::validate_person_name(&request.display_name)
        .map_err(translate_domain_error)?;
    PasswordPolicy::default().validate(
        &request.password,
        &request.password_confirmation,
        &request.login_email,
    )?;
    let managed_cantons: Vec<Canton> =
        parse_canton_list("managed_cantons", &request.managed_cantons)?;

    let account_id: i64 = persistence
        .create_account(
            &request.login_email,
            &request.display_name,
            &request.password,
            role.as_str(),
            &Canton::format_list(&managed_cantons),
            request.profile_id,
        )
        .map_err(translate_persistence_error)?;

    info!("Account {} created by {}", account_id, account.account_id);
    Ok(CreateAccountResponse {
        account_id,
        message: format!("Account '{}' created", request.login_email),
    })
}

/// Lists all accounts. Power user only.
///
/// # Errors
///
/// Returns an error if unauthorized or the query fails.
pub fn list_accounts(
    persistence: &mut Persistence,
    account: &AuthenticatedAccount,
) -> Result<ListAccountsResponse, ApiError> {
    AuthorizationService::require_power_user(account, "list_accounts")?;
    let accounts: Vec<AccountInfo> = persistence
        .list_accounts()
        .map_err(translate_persistence_error)?
        .iter()
        .map(account_info)
        .collect::<Result<_, _>>()?;
    Ok(ListAccountsResponse { accounts })
}

/// Disables an account and revokes its sessions. Power user only.
///
/// The last active power user cannot be disabled.
///
/// # Errors
///
/// Returns an error if unauthorized or the guard is violated.
pub fn disable_account(
    persistence: &mut Persistence,
    target_account_id: i64,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    AuthorizationService::require_power_user(account, "disable_account")?;

    let target: AccountData = persistence
        .get_account_by_id(target_account_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::ResourceNotFound {
            resource_type: String::from("Account"),
            message: format!("Account {target_account_id} does not exist"),
        })?;

    if target.role == Role::PowerUser.as_str() && !target.is_disabled {
        let active_power_users: i64 = persistence
            .count_active_power_users()
            .map_err(translate_persistence_error)?;
        if active_power_users <= 1 {
            return Err(ApiError::DomainRuleViolation {
                rule: String::from("last_power_user"),
                message: String::from("Cannot disable the last active power user"),
            });
        }
    }

    persistence
        .disable_account(target_account_id)
        .map_err(translate_persistence_error)?;
    persistence
        .delete_login_sessions_for_account(target_account_id)
        .map_err(translate_persistence_error)?;

    info!("Account {} disabled by {}", target_account_id, account.account_id);
    Ok(MessageResponse {
        message: format!("Account {target_account_id} disabled"),
    })
}

/// Re-enables a disabled account. Power user only.
///
/// # Errors
///
/// Returns an error if unauthorized or the account doesn't exist.
pub fn enable_account(
    persistence: &mut Persistence,
    target_account_id: i64,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    AuthorizationService::require_power_user(account, "enable_account")?;
    persistence
        .enable_account(target_account_id)
        .map_err(translate_persistence_error)?;
    Ok(MessageResponse {
        message: format!("Account {target_account_id} enabled"),
    })
}

/// Updates an account's display name, role, canton scope, and profile
/// link. Power user only.
///
/// # Errors
///
/// Returns an error if unauthorized or the payload is invalid.
pub fn update_account(
    persistence: &mut Persistence,
    target_account_id: i64,
    request: UpdateAccountRequest,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    AuthorizationService::require_power_user(account, "update_account")?;

    let role: Role = Role::parse(&request.role).map_err(|_| ApiError::InvalidInput {
        field: String::from("role"),
        message: format!("Unknown role: {}", request.role),
    })?;
    if role == Role::Collaborator && request.profile_id.is_none() {
        return Err(ApiError::InvalidInput {
            field: String::from("profile_id"),
            message: String::from("A collaborator account must be linked to a volunteer profile"),
        });
    }
    defivelo_domain::validate_person_name(&request.display_name)
        .map_err(translate_domain_error)?;
    let managed_cantons: Vec<Canton> =
        parse_canton_list("managed_cantons", &request.managed_cantons)?;

    persistence
        .update_account(
            target_account_id,
            &request.display_name,
            role.as_str(),
            &Canton::format_list(&managed_cantons),
            request.profile_id,
        )
        .map_err(translate_persistence_error)?;
    Ok(MessageResponse {
        message: format!("Account {target_account_id} updated"),
    })
}

/// Deletes an account that has never been used. Power user only.
///
/// Accounts that have logged in at least once can only be disabled.
///
/// # Errors
///
/// Returns an error if unauthorized or the account has been used.
pub fn delete_account(
    persistence: &mut Persistence,
    target_account_id: i64,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    AuthorizationService::require_power_user(account, "delete_account")?;
    if target_account_id == account.account_id {
        return Err(ApiError::Conflict {
            message: String::from("Cannot delete the account you are logged in with"),
        });
    }
    persistence
        .delete_account(target_account_id)
        .map_err(translate_persistence_error)?;
    info!("Account {} deleted by {}", target_account_id, account.account_id);
    Ok(MessageResponse {
        message: format!("Account {target_account_id} deleted"),
    })
}

/// Changes the caller's own password.
///
/// # Errors
///
/// Returns an error if the current password is wrong or the new password
/// violates policy.
pub fn change_password(
    persistence: &mut Persistence,
    request: ChangePasswordRequest,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    let data: AccountData = persistence
        .get_account_by_id(account.account_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::Internal {
            message: String::from("Authenticated account no longer exists"),
        })?;

    let current_matches: bool = persistence
        .verify_password(&request.current_password, &data.password_hash)
        .map_err(translate_persistence_error)?;
    if !current_matches {
        return Err(ApiError::AuthenticationFailed {
            reason: String::from("Current password is incorrect"),
        });
    }

    PasswordPolicy::default().validate(
        &request.new_password,
        &request.new_password_confirmation,
        &data.login_email,
    )?;
    persistence
        .update_password(account.account_id, &request.new_password)
        .map_err(translate_persistence_error)?;

    info!("Account {} changed its password", account.account_id);
    Ok(MessageResponse {
        message: String::from("Password changed"),
    })
}

/// Resets another account's password and revokes its sessions. Power user
/// only.
///
/// # Errors
///
/// Returns an error if unauthorized or the new password violates policy.
pub fn reset_password(
    persistence: &mut Persistence,
    request: ResetPasswordRequest,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    AuthorizationService::require_power_user(account, "reset_password")?;

    let target: AccountData = persistence
        .get_account_by_id(request.account_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::ResourceNotFound {
            resource_type: String::from("Account"),
            message: format!("Account {} does not exist", request.account_id),
        })?;

    PasswordPolicy::default().validate(
        &request.new_password,
        &request.new_password_confirmation,
        &target.login_email,
    )?;
    persistence
        .update_password(request.account_id, &request.new_password)
        .map_err(translate_persistence_error)?;
    persistence
        .delete_login_sessions_for_account(request.account_id)
        .map_err(translate_persistence_error)?;

    info!(
        "Password of account {} reset by {}",
        request.account_id, account.account_id
    );
    Ok(MessageResponse {
        message: format!("Password of account {} reset", request.account_id),
    })
}

// ============================================================================
// Directory: organizations
// ============================================================================

/// Creates a partner organization.
///
/// # Errors
///
/// Returns an error if unauthorized or the payload is invalid.
pub fn create_organization(
    persistence: &mut Persistence,
    request: SaveOrganizationRequest,
    account: &AuthenticatedAccount,
) -> Result<CreateOrganizationResponse, ApiError> {
    let canton: Canton = parse_canton_field("canton", &request.canton)?;
    AuthorizationService::require_canton(account, &canton, "create_organization")?;

    let organization: Organization = Organization::new(
        request.name,
        request.address_street,
        request.address_zip,
        request.address_city,
        canton,
        request.coordinator_name,
    )
    .map_err(translate_domain_error)?;

    let organization_id: i64 = persistence
        .create_organization(&organization)
        .map_err(translate_persistence_error)?;
    Ok(CreateOrganizationResponse {
        organization_id,
        message: format!("Organization '{}' created", organization.name),
    })
}

/// Retrieves one organization.
///
/// # Errors
///
/// Returns an error if the organization does not exist.
pub fn get_organization(
    persistence: &mut Persistence,
    organization_id: i64,
    _account: &AuthenticatedAccount,
) -> Result<OrganizationInfo, ApiError> {
    let organization: Organization = persistence
        .get_organization(organization_id)
        .map_err(translate_persistence_error)?;
    organization_info(&organization)
}

/// Lists organizations visible to the caller. Coordinators see only their
/// managed cantons.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_organizations(
    persistence: &mut Persistence,
    account: &AuthenticatedAccount,
) -> Result<ListOrganizationsResponse, ApiError> {
    let organizations: Vec<Organization> = match account.role {
        Role::PowerUser | Role::Collaborator => persistence
            .list_organizations()
            .map_err(translate_persistence_error)?,
        Role::Coordinator => persistence
            .list_organizations_in_cantons(&account.managed_cantons)
            .map_err(translate_persistence_error)?,
    };
    let organizations: Vec<OrganizationInfo> = organizations
        .iter()
        .map(organization_info)
        .collect::<Result<_, _>>()?;
    Ok(ListOrganizationsResponse { organizations })
}

/// Updates an organization.
///
/// # Errors
///
/// Returns an error if unauthorized or the organization does not exist.
pub fn update_organization(
    persistence: &mut Persistence,
    organization_id: i64,
    request: SaveOrganizationRequest,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    let existing: Organization = persistence
        .get_organization(organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_canton(account, &existing.canton, "update_organization")?;
    let canton: Canton = parse_canton_field("canton", &request.canton)?;
    AuthorizationService::require_canton(account, &canton, "update_organization")?;

    let organization: Organization = Organization::new(
        request.name,
        request.address_street,
        request.address_zip,
        request.address_city,
        canton,
        request.coordinator_name,
    )
    .map_err(translate_domain_error)?;

    persistence
        .update_organization(organization_id, &organization)
        .map_err(translate_persistence_error)?;
    Ok(MessageResponse {
        message: format!("Organization {organization_id} updated"),
    })
}

/// Deletes an organization. Refused while sessions reference it.
///
/// # Errors
///
/// Returns an error if unauthorized or the organization is referenced.
pub fn delete_organization(
    persistence: &mut Persistence,
    organization_id: i64,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    let existing: Organization = persistence
        .get_organization(organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_canton(account, &existing.canton, "delete_organization")?;
    persistence
        .delete_organization(organization_id)
        .map_err(|e| match e {
            defivelo_persistence::PersistenceError::QueryFailed(_)
            | defivelo_persistence::PersistenceError::DatabaseError(_) => ApiError::Conflict {
                message: format!(
                    "Organization {organization_id} still has sessions and cannot be deleted"
                ),
            },
            other => translate_persistence_error(other),
        })?;
    Ok(MessageResponse {
        message: format!("Organization {organization_id} deleted"),
    })
}

// ============================================================================
// Directory: volunteer profiles
// ============================================================================

/// Creates a volunteer profile with a fresh calendar feed token.
///
/// # Errors
///
/// Returns an error if unauthorized or the payload is invalid.
pub fn create_profile(
    persistence: &mut Persistence,
    request: SaveProfileRequest,
    account: &AuthenticatedAccount,
) -> Result<CreateProfileResponse, ApiError> {
    let canton: Canton = parse_canton_field("canton", &request.canton)?;
    AuthorizationService::require_canton(account, &canton, "create_profile")?;

    let profile: VolunteerProfile = VolunteerProfile::new(
        request.first_name,
        request.last_name,
        request.email,
        canton,
        request.can_lead,
        request.is_actor,
        request.has_bike,
    )
    .map_err(translate_domain_error)?;

    let calendar_token: String = generate_calendar_token();
    let profile_id: i64 = persistence
        .create_profile(&profile, &calendar_token)
        .map_err(translate_persistence_error)?;
    Ok(CreateProfileResponse {
        profile_id,
        calendar_token,
        message: format!("Profile '{}' created", profile.sort_name()),
    })
}

/// Retrieves one volunteer profile.
///
/// # Errors
///
/// Returns an error if unauthorized or the profile does not exist.
pub fn get_profile(
    persistence: &mut Persistence,
    profile_id: i64,
    account: &AuthenticatedAccount,
) -> Result<ProfileInfo, ApiError> {
    let profile: VolunteerProfile = persistence
        .get_profile(profile_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_profile_access(
        account,
        profile_id,
        &profile.canton,
        "get_profile",
    )?;
    profile_info(&profile)
}

/// Lists volunteer profiles visible to the caller.
///
/// Coordinators see their managed cantons; collaborators see only their
/// own profile.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_profiles(
    persistence: &mut Persistence,
    account: &AuthenticatedAccount,
) -> Result<ListProfilesResponse, ApiError> {
    let profiles: Vec<VolunteerProfile> = match account.role {
        Role::PowerUser => persistence
            .list_profiles()
            .map_err(translate_persistence_error)?,
        Role::Coordinator => persistence
            .list_profiles_in_cantons(&account.managed_cantons)
            .map_err(translate_persistence_error)?,
        Role::Collaborator => match account.profile_id {
            Some(own) => persistence
                .list_profiles_by_ids(&[own])
                .map_err(translate_persistence_error)?,
            None => Vec::new(),
        },
    };
    let profiles: Vec<ProfileInfo> = profiles
        .iter()
        .map(profile_info)
        .collect::<Result<_, _>>()?;
    Ok(ListProfilesResponse { profiles })
}

/// Updates a volunteer profile. The calendar token is left untouched.
///
/// # Errors
///
/// Returns an error if unauthorized or the profile does not exist.
pub fn update_profile(
    persistence: &mut Persistence,
    profile_id: i64,
    request: SaveProfileRequest,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    let existing: VolunteerProfile = persistence
        .get_profile(profile_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_canton(account, &existing.canton, "update_profile")?;
    let canton: Canton = parse_canton_field("canton", &request.canton)?;
    AuthorizationService::require_canton(account, &canton, "update_profile")?;

    let profile: VolunteerProfile = VolunteerProfile::new(
        request.first_name,
        request.last_name,
        request.email,
        canton,
        request.can_lead,
        request.is_actor,
        request.has_bike,
    )
    .map_err(translate_domain_error)?;

    persistence
        .update_profile(profile_id, &profile)
        .map_err(translate_persistence_error)?;
    Ok(MessageResponse {
        message: format!("Profile {profile_id} updated"),
    })
}

/// Deletes a volunteer profile. Refused while referenced.
///
/// # Errors
///
/// Returns an error if unauthorized or the profile is referenced.
pub fn delete_profile(
    persistence: &mut Persistence,
    profile_id: i64,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    let existing: VolunteerProfile = persistence
        .get_profile(profile_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_canton(account, &existing.canton, "delete_profile")?;
    persistence.delete_profile(profile_id).map_err(|e| match e {
        defivelo_persistence::PersistenceError::QueryFailed(_)
        | defivelo_persistence::PersistenceError::DatabaseError(_) => ApiError::Conflict {
            message: format!("Profile {profile_id} is still referenced and cannot be deleted"),
        },
        other => translate_persistence_error(other),
    })?;
    Ok(MessageResponse {
        message: format!("Profile {profile_id} deleted"),
    })
}

// ============================================================================
// Seasons
// ============================================================================

/// Creates a season in the `Planning` state.
///
/// # Errors
///
/// Returns an error if unauthorized or the span is invalid.
pub fn create_season(
    persistence: &mut Persistence,
    request: CreateSeasonRequest,
    account: &AuthenticatedAccount,
) -> Result<CreateSeasonResponse, ApiError> {
    let cantons: Vec<Canton> = parse_canton_list("cantons", &request.cantons)?;
    AuthorizationService::require_staff(account, "create_season")?;
    AuthorizationService::require_all_cantons(account, &cantons, "create_season")?;

    let mut season: Season = Season::new(
        request.year,
        request.month_start,
        request.n_months,
        cantons,
    )
    .map_err(translate_domain_error)?;
    if let Some(price) = request.cost_per_participant_cents {
        season.cost_per_participant_cents = price;
    }
    if let Some(price) = request.cost_per_bike_cents {
        season.cost_per_bike_cents = price;
    }

    let season_id: i64 = persistence
        .create_season(&season)
        .map_err(translate_persistence_error)?;
    info!("Season {} created by {}", season_id, account.account_id);
    Ok(CreateSeasonResponse {
        season_id,
        message: format!(
            "Season {}-{:02} created in Planning",
            season.year, season.month_start
        ),
    })
}

/// Retrieves one season.
///
/// # Errors
///
/// Returns an error if the season does not exist.
pub fn get_season(
    persistence: &mut Persistence,
    season_id: i64,
    _account: &AuthenticatedAccount,
) -> Result<SeasonInfo, ApiError> {
    let season: Season = persistence
        .get_season(season_id)
        .map_err(translate_persistence_error)?;
    season_info(&season)
}

/// Lists all seasons, most recent first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_seasons(
    persistence: &mut Persistence,
    _account: &AuthenticatedAccount,
) -> Result<ListSeasonsResponse, ApiError> {
    let seasons: Vec<SeasonInfo> = persistence
        .list_seasons()
        .map_err(translate_persistence_error)?
        .iter()
        .map(season_info)
        .collect::<Result<_, _>>()?;
    Ok(ListSeasonsResponse { seasons })
}

/// Updates a season's structural fields and prices. Planning only.
///
/// # Errors
///
/// Returns an error if unauthorized or the season has left `Planning`.
pub fn update_season(
    persistence: &mut Persistence,
    season_id: i64,
    request: UpdateSeasonRequest,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    let existing: Season = persistence
        .get_season(season_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_all_cantons(account, &existing.cantons, "update_season")?;
    let cantons: Vec<Canton> = parse_canton_list("cantons", &request.cantons)?;
    AuthorizationService::require_all_cantons(account, &cantons, "update_season")?;

    if existing.state != SeasonState::Planning {
        return Err(translate_domain_error(DomainError::SeasonStateForbids {
            state: existing.state,
            operation: "update_season",
        }));
    }

    let mut season: Season = Season::new(
        request.year,
        request.month_start,
        request.n_months,
        cantons,
    )
    .map_err(translate_domain_error)?;
    season.cost_per_participant_cents = request.cost_per_participant_cents;
    season.cost_per_bike_cents = request.cost_per_bike_cents;

    persistence
        .update_season(season_id, &season)
        .map_err(translate_persistence_error)?;
    Ok(MessageResponse {
        message: format!("Season {season_id} updated"),
    })
}

/// Advances a season to the requested lifecycle state.
///
/// Only the single permitted next state is accepted.
///
/// # Errors
///
/// Returns an error if unauthorized or the transition is not linear.
pub fn transition_season(
    persistence: &mut Persistence,
    season_id: i64,
    request: TransitionSeasonRequest,
    account: &AuthenticatedAccount,
) -> Result<TransitionSeasonResponse, ApiError> {
    let mut season: Season = persistence
        .get_season(season_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_staff(account, "transition_season")?;
    AuthorizationService::require_all_cantons(account, &season.cantons, "transition_season")?;

    let target: SeasonState =
        SeasonState::from_str(&request.target_state).map_err(|_| ApiError::InvalidInput {
            field: String::from("target_state"),
            message: format!("Unknown season state: {}", request.target_state),
        })?;
    season.transition_to(target).map_err(translate_domain_error)?;

    persistence
        .update_season_state(season_id, season.state.as_str())
        .map_err(translate_persistence_error)?;
    info!(
        "Season {} transitioned to {} by {}",
        season_id, season.state, account.account_id
    );
    Ok(TransitionSeasonResponse {
        season_id,
        state: season.state.to_string(),
        message: format!("Season {season_id} is now {}", season.state),
    })
}

/// Lists the sessions of a season.
///
/// # Errors
///
/// Returns an error if the season does not exist or the query fails.
pub fn list_sessions_in_season(
    persistence: &mut Persistence,
    season_id: i64,
    _account: &AuthenticatedAccount,
) -> Result<ListSessionsResponse, ApiError> {
    let season: Season = persistence
        .get_season(season_id)
        .map_err(translate_persistence_error)?;
    let sessions: Vec<SessionInfo> = persistence
        .list_sessions_in_season(&season)
        .map_err(translate_persistence_error)?
        .iter()
        .map(session_info)
        .collect::<Result<_, _>>()?;
    Ok(ListSessionsResponse { sessions })
}

// ============================================================================
// Sessions
// ============================================================================

fn session_from_request(request: &SaveSessionRequest) -> Result<Session, ApiError> {
    let day: Date = parse_day_field("day", &request.day)?;
    let begin_time: Time = parse_time_field("begin_time", &request.begin_time)?;
    let end_time: Time = parse_time_field("end_time", &request.end_time)?;
    Session::new(
        request.organization_id,
        day,
        begin_time,
        end_time,
        request.fallback_plan.clone(),
    )
    .map_err(translate_domain_error)
}

/// Creates a session.
///
/// # Errors
///
/// Returns an error if unauthorized, the slot is taken, or a covering
/// season has advanced past `Open`.
pub fn create_session(
    persistence: &mut Persistence,
    request: SaveSessionRequest,
    account: &AuthenticatedAccount,
) -> Result<CreateSessionResponse, ApiError> {
    let organization: Organization = persistence
        .get_organization(request.organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_canton(account, &organization.canton, "create_session")?;

    let session: Session = session_from_request(&request)?;
    require_structural_phase(persistence, &session, &organization.canton, "create_session")?;

    let session_id: i64 = persistence
        .create_session(&session)
        .map_err(translate_persistence_error)?;
    Ok(CreateSessionResponse {
        session_id,
        message: format!("Session created on {}", request.day),
    })
}

/// Updates a session.
///
/// # Errors
///
/// Returns an error if unauthorized or a covering season has advanced
/// past `Open`.
pub fn update_session(
    persistence: &mut Persistence,
    session_id: i64,
    request: SaveSessionRequest,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    let existing: Session = persistence
        .get_session(session_id)
        .map_err(translate_persistence_error)?;
    let existing_organization: Organization = persistence
        .get_organization(existing.organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_canton(
        account,
        &existing_organization.canton,
        "update_session",
    )?;
    require_structural_phase(
        persistence,
        &existing,
        &existing_organization.canton,
        "update_session",
    )?;

    let organization: Organization = persistence
        .get_organization(request.organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_canton(account, &organization.canton, "update_session")?;
    let session: Session = session_from_request(&request)?;
    require_structural_phase(persistence, &session, &organization.canton, "update_session")?;

    persistence
        .update_session(session_id, &session)
        .map_err(translate_persistence_error)?;
    Ok(MessageResponse {
        message: format!("Session {session_id} updated"),
    })
}

/// Deletes a session with its qualifications and availabilities.
///
/// # Errors
///
/// Returns an error if unauthorized or a covering season has advanced
/// past `Open`.
pub fn delete_session(
    persistence: &mut Persistence,
    session_id: i64,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    let existing: Session = persistence
        .get_session(session_id)
        .map_err(translate_persistence_error)?;
    let organization: Organization = persistence
        .get_organization(existing.organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_canton(account, &organization.canton, "delete_session")?;
    require_structural_phase(persistence, &existing, &organization.canton, "delete_session")?;

    persistence
        .delete_session(session_id)
        .map_err(translate_persistence_error)?;
    info!("Session {} deleted by {}", session_id, account.account_id);
    Ok(MessageResponse {
        message: format!("Session {session_id} deleted"),
    })
}

// ============================================================================
// Qualifications
// ============================================================================

/// Creates a qualification within a session.
///
/// # Errors
///
/// Returns an error if unauthorized, the class data is invalid, or a
/// covering season has advanced past `Open`.
pub fn create_qualification(
    persistence: &mut Persistence,
    session_id: i64,
    request: CreateQualificationRequest,
    account: &AuthenticatedAccount,
) -> Result<CreateQualificationResponse, ApiError> {
    let session: Session = persistence
        .get_session(session_id)
        .map_err(translate_persistence_error)?;
    let organization: Organization = persistence
        .get_organization(session.organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_canton(account, &organization.canton, "create_qualification")?;
    require_structural_phase(
        persistence,
        &session,
        &organization.canton,
        "create_qualification",
    )?;

    let qualification: Qualification = Qualification::new(
        session_id,
        request.class_name,
        request.n_participants,
        request.n_bikes,
        request.n_helmets,
    )
    .map_err(translate_domain_error)?;

    let qualification_id: i64 = persistence
        .create_qualification(&qualification)
        .map_err(translate_persistence_error)?;
    Ok(CreateQualificationResponse {
        qualification_id,
        message: format!("Qualification '{}' created", qualification.class_name),
    })
}

/// Lists the qualifications of a session.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_qualifications(
    persistence: &mut Persistence,
    session_id: i64,
    _account: &AuthenticatedAccount,
) -> Result<ListQualificationsResponse, ApiError> {
    let qualifications: Vec<QualificationInfo> = persistence
        .list_qualifications_for_session(session_id)
        .map_err(translate_persistence_error)?
        .iter()
        .map(qualification_info)
        .collect::<Result<_, _>>()?;
    Ok(ListQualificationsResponse { qualifications })
}

/// Updates a qualification's class data. Staffing is changed separately.
///
/// # Errors
///
/// Returns an error if unauthorized, the class data is invalid, or a
/// covering season has advanced past `Open`.
pub fn update_qualification(
    persistence: &mut Persistence,
    qualification_id: i64,
    request: UpdateQualificationRequest,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    let existing: Qualification = persistence
        .get_qualification(qualification_id)
        .map_err(translate_persistence_error)?;
    let session: Session = persistence
        .get_session(existing.session_id)
        .map_err(translate_persistence_error)?;
    let organization: Organization = persistence
        .get_organization(session.organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_canton(account, &organization.canton, "update_qualification")?;
    require_structural_phase(
        persistence,
        &session,
        &organization.canton,
        "update_qualification",
    )?;

    let qualification: Qualification = Qualification::new(
        existing.session_id,
        request.class_name,
        request.n_participants,
        request.n_bikes,
        request.n_helmets,
    )
    .map_err(translate_domain_error)?;

    persistence
        .update_qualification(qualification_id, &qualification)
        .map_err(translate_persistence_error)?;
    Ok(MessageResponse {
        message: format!("Qualification {qualification_id} updated"),
    })
}

/// Replaces a qualification's staff assignment. Running phase only.
///
/// Enforces the staffing rules: at most 2 helpers, distinct people,
/// declared availability, and leader/actor capability flags.
///
/// # Errors
///
/// Returns an error if unauthorized or any staffing rule is violated.
pub fn assign_staff(
    persistence: &mut Persistence,
    qualification_id: i64,
    request: AssignStaffRequest,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    let existing: Qualification = persistence
        .get_qualification(qualification_id)
        .map_err(translate_persistence_error)?;
    let session: Session = persistence
        .get_session(existing.session_id)
        .map_err(translate_persistence_error)?;
    let organization: Organization = persistence
        .get_organization(session.organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_staff(account, "assign_staff")?;
    AuthorizationService::require_canton(account, &organization.canton, "assign_staff")?;
    require_covering_phase(
        persistence,
        &session,
        &organization.canton,
        SeasonState::allows_staff_assignment,
        "assign_staff",
    )?;

    let staff: StaffAssignment = StaffAssignment {
        leader_id: request.leader_id,
        helper_ids: request.helper_ids,
        actor_id: request.actor_id,
    };
    let availabilities: Vec<SessionAvailability> = persistence
        .list_availabilities_for_session(existing.session_id)
        .map_err(translate_persistence_error)?;
    let profiles: Vec<VolunteerProfile> = persistence
        .list_profiles_by_ids(&staff.all_ids())
        .map_err(translate_persistence_error)?;
    validate_staffing(existing.session_id, &staff, &availabilities, &profiles)
        .map_err(translate_domain_error)?;

    persistence
        .update_qualification_staff(qualification_id, &staff)
        .map_err(translate_persistence_error)?;
    info!(
        "Staff of qualification {} set by {}",
        qualification_id, account.account_id
    );
    Ok(MessageResponse {
        message: format!("Staff of qualification {qualification_id} updated"),
    })
}

/// Deletes a qualification.
///
/// # Errors
///
/// Returns an error if unauthorized or a covering season has advanced
/// past `Open`.
pub fn delete_qualification(
    persistence: &mut Persistence,
    qualification_id: i64,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    let existing: Qualification = persistence
        .get_qualification(qualification_id)
        .map_err(translate_persistence_error)?;
    let session: Session = persistence
        .get_session(existing.session_id)
        .map_err(translate_persistence_error)?;
    let organization: Organization = persistence
        .get_organization(session.organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_canton(account, &organization.canton, "delete_qualification")?;
    require_structural_phase(
        persistence,
        &session,
        &organization.canton,
        "delete_qualification",
    )?;

    persistence
        .delete_qualification(qualification_id)
        .map_err(translate_persistence_error)?;
    Ok(MessageResponse {
        message: format!("Qualification {qualification_id} deleted"),
    })
}

// ============================================================================
// Availability
// ============================================================================

/// Declares or updates a volunteer's availability for a session.
///
/// Collaborators may declare for their own profile only; staff for any
/// profile in their cantons. Allowed only while a covering season is
/// `Open`.
///
/// # Errors
///
/// Returns an error if unauthorized or no covering season is `Open`.
pub fn declare_availability(
    persistence: &mut Persistence,
    request: DeclareAvailabilityRequest,
    account: &AuthenticatedAccount,
) -> Result<DeclareAvailabilityResponse, ApiError> {
    let profile: VolunteerProfile = persistence
        .get_profile(request.profile_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_profile_access(
        account,
        request.profile_id,
        &profile.canton,
        "declare_availability",
    )?;

    let session: Session = persistence
        .get_session(request.session_id)
        .map_err(translate_persistence_error)?;
    let organization: Organization = persistence
        .get_organization(session.organization_id)
        .map_err(translate_persistence_error)?;
    require_covering_phase(
        persistence,
        &session,
        &organization.canton,
        SeasonState::allows_availability_entry,
        "declare_availability",
    )?;

    let availability: Availability =
        Availability::from_str(&request.availability).map_err(|_| ApiError::InvalidInput {
            field: String::from("availability"),
            message: format!("Unknown availability: {}", request.availability),
        })?;

    let availability_id: i64 = persistence
        .set_availability(request.profile_id, request.session_id, availability)
        .map_err(translate_persistence_error)?;
    Ok(DeclareAvailabilityResponse {
        availability_id,
        message: format!(
            "Availability {} recorded for session {}",
            availability, request.session_id
        ),
    })
}

/// Chooses a volunteer for a role on a session. Running phase only.
///
/// The chosen role requires a declared availability of `Yes` or
/// `IfNeeded`.
///
/// # Errors
///
/// Returns an error if unauthorized, no declaration exists, or the
/// declared availability is `No`.
pub fn choose_staff(
    persistence: &mut Persistence,
    request: ChooseStaffRequest,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    let session: Session = persistence
        .get_session(request.session_id)
        .map_err(translate_persistence_error)?;
    let organization: Organization = persistence
        .get_organization(session.organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_staff(account, "choose_staff")?;
    AuthorizationService::require_canton(account, &organization.canton, "choose_staff")?;
    require_covering_phase(
        persistence,
        &session,
        &organization.canton,
        SeasonState::allows_staff_assignment,
        "choose_staff",
    )?;

    let role: ChosenRole =
        ChosenRole::from_str(&request.role).map_err(|_| ApiError::InvalidInput {
            field: String::from("role"),
            message: format!("Unknown chosen role: {}", request.role),
        })?;

    let mut record: SessionAvailability = persistence
        .get_availability(request.profile_id, request.session_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::ResourceNotFound {
            resource_type: String::from("Availability"),
            message: format!(
                "Profile {} has no availability record for session {}",
                request.profile_id, request.session_id
            ),
        })?;
    record.choose(role).map_err(translate_domain_error)?;

    persistence
        .set_chosen_role(request.profile_id, request.session_id, role)
        .map_err(translate_persistence_error)?;
    info!(
        "Profile {} chosen as {} on session {} by {}",
        request.profile_id, role, request.session_id, account.account_id
    );
    Ok(MessageResponse {
        message: format!("Profile {} chosen as {}", request.profile_id, role),
    })
}

/// Lists a session's availability records. Staff only.
///
/// # Errors
///
/// Returns an error if unauthorized or the query fails.
pub fn list_availabilities(
    persistence: &mut Persistence,
    session_id: i64,
    account: &AuthenticatedAccount,
) -> Result<ListAvailabilitiesResponse, ApiError> {
    let session: Session = persistence
        .get_session(session_id)
        .map_err(translate_persistence_error)?;
    let organization: Organization = persistence
        .get_organization(session.organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_staff(account, "list_availabilities")?;
    AuthorizationService::require_canton(account, &organization.canton, "list_availabilities")?;

    let availabilities: Vec<AvailabilityInfo> = persistence
        .list_availabilities_for_session(session_id)
        .map_err(translate_persistence_error)?
        .iter()
        .map(availability_info)
        .collect::<Result<_, _>>()?;
    Ok(ListAvailabilitiesResponse { availabilities })
}

/// Builds the session x profile availability matrix for a season. Staff
/// covering the season only.
///
/// # Errors
///
/// Returns an error if unauthorized or the queries fail.
pub fn availability_grid(
    persistence: &mut Persistence,
    season_id: i64,
    account: &AuthenticatedAccount,
) -> Result<AvailabilityGridResponse, ApiError> {
    let season: Season = persistence
        .get_season(season_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_staff(account, "availability_grid")?;
    AuthorizationService::require_all_cantons(account, &season.cantons, "availability_grid")?;

    let sessions: Vec<Session> = persistence
        .list_sessions_in_season(&season)
        .map_err(translate_persistence_error)?;
    let session_ids: Vec<i64> = sessions
        .iter()
        .map(|s| require_id(s.session_id, "Session"))
        .collect::<Result<_, _>>()?;
    let profiles: Vec<VolunteerProfile> = persistence
        .list_profiles_in_cantons(&season.cantons)
        .map_err(translate_persistence_error)?;
    let entries: Vec<SessionAvailability> = persistence
        .list_availabilities_for_sessions(&session_ids)
        .map_err(translate_persistence_error)?;

    Ok(AvailabilityGridResponse {
        sessions: sessions
            .iter()
            .map(session_info)
            .collect::<Result<_, _>>()?,
        profiles: profiles
            .iter()
            .map(profile_info)
            .collect::<Result<_, _>>()?,
        entries: entries
            .iter()
            .map(availability_info)
            .collect::<Result<_, _>>()?,
    })
}

// ============================================================================
// Timesheets
// ============================================================================

fn timesheet_info(entry: &TimesheetEntry) -> Result<TimesheetInfo, ApiError> {
    Ok(TimesheetInfo {
        timesheet_id: entry.timesheet_id,
        profile_id: entry.profile_id,
        day: format_day(entry.day)?,
        n_leader: entry.counts.n_leader,
        n_helper: entry.counts.n_helper,
        n_actor: entry.counts.n_actor,
        amount_cents: entry.amount_cents,
        validated: entry.validated,
    })
}

/// Computes the timesheet entries for a date range from the chosen
/// assignments, merged with stored validated entries.
///
/// Validated rows always win over recomputation.
pub(crate) fn compute_timesheets_in_range(
    persistence: &mut Persistence,
    range_begin: Date,
    range_end: Date,
) -> Result<Vec<TimesheetEntry>, ApiError> {
    let assignments: Vec<(i64, Date, ChosenRole)> = persistence
        .list_chosen_roles_in_range(range_begin, range_end)
        .map_err(translate_persistence_error)?;

    let mut counts_by_key: BTreeMap<(i64, Date), DayRoleCounts> = BTreeMap::new();
    for (profile_id, day, role) in assignments {
        let counts: &mut DayRoleCounts = counts_by_key.entry((profile_id, day)).or_default();
        match role {
            ChosenRole::Leader => counts.n_leader += 1,
            ChosenRole::Helper => counts.n_helper += 1,
            ChosenRole::Actor => counts.n_actor += 1,
            ChosenRole::NotChosen => {}
        }
    }

    let mut entries: BTreeMap<(i64, Date), TimesheetEntry> = BTreeMap::new();
    for ((profile_id, day), counts) in counts_by_key {
        if !counts.any() {
            continue;
        }
        let entry: TimesheetEntry =
            compute_timesheet_entry(profile_id, day, counts).map_err(translate_domain_error)?;
        entries.insert((profile_id, day), entry);
    }

    // Stored validated entries replace whatever was recomputed.
    let stored: Vec<TimesheetEntry> = persistence
        .list_timesheets_in_range(range_begin, range_end)
        .map_err(translate_persistence_error)?;
    for entry in stored {
        if entry.validated {
            entries.insert((entry.profile_id, entry.day), entry);
        }
    }

    Ok(entries.into_values().collect())
}

/// Lists timesheet entries over a date range, computed on the fly.
///
/// Collaborators see only their own profile; staff may filter by profile.
///
/// # Errors
///
/// Returns an error if unauthorized or the computation fails.
pub fn list_timesheets(
    persistence: &mut Persistence,
    from: &str,
    to: &str,
    profile_filter: Option<i64>,
    account: &AuthenticatedAccount,
) -> Result<ListTimesheetsResponse, ApiError> {
    let range_begin: Date = parse_day_field("from", from)?;
    let range_end: Date = parse_day_field("to", to)?;

    let effective_filter: Option<i64> = match account.role {
        Role::PowerUser | Role::Coordinator => profile_filter,
        Role::Collaborator => {
            let own: i64 = account.profile_id.ok_or_else(|| ApiError::Unauthorized {
                action: String::from("list_timesheets"),
                required: String::from("a linked volunteer profile"),
            })?;
            if profile_filter.is_some_and(|requested| requested != own) {
                return Err(ApiError::Unauthorized {
                    action: String::from("list_timesheets"),
                    required: String::from("your own profile"),
                });
            }
            Some(own)
        }
    };

    let mut entries: Vec<TimesheetEntry> =
        compute_timesheets_in_range(persistence, range_begin, range_end)?;
    if let Some(profile_id) = effective_filter {
        entries.retain(|e| e.profile_id == profile_id);
    }

    let entries: Vec<TimesheetInfo> = entries
        .iter()
        .map(timesheet_info)
        .collect::<Result<_, _>>()?;
    Ok(ListTimesheetsResponse { entries })
}

/// Validates one volunteer's timesheet for one day, locking it against
/// recomputation. Requires a settled (`Finished` or later) season
/// containing the day and covering the profile's canton.
///
/// # Errors
///
/// Returns an error if unauthorized, no assignments exist for the day, or
/// the entry is already validated.
pub fn validate_timesheet(
    persistence: &mut Persistence,
    request: ValidateTimesheetRequest,
    account: &AuthenticatedAccount,
) -> Result<ValidateTimesheetResponse, ApiError> {
    let profile: VolunteerProfile = persistence
        .get_profile(request.profile_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_staff(account, "validate_timesheet")?;
    AuthorizationService::require_canton(account, &profile.canton, "validate_timesheet")?;

    let day: Date = parse_day_field("day", &request.day)?;
    let seasons: Vec<Season> = persistence
        .list_seasons()
        .map_err(translate_persistence_error)?;
    let mut settled: bool = false;
    for season in &seasons {
        let contains: bool = season.contains_day(day).map_err(translate_domain_error)?;
        if contains && season.covers_canton(&profile.canton) && season.state.allows_settlement() {
            settled = true;
            break;
        }
    }
    if !settled {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("season_lifecycle"),
            message: String::from(
                "Timesheets can only be validated once a covering season is Finished",
            ),
        });
    }

    if let Some(existing) = persistence
        .get_timesheet(request.profile_id, day)
        .map_err(translate_persistence_error)?
        && existing.validated
    {
        return Err(translate_domain_error(DomainError::TimesheetValidated {
            profile_id: request.profile_id,
            day: request.day,
        }));
    }

    let assignments: Vec<(i64, Date, ChosenRole)> = persistence
        .list_chosen_roles_in_range(day, day)
        .map_err(translate_persistence_error)?;
    let mut counts: DayRoleCounts = DayRoleCounts::default();
    for (profile_id, _, role) in assignments {
        if profile_id != request.profile_id {
            continue;
        }
        match role {
            ChosenRole::Leader => counts.n_leader += 1,
            ChosenRole::Helper => counts.n_helper += 1,
            ChosenRole::Actor => counts.n_actor += 1,
            ChosenRole::NotChosen => {}
        }
    }
    if !counts.any() {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("timesheet_requires_assignments"),
            message: format!(
                "Profile {} has no chosen assignments on {}",
                request.profile_id, request.day
            ),
        });
    }

    let entry: TimesheetEntry = compute_timesheet_entry(request.profile_id, day, counts)
        .map_err(translate_domain_error)?;
    let timesheet_id: i64 = persistence
        .upsert_timesheet(&entry)
        .map_err(translate_persistence_error)?;
    persistence
        .set_timesheet_validated(timesheet_id)
        .map_err(translate_persistence_error)?;

    info!(
        "Timesheet {} validated by {}",
        timesheet_id, account.account_id
    );
    Ok(ValidateTimesheetResponse {
        timesheet_id,
        amount_cents: entry.amount_cents,
        message: format!(
            "Timesheet for profile {} on {} validated",
            request.profile_id, request.day
        ),
    })
}

// ============================================================================
// Invoices
// ============================================================================

/// Recomputes the invoice lines for one organization in one season.
fn compute_lines_for(
    persistence: &mut Persistence,
    season: &Season,
    organization_id: i64,
) -> Result<Vec<InvoiceLine>, ApiError> {
    let range_begin: Date = season.begin().map_err(translate_domain_error)?;
    let range_end: Date = season.end().map_err(translate_domain_error)?;
    let billing: Vec<SessionBilling> = persistence
        .list_session_billing(organization_id, range_begin, range_end)
        .map_err(translate_persistence_error)?;
    compute_invoice_lines(
        &billing,
        season.cost_per_participant_cents,
        season.cost_per_bike_cents,
    )
    .map_err(translate_domain_error)
}

/// Creates an invoice for one organization in one season.
///
/// Requires a `Finished` (or later) season covering the organization's
/// canton; the reference is allocated atomically.
///
/// # Errors
///
/// Returns an error if unauthorized, the season is not settled, or the
/// organization already has an invoice for the season.
pub fn create_invoice(
    persistence: &mut Persistence,
    request: CreateInvoiceRequest,
    account: &AuthenticatedAccount,
) -> Result<CreateInvoiceResponse, ApiError> {
    let season: Season = persistence
        .get_season(request.season_id)
        .map_err(translate_persistence_error)?;
    let organization: Organization = persistence
        .get_organization(request.organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_staff(account, "create_invoice")?;
    AuthorizationService::require_canton(account, &organization.canton, "create_invoice")?;

    if !season.state.allows_settlement() {
        return Err(translate_domain_error(DomainError::SeasonStateForbids {
            state: season.state,
            operation: "create_invoice",
        }));
    }
    if !season.covers_canton(&organization.canton) {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("season_coverage"),
            message: format!(
                "Season {} does not cover canton {}",
                request.season_id, organization.canton
            ),
        });
    }

    let lines: Vec<InvoiceLine> =
        compute_lines_for(persistence, &season, request.organization_id)?;
    let total_cents: i64 = lines.iter().map(InvoiceLine::total_cents).sum();

    let (invoice_id, reference) = persistence
        .create_invoice(request.season_id, request.organization_id, season.year, &lines)
        .map_err(translate_persistence_error)?;
    info!(
        "Invoice {} ({}) created by {}",
        invoice_id, reference, account.account_id
    );
    Ok(CreateInvoiceResponse {
        invoice_id,
        message: format!("Invoice {reference} created"),
        reference,
        total_cents,
    })
}

/// Retrieves an invoice with its lines. Staff with canton authority only.
///
/// # Errors
///
/// Returns an error if unauthorized or the invoice does not exist.
pub fn get_invoice(
    persistence: &mut Persistence,
    invoice_id: i64,
    account: &AuthenticatedAccount,
) -> Result<InvoiceInfo, ApiError> {
    let invoice: InvoiceData = persistence
        .get_invoice(invoice_id)
        .map_err(translate_persistence_error)?;
    let organization: Organization = persistence
        .get_organization(invoice.organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_staff(account, "get_invoice")?;
    AuthorizationService::require_canton(account, &organization.canton, "get_invoice")?;
    invoice_info(persistence, &invoice)
}

/// Lists the invoices of a season. Staff only; coordinators see only
/// organizations in their cantons.
///
/// # Errors
///
/// Returns an error if unauthorized or the query fails.
pub fn list_invoices(
    persistence: &mut Persistence,
    season_id: i64,
    account: &AuthenticatedAccount,
) -> Result<ListInvoicesResponse, ApiError> {
    AuthorizationService::require_staff(account, "list_invoices")?;

    let headers: Vec<InvoiceData> = persistence
        .list_invoices_for_season(season_id)
        .map_err(translate_persistence_error)?;
    let mut invoices: Vec<InvoiceInfo> = Vec::with_capacity(headers.len());
    for header in &headers {
        let organization: Organization = persistence
            .get_organization(header.organization_id)
            .map_err(translate_persistence_error)?;
        if !account.manages_canton(&organization.canton) {
            continue;
        }
        invoices.push(invoice_info(persistence, header)?);
    }
    Ok(ListInvoicesResponse { invoices })
}

/// Regenerates a draft invoice's lines from the current sessions.
///
/// # Errors
///
/// Returns an error if unauthorized or the invoice is no longer a draft.
pub fn refresh_invoice(
    persistence: &mut Persistence,
    invoice_id: i64,
    account: &AuthenticatedAccount,
) -> Result<MessageResponse, ApiError> {
    let invoice: InvoiceData = persistence
        .get_invoice(invoice_id)
        .map_err(translate_persistence_error)?;
    let organization: Organization = persistence
        .get_organization(invoice.organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_staff(account, "refresh_invoice")?;
    AuthorizationService::require_canton(account, &organization.canton, "refresh_invoice")?;

    let status: InvoiceStatus =
        InvoiceStatus::from_str(&invoice.status).map_err(translate_domain_error)?;
    if !status.is_mutable() {
        return Err(translate_domain_error(DomainError::InvoiceLocked {
            reference: invoice.reference.clone(),
        }));
    }

    let season: Season = persistence
        .get_season(invoice.season_id)
        .map_err(translate_persistence_error)?;
    let lines: Vec<InvoiceLine> =
        compute_lines_for(persistence, &season, invoice.organization_id)?;
    persistence
        .replace_invoice_lines(invoice_id, &lines)
        .map_err(translate_persistence_error)?;

    Ok(MessageResponse {
        message: format!("Invoice {} lines regenerated", invoice.reference),
    })
}

/// Advances an invoice's status. Draft to Sent to Paid only.
///
/// # Errors
///
/// Returns an error if unauthorized or the transition is not permitted.
pub fn transition_invoice(
    persistence: &mut Persistence,
    invoice_id: i64,
    request: TransitionInvoiceRequest,
    account: &AuthenticatedAccount,
) -> Result<TransitionInvoiceResponse, ApiError> {
    let invoice: InvoiceData = persistence
        .get_invoice(invoice_id)
        .map_err(translate_persistence_error)?;
    let organization: Organization = persistence
        .get_organization(invoice.organization_id)
        .map_err(translate_persistence_error)?;
    AuthorizationService::require_staff(account, "transition_invoice")?;
    AuthorizationService::require_canton(account, &organization.canton, "transition_invoice")?;

    let current: InvoiceStatus =
        InvoiceStatus::from_str(&invoice.status).map_err(translate_domain_error)?;
    let target: InvoiceStatus =
        InvoiceStatus::from_str(&request.target_status).map_err(|_| ApiError::InvalidInput {
            field: String::from("target_status"),
            message: format!("Unknown invoice status: {}", request.target_status),
        })?;
    if !current.can_transition_to(target) {
        return Err(translate_domain_error(
            DomainError::InvalidInvoiceTransition {
                from: current.to_string(),
                to: target.to_string(),
            },
        ));
    }

    persistence
        .update_invoice_status(invoice_id, target.as_str())
        .map_err(translate_persistence_error)?;
    info!(
        "Invoice {} transitioned to {} by {}",
        invoice.reference, target, account.account_id
    );
    Ok(TransitionInvoiceResponse {
        invoice_id,
        status: target.to_string(),
        message: format!("Invoice {} is now {}", invoice.reference, target),
    })
}
