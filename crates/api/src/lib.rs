// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary layer for the Défi Vélo intranet.
//!
//! This crate sits between the HTTP server and the domain/persistence
//! layers: it authenticates accounts, authorizes every operation against
//! the caller's role and canton scope, translates request payloads into
//! domain types, and maps all lower-level errors into `ApiError`.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod auth;
mod calendar;
mod error;
mod export;
mod handlers;
mod password_policy;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{
    AuthenticatedAccount, AuthenticationService, AuthorizationService, Role,
    generate_calendar_token,
};
pub use calendar::render_calendar_feed;
pub use error::{ApiError, AuthError, translate_domain_error, translate_persistence_error};
pub use export::{export_invoice_csv, export_salary_csv, export_sessions_csv};
pub use handlers::{
    assign_staff, availability_grid, change_password, choose_staff, create_account,
    create_invoice, create_organization, create_profile, create_qualification, create_season,
    create_session, declare_availability, delete_account, delete_organization, delete_profile,
    delete_qualification, delete_session, disable_account, enable_account, get_invoice,
    get_organization, get_profile, get_season, list_accounts, list_availabilities,
    list_invoices, list_organizations, list_profiles, list_qualifications, list_seasons,
    list_sessions_in_season, list_timesheets, refresh_invoice, reset_password,
    transition_invoice, transition_season, update_account, update_organization, update_profile,
    update_qualification, update_season, update_session, validate_timesheet, whoami,
};
pub use password_policy::{PasswordPolicy, PasswordPolicyError};
pub use request_response::{
    AccountInfo, AssignStaffRequest, AvailabilityGridResponse, AvailabilityInfo,
    ChangePasswordRequest, ChooseStaffRequest, CreateAccountRequest, CreateAccountResponse,
    CreateInvoiceRequest, CreateInvoiceResponse, CreateOrganizationResponse,
    CreateProfileResponse, CreateQualificationRequest, CreateQualificationResponse,
    CreateSeasonRequest, CreateSeasonResponse, CreateSessionResponse,
    DeclareAvailabilityRequest, DeclareAvailabilityResponse, InvoiceInfo, InvoiceLineInfo,
    ListAccountsResponse, ListAvailabilitiesResponse, ListInvoicesResponse,
    ListOrganizationsResponse, ListProfilesResponse, ListQualificationsResponse,
    ListSeasonsResponse, ListSessionsResponse, ListTimesheetsResponse, LoginRequest,
    LoginResponse, MessageResponse, OrganizationInfo, ProfileInfo, QualificationInfo,
    ResetPasswordRequest, SaveOrganizationRequest, SaveProfileRequest, SaveSessionRequest,
    SeasonInfo, SessionInfo, TimesheetInfo, TransitionInvoiceRequest, TransitionInvoiceResponse,
    TransitionSeasonRequest, TransitionSeasonResponse, UpdateAccountRequest,
    UpdateQualificationRequest, UpdateSeasonRequest, ValidateTimesheetRequest,
    ValidateTimesheetResponse, WhoAmIResponse,
};
