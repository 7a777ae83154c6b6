// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use defivelo_api::{
    ApiError, AssignStaffRequest, AuthError, AuthenticatedAccount, AuthenticationService,
    ChangePasswordRequest, ChooseStaffRequest, CreateAccountRequest, CreateAccountResponse,
    CreateInvoiceRequest, CreateInvoiceResponse, CreateOrganizationResponse,
    CreateProfileResponse, CreateQualificationRequest, CreateQualificationResponse,
    CreateSeasonRequest, CreateSeasonResponse, CreateSessionResponse,
    DeclareAvailabilityRequest, DeclareAvailabilityResponse, InvoiceInfo, ListAccountsResponse,
    ListAvailabilitiesResponse, ListInvoicesResponse, ListOrganizationsResponse,
    ListProfilesResponse, ListQualificationsResponse, ListSeasonsResponse, ListSessionsResponse,
    ListTimesheetsResponse, LoginRequest, LoginResponse, MessageResponse, OrganizationInfo,
    ProfileInfo, ResetPasswordRequest, SaveOrganizationRequest, SaveProfileRequest,
    SaveSessionRequest, SeasonInfo, TransitionInvoiceRequest, TransitionInvoiceResponse,
    TransitionSeasonRequest, TransitionSeasonResponse, UpdateAccountRequest,
    UpdateQualificationRequest, UpdateSeasonRequest, ValidateTimesheetRequest,
    ValidateTimesheetResponse, WhoAmIResponse,
};
use defivelo_persistence::Persistence;

/// Défi Vélo intranet server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses an
    /// in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// The persistence layer, serialized behind a mutex.
    persistence: Arc<Mutex<Persistence>>,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::DomainRuleViolation { .. } | ApiError::PasswordPolicyViolation { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal API error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<AuthError> for HttpError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { .. } => Self {
                status: StatusCode::UNAUTHORIZED,
                message: err.to_string(),
            },
            AuthError::Unauthorized { .. } => Self {
                status: StatusCode::FORBIDDEN,
                message: err.to_string(),
            },
        }
    }
}

/// Extracts the bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Result<String, HttpError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| HttpError {
            status: StatusCode::UNAUTHORIZED,
            message: String::from("Missing Authorization header"),
        })?;
    let value: &str = value.to_str().map_err(|_| HttpError {
        status: StatusCode::BAD_REQUEST,
        message: String::from("Malformed Authorization header"),
    })?;
    value
        .strip_prefix("Bearer ")
        .map(String::from)
        .ok_or_else(|| HttpError {
            status: StatusCode::UNAUTHORIZED,
            message: String::from("Authorization header must use the Bearer scheme"),
        })
}

/// Authenticates the request's bearer token against the session store.
fn authenticate(
    persistence: &mut Persistence,
    headers: &HeaderMap,
) -> Result<AuthenticatedAccount, HttpError> {
    let token: String = bearer_token(headers)?;
    AuthenticationService::validate_session(persistence, &token).map_err(HttpError::from)
}

fn csv_response(content: String) -> Response {
    (
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        content,
    )
        .into_response()
}

// ============================================================================
// Authentication handlers
// ============================================================================

async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let (session_token, account) =
        AuthenticationService::login(&mut persistence, &req.login_email, &req.password)?;
    let me: WhoAmIResponse = defivelo_api::whoami(&mut persistence, &account)?;
    Ok(Json(LoginResponse {
        session_token,
        account: me.account,
    }))
}

async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, HttpError> {
    let token: String = bearer_token(&headers)?;
    let mut persistence = app_state.persistence.lock().await;
    AuthenticationService::logout(&mut persistence, &token)?;
    Ok(Json(MessageResponse {
        message: String::from("Logged out"),
    }))
}

async fn handle_whoami(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
) -> Result<Json<WhoAmIResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::whoami(&mut persistence, &account)?))
}

async fn handle_change_password(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::change_password(
        &mut persistence,
        req,
        &account,
    )?))
}

async fn handle_reset_password(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::reset_password(
        &mut persistence,
        req,
        &account,
    )?))
}

// ============================================================================
// Account handlers
// ============================================================================

async fn handle_create_account(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateAccountRequest>,
) -> Result<Json<CreateAccountResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::create_account(
        &mut persistence,
        req,
        &account,
    )?))
}

async fn handle_list_accounts(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListAccountsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::list_accounts(
        &mut persistence,
        &account,
    )?))
}

async fn handle_update_account(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(account_id): Path<i64>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::update_account(
        &mut persistence,
        account_id,
        req,
        &account,
    )?))
}

async fn handle_disable_account(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(account_id): Path<i64>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::disable_account(
        &mut persistence,
        account_id,
        &account,
    )?))
}

async fn handle_enable_account(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(account_id): Path<i64>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::enable_account(
        &mut persistence,
        account_id,
        &account,
    )?))
}

async fn handle_delete_account(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(account_id): Path<i64>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::delete_account(
        &mut persistence,
        account_id,
        &account,
    )?))
}

// ============================================================================
// Directory handlers
// ============================================================================

async fn handle_create_organization(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Json(req): Json<SaveOrganizationRequest>,
) -> Result<Json<CreateOrganizationResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::create_organization(
        &mut persistence,
        req,
        &account,
    )?))
}

async fn handle_list_organizations(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListOrganizationsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::list_organizations(
        &mut persistence,
        &account,
    )?))
}

async fn handle_get_organization(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(organization_id): Path<i64>,
) -> Result<Json<OrganizationInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::get_organization(
        &mut persistence,
        organization_id,
        &account,
    )?))
}

async fn handle_update_organization(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(organization_id): Path<i64>,
    Json(req): Json<SaveOrganizationRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::update_organization(
        &mut persistence,
        organization_id,
        req,
        &account,
    )?))
}

async fn handle_delete_organization(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(organization_id): Path<i64>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::delete_organization(
        &mut persistence,
        organization_id,
        &account,
    )?))
}

async fn handle_create_profile(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Json(req): Json<SaveProfileRequest>,
) -> Result<Json<CreateProfileResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::create_profile(
        &mut persistence,
        req,
        &account,
    )?))
}

async fn handle_list_profiles(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListProfilesResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::list_profiles(
        &mut persistence,
        &account,
    )?))
}

async fn handle_get_profile(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(profile_id): Path<i64>,
) -> Result<Json<ProfileInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::get_profile(
        &mut persistence,
        profile_id,
        &account,
    )?))
}

async fn handle_update_profile(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(profile_id): Path<i64>,
    Json(req): Json<SaveProfileRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::update_profile(
        &mut persistence,
        profile_id,
        req,
        &account,
    )?))
}

async fn handle_delete_profile(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(profile_id): Path<i64>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::delete_profile(
        &mut persistence,
        profile_id,
        &account,
    )?))
}

// ============================================================================
// Season handlers
// ============================================================================

async fn handle_create_season(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateSeasonRequest>,
) -> Result<Json<CreateSeasonResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::create_season(
        &mut persistence,
        req,
        &account,
    )?))
}

async fn handle_list_seasons(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListSeasonsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::list_seasons(&mut persistence, &account)?))
}

async fn handle_get_season(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(season_id): Path<i64>,
) -> Result<Json<SeasonInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::get_season(
        &mut persistence,
        season_id,
        &account,
    )?))
}

async fn handle_update_season(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(season_id): Path<i64>,
    Json(req): Json<UpdateSeasonRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::update_season(
        &mut persistence,
        season_id,
        req,
        &account,
    )?))
}

async fn handle_transition_season(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(season_id): Path<i64>,
    Json(req): Json<TransitionSeasonRequest>,
) -> Result<Json<TransitionSeasonResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::transition_season(
        &mut persistence,
        season_id,
        req,
        &account,
    )?))
}

async fn handle_list_season_sessions(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(season_id): Path<i64>,
) -> Result<Json<ListSessionsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::list_sessions_in_season(
        &mut persistence,
        season_id,
        &account,
    )?))
}

async fn handle_availability_grid(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(season_id): Path<i64>,
) -> Result<Json<defivelo_api::AvailabilityGridResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::availability_grid(
        &mut persistence,
        season_id,
        &account,
    )?))
}

async fn handle_export_sessions_csv(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(season_id): Path<i64>,
) -> Result<Response, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    let content: String =
        defivelo_api::export_sessions_csv(&mut persistence, season_id, &account)?;
    Ok(csv_response(content))
}

// ============================================================================
// Session and qualification handlers
// ============================================================================

async fn handle_create_session(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Json(req): Json<SaveSessionRequest>,
) -> Result<Json<CreateSessionResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::create_session(
        &mut persistence,
        req,
        &account,
    )?))
}

async fn handle_update_session(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<i64>,
    Json(req): Json<SaveSessionRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::update_session(
        &mut persistence,
        session_id,
        req,
        &account,
    )?))
}

async fn handle_delete_session(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<i64>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::delete_session(
        &mut persistence,
        session_id,
        &account,
    )?))
}

async fn handle_create_qualification(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<i64>,
    Json(req): Json<CreateQualificationRequest>,
) -> Result<Json<CreateQualificationResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::create_qualification(
        &mut persistence,
        session_id,
        req,
        &account,
    )?))
}

async fn handle_list_qualifications(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<i64>,
) -> Result<Json<ListQualificationsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::list_qualifications(
        &mut persistence,
        session_id,
        &account,
    )?))
}

async fn handle_update_qualification(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(qualification_id): Path<i64>,
    Json(req): Json<UpdateQualificationRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::update_qualification(
        &mut persistence,
        qualification_id,
        req,
        &account,
    )?))
}

async fn handle_assign_staff(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(qualification_id): Path<i64>,
    Json(req): Json<AssignStaffRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::assign_staff(
        &mut persistence,
        qualification_id,
        req,
        &account,
    )?))
}

async fn handle_delete_qualification(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(qualification_id): Path<i64>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::delete_qualification(
        &mut persistence,
        qualification_id,
        &account,
    )?))
}

// ============================================================================
// Availability handlers
// ============================================================================

async fn handle_declare_availability(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Json(req): Json<DeclareAvailabilityRequest>,
) -> Result<Json<DeclareAvailabilityResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::declare_availability(
        &mut persistence,
        req,
        &account,
    )?))
}

async fn handle_choose_staff(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChooseStaffRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::choose_staff(
        &mut persistence,
        req,
        &account,
    )?))
}

async fn handle_list_availabilities(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<i64>,
) -> Result<Json<ListAvailabilitiesResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::list_availabilities(
        &mut persistence,
        session_id,
        &account,
    )?))
}

// ============================================================================
// Timesheet handlers
// ============================================================================

/// Query parameters for listing timesheets.
#[derive(Debug, Deserialize)]
struct TimesheetsQuery {
    /// Start of the date range (`YYYY-MM-DD`).
    from: String,
    /// End of the date range (`YYYY-MM-DD`).
    to: String,
    /// Restricts the result to one volunteer profile.
    profile_id: Option<i64>,
}

/// Query parameters for the salary export.
#[derive(Debug, Deserialize)]
struct DateRangeQuery {
    /// Start of the date range (`YYYY-MM-DD`).
    from: String,
    /// End of the date range (`YYYY-MM-DD`).
    to: String,
}

async fn handle_list_timesheets(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Query(query): Query<TimesheetsQuery>,
) -> Result<Json<ListTimesheetsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::list_timesheets(
        &mut persistence,
        &query.from,
        &query.to,
        query.profile_id,
        &account,
    )?))
}

async fn handle_validate_timesheet(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Json(req): Json<ValidateTimesheetRequest>,
) -> Result<Json<ValidateTimesheetResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::validate_timesheet(
        &mut persistence,
        req,
        &account,
    )?))
}

async fn handle_export_salary_csv(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Query(query): Query<DateRangeQuery>,
) -> Result<Response, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    let content: String =
        defivelo_api::export_salary_csv(&mut persistence, &query.from, &query.to, &account)?;
    Ok(csv_response(content))
}

// ============================================================================
// Invoice handlers
// ============================================================================

async fn handle_create_invoice(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateInvoiceRequest>,
) -> Result<Json<CreateInvoiceResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::create_invoice(
        &mut persistence,
        req,
        &account,
    )?))
}

async fn handle_get_invoice(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(invoice_id): Path<i64>,
) -> Result<Json<InvoiceInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::get_invoice(
        &mut persistence,
        invoice_id,
        &account,
    )?))
}

async fn handle_list_invoices(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(season_id): Path<i64>,
) -> Result<Json<ListInvoicesResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::list_invoices(
        &mut persistence,
        season_id,
        &account,
    )?))
}

async fn handle_refresh_invoice(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(invoice_id): Path<i64>,
) -> Result<Json<MessageResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::refresh_invoice(
        &mut persistence,
        invoice_id,
        &account,
    )?))
}

async fn handle_transition_invoice(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(invoice_id): Path<i64>,
    Json(req): Json<TransitionInvoiceRequest>,
) -> Result<Json<TransitionInvoiceResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    Ok(Json(defivelo_api::transition_invoice(
        &mut persistence,
        invoice_id,
        req,
        &account,
    )?))
}

async fn handle_export_invoice_csv(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
    Path(invoice_id): Path<i64>,
) -> Result<Response, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let account: AuthenticatedAccount = authenticate(&mut persistence, &headers)?;
    let content: String =
        defivelo_api::export_invoice_csv(&mut persistence, invoice_id, &account)?;
    Ok(csv_response(content))
}

// ============================================================================
// Calendar feed
// ============================================================================

async fn handle_calendar_feed(
    AxumState(app_state): AxumState<AppState>,
    Path(token): Path<String>,
) -> Result<Response, HttpError> {
    // The route parameter may carry the conventional .ics suffix.
    let token: &str = token.strip_suffix(".ics").unwrap_or(&token);
    let mut persistence = app_state.persistence.lock().await;
    let feed: Option<String> = defivelo_api::render_calendar_feed(&mut persistence, token)?;
    feed.map_or_else(
        || {
            Err(HttpError {
                status: StatusCode::NOT_FOUND,
                message: String::from("Unknown calendar feed"),
            })
        },
        |content| {
            Ok((
                [(header::CONTENT_TYPE, "text/calendar; charset=utf-8")],
                content,
            )
                .into_response())
        },
    )
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .route("/whoami", get(handle_whoami))
        .route("/password/change", post(handle_change_password))
        .route("/password/reset", post(handle_reset_password))
        .route("/accounts", post(handle_create_account))
        .route("/accounts", get(handle_list_accounts))
        .route("/accounts/{id}", put(handle_update_account))
        .route("/accounts/{id}", delete(handle_delete_account))
        .route("/accounts/{id}/disable", post(handle_disable_account))
        .route("/accounts/{id}/enable", post(handle_enable_account))
        .route("/organizations", post(handle_create_organization))
        .route("/organizations", get(handle_list_organizations))
        .route("/organizations/{id}", get(handle_get_organization))
        .route("/organizations/{id}", put(handle_update_organization))
        .route("/organizations/{id}", delete(handle_delete_organization))
        .route("/profiles", post(handle_create_profile))
        .route("/profiles", get(handle_list_profiles))
        .route("/profiles/{id}", get(handle_get_profile))
        .route("/profiles/{id}", put(handle_update_profile))
        .route("/profiles/{id}", delete(handle_delete_profile))
        .route("/seasons", post(handle_create_season))
        .route("/seasons", get(handle_list_seasons))
        .route("/seasons/{id}", get(handle_get_season))
        .route("/seasons/{id}", put(handle_update_season))
        .route("/seasons/{id}/transition", post(handle_transition_season))
        .route("/seasons/{id}/sessions", get(handle_list_season_sessions))
        .route(
            "/seasons/{id}/availability_grid",
            get(handle_availability_grid),
        )
        .route("/seasons/{id}/invoices", get(handle_list_invoices))
        .route(
            "/seasons/{id}/export/sessions.csv",
            get(handle_export_sessions_csv),
        )
        .route("/sessions", post(handle_create_session))
        .route("/sessions/{id}", put(handle_update_session))
        .route("/sessions/{id}", delete(handle_delete_session))
        .route(
            "/sessions/{id}/qualifications",
            post(handle_create_qualification),
        )
        .route(
            "/sessions/{id}/qualifications",
            get(handle_list_qualifications),
        )
        .route(
            "/sessions/{id}/availabilities",
            get(handle_list_availabilities),
        )
        .route("/qualifications/{id}", put(handle_update_qualification))
        .route("/qualifications/{id}", delete(handle_delete_qualification))
        .route("/qualifications/{id}/staff", post(handle_assign_staff))
        .route("/availabilities", post(handle_declare_availability))
        .route("/availabilities/choose", post(handle_choose_staff))
        .route("/timesheets", get(handle_list_timesheets))
        .route("/timesheets/validate", post(handle_validate_timesheet))
        .route("/export/salary.csv", get(handle_export_salary_csv))
        .route("/invoices", post(handle_create_invoice))
        .route("/invoices/{id}", get(handle_get_invoice))
        .route("/invoices/{id}/refresh", post(handle_refresh_invoice))
        .route("/invoices/{id}/status", post(handle_transition_invoice))
        .route("/invoices/{id}/export.csv", get(handle_export_invoice_csv))
        .route("/calendar/{token}", get(handle_calendar_feed))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Défi Vélo intranet server");

    let persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
    };

    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
