//! HTTP request handlers for the payroll tracker API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    routing::{get, post, put},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{TOKEN_TYPE, hash_password, issue_token, verify_password};
use crate::calculation::{
    PayrollInput, PayrollSummary, YearlySummary, compute_payroll, summarize_year,
    validate_field_update, validate_new_field,
};
use crate::config::CategoryTable;
use crate::error::{PayrollError, PayrollResult};
use crate::models::{
    NewPerson, NewSalaryField, Person, PersonUpdate, RecordFilter, SalaryField,
    SalaryFieldUpdate, SalaryRecord, validate_period,
};

use super::extract::AuthUser;
use super::request::{
    CredentialsRequest, SalaryCreateRequest, SalaryFieldCreateRequest, SalaryFieldQuery,
    SalaryUpdateRequest, YearlyStatsQuery,
};
use super::response::{ApiError, ApiErrorResponse, OkResponse, SalaryOut, TokenResponse, UserOut};
use super::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/me", get(me_handler))
        .route("/persons", get(list_persons_handler).post(create_person_handler))
        .route(
            "/persons/:id",
            get(get_person_handler)
                .put(update_person_handler)
                .delete(delete_person_handler),
        )
        .route("/salary-fields/categories", get(categories_handler))
        .route(
            "/salary-fields",
            get(list_fields_handler).post(create_field_handler),
        )
        .route(
            "/salary-fields/:id",
            put(update_field_handler).delete(delete_field_handler),
        )
        .route("/salaries", get(list_salaries_handler))
        .route(
            "/salaries/:id",
            get(get_salary_handler)
                .post(create_salary_handler)
                .put(update_salary_handler)
                .delete(delete_salary_handler),
        )
        .route("/payroll/calculate", post(calculate_handler))
        .route("/stats/yearly", get(yearly_stats_handler))
        .with_state(state)
}

/// Unwraps a JSON body, turning extractor rejections into 400 responses.
fn json_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> Result<T, ApiErrorResponse> {
    let rejection = match payload {
        Ok(Json(body)) => return Ok(body),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    Err(ApiErrorResponse::bad_request(error))
}

/// Logs a failed operation and converts it for the response.
fn reject(correlation_id: Uuid, error: PayrollError) -> ApiErrorResponse {
    warn!(correlation_id = %correlation_id, error = %error, "Request failed");
    error.into()
}

fn validate_credentials(body: &CredentialsRequest) -> Result<(), ApiErrorResponse> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(ApiErrorResponse::bad_request(ApiError::validation_error(
            "username and password must not be empty",
        )));
    }
    Ok(())
}

/// Handler for POST /auth/register.
async fn register_handler(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<UserOut> {
    let correlation_id = Uuid::new_v4();
    let body = json_body(payload, correlation_id)?;
    validate_credentials(&body)?;

    let username = body.username.trim();
    let hash = hash_password(&body.password).map_err(|e| reject(correlation_id, e))?;
    let user = state
        .store()
        .create_user(username, &hash)
        .map_err(|e| reject(correlation_id, e))?;

    info!(correlation_id = %correlation_id, user_id = user.id, "Registered user");
    Ok(Json(user.into()))
}

/// Handler for POST /auth/login.
async fn login_handler(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let correlation_id = Uuid::new_v4();
    let body = json_body(payload, correlation_id)?;

    let user = state
        .store()
        .find_user_by_username(body.username.trim())
        .map_err(|e| reject(correlation_id, e))?
        .filter(|u| verify_password(&body.password, &u.password_hash))
        .ok_or_else(|| reject(correlation_id, PayrollError::InvalidCredentials))?;

    let (access_token, expires_in) =
        issue_token(&state.config().config().auth, user.id, &user.username)
            .map_err(|e| reject(correlation_id, e))?;

    info!(correlation_id = %correlation_id, user_id = user.id, "Issued access token");
    Ok(Json(TokenResponse {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in,
    }))
}

/// Handler for GET /auth/me.
async fn me_handler(State(state): State<AppState>, user: AuthUser) -> ApiResult<UserOut> {
    let account = state
        .store()
        .get_user(user.id)?
        .ok_or_else(|| PayrollError::Unauthenticated {
            message: "user no longer exists".to_string(),
        })?;
    Ok(Json(account.into()))
}

/// Handler for GET /persons.
async fn list_persons_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<Person>> {
    Ok(Json(state.store().list_persons(user.id)?))
}

/// Handler for POST /persons.
async fn create_person_handler(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<NewPerson>, JsonRejection>,
) -> ApiResult<Person> {
    let correlation_id = Uuid::new_v4();
    let body = json_body(payload, correlation_id)?;
    let person = state
        .store()
        .create_person(user.id, &body)
        .map_err(|e| reject(correlation_id, e))?;
    info!(correlation_id = %correlation_id, person_id = person.id, "Added person");
    Ok(Json(person))
}

/// Handler for GET /persons/{id}.
async fn get_person_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(person_id): Path<u64>,
) -> ApiResult<Person> {
    Ok(Json(state.store().get_person(user.id, person_id)?))
}

/// Handler for PUT /persons/{id}.
async fn update_person_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(person_id): Path<u64>,
    payload: Result<Json<PersonUpdate>, JsonRejection>,
) -> ApiResult<Person> {
    let correlation_id = Uuid::new_v4();
    let body = json_body(payload, correlation_id)?;
    let person = state
        .store()
        .update_person(user.id, person_id, &body)
        .map_err(|e| reject(correlation_id, e))?;
    Ok(Json(person))
}

/// Handler for DELETE /persons/{id}. Removes the person's salary records too.
async fn delete_person_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(person_id): Path<u64>,
) -> ApiResult<OkResponse> {
    let correlation_id = Uuid::new_v4();
    state
        .store()
        .delete_person(user.id, person_id)
        .map_err(|e| reject(correlation_id, e))?;
    Ok(Json(OkResponse::OK))
}

/// Handler for GET /salary-fields/categories.
///
/// Public: the table is the same for every user.
async fn categories_handler(State(state): State<AppState>) -> Json<CategoryTable> {
    Json(state.config().categories().clone())
}

/// Handler for GET /salary-fields.
async fn list_fields_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SalaryFieldQuery>,
) -> ApiResult<Vec<SalaryField>> {
    let filter = query.to_filter()?;
    Ok(Json(state.store().list_fields(user.id, filter)?))
}

/// Handler for POST /salary-fields.
async fn create_field_handler(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<SalaryFieldCreateRequest>, JsonRejection>,
) -> ApiResult<SalaryField> {
    let correlation_id = Uuid::new_v4();
    let body = json_body(payload, correlation_id)?;

    let field = NewSalaryField::try_from(body)
        .and_then(|field| {
            validate_new_field(state.config().categories(), &field)?;
            state.store().create_field(user.id, &field)
        })
        .map_err(|e| reject(correlation_id, e))?;

    info!(
        correlation_id = %correlation_id,
        field_id = field.id,
        field_key = %field.field_key,
        "Created salary field"
    );
    Ok(Json(field))
}

/// Handler for PUT /salary-fields/{id}.
async fn update_field_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(field_id): Path<u64>,
    payload: Result<Json<SalaryFieldUpdate>, JsonRejection>,
) -> ApiResult<SalaryField> {
    let correlation_id = Uuid::new_v4();
    let body = json_body(payload, correlation_id)?;

    let store = state.store();
    let field = store
        .get_field(user.id, field_id)
        .and_then(|existing| {
            validate_field_update(state.config().categories(), &existing, &body)?;
            store.update_field(user.id, field_id, &body)
        })
        .map_err(|e| reject(correlation_id, e))?;
    Ok(Json(field))
}

/// Handler for DELETE /salary-fields/{id}. Soft delete.
async fn delete_field_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(field_id): Path<u64>,
) -> ApiResult<OkResponse> {
    let correlation_id = Uuid::new_v4();
    state
        .store()
        .deactivate_field(user.id, field_id)
        .map_err(|e| reject(correlation_id, e))?;
    info!(correlation_id = %correlation_id, field_id, "Deactivated salary field");
    Ok(Json(OkResponse::OK))
}

/// Derives the totals for each record using one batched custom value lookup.
fn derive_salaries(
    state: &AppState,
    records: &[SalaryRecord],
) -> PayrollResult<Vec<(SalaryOut, PayrollSummary)>> {
    let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
    let custom_values = state.store().custom_values_for_records(&ids)?;

    records
        .iter()
        .map(|record| {
            let values = custom_values
                .get(&record.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let summary = compute_payroll(&PayrollInput::from_record(&record.fixed, values))?;
            Ok((SalaryOut::new(record, &summary, values), summary))
        })
        .collect()
}

fn salary_out(state: &AppState, record: &SalaryRecord) -> PayrollResult<SalaryOut> {
    let mut derived = derive_salaries(state, std::slice::from_ref(record))?;
    derived
        .pop()
        .map(|(out, _)| out)
        .ok_or(PayrollError::RecordNotFound { id: record.id })
}

/// Handler for GET /salaries.
async fn list_salaries_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<RecordFilter>,
) -> ApiResult<Vec<SalaryOut>> {
    let correlation_id = Uuid::new_v4();
    let start_time = Instant::now();

    let records = state
        .store()
        .list_records(user.id, filter)
        .map_err(|e| reject(correlation_id, e))?;
    let salaries: Vec<SalaryOut> = derive_salaries(&state, &records)
        .map_err(|e| reject(correlation_id, e))?
        .into_iter()
        .map(|(out, _)| out)
        .collect();

    info!(
        correlation_id = %correlation_id,
        records = salaries.len(),
        duration_us = start_time.elapsed().as_micros(),
        "Listed salaries"
    );
    Ok(Json(salaries))
}

/// Handler for POST /salaries/{person_id}.
async fn create_salary_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(person_id): Path<u64>,
    payload: Result<Json<SalaryCreateRequest>, JsonRejection>,
) -> ApiResult<SalaryOut> {
    let correlation_id = Uuid::new_v4();
    let body = json_body(payload, correlation_id)?;

    let out = body
        .into_parts()
        .and_then(|(record, custom)| {
            state
                .store()
                .create_record(user.id, person_id, &record, custom.as_ref())
        })
        .and_then(|record| salary_out(&state, &record))
        .map_err(|e| reject(correlation_id, e))?;

    info!(
        correlation_id = %correlation_id,
        record_id = out.id,
        net_income = %out.net_income,
        "Created salary"
    );
    Ok(Json(out))
}

/// Handler for GET /salaries/{id}.
async fn get_salary_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(record_id): Path<u64>,
) -> ApiResult<SalaryOut> {
    let record = state.store().get_record(user.id, record_id)?;
    Ok(Json(salary_out(&state, &record)?))
}

/// Handler for PUT /salaries/{id}.
async fn update_salary_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(record_id): Path<u64>,
    payload: Result<Json<SalaryUpdateRequest>, JsonRejection>,
) -> ApiResult<SalaryOut> {
    let correlation_id = Uuid::new_v4();
    let body = json_body(payload, correlation_id)?;

    let out = body
        .into_parts()
        .and_then(|(update, custom)| {
            state
                .store()
                .update_record(user.id, record_id, &update, custom.as_ref())
        })
        .and_then(|record| salary_out(&state, &record))
        .map_err(|e| reject(correlation_id, e))?;

    info!(correlation_id = %correlation_id, record_id, "Updated salary");
    Ok(Json(out))
}

/// Handler for DELETE /salaries/{id}.
async fn delete_salary_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(record_id): Path<u64>,
) -> ApiResult<OkResponse> {
    let correlation_id = Uuid::new_v4();
    state
        .store()
        .delete_record(user.id, record_id)
        .map_err(|e| reject(correlation_id, e))?;
    Ok(Json(OkResponse::OK))
}

/// Handler for POST /payroll/calculate.
///
/// Stateless: runs the aggregator on the posted input.
async fn calculate_handler(
    payload: Result<Json<PayrollInput>, JsonRejection>,
) -> ApiResult<PayrollSummary> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing payroll calculation");
    let input = json_body(payload, correlation_id)?;

    let start_time = Instant::now();
    let summary = compute_payroll(&input).map_err(|e| reject(correlation_id, e))?;
    info!(
        correlation_id = %correlation_id,
        custom_fields = input.custom_fields.len(),
        net_income = %summary.net_income,
        duration_us = start_time.elapsed().as_micros(),
        "Calculation completed successfully"
    );
    Ok(Json(summary))
}

/// Handler for GET /stats/yearly.
async fn yearly_stats_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<YearlyStatsQuery>,
) -> ApiResult<YearlySummary> {
    let correlation_id = Uuid::new_v4();

    let summary = yearly_summary(&state, user.id, &query).map_err(|e| reject(correlation_id, e))?;
    info!(
        correlation_id = %correlation_id,
        year = summary.year,
        records = summary.record_count,
        "Built yearly summary"
    );
    Ok(Json(summary))
}

fn yearly_summary(
    state: &AppState,
    user_id: u64,
    query: &YearlyStatsQuery,
) -> PayrollResult<YearlySummary> {
    validate_period(query.year, 1)?;
    if let Some(person_id) = query.person_id {
        state.store().get_person(user_id, person_id)?;
    }

    let filter = RecordFilter {
        person_id: query.person_id,
        year: Some(query.year),
        month: None,
    };
    let records = state.store().list_records(user_id, filter)?;
    let entries: Vec<(u32, PayrollSummary)> = derive_salaries(state, &records)?
        .into_iter()
        .map(|(out, summary)| (out.month, summary))
        .collect();

    summarize_year(query.year, query.person_id, &entries)
}
