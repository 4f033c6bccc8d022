//! Customer HTTP surface under `/api/customer/v1`.
//!
//! Every response, success or failure, uses the `{code, message, data}`
//! envelope and `code` always mirrors the HTTP status.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use clientele_core::{
    AgeComparison, ApplicationError, CustomerField, CustomerInput, CustomerService,
    CustomerStatus, DomainError, InterfaceError,
};

pub const API_PREFIX: &str = "/api/customer/v1";

const CREATED: &str = "Customer created successfully";
const FETCHED: &str = "Customer data fetched successfully";
const UPDATED: &str = "Customer updated successfully";
const DELETED: &str = "Customer deleted successfully";
const STATUS_UPDATED: &str = "Customer status updated successfully";

#[derive(Clone)]
pub struct ApiState {
    service: CustomerService,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub message: String,
    pub data: T,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub correlation_id: String,
    pub fields: Vec<CustomerField>,
}

#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error.into_interface(Uuid::new_v4().to_string()))
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        ApplicationError::from(error).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let correlation_id = self.0.correlation_id().to_string();

        if status.is_server_error() {
            error!(
                event_name = "api.customer.failed",
                correlation_id = %correlation_id,
                status = status.as_u16(),
                error = %self.0,
                "customer request failed"
            );
        } else {
            warn!(
                event_name = "api.customer.rejected",
                correlation_id = %correlation_id,
                status = status.as_u16(),
                error = %self.0,
                "customer request rejected"
            );
        }

        let body = Envelope {
            code: status.as_u16(),
            message: self.0.user_message(),
            data: ErrorDetail { correlation_id, fields: self.0.fields().to_vec() },
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Response, ApiError>;

fn respond<T: Serialize>(status: StatusCode, message: &str, data: T) -> ApiResult {
    let body = Envelope { code: status.as_u16(), message: message.to_string(), data };
    Ok((status, Json(body)).into_response())
}

pub fn router(service: CustomerService) -> Router {
    let routes = Router::new()
        .route("/create", post(create))
        .route("/getAllData", get(get_all))
        .route("/getByMobile/{mobile}", get(get_by_mobile))
        .route("/getByUserName/{user_name}", get(get_by_user_name))
        .route("/getByEmailAddress/{email}", get(get_by_email_address))
        .route("/update", put(update))
        .route("/delete/{mobile}", delete(soft_delete))
        .route("/updateMobileNumber/{user_name}/{mobile}", patch(patch_mobile_number))
        .route("/status/{mobile}/{status}", patch(patch_status))
        .route("/getByFirstname/{first_name}", get(by_first_name))
        .route("/getByFirstnameAndLastname/{first_name}/{last_name}", get(by_first_and_last_name))
        .route("/getByFirstnameOrLastname/{first_name}/{last_name}", get(by_first_or_last_name))
        .route(
            "/getDistinctByFirstnameAndLastname/{first_name}/{last_name}",
            get(distinct_by_first_and_last_name),
        )
        .route("/getByAgeLessThan/{age}", get(age_less_than))
        .route("/getByAgeLessThanEqual/{age}", get(age_less_than_equal))
        .route("/getByAgeGreaterThan/{age}", get(age_greater_than))
        .route("/getByAgeGreaterThanEqual/{age}", get(age_greater_than_equal))
        .route("/getByStartDateBetween/{start}/{end}", get(by_start_date_between));

    Router::new()
        .nest(API_PREFIX, routes)
        .fallback(route_not_found)
        .with_state(ApiState { service })
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError(InterfaceError::NotFound {
        message: format!("no route for `{}`", uri.path()),
        correlation_id: Uuid::new_v4().to_string(),
    })
}

fn parse_body(payload: Result<Json<CustomerInput>, JsonRejection>) -> Result<CustomerInput, ApiError> {
    payload
        .map(|Json(input)| input)
        .map_err(|rejection| DomainError::Validation(rejection.body_text()).into())
}

fn parse_path<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    path.map(|Path(value)| value)
        .map_err(|rejection| DomainError::Validation(rejection.body_text()).into())
}

fn parse_age(raw: &str) -> Result<i32, DomainError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| DomainError::Validation(format!("age `{raw}` is not a whole number")))
}

fn parse_date(raw: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::Validation(format!("date `{raw}` is not in YYYY-MM-DD form")))
}

async fn create(
    State(state): State<ApiState>,
    payload: Result<Json<CustomerInput>, JsonRejection>,
) -> ApiResult {
    let input = parse_body(payload)?;
    let view = state.service.create(input).await?;
    info!(
        event_name = "api.customer.created",
        customer_id = %view.customer_id,
        "customer create accepted"
    );
    respond(StatusCode::CREATED, CREATED, view)
}

async fn get_all(State(state): State<ApiState>) -> ApiResult {
    respond(StatusCode::OK, FETCHED, state.service.get_all().await?)
}

async fn get_by_mobile(
    State(state): State<ApiState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let mobile = parse_path(path)?;
    respond(StatusCode::OK, FETCHED, state.service.get_by_mobile_number(&mobile).await?)
}

async fn get_by_user_name(
    State(state): State<ApiState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let user_name = parse_path(path)?;
    respond(StatusCode::OK, FETCHED, state.service.get_by_user_name(&user_name).await?)
}

async fn get_by_email_address(
    State(state): State<ApiState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let email = parse_path(path)?;
    respond(StatusCode::OK, FETCHED, state.service.get_by_email_address(&email).await?)
}

async fn update(
    State(state): State<ApiState>,
    payload: Result<Json<CustomerInput>, JsonRejection>,
) -> ApiResult {
    let input = parse_body(payload)?;
    respond(StatusCode::OK, UPDATED, state.service.update(input).await?)
}

async fn soft_delete(
    State(state): State<ApiState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let mobile = parse_path(path)?;
    respond(StatusCode::OK, DELETED, state.service.soft_delete(&mobile).await?)
}

async fn patch_mobile_number(
    State(state): State<ApiState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> ApiResult {
    let (user_name, mobile) = parse_path(path)?;
    respond(StatusCode::OK, UPDATED, state.service.patch_mobile_number(&user_name, &mobile).await?)
}

async fn patch_status(
    State(state): State<ApiState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> ApiResult {
    let (mobile, status) = parse_path(path)?;
    let status = status.parse::<CustomerStatus>()?;
    respond(StatusCode::OK, STATUS_UPDATED, state.service.patch_status(&mobile, status).await?)
}

async fn by_first_name(
    State(state): State<ApiState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let first_name = parse_path(path)?;
    respond(StatusCode::OK, FETCHED, state.service.search_by_first_name(&first_name).await?)
}

async fn by_first_and_last_name(
    State(state): State<ApiState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> ApiResult {
    let (first_name, last_name) = parse_path(path)?;
    let views = state.service.search_by_first_and_last_name(&first_name, &last_name).await?;
    respond(StatusCode::OK, FETCHED, views)
}

async fn by_first_or_last_name(
    State(state): State<ApiState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> ApiResult {
    let (first_name, last_name) = parse_path(path)?;
    let views = state.service.search_by_first_or_last_name(&first_name, &last_name).await?;
    respond(StatusCode::OK, FETCHED, views)
}

async fn distinct_by_first_and_last_name(
    State(state): State<ApiState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> ApiResult {
    let (first_name, last_name) = parse_path(path)?;
    let views =
        state.service.search_distinct_by_first_and_last_name(&first_name, &last_name).await?;
    respond(StatusCode::OK, FETCHED, views)
}

async fn by_age(state: ApiState, comparison: AgeComparison, raw_age: &str) -> ApiResult {
    let age = parse_age(raw_age)?;
    respond(StatusCode::OK, FETCHED, state.service.search_by_age(comparison, age).await?)
}

async fn age_less_than(
    State(state): State<ApiState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let age = parse_path(path)?;
    by_age(state, AgeComparison::LessThan, &age).await
}

async fn age_less_than_equal(
    State(state): State<ApiState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let age = parse_path(path)?;
    by_age(state, AgeComparison::LessThanOrEqual, &age).await
}

async fn age_greater_than(
    State(state): State<ApiState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let age = parse_path(path)?;
    by_age(state, AgeComparison::GreaterThan, &age).await
}

async fn age_greater_than_equal(
    State(state): State<ApiState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let age = parse_path(path)?;
    by_age(state, AgeComparison::GreaterThanOrEqual, &age).await
}

async fn by_start_date_between(
    State(state): State<ApiState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> ApiResult {
    let (start, end) = parse_path(path)?;
    let start = parse_date(&start)?;
    let end = parse_date(&end)?;
    respond(StatusCode::OK, FETCHED, state.service.search_by_start_date_between(start, end).await?)
}
