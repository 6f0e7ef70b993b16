use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::error;

use super::types::{
    AccountResponse, BalanceQuery, CreateAccountRequest, ErrorBody, PageQuery, PageResponse,
    UpdateAccountRequest,
};
use super::AppState;
use crate::auth::AuthContext;
use crate::error::ServiceError;

/// Boundary mapping from the domain error taxonomy to HTTP.
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServiceError::AccountNotFound(_) => (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND"),
            ServiceError::InsufficientFunds(_) => (StatusCode::BAD_REQUEST, "INSUFFICIENT_FUNDS"),
            ServiceError::InvalidOperation(_) => (StatusCode::BAD_REQUEST, "INVALID_OPERATION"),
            ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ServiceError::Storage(_) | ServiceError::Codec(_) | ServiceError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        // Internal failures are logged in full but reported generically.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Internal error: {}", self);
            "An unexpected error occurred".to_string()
        } else {
            self.to_string()
        };
        let details = match self {
            ServiceError::Validation(details) => Some(details),
            _ => None,
        };

        let body = ErrorBody::new(status.as_u16(), code, &message, details);
        let mut response = (status, Json(body)).into_response();
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        response
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<Response, ServiceError> {
    let new = request.validate()?;
    let account = state.service.create(new)?;
    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))).into_response())
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<AccountResponse>, ServiceError> {
    Ok(Json(state.service.get_by_id(id)?.into()))
}

pub async fn get_account_by_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<AccountResponse>, ServiceError> {
    Ok(Json(state.service.get_by_number(&number)?.into()))
}

pub async fn get_customer_accounts(
    State(state): State<AppState>,
    Path(customer_id): Path<u64>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ServiceError> {
    if query.page.is_none() && query.size.is_none() {
        let accounts = state.service.list_by_customer(customer_id)?;
        let body: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();
        return Ok(Json(body).into_response());
    }

    let page = query.page.unwrap_or(0);
    let size = query.size.unwrap_or(10);
    if size == 0 {
        let mut details = HashMap::new();
        details.insert("size".to_string(), "Page size must be at least 1".to_string());
        return Err(ServiceError::Validation(details));
    }

    let (accounts, total) = state.service.list_by_customer_paged(customer_id, page, size)?;
    let content: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();
    Ok(Json(PageResponse::new(content, page, size, total)).into_response())
}

pub async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ServiceError> {
    let changes = request.validate()?;
    Ok(Json(state.service.update(id, changes)?.into()))
}

pub async fn close_account(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ServiceError> {
    state.service.close(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn suspend_account(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ServiceError> {
    state.service.suspend(id)?;
    Ok(StatusCode::OK)
}

pub async fn activate_account(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ServiceError> {
    state.service.activate(id)?;
    Ok(StatusCode::OK)
}

pub async fn get_balance(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Decimal>, ServiceError> {
    Ok(Json(state.service.get_balance(id)?))
}

pub async fn update_balance(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<Decimal>, ServiceError> {
    let new_balance = Decimal::from_str(&query.new_balance).map_err(|_| {
        let mut details = HashMap::new();
        details.insert(
            "newBalance".to_string(),
            "New balance must be a decimal amount".to_string(),
        );
        ServiceError::Validation(details)
    })?;
    Ok(Json(state.service.update_balance(id, new_balance)?))
}

/// Identity check: the numeric user id of the connected user, -1 when
/// the token carries none.
pub async fn get_user_id(context: Option<Extension<AuthContext>>) -> Json<i64> {
    let user_id = context
        .and_then(|Extension(ctx)| ctx.identity.user_id)
        .map(|id| id as i64)
        .unwrap_or(-1);
    Json(user_id)
}
