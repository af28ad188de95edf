//! Bearer-token authentication
//!
//! A request is admitted when its bearer token maps to a user id through the
//! configured API keys and that user is listed by the admin directory.

use axum::http::{header, HeaderMap};
use chrono::{Local, NaiveDate};

use crate::error::{Error, Result};
use crate::publish::{Principal, RequestContext};

use super::server::AppState;

/// Extract the bearer token from `Authorization`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Build the admin request context for today
pub async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<RequestContext> {
    authorize_on(state, headers, Local::now().date_naive()).await
}

/// Build the admin request context for a given day
pub async fn authorize_on(
    state: &AppState,
    headers: &HeaderMap,
    today: NaiveDate,
) -> Result<RequestContext> {
    let token = bearer_token(headers).ok_or_else(|| Error::unauthorized("Missing token."))?;

    let user_id = state
        .config
        .user_for_token(token)
        .ok_or_else(|| Error::unauthorized("Not logged in."))?
        .to_string();

    let is_admin = state
        .service
        .store()
        .is_admin(&user_id)
        .await
        .map_err(Error::AdminCheck)?;

    let ctx = RequestContext::new(Principal::User(user_id), is_admin, today);
    ctx.require_admin()?;
    Ok(ctx)
}
