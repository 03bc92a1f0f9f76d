//! User endpoints
//!
//! One resource path, four methods:
//! - `GET    /users?id=&page=&search=` - filtered, paginated listing
//! - `POST   /users` - create, with an optional flat address
//! - `PUT    /users` - update by id, upserting the address when supplied
//! - `DELETE /users` - delete by id, together with the address

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::UserFilter;
use crate::http::error::{ApiError, Operation};
use crate::http::state::AppState;
use crate::models::user::{deserialize_optional_id, deserialize_present};
use crate::models::{AddressInput, NewUser, Pagination, UserId, UserRow, UserUpdate};

/// Query string of the listing. Values stay text so an empty parameter
/// (`?id=&search=`) reads as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub id: Option<String>,
    pub page: Option<String>,
    pub search: Option<String>,
}

impl ListParams {
    fn present(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Turn the raw parameters into a filter and a page.
    pub fn parse(&self) -> Result<(UserFilter, Pagination), String> {
        let mut filter = UserFilter::new();

        if let Some(id) = Self::present(&self.id) {
            let id: UserId = id.parse().map_err(|_| format!("invalid id '{id}'"))?;
            filter = filter.with_id(id);
        }
        if let Some(search) = self.search.as_deref() {
            filter = filter.with_name_containing(search);
        }

        let page = match Self::present(&self.page) {
            Some(page) => page
                .parse::<u32>()
                .or_else(|e| {
                    // Out-of-range integers clamp to the first or last representable page
                    let digits = page.strip_prefix(['-', '+']).unwrap_or(page);
                    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(e);
                    }
                    Ok(if page.starts_with('-') { 1 } else { u32::MAX })
                })
                .map_err(|_| format!("invalid page '{page}'"))?,
            None => 1,
        };

        Ok((filter, Pagination::new(page)))
    }
}

/// Pagination metadata of a listing response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: i64,
    pub total_users: i64,
}

/// GET response
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub data: Vec<UserRow>,
    pub pagination: PageInfo,
}

/// POST response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub success: bool,
    pub user_id: UserId,
}

/// PUT and DELETE response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// PUT body
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<UserId>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub birthdate: Option<Option<String>>,
    pub address: Option<AddressInput>,
}

impl UpdateUserRequest {
    fn into_parts(self) -> (Option<UserId>, UserUpdate) {
        let changes = UserUpdate {
            firstname: self.firstname,
            lastname: self.lastname,
            birthdate: self.birthdate,
            address: self.address,
        };
        (self.id, changes)
    }
}

/// DELETE body
#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<UserId>,
}

/// GET /users - list users with their address, five per page
async fn list_users(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<UserListResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::failed(Operation::List, e))?;
    let (filter, page) = params
        .parse()
        .map_err(|e| ApiError::failed(Operation::List, e))?;

    let result = state
        .store()
        .list(&filter, page)
        .await
        .map_err(|e| ApiError::from_db(Operation::List, e))?;

    let pagination = PageInfo {
        current_page: result.page,
        total_pages: result.total_pages(),
        total_users: result.total,
    };

    Ok(Json(UserListResponse {
        data: result.items,
        pagination,
    }))
}

/// POST /users - create a user and, if any address field is filled, its address
async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let Json(user) = body.map_err(|e| ApiError::failed(Operation::Create, e))?;

    let user_id = state
        .store()
        .create(&user)
        .await
        .map_err(|e| ApiError::from_db(Operation::Create, e))?;

    Ok(Json(CreatedResponse {
        success: true,
        user_id,
    }))
}

/// PUT /users - update a user, upserting the address when one is sent
async fn update_user(
    State(state): State<AppState>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::failed(Operation::Update, e))?;
    let (id, changes) = req.into_parts();
    let id = id.ok_or_else(|| ApiError::failed(Operation::Update, "id is required"))?;

    state
        .store()
        .update(id, &changes)
        .await
        .map_err(|e| ApiError::from_db(Operation::Update, e))?;

    Ok(Json(MessageResponse {
        message: "User updated",
    }))
}

/// DELETE /users - delete a user and its address
async fn delete_user(
    State(state): State<AppState>,
    body: Result<Json<DeleteUserRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::failed(Operation::Delete, e))?;
    let id = req
        .id
        .ok_or_else(|| ApiError::failed(Operation::Delete, "id is required"))?;

    state
        .store()
        .delete(id)
        .await
        .map_err(|e| ApiError::from_db(Operation::Delete, e))?;

    Ok(Json(MessageResponse {
        message: "User and address deleted",
    }))
}

/// User routes
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/users",
        get(list_users)
            .post(create_user)
            .put(update_user)
            .delete(delete_user),
    )
}
