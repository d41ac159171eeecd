use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use room_core::{RoomError, UserId};

use crate::dto::{CreatedUserResponse, RoomCodeQuery, UserCodeQuery, UserCreate, UserView};
use crate::error::AppResult;
use crate::extract::{ValidatedJson, ValidatedQuery};
use crate::service::DeleteUserCommand;
use crate::AppState;

fn positive_id(id: UserId) -> AppResult<UserId> {
    if id == 0 {
        return Err(RoomError::bad_request("id", "User id must be a positive number.").into());
    }
    Ok(id)
}

/// POST /api/users?roomCode=
pub async fn join_room(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<RoomCodeQuery>,
    ValidatedJson(profile): ValidatedJson<UserCreate>,
) -> AppResult<(StatusCode, Json<CreatedUserResponse>)> {
    let (user, user_code) = state.service.join_room(&query.room_code, profile).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            user: UserView::for_viewer(&user, &user),
            user_code,
        }),
    ))
}

/// GET /api/users?userCode=
pub async fn list_users(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<UserCodeQuery>,
) -> AppResult<Json<Vec<UserView>>> {
    let (users, caller) = state.service.list_users(&query.user_code).await?;
    Ok(Json(
        users
            .iter()
            .map(|u| UserView::for_viewer(u, &caller))
            .collect(),
    ))
}

/// GET /api/users/:id?userCode=
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    ValidatedQuery(query): ValidatedQuery<UserCodeQuery>,
) -> AppResult<Json<UserView>> {
    let id = positive_id(id)?;
    let (user, caller) = state.service.get_user(&query.user_code, id).await?;
    Ok(Json(UserView::for_viewer(&user, &caller)))
}

/// DELETE /api/users/:id?userCode=
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    ValidatedQuery(query): ValidatedQuery<UserCodeQuery>,
) -> AppResult<StatusCode> {
    let user_id = positive_id(id)?;
    state
        .service
        .delete_user(DeleteUserCommand {
            user_code: query.user_code,
            user_id,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
