//! HTTP routes.
//!
//! Every route except health identifies its caller with the `X-User-Id`
//! header.

use std::fmt::Display;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use farmstead_domain::{CharacterId, GameMap, MapId, UserId, WalletId};
use farmstead_shared::{
    CharacterProfileResponse, CharacterSummary, CreateCharacterRequest, CreateMapRequest,
    ErrorCode, ErrorResponse, MapSummary, RenameMapRequest, SetFavoriteRequest,
    TransactionRequest, WalletResponse,
};
use uuid::Uuid;

use super::websocket::error_sanitizer::{client_message, messages};
use crate::app::App;
use crate::use_cases::{
    economy::EconomyError, lifecycle::LifecycleError, maps::MapError, ErrorKind,
};

/// Status entries included in a character profile.
const PROFILE_RECENT_STATUS: usize = 10;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/characters",
            get(list_characters).post(create_character),
        )
        .route(
            "/api/characters/{id}",
            get(get_character).delete(remove_character),
        )
        .route("/api/characters/{id}/favorite", put(set_character_favorite))
        .route(
            "/api/characters/{id}/maps",
            get(list_maps).post(create_map),
        )
        .route("/api/maps/{id}/favorite", put(set_map_favorite))
        .route("/api/maps/{id}/nickname", put(rename_map))
        .route("/api/wallets/{id}/transactions", post(process_transaction))
}

async fn health() -> &'static str {
    "OK"
}

/// Authenticated caller, taken from `X-User-Id`.
pub struct Caller(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        super::user_id_from_headers(&parts.headers)
            .map(Caller)
            .ok_or_else(|| ApiError::bad_request(messages::MISSING_USER))
    }
}

async fn list_characters(
    State(app): State<Arc<App>>,
    Caller(user_id): Caller,
) -> Result<Json<Vec<CharacterSummary>>, ApiError> {
    let characters = app
        .use_cases
        .lifecycle
        .profiles
        .list_characters(user_id)
        .await
        .map_err(api_error("list characters"))?;
    Ok(Json(characters.iter().map(CharacterSummary::from).collect()))
}

async fn create_character(
    State(app): State<Arc<App>>,
    Caller(user_id): Caller,
    Json(body): Json<CreateCharacterRequest>,
) -> Result<(StatusCode, Json<CharacterProfileResponse>), ApiError> {
    let user = app
        .repositories
        .users
        .get(user_id)
        .await
        .map_err(|e| ApiError::internal(&e, "load user"))?
        .ok_or_else(|| ApiError::bad_request(format!("Unknown user: {user_id}")))?;

    let created = app
        .use_cases
        .lifecycle
        .create
        .execute(&user.username, body.character_name)
        .await
        .map_err(api_error("create character"))?;

    Ok((
        StatusCode::CREATED,
        Json(CharacterProfileResponse {
            recent_status: created.status_log.recent(PROFILE_RECENT_STATUS),
            character: created.character,
            inventory_id: created.inventory.id.to_uuid(),
            items: created.inventory.items().to_vec(),
            wallet_id: created.wallet.id.to_uuid(),
            coins: created.wallet.coins,
            status_log_id: created.status_log.id.to_uuid(),
        }),
    ))
}

async fn get_character(
    State(app): State<Arc<App>>,
    Caller(user_id): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<CharacterProfileResponse>, ApiError> {
    let profile = app
        .use_cases
        .lifecycle
        .profiles
        .get_profile(user_id, CharacterId::from_uuid(id))
        .await
        .map_err(api_error("load character"))?;

    Ok(Json(CharacterProfileResponse {
        recent_status: profile.status_log.recent(PROFILE_RECENT_STATUS),
        character: profile.character,
        inventory_id: profile.inventory.id.to_uuid(),
        items: profile.inventory.items().to_vec(),
        wallet_id: profile.wallet.id.to_uuid(),
        coins: profile.wallet.coins,
        status_log_id: profile.status_log.id.to_uuid(),
    }))
}

async fn remove_character(
    State(app): State<Arc<App>>,
    Caller(user_id): Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app.use_cases
        .lifecycle
        .remove
        .execute(user_id, CharacterId::from_uuid(id))
        .await
        .map_err(api_error("remove character"))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_character_favorite(
    State(app): State<Arc<App>>,
    Caller(user_id): Caller,
    Path(id): Path<Uuid>,
    Json(body): Json<SetFavoriteRequest>,
) -> Result<StatusCode, ApiError> {
    app.use_cases
        .lifecycle
        .favorite
        .execute(user_id, CharacterId::from_uuid(id), body.is_favorite)
        .await
        .map_err(api_error("update favorite character"))?;
    Ok(StatusCode::NO_CONTENT)
}

fn map_summary(map: &GameMap) -> MapSummary {
    MapSummary {
        map_id: map.id.to_uuid(),
        character_id: map.character_id.to_uuid(),
        nickname: map.nickname.to_string(),
        max_width: map.max_width,
        max_height: map.max_height,
        is_favorite: map.is_favorite,
        created_at: map.created_at,
    }
}

async fn list_maps(
    State(app): State<Arc<App>>,
    Caller(user_id): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MapSummary>>, ApiError> {
    let maps = app
        .use_cases
        .maps
        .list_maps(user_id, CharacterId::from_uuid(id))
        .await
        .map_err(api_error("list maps"))?;
    Ok(Json(maps.iter().map(map_summary).collect()))
}

async fn create_map(
    State(app): State<Arc<App>>,
    Caller(user_id): Caller,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateMapRequest>,
) -> Result<(StatusCode, Json<MapSummary>), ApiError> {
    let map = app
        .use_cases
        .maps
        .create_map(user_id, CharacterId::from_uuid(id), body.nickname)
        .await
        .map_err(api_error("create map"))?;
    Ok((StatusCode::CREATED, Json(map_summary(&map))))
}

async fn set_map_favorite(
    State(app): State<Arc<App>>,
    Caller(user_id): Caller,
    Path(id): Path<Uuid>,
    Json(body): Json<SetFavoriteRequest>,
) -> Result<StatusCode, ApiError> {
    app.use_cases
        .maps
        .set_favorite_map(user_id, MapId::from_uuid(id), body.is_favorite)
        .await
        .map_err(api_error("update favorite map"))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn rename_map(
    State(app): State<Arc<App>>,
    Caller(user_id): Caller,
    Path(id): Path<Uuid>,
    Json(body): Json<RenameMapRequest>,
) -> Result<StatusCode, ApiError> {
    app.use_cases
        .maps
        .rename_map(user_id, MapId::from_uuid(id), body.nickname)
        .await
        .map_err(api_error("rename map"))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn process_transaction(
    State(app): State<Arc<App>>,
    Caller(user_id): Caller,
    Path(id): Path<Uuid>,
    Json(body): Json<TransactionRequest>,
) -> Result<Json<WalletResponse>, ApiError> {
    let wallet_id = WalletId::from_uuid(id);
    let wallets = &app.use_cases.economy.wallets;
    wallets
        .ensure_owner(user_id, wallet_id)
        .await
        .map_err(api_error("process transaction"))?;
    let coins = wallets
        .process_transaction(wallet_id, body.cost)
        .await
        .map_err(api_error("process transaction"))?;
    Ok(Json(WalletResponse {
        wallet_id: id,
        coins,
    }))
}

// =============================================================================
// Errors
// =============================================================================

/// Use-case errors the HTTP layer knows how to classify.
trait Classified: Display {
    fn kind(&self) -> ErrorKind;
}

impl Classified for LifecycleError {
    fn kind(&self) -> ErrorKind {
        LifecycleError::kind(self)
    }
}

impl Classified for MapError {
    fn kind(&self) -> ErrorKind {
        MapError::kind(self)
    }
}

impl Classified for EconomyError {
    fn kind(&self) -> ErrorKind {
        EconomyError::kind(self)
    }
}

fn api_error<E: Classified>(operation: &'static str) -> impl Fn(E) -> ApiError {
    move |e| ApiError::from_kind(e.kind(), &e, operation)
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse::new(code, message),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, message)
    }

    fn internal<E: Display>(error: &E, operation: &str) -> Self {
        Self::from_kind(ErrorKind::Internal, error, operation)
    }

    fn from_kind<E: Display>(kind: ErrorKind, error: &E, operation: &str) -> Self {
        let (status, code) = match kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, ErrorCode::ValidationError),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            ErrorKind::Conflict => (StatusCode::CONFLICT, ErrorCode::Conflict),
            ErrorKind::InsufficientResource => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::InsufficientResource,
            ),
            ErrorKind::Inconsistency => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Inconsistency)
            }
            ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError),
        };
        Self::new(status, code, client_message(kind, error, operation))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
