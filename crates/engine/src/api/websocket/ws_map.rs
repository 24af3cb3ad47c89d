use super::*;

use farmstead_domain::MapId;

use crate::use_cases::maps::MapError;
use super::error_sanitizer::{client_message, error_code};

fn error_frame(e: &MapError, operation: &str) -> SessionEffect {
    let kind = e.kind();
    SessionEffect::Emit(ServerMessage::error(
        error_code(kind),
        client_message(kind, e, operation),
    ))
}

/// `client:request_initial_map`: resolve the map and (re)bind the session.
pub(super) async fn handle_request_initial_map(
    state: &WsState,
    ctx: &mut ConnectionContext,
    map_id: Uuid,
) -> Vec<SessionEffect> {
    let map_id = MapId::from_uuid(map_id);
    match state.app.use_cases.maps.get_map(map_id).await {
        Ok(map) => {
            let effects = ctx.session.on_map_resolved(map_id, Some(&map));
            tracing::info!(
                connection_id = %ctx.connection_id,
                map_id = %map.id,
                character_id = %map.character_id,
                "Connection bound to map"
            );
            effects
        }
        Err(MapError::MapNotFound(_)) => {
            tracing::warn!(
                connection_id = %ctx.connection_id,
                map_id = %map_id,
                "Requested map does not exist"
            );
            ctx.session.on_map_resolved(map_id, None)
        }
        Err(e) => vec![error_frame(&e, "load map")],
    }
}

/// `requestAllMapData`: full tile set of the bound map.
pub(super) async fn handle_request_all_map_data(
    state: &WsState,
    ctx: &mut ConnectionContext,
) -> Vec<SessionEffect> {
    let binding = match ctx.session.on_action() {
        Ok(binding) => binding,
        Err(effects) => return effects,
    };
    match state.app.use_cases.maps.get_map(binding.map_id).await {
        Ok(map) => vec![SessionEffect::Emit(ServerMessage::AllMapData {
            tiles: map.tiles_by_key(),
        })],
        Err(e) => vec![error_frame(&e, "load map")],
    }
}
