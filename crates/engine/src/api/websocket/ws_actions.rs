use super::*;

use farmstead_domain::{TileAction, TileCoord};

use super::error_sanitizer::{client_message, error_code};

/// Run one batched tile action against the session's binding.
///
/// The room sees the modified tiles; the requester also gets the batch summary.
pub(super) async fn handle_tile_action(
    state: &WsState,
    ctx: &mut ConnectionContext,
    action: TileAction,
    coords: Option<Vec<TileCoord>>,
) -> Vec<SessionEffect> {
    let binding = match ctx.session.on_action() {
        Ok(binding) => binding,
        Err(effects) => return effects,
    };

    let result = state
        .app
        .use_cases
        .farm
        .perform(
            binding.character_id,
            binding.map_id,
            action,
            coords.as_deref(),
        )
        .await;

    match result {
        Ok(result) => {
            let outcome = &result.outcome;
            tracing::info!(
                connection_id = %ctx.connection_id,
                map_id = %binding.map_id,
                action = action.name(),
                updated = outcome.updated_tile_count,
                charged = result.charged_cost,
                "Tile action applied"
            );

            if outcome.updated_tile_count > 0 && ctx.session.is_current(binding.generation) {
                state
                    .connections
                    .broadcast_to_room(
                        &binding.room,
                        ServerMessage::TilesUpdated {
                            action: action.name().to_string(),
                            tiles: result.tiles.clone(),
                        },
                    )
                    .await;
            }

            vec![SessionEffect::Emit(ServerMessage::ActionResult {
                action: action.name().to_string(),
                updated_tile_count: outcome.updated_tile_count,
                total_cost: outcome.total_cost,
                charged_cost: result.charged_cost,
            })]
        }
        Err(e) => {
            let kind = e.kind();
            tracing::warn!(
                connection_id = %ctx.connection_id,
                map_id = %binding.map_id,
                action = action.name(),
                error = %e,
                "Tile action failed"
            );
            vec![SessionEffect::Emit(ServerMessage::error(
                error_code(kind),
                client_message(kind, &e, action.name()),
            ))]
        }
    }
}
