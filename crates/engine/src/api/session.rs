//! Per-connection session state machine.
//!
//! `Unbound -> Bound -> Closed`. Transitions are pure: they update the state
//! and return the effects the socket handler must carry out, in order.

use farmstead_domain::{CharacterId, GameMap, MapId};
use farmstead_shared::{ErrorCode, ServerMessage};

/// Room every connection bound to a map joins.
pub fn map_room(map_id: MapId) -> String {
    format!("map:{map_id}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub map_id: MapId,
    pub character_id: CharacterId,
    pub room: String,
    /// Listener generation attached for this binding.
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unbound,
    Bound(Binding),
    Closed,
}

/// Side effects the connection loop carries out after each event.
///
/// There is no separate listener registry. The action listeners of a
/// connection are the generation gate itself: [`Session::on_action`] only
/// accepts actions while the bound generation is attached, and
/// [`Session::is_current`] drops broadcasts from a superseded binding.
/// `AttachListeners` and `DetachListeners` mark where that gate opens and
/// closes so the handler can trace it.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    JoinRoom(String),
    LeaveRoom(String),
    AttachListeners { generation: u64 },
    DetachListeners { generation: u64 },
    /// Send to this connection only.
    Emit(ServerMessage),
    Disconnect,
    AppendDisconnectLog(CharacterId),
}

#[derive(Debug)]
pub struct Session {
    state: SessionState,
    /// Generation of the listeners currently attached, if any.
    attached: Option<u64>,
    next_generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unbound,
            attached: None,
            next_generation: 1,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, SessionState::Closed)
    }

    /// Leave the current binding, if any.
    fn unbind(&mut self, effects: &mut Vec<SessionEffect>) -> Option<Binding> {
        let SessionState::Bound(binding) = std::mem::replace(&mut self.state, SessionState::Unbound)
        else {
            return None;
        };
        if self.attached.take().is_some() {
            effects.push(SessionEffect::DetachListeners {
                generation: binding.generation,
            });
        }
        effects.push(SessionEffect::LeaveRoom(binding.room.clone()));
        Some(binding)
    }

    /// The map lookup for `client:request_initial_map` finished.
    ///
    /// A missing map closes the connection. Otherwise any previous binding is
    /// torn down before the new one is attached.
    pub fn on_map_resolved(&mut self, requested: MapId, map: Option<&GameMap>) -> Vec<SessionEffect> {
        if self.is_closed() {
            return Vec::new();
        }
        let mut effects = Vec::new();
        let previous = self.unbind(&mut effects);

        let Some(map) = map else {
            if let Some(previous) = previous {
                effects.push(SessionEffect::AppendDisconnectLog(previous.character_id));
            }
            effects.push(SessionEffect::Emit(ServerMessage::error(
                ErrorCode::NotFound,
                format!("Map not found: {requested}"),
            )));
            effects.push(SessionEffect::Disconnect);
            self.state = SessionState::Closed;
            return effects;
        };

        let generation = self.next_generation;
        self.next_generation += 1;
        let binding = Binding {
            map_id: map.id,
            character_id: map.character_id,
            room: map_room(map.id),
            generation,
        };

        effects.push(SessionEffect::Emit(ServerMessage::InitialMapData {
            tiles: map.tiles_by_key(),
            map_nickname: map.nickname.to_string(),
        }));
        effects.push(SessionEffect::AttachListeners { generation });
        effects.push(SessionEffect::JoinRoom(binding.room.clone()));
        self.attached = Some(generation);
        self.state = SessionState::Bound(binding);
        effects
    }

    /// Binding an incoming action or map request should run against.
    ///
    /// Unbound sessions get an error frame back; the connection stays open.
    pub fn on_action(&self) -> Result<Binding, Vec<SessionEffect>> {
        match &self.state {
            SessionState::Bound(binding) if self.attached == Some(binding.generation) => {
                Ok(binding.clone())
            }
            SessionState::Closed => Err(Vec::new()),
            SessionState::Bound(_) | SessionState::Unbound => {
                Err(vec![SessionEffect::Emit(ServerMessage::error(
                    ErrorCode::BadRequest,
                    "No map is bound to this connection; send client:request_initial_map first",
                ))])
            }
        }
    }

    /// Whether a result produced under `generation` still belongs to the live binding.
    pub fn is_current(&self, generation: u64) -> bool {
        matches!(&self.state, SessionState::Bound(b) if b.generation == generation)
            && self.attached == Some(generation)
    }

    pub fn on_disconnect(&mut self) -> Vec<SessionEffect> {
        let mut effects = Vec::new();
        if let Some(binding) = self.unbind(&mut effects) {
            effects.push(SessionEffect::AppendDisconnectLog(binding.character_id));
        }
        self.state = SessionState::Closed;
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use farmstead_domain::MapNickname;

    fn map() -> GameMap {
        GameMap::generate(
            CharacterId::new(),
            MapNickname::new("Home").unwrap(),
            4,
            4,
            Utc::now(),
            || false,
        )
    }

    #[test]
    fn first_bind_emits_then_attaches_then_joins() {
        let mut session = Session::new();
        let map = map();
        let effects = session.on_map_resolved(map.id, Some(&map));

        assert!(matches!(
            &effects[0],
            SessionEffect::Emit(ServerMessage::InitialMapData { map_nickname, tiles })
                if map_nickname == "Home" && tiles.len() == 16
        ));
        assert_eq!(effects[1], SessionEffect::AttachListeners { generation: 1 });
        assert_eq!(effects[2], SessionEffect::JoinRoom(map_room(map.id)));
        assert_eq!(session.on_action().unwrap().character_id, map.character_id);
    }

    #[test]
    fn rebind_tears_down_previous_binding_first() {
        let mut session = Session::new();
        let (a, b) = (map(), map());
        session.on_map_resolved(a.id, Some(&a));
        let effects = session.on_map_resolved(b.id, Some(&b));

        assert_eq!(effects[0], SessionEffect::DetachListeners { generation: 1 });
        assert_eq!(effects[1], SessionEffect::LeaveRoom(map_room(a.id)));
        assert_eq!(effects[3], SessionEffect::AttachListeners { generation: 2 });
        assert_eq!(effects[4], SessionEffect::JoinRoom(map_room(b.id)));
        assert!(!session.is_current(1));
        assert!(session.is_current(2));
    }

    #[test]
    fn missing_map_closes_connection() {
        let mut session = Session::new();
        let effects = session.on_map_resolved(MapId::new(), None);

        assert!(matches!(
            &effects[0],
            SessionEffect::Emit(ServerMessage::Error { code: ErrorCode::NotFound, .. })
        ));
        assert_eq!(effects[1], SessionEffect::Disconnect);
        assert!(session.is_closed());
        assert!(session.on_disconnect().is_empty());
    }

    #[test]
    fn action_while_unbound_is_answered_with_error() {
        let session = Session::new();
        let effects = session.on_action().unwrap_err();
        assert!(matches!(
            &effects[..],
            [SessionEffect::Emit(ServerMessage::Error { code: ErrorCode::BadRequest, .. })]
        ));
        assert_eq!(session.state(), &SessionState::Unbound);
    }

    #[test]
    fn disconnect_while_bound_logs_for_character() {
        let mut session = Session::new();
        let map = map();
        session.on_map_resolved(map.id, Some(&map));

        let effects = session.on_disconnect();
        assert_eq!(
            effects,
            vec![
                SessionEffect::DetachListeners { generation: 1 },
                SessionEffect::LeaveRoom(map_room(map.id)),
                SessionEffect::AppendDisconnectLog(map.character_id),
            ]
        );
        assert!(session.on_action().unwrap_err().is_empty());
    }

    #[test]
    fn disconnect_while_unbound_has_no_effects() {
        let mut session = Session::new();
        assert!(session.on_disconnect().is_empty());
        assert!(session.is_closed());
    }
}
