//! Farmstead Protocol - types shared between the engine and game clients
//!
//! - Socket frames (`ClientMessage`, `ServerMessage`), `{ "event", "data" }` on the wire
//! - HTTP request bodies and response DTOs
//! - Error classification codes
//!
//! No business logic lives here. Tile and crop vocabulary comes from the
//! domain crate so both sides agree on the shape of a map.

pub mod messages;
pub mod requests;
pub mod responses;

pub use messages::{ClientMessage, ServerMessage, TileMap};
pub use requests::{
    CreateCharacterRequest, CreateMapRequest, RenameMapRequest, SetFavoriteRequest,
    TransactionRequest,
};
pub use responses::{
    CharacterProfileResponse, CharacterSummary, ErrorCode, ErrorResponse, MapSummary,
    WalletResponse,
};
