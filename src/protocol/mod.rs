// Protocol module: wire types, message shapes, room codes, and validation.

pub mod error_codes;
pub mod messages;
pub mod room_codes;
pub mod types;
pub mod validation;

pub use error_codes::ErrorCode;
pub use messages::{
    ClientMessage, CreateRoomRequest, Event, JoinRoomRequest, PlayerActionRequest,
    StartGameRequest, SubmitSolutionRequest, SubmitSolutionResponse,
};
pub use types::{Player, PlayerId, PlayerSolution, PlayerStatus, SolutionAttempt, ROOM_CODE_LENGTH};
