// Room domain: the authoritative room state, the repository that owns it,
// and the pure managers that mutate a locked room and return signals.

pub mod lifecycle;
pub mod players;
pub mod repository;
pub mod signal;
pub mod solutions;
pub mod state;

pub use repository::RoomRepository;
pub use signal::Signal;
pub use state::Room;
