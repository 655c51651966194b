pub mod auth;
pub mod sockets;
pub mod state;
pub mod storage;

pub use state::AppState;
