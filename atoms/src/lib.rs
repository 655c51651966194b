pub mod notifications;
pub mod proofs;
pub mod tasks;
pub mod users;
