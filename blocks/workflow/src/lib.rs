pub mod proofs;
pub mod tasks;
