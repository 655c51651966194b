pub mod messages;

pub use messages::TableChanged;
