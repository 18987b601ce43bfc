pub mod server;

pub use server::{ServerState, app};
