pub mod api;
pub mod gateway;
pub mod handlers;
pub mod server;
pub mod state;

#[cfg(test)]
mod testing;

pub use api::ApiError;
pub use gateway::{dispatch, GatewayEvent, GatewayResponse};
pub use server::{router, run_server};
pub use state::AppState;
