// Pagos ILP - checkout backend over Interledger Open Payments

pub mod config;
pub mod middleware;
pub mod models;
pub mod open_payments;
pub mod payment;
pub mod routes;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
