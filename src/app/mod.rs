// Application layer: HTTP surface and process wiring.

pub mod cors;
pub mod routes;
pub mod server;

pub use routes::{
    api_routes, build_router, with_middleware, AppState, HealthStatus, NotFoundBody, ServiceInfo,
};
pub use server::start_server;
