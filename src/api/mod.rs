//! HTTP surface: routes under `/api`, bearer authentication and the
//! request extractors that turn rejections into the response envelope.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
