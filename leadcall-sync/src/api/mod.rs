//! HTTP API handlers for leadcall-sync

pub mod events;
pub mod health;
pub mod phone;
pub mod reconciler;

pub use events::event_stream;
pub use health::health_routes;
pub use phone::phone_routes;
pub use reconciler::reconciler_routes;
