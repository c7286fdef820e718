//! Service layer between route handlers and the map engine.

pub mod map_service;

pub use map_service::MapQueryService;
