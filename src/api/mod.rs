//! The API layer, containing web handlers and routing.

pub mod admin;
pub mod handlers;
pub mod router;

pub use admin::{
    AddRegistryRequest, ListRegistryResponse, RegistryResponse, add_registry_handler,
    list_registry_handler, remove_registry_handler,
};
pub use handlers::ApiDoc;
pub use router::create_router;
