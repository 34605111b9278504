//! API middleware components

pub mod auth;
pub mod logging;

pub use auth::RequireIngestKey;
pub use logging::{
    logging_middleware, propagate_request_id_layer, set_request_id_layer, REQUEST_ID_HEADER,
};
