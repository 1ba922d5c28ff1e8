//! Endpoint glue. Each method is a single `build_object` call with a fixed
//! path template; identifiers are escaped with [`escape_id`](crate::http::escape_id).

pub mod categories;
pub mod subscriptions;
