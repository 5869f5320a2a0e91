//! HTTP service layer for the tempurl broker.
//!
//! - **Router**: maps method and path to a [`TempUrlRoute`]
//! - **Handler trait**: the boundary between HTTP and business logic
//! - **Service**: hyper `Service` that authenticates, routes and dispatches
//! - **Response helpers**: JSON success and `{"error": ...}` formatting

pub mod body;
pub mod dispatch;
pub mod response;
pub mod router;
pub mod service;

pub use body::TempUrlResponseBody;
pub use dispatch::TempUrlHandler;
pub use router::TempUrlRoute;
pub use service::{TempUrlHttpConfig, TempUrlHttpService};
