mod client;
mod error;
mod transport;

pub use client::{ApiClient, PageRequest};
pub use error::{ApiError, ApiResult};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
