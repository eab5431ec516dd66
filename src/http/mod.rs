//! Request and response plumbing between the client and the application
//! under test.

mod context;
mod dispatcher;
mod multipart;
mod response;

pub use context::{RequestContext, ServerParams, UploadedFile};
pub use dispatcher::{ActixDispatcher, RequestDispatcher};
pub use response::{CapturedResponse, REDIRECT_STATUSES};
