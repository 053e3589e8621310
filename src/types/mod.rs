//! Response types shared by every handler.

mod response;

pub use response::{ApiResponse, Created, NoContent, ResponseStatus};
