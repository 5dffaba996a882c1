pub mod backend;
pub mod http;
pub mod session;

pub use backend::*;
pub use http::*;
pub use session::*;
