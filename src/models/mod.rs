pub mod category;
pub mod goal;
pub mod summary;
pub mod task;
pub mod user;

pub use category::*;
pub use goal::*;
pub use summary::*;
pub use task::*;
pub use user::*;
