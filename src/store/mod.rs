pub mod cache;
pub mod events;
pub mod goals;
pub mod tasks;

pub use cache::*;
pub use events::*;
pub use goals::*;
pub use tasks::*;
