pub mod browser;
pub mod fetch;
pub mod human;
pub mod narrate;
pub mod versions;

pub use browser::*;
pub use fetch::*;
pub use human::*;
pub use narrate::*;
pub use versions::*;
