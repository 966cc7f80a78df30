pub mod chapter;
pub mod score;
pub mod workspace;

pub use chapter::*;
pub use score::*;
pub use workspace::*;
