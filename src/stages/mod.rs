pub mod editorial;
pub mod fetch;
pub mod pipeline;

pub use editorial::*;
pub use fetch::*;
pub use pipeline::*;
