mod api;
mod enums;

pub use api::*;
pub use enums::*;
