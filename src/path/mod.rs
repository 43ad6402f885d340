mod paths;
mod walker;

pub use paths::*;
pub use walker::*;
