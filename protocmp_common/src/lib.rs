pub mod error;
pub mod options;
pub mod path;
pub mod types;

pub use error::*;
pub use options::*;
pub use path::*;
pub use types::*;
