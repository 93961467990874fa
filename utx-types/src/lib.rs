pub mod error;
pub mod metadata;
pub mod sample_format;
pub mod sync;
pub mod time;

pub use error::*;
pub use metadata::*;
pub use sample_format::*;
pub use sync::*;
pub use time::*;
