pub mod channels;
pub mod config;
pub mod device;
pub mod metrics;
pub mod session;
pub mod source;
pub mod streamer;
pub mod sync;

pub use channels::*;
pub use config::*;
pub use device::*;
pub use metrics::*;
pub use session::*;
pub use source::*;
pub use streamer::*;
pub use sync::*;
