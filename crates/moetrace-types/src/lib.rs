pub mod error;
pub mod event;
pub mod matrix;
pub mod session;
pub mod summary;
pub mod usage;

pub use error::{Error, Result};
pub use event::*;
pub use matrix::*;
pub use session::*;
pub use summary::*;
pub use usage::*;
