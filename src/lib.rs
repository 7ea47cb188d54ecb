pub mod codec;
pub mod compress;
pub mod config;
pub mod error;
pub mod flatten;
pub mod font;
pub mod icon;
pub mod recreate;

pub use error::IconError;
pub use icon::{ColorMode, IconImage, IconReport};
