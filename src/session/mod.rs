//! Session controller and its async driver.

pub mod controller;
pub mod driver;

pub use controller::{Dashboard, Phase, SessionController};
pub use driver::Session;
