//! Governor stats scan: session state, validation and the controller that
//! drives the device through the rankings list.

pub mod controller;
pub mod session;
pub mod validator;

#[cfg(test)]
mod testing;

pub use controller::{Collaborators, ScanController, ThreadSleeper};
pub use session::{ScanMode, ScanSession};
