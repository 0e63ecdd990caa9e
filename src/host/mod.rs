//! Collaborators that sit outside the decoder: capture input, the transmit
//! register and log output.

pub mod capture;
pub mod logging;
pub mod port;
