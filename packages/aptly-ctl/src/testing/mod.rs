//! Test support: an in-process fake of the Aptly REST API.
//!
//! Only the endpoints the clients call are served, with just enough state to
//! check what the clients sent.

mod server;

pub use server::*;
