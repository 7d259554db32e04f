//! # Domo Web Gateway Library
//!
//! HTTP façade over the hardware controller. The gateway owns no hardware
//! state — it translates the two routes into controller calls and renders
//! the returned snapshot as JSON:
//!
//! ```text
//! External clients ──HTTP──► domo_web ──calls──► Controller ──► GPIO lines
//! ```

#![deny(missing_docs)]

pub mod routes;
