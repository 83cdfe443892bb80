//! End-to-end dog identification and registration.
//!
//! # Identification
//!
//! ```text
//! photo -> Extractor (blocking pool) -> store.list_all -> Matcher -> Report
//! ```
//!
//! [`Identifier`] short-circuits with [`Report::ExtractionFailed`] when the
//! photo cannot be turned into an embedding, and returns [`Report::NoData`]
//! for an empty store without computing a single distance.
//!
//! # Registration
//!
//! A [`RegistrationSession`] owns one capture flow and the dog's details
//! until it is handed to [`Registrar::submit`], which extracts the nose
//! photo's embedding and writes the profile exactly once. Abandoning the
//! session drops any in-flight extraction result unwritten.

mod error;
mod identifier;
mod registrar;
mod report;
mod session;

pub use error::IdentifyError;
pub use identifier::Identifier;
pub use registrar::{Registrar, Submission};
pub use report::Report;
pub use session::RegistrationSession;
