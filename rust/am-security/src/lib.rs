//! Kerberos security configuration of application masters.
//!
//! Before an application master can authenticate against a secured cluster it has to know
//! whether security is required at all, which principal to log in with and where the keytab for
//! that principal is. [`security::SecurityConfiguration`] answers these questions and, if the
//! keytab is published on the shared filesystem, stages a private local copy of it.

pub mod config;
pub mod filesystem;
pub mod identity;
pub mod security;
