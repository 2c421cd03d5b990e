//! File-backed persistence for harvest: the incremental result store and the
//! credential store. Every durable write goes through [`json_file`], which
//! stages to a temporary file in the destination directory and renames it
//! into place.

pub mod credentials;
pub mod error;
pub mod json_file;
pub mod results;

pub use credentials::{
    CookieRecord, CookieSource, Credential, CredentialProbe, CredentialSet, CredentialStore,
    ProbeOutcome, BROWSER_SET_NAME,
};
pub use error::StoreError;
pub use results::{ProfileEntry, ResultStore};
