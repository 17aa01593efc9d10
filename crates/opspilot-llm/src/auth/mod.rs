//! Credential profiles, importers and resolution
//!
//! # Module Structure
//!
//! - `profile`: `AuthProfile` / `AuthProfiles` and selection rules
//! - `store`: JSON profile store with owner-only writes
//! - `native`: Codex CLI session importer
//! - `tolerant`: multi-shape third-party export importer
//! - `claims`: unverified token payload reading
//! - `resolve`: explicit → environment → store precedence

pub mod claims;
mod expiry;
pub mod native;
pub mod profile;
pub mod resolve;
pub mod store;
pub mod tolerant;

pub use claims::UnverifiedTokenClaims;
pub use native::NativeImporter;
pub use profile::{profile_id_for, AuthProfile, AuthProfiles};
pub use resolve::{CredentialResolver, CredentialSource, ResolvedCredential, PROFILE_ID_ENV};
pub use store::{default_store_path, ProfileStore};
pub use tolerant::{classify_export, ExportShape, LooseCredential, TolerantImporter};
