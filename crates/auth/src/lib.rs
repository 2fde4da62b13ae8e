//! `assetdesk-auth`: authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how to
//! check credentials, mint/verify tokens and decide whether a principal holds a
//! permission, nothing more.

pub mod authorize;
pub mod claims;
pub mod credentials;
pub mod jwt;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, CommandAuthorization, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use credentials::{Account, CredentialDirectory};
pub use jwt::{Hs256Jwt, JwtError, JwtValidator, TokenIssuer};
pub use permissions::{Permission, permissions_for_role};
pub use principal::Principal;
pub use roles::Role;
