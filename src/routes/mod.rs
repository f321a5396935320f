/// Router Module Index
///
/// Routing is segregated by capability class, and the class gate is
/// applied at the router layer rather than inside individual handlers.
/// The ordering contract: authentication is always checked before any
/// role comparison, so an anonymous caller sees 401 regardless of which
/// role a route demands.

/// No gate. Read-only browsing plus registration and login.
pub mod public;

/// Any valid, unexpired token.
pub mod authenticated;

/// Token plus the `creative` role: portfolio publishing.
pub mod creative;

/// Token plus the `company` role: company profile, postings, hiring.
pub mod company;

/// Token plus the `admin` role: moderation and oversight.
pub mod admin;
