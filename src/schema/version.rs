//! Schema version gate policy.
//!
//! A version string is accepted iff it reads `0.<minor>[.<rest>]` with
//! minor between 1 and 3. The check runs once per compiled schema, on the
//! root node only; nested nodes inherit the root version and are never
//! re-validated.

/// Version stamped on schemas that declare none.
pub const ENGINE_VERSION: &str = "0.3.1";

/// Whether `version` falls in the engine's accepted range.
pub fn is_supported(version: &str) -> bool {
    let mut parts = version.split('.');
    let major = parts.next();
    let minor = parts.next().and_then(|m| m.parse::<u64>().ok());
    matches!((major, minor), (Some("0"), Some(1..=3)))
}
