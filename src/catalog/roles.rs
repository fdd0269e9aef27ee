//! Operator roles

/// Roles that ship with a catalog
pub const KNOWN_ROLES: &[&str] = &["FLIGHT", "CAPCOM", "FAO", "BME", "CPOO", "SCIENCE", "EVA"];

/// Role used when none is configured
pub const DEFAULT_ROLE: &str = "FLIGHT";

/// Canonical form of a role name (trimmed, upper case)
pub fn normalize_role(role: &str) -> String {
    role.trim().to_uppercase()
}

pub fn is_known_role(role: &str) -> bool {
    let role = normalize_role(role);
    KNOWN_ROLES.iter().any(|r| *r == role)
}
