//! Package naming rules.
//!
//! Catalog and manifest names are free-form; the names handed to the
//! packaging pipeline are not. These functions map one onto the other.

/// The distro whose packages keep their upstream names.
pub const BACKPORTS_DISTRO: &str = "backports";

/// Normalize a raw package name: underscores become dashes, lower case.
pub fn sanitize_package_name(name: &str) -> String {
    name.replace('_', "-").to_lowercase()
}

/// Build the distro-scoped package name (`ros-<distro>-<name>`).
///
/// The `backports` distro is not scoped and only gets sanitized.
pub fn debianize_package_name(distro: &str, name: &str) -> String {
    if distro == BACKPORTS_DISTRO {
        return sanitize_package_name(name);
    }
    sanitize_package_name(&format!("ros-{}-{}", distro, name))
}

/// Canonicalization applied to package identifiers.
pub trait NamingRule {
    /// Canonical name for a manifest's declared project name.
    fn package_name(&self, name: &str) -> String;

    /// Canonical name for a catalog key that has no manifest.
    fn placeholder_name(&self, name: &str) -> String {
        sanitize_package_name(name)
    }
}

/// Naming rule scoped to a single distro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistroNaming {
    distro: String,
}

impl DistroNaming {
    pub fn new(distro: impl Into<String>) -> Self {
        DistroNaming {
            distro: distro.into(),
        }
    }

    /// Whether this is the `backports` distro.
    pub fn is_backports(&self) -> bool {
        self.distro == BACKPORTS_DISTRO
    }
}

impl NamingRule for DistroNaming {
    fn package_name(&self, name: &str) -> String {
        debianize_package_name(&self.distro, name)
    }
}
