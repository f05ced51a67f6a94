//! Class name relocation for the shaded distribution.
//!
//! The shaded build moves the booter packages under a `shadefire` segment so
//! they cannot clash with the copy of the framework being tested.

use crate::error::{ForkError, Result};

const RELOCATION_BASE: &str = "org.apache.maven.surefire.";
const PACKAGE_DELIMITER: &str = "shadefire";

/// Relocate a fully qualified class name into the shaded package space.
pub fn relocate(class_name: &str) -> Result<String> {
    if class_name.contains(PACKAGE_DELIMITER) {
        return Ok(class_name.to_string());
    }
    let Some(rest) = class_name.strip_prefix(RELOCATION_BASE) else {
        return Err(ForkError::Configuration(format!(
            "'{class_name}' should start with '{RELOCATION_BASE}'"
        )));
    };
    Ok(format!("{RELOCATION_BASE}{PACKAGE_DELIMITER}.{rest}"))
}

/// Relocate only when running shaded.
pub fn relocate_if(class_name: &str, shaded: bool) -> Result<String> {
    if shaded {
        relocate(class_name)
    } else {
        Ok(class_name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relocates_booter() {
        assert_eq!(
            relocate("org.apache.maven.surefire.booter.ForkedBooter").unwrap(),
            "org.apache.maven.surefire.shadefire.booter.ForkedBooter"
        );
    }

    #[test]
    fn test_already_relocated_is_unchanged() {
        let name = "org.apache.maven.surefire.shadefire.booter.ForkedBooter";
        assert_eq!(relocate(name).unwrap(), name);
    }

    #[test]
    fn test_foreign_package_is_rejected() {
        let err = relocate("com.example.Main").unwrap_err();
        assert!(matches!(err, ForkError::Configuration(_)));
        assert!(err.to_string().contains("com.example.Main"));
    }

    #[test]
    fn test_relocate_if_disabled_passes_through() {
        assert_eq!(relocate_if("com.example.Main", false).unwrap(), "com.example.Main");
    }
}
