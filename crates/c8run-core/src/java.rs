//! Java runtime version checks run before anything is started.

use crate::error::LauncherError;

/// Version token of `java --version` output, e.g. `21.0.2` from
/// `openjdk 21.0.2 2024-01-16`
pub fn version_from_probe_output(output: &str) -> Result<&str, LauncherError> {
    output
        .split_whitespace()
        .nth(1)
        .ok_or(LauncherError::JavaMissing {
            required: crate::config::REQUIRED_JAVA_MAJOR,
        })
}

/// Major component of a version string (`21.0.2` -> 21, `1.8.0_292` -> 1)
pub fn major_version(version: &str) -> Result<u32, LauncherError> {
    let major = version.trim().split(['.', '+', '-']).next().unwrap_or_default();
    major
        .parse::<u32>()
        .map_err(|_| LauncherError::JavaVersionMalformed(version.trim().to_string()))
}

/// Fails unless `version` has a major version of at least `required`
pub fn ensure_supported(version: &str, required: u32) -> Result<u32, LauncherError> {
    let found = major_version(version)?;
    if found < required {
        return Err(LauncherError::JavaTooOld { found, required });
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_output() {
        let output = "openjdk 21.0.2 2024-01-16\nOpenJDK Runtime Environment (build 21.0.2+13-58)\n";
        assert_eq!(version_from_probe_output(output).unwrap(), "21.0.2");

        let output = "java 17.0.10 2024-01-16 LTS";
        assert_eq!(version_from_probe_output(output).unwrap(), "17.0.10");
    }

    #[test]
    fn test_empty_probe_output() {
        assert!(matches!(
            version_from_probe_output(""),
            Err(LauncherError::JavaMissing { required: 21 })
        ));
        assert!(matches!(
            version_from_probe_output("openjdk"),
            Err(LauncherError::JavaMissing { .. })
        ));
    }

    #[test]
    fn test_major_version() {
        assert_eq!(major_version("21.0.2").unwrap(), 21);
        assert_eq!(major_version("23").unwrap(), 23);
        assert_eq!(major_version("22-ea").unwrap(), 22);
        assert_eq!(major_version("1.8.0_292").unwrap(), 1);
        assert!(matches!(
            major_version("abc"),
            Err(LauncherError::JavaVersionMalformed(_))
        ));
        assert!(major_version("").is_err());
    }

    #[test]
    fn test_minimum_version() {
        assert_eq!(ensure_supported("21.0.2", 21).unwrap(), 21);
        assert_eq!(ensure_supported("23.0.1", 21).unwrap(), 23);
        assert!(matches!(
            ensure_supported("17.0.10", 21),
            Err(LauncherError::JavaTooOld {
                found: 17,
                required: 21
            })
        ));
    }
}
