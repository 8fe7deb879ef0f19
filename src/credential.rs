use anyhow::{Context, Result};
use std::path::Path;

/// API key for the hosted language model, read once at startup. A missing or
/// empty key file is not an error; it only disables the scene describer.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read key file: {}", path.display()))?;
        let key = raw.trim();
        if key.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self(key.to_string())))
    }

    pub fn reveal(&self) -> &str {
        &self.0
    }
}

// Keep the key out of debug output.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::Credential;
    use std::io::Write;

    #[test]
    fn missing_file_is_absent_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.txt");
        assert!(Credential::load(&path).unwrap().is_none());
    }

    #[test]
    fn key_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  sk-test-key  ").unwrap();
        let credential = Credential::load(file.path()).unwrap().unwrap();
        assert_eq!(credential.reveal(), "sk-test-key");
    }

    #[test]
    fn blank_file_is_absent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();
        assert!(Credential::load(file.path()).unwrap().is_none());
    }

    #[test]
    fn debug_does_not_leak_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sk-secret").unwrap();
        let credential = Credential::load(file.path()).unwrap().unwrap();
        assert!(!format!("{:?}", credential).contains("sk-secret"));
    }
}
