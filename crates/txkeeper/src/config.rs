use serde::Deserialize;

/// Construction-time settings for a [`Transaction`](crate::Transaction).
///
/// Can be embedded in a host application's own configuration file:
///
/// ```toml
/// [transaction]
/// check-rollback = false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TransactionConfig {
    check_rollback: bool,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            check_rollback: true,
        }
    }
}

impl TransactionConfig {
    /// Whether commit is refused while no rollback actions are registered.
    #[must_use]
    pub fn check_rollback(&self) -> bool {
        self.check_rollback
    }

    /// Set whether commit is refused while no rollback actions are registered.
    #[must_use]
    pub fn with_check_rollback(mut self, check_rollback: bool) -> Self {
        self.check_rollback = check_rollback;
        self
    }

    /// Allow commit to run without any rollback actions registered.
    #[must_use]
    pub fn without_rollback_check(self) -> Self {
        self.with_check_rollback(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_checks_rollback() {
        assert!(TransactionConfig::default().check_rollback());
    }

    #[test]
    fn without_rollback_check_disables_check() {
        let config = TransactionConfig::default().without_rollback_check();
        assert!(!config.check_rollback());
    }

    #[test]
    fn later_setting_overrides_earlier() {
        let config = TransactionConfig::default()
            .without_rollback_check()
            .with_check_rollback(true);
        assert!(config.check_rollback());
    }

    #[test]
    fn deserializes_kebab_case_key() -> anyhow::Result<()> {
        let config: TransactionConfig = serde_json::from_str(r#"{"check-rollback": false}"#)?;
        assert!(!config.check_rollback());
        Ok(())
    }

    #[test]
    fn missing_key_uses_default() -> anyhow::Result<()> {
        let config: TransactionConfig = serde_json::from_str("{}")?;
        assert_eq!(config, TransactionConfig::default());
        Ok(())
    }
}
