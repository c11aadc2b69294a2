// ABOUTME: Diagnostics accumulator for non-fatal warnings during state compilation.
// ABOUTME: Collects warnings that shouldn't fail a compile but should be shown to users.

/// Collects non-fatal warnings during compile operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during compilation.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// A variable alias whose target was never bound.
    pub fn unbound_alias(alias: &str, target: &str) -> Self {
        Self {
            kind: WarningKind::UnboundAlias,
            message: format!("variable alias '{alias}' refers to '{target}', which is not bound"),
        }
    }

    /// A calculated value that no longer matches a declared variable.
    pub fn undeclared_variable(deployment: &str, variable: &str) -> Self {
        Self {
            kind: WarningKind::UndeclaredVariable,
            message: format!(
                "deployment '{deployment}' has a calculated value for '{variable}', which its release does not declare"
            ),
        }
    }
}

/// Categories of warnings that can occur during compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Alias in the variable context points at nothing.
    UnboundAlias,
    /// Stale calculated input or output left out of the compiled environment.
    UndeclaredVariable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::unbound_alias("cluster", "kubernetes"));
        diag.warn(Warning::undeclared_variable("webapp", "old_port"));

        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().len(), 2);
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        let alias = Warning::unbound_alias("a", "b");
        assert_eq!(alias.kind, WarningKind::UnboundAlias);
        assert!(alias.message.contains("'b'"));

        let stale = Warning::undeclared_variable("d", "v");
        assert_eq!(stale.kind, WarningKind::UndeclaredVariable);
    }
}
