//! Fatal planning errors.
//!
//! Everything a user can fix in the query is a [`crate::diag::Problem`]; a
//! `PlanningError` means the planner was misconfigured or handed an AST it
//! cannot interpret, and no plan is produced.

use miette::Diagnostic;
use smol_str::SmolStr;
use std::fmt;

/// An error that aborts planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanningError {
    /// The AST violates a structural invariant the parser guarantees.
    MalformedAst { reason: SmolStr },
    /// A catalog configuration names a connector no provider implements.
    UnknownProvider { catalog: SmolStr, connector: SmolStr },
    /// Two catalogs were registered under the same name.
    DuplicateCatalog { catalog: SmolStr },
    /// The session's current catalog is not registered.
    UnknownCatalog { catalog: SmolStr },
    /// A catalog provider rejected its configuration.
    InvalidCatalogConfig { catalog: SmolStr, reason: SmolStr },
}

impl PlanningError {
    /// Creates a malformed-AST error.
    pub fn malformed(reason: impl Into<SmolStr>) -> Self {
        PlanningError::MalformedAst {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for PlanningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanningError::MalformedAst { reason } => write!(f, "Malformed AST: {}", reason),
            PlanningError::UnknownProvider { catalog, connector } => write!(
                f,
                "No catalog provider named '{}' for catalog '{}'",
                connector, catalog
            ),
            PlanningError::DuplicateCatalog { catalog } => {
                write!(f, "Catalog '{}' is registered more than once", catalog)
            }
            PlanningError::UnknownCatalog { catalog } => {
                write!(f, "Current catalog '{}' is not registered", catalog)
            }
            PlanningError::InvalidCatalogConfig { catalog, reason } => {
                write!(f, "Invalid configuration for catalog '{}': {}", catalog, reason)
            }
        }
    }
}

impl std::error::Error for PlanningError {}

impl Diagnostic for PlanningError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self {
            PlanningError::MalformedAst { .. } => "planner::malformed_ast",
            PlanningError::UnknownProvider { .. } => "planner::unknown_provider",
            PlanningError::DuplicateCatalog { .. } => "planner::duplicate_catalog",
            PlanningError::UnknownCatalog { .. } => "planner::unknown_catalog",
            PlanningError::InvalidCatalogConfig { .. } => "planner::invalid_catalog_config",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            PlanningError::UnknownProvider { .. } => Some(Box::new(
                "Register a CatalogProvider whose name matches the connector",
            )),
            PlanningError::UnknownCatalog { .. } => {
                Some(Box::new("Set Session::catalog to a registered catalog name"))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = PlanningError::UnknownProvider {
            catalog: "main".into(),
            connector: "s3".into(),
        };
        assert_eq!(
            err.to_string(),
            "No catalog provider named 's3' for catalog 'main'"
        );
        assert_eq!(
            PlanningError::malformed("empty path").to_string(),
            "Malformed AST: empty path"
        );
    }

    #[test]
    fn diagnostic_codes() {
        let err = PlanningError::DuplicateCatalog {
            catalog: "main".into(),
        };
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("planner::duplicate_catalog"));
        assert!(err.help().is_none());
    }
}
