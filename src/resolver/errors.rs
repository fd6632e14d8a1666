//! Resolution error types and diagnostics.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error while resolving an import path to a package.
///
/// Errors are `Clone` so a failed dependency traversal can be cached on the
/// package and reported again without repeating the import work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("cannot find package `{import_path}`")]
    NotFound {
        import_path: String,
        src_dir: PathBuf,
        searched: Vec<PathBuf>,
    },

    #[error("invalid package `{import_path}`: {message}")]
    Invalid {
        import_path: String,
        dir: PathBuf,
        message: String,
    },

    #[error("error importing package `{import_path}` from `{importer}`")]
    Import {
        importer: String,
        import_path: String,
        #[source]
        source: Box<ResolveError>,
    },

    #[error("dependencies of `{import_path}` are unavailable after an earlier failure")]
    Unavailable { import_path: String },
}

impl ResolveError {
    /// Wrap an error with the package that imported the failing path.
    pub fn import(
        importer: impl Into<String>,
        import_path: impl Into<String>,
        source: ResolveError,
    ) -> Self {
        ResolveError::Import {
            importer: importer.into(),
            import_path: import_path.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, skipping import wrappers.
    pub fn root_cause(&self) -> &ResolveError {
        match self {
            ResolveError::Import { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// The chain of `(importer, import path)` edges leading to the root cause.
    pub fn import_chain(&self) -> Vec<(&str, &str)> {
        let mut chain = Vec::new();
        let mut current = self;
        while let ResolveError::Import {
            importer,
            import_path,
            source,
        } = current
        {
            chain.push((importer.as_str(), import_path.as_str()));
            current = &**source;
        }
        chain
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = match self.root_cause() {
            ResolveError::NotFound {
                import_path,
                src_dir,
                searched,
            } => {
                let mut diag = Diagnostic::error(format!("cannot find package `{}`", import_path))
                    .with_location(src_dir.clone());
                for path in searched {
                    diag = diag.with_context(format!("looked in {}", path.display()));
                }
                diag.with_suggestion(suggestions::CHECK_ROOTS)
            }

            ResolveError::Invalid {
                import_path,
                dir,
                message,
            } => Diagnostic::error(format!("invalid package `{}`: {}", import_path, message))
                .with_location(dir.clone())
                .with_suggestion(suggestions::CHECK_SOURCES),

            ResolveError::Unavailable { import_path } => Diagnostic::error(format!(
                "dependencies of `{}` are unavailable",
                import_path
            ))
            .with_suggestion(suggestions::RESTART),

            ResolveError::Import { .. } => Diagnostic::error(self.to_string()),
        };

        for (importer, import_path) in self.import_chain() {
            diag = diag.with_context(format!("`{}` imported by `{}`", import_path, importer));
        }

        diag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> ResolveError {
        ResolveError::NotFound {
            import_path: "example.com/d".to_string(),
            src_dir: PathBuf::from("/src/example.com/b"),
            searched: vec![PathBuf::from("/src/example.com/d")],
        }
    }

    #[test]
    fn test_import_chain() {
        let err = ResolveError::import(
            "example.com/a",
            "example.com/b",
            ResolveError::import("example.com/b", "example.com/d", not_found()),
        );

        assert_eq!(err.root_cause(), &not_found());
        assert_eq!(
            err.import_chain(),
            [
                ("example.com/a", "example.com/b"),
                ("example.com/b", "example.com/d")
            ]
        );
    }

    #[test]
    fn test_to_diagnostic() {
        let err = ResolveError::import("example.com/a", "example.com/d", not_found());
        let output = err.to_diagnostic().format(false);

        assert!(output.contains("cannot find package `example.com/d`"));
        assert!(output.contains("looked in /src/example.com/d"));
        assert!(output.contains("`example.com/d` imported by `example.com/a`"));
    }
}
