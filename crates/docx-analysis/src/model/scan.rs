//! Project file discovery: `.py` files under a root, honouring ignore rules.

use std::fs;
use std::path::{Path, PathBuf};

use docx_core::errors::ProjectError;
use ignore::gitignore::{Gitignore, GitignoreBuilder};

/// Directories never worth scanning for application modules.
pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
    "__pycache__",
    ".venv",
    "venv",
    "env",
    ".env",
    "virtualenv",
    ".virtualenv",
    "site-packages",
    ".eggs",
    "*.egg-info",
    ".tox",
    ".nox",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    "build",
    "dist",
    "node_modules",
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
];

/// Compiled ignore rules: defaults, extra patterns, then the project's
/// `.docxignore` and `.gitignore`.
pub struct IgnorePatterns {
    gitignore: Gitignore,
}

impl IgnorePatterns {
    pub fn new(root: &Path, extra_patterns: &[String]) -> Result<Self, ProjectError> {
        let mut builder = GitignoreBuilder::new(root);
        let invalid = |e: ignore::Error| ProjectError::Walk {
            root: root.to_path_buf(),
            message: e.to_string(),
        };

        for pattern in DEFAULT_IGNORE_DIRS {
            builder.add_line(None, pattern).map_err(invalid)?;
        }
        for pattern in extra_patterns {
            builder.add_line(None, pattern).map_err(invalid)?;
        }
        for file in [".docxignore", ".gitignore"] {
            let path = root.join(file);
            if path.exists() {
                if let Some(e) = builder.add(&path) {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable ignore file");
                }
            }
        }

        Ok(Self {
            gitignore: builder.build().map_err(invalid)?,
        })
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.gitignore.matched(path, is_dir).is_ignore()
    }
}

/// One discovered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub module: String,
    pub is_package: bool,
}

/// Collect every `.py` file under `root`, sorted by module name.
pub fn collect_python_files(
    root: &Path,
    extra_ignore: &[String],
) -> Result<Vec<SourceFile>, ProjectError> {
    let ignores = IgnorePatterns::new(root, extra_ignore)?;
    let mut files = Vec::new();
    walk_dir(root, root, &ignores, &mut files)?;
    files.sort_by(|a, b| a.module.cmp(&b.module));
    Ok(files)
}

fn walk_dir(
    root: &Path,
    dir: &Path,
    ignores: &IgnorePatterns,
    files: &mut Vec<SourceFile>,
) -> Result<(), ProjectError> {
    let entries = fs::read_dir(dir).map_err(|e| ProjectError::Io {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(&path);
        if path.is_dir() {
            if !ignores.is_ignored(relative, true) {
                walk_dir(root, &path, ignores, files)?;
            }
        } else if path.extension().is_some_and(|ext| ext == "py")
            && !ignores.is_ignored(relative, false)
        {
            if let Some((module, is_package)) = module_name(relative) {
                files.push(SourceFile {
                    path,
                    module,
                    is_package,
                });
            } else {
                tracing::debug!(path = %relative.display(), "not an importable module path");
            }
        }
    }
    Ok(())
}

/// `pkg/sub/mod.py` -> `pkg.sub.mod`; `pkg/__init__.py` -> `pkg` (a package).
pub fn module_name(relative: &Path) -> Option<(String, bool)> {
    let mut parts: Vec<String> = relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_str().map(str::to_string))
        .collect::<Option<_>>()?;
    let is_package = parts.last().is_some_and(|last| last == "__init__");
    if is_package {
        parts.pop();
    }
    let valid = !parts.is_empty()
        && parts.iter().all(|p| {
            !p.is_empty()
                && p.chars().all(|c| c.is_alphanumeric() || c == '_')
                && !p.starts_with(|c: char| c.is_ascii_digit())
        });
    valid.then(|| (parts.join("."), is_package))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_names_from_paths() {
        assert_eq!(
            module_name(Path::new("app/api/routes.py")),
            Some(("app.api.routes".to_string(), false))
        );
        assert_eq!(
            module_name(Path::new("app/__init__.py")),
            Some(("app".to_string(), true))
        );
        assert_eq!(module_name(Path::new("__init__.py")), None);
        assert_eq!(module_name(Path::new("my-scripts/run.py")), None);
    }

    #[test]
    fn default_ignores_skip_virtualenvs() {
        let patterns = IgnorePatterns::new(Path::new("/project"), &[]).unwrap();
        assert!(patterns.is_ignored(Path::new(".venv"), true));
        assert!(patterns.is_ignored(Path::new("src/__pycache__"), true));
        assert!(!patterns.is_ignored(Path::new("app/main.py"), false));
    }
}
