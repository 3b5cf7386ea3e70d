//! The set of modules one analysis runs over.

use std::path::Path;

use docx_core::errors::ProjectError;
use rustc_hash::FxHashMap;

use super::builder::{build_module, ModuleSource};
use super::scan::collect_python_files;
use super::stubs::stub_modules;
use super::{ClassDef, ClassRef, FunctionDef, FunctionRef, ModuleId, PyModule};

/// All parsed modules: bundled stubs plus the project's own files.
#[derive(Debug)]
pub struct Project {
    modules: Vec<PyModule>,
    by_name: FxHashMap<String, ModuleId>,
}

impl Project {
    /// A project holding only the bundled stubs.
    pub fn new() -> Result<Self, ProjectError> {
        let mut project = Self {
            modules: Vec::new(),
            by_name: FxHashMap::default(),
        };
        for (name, is_package, source) in stub_modules() {
            project.insert(ModuleSource {
                name: name.to_string(),
                path: None,
                is_package,
                is_stub: true,
                source,
            })?;
        }
        Ok(project)
    }

    /// Parse every `.py` file under `root`.
    pub fn load(root: &Path, extra_ignore: &[String]) -> Result<Self, ProjectError> {
        let mut project = Self::new()?;
        let files = collect_python_files(root, extra_ignore)?;
        tracing::debug!(root = %root.display(), files = files.len(), "loading project");
        for file in files {
            let source = std::fs::read_to_string(&file.path).map_err(|e| ProjectError::Io {
                path: file.path.clone(),
                message: e.to_string(),
            })?;
            project.insert(ModuleSource {
                name: file.module,
                path: Some(file.path),
                is_package: file.is_package,
                is_stub: false,
                source,
            })?;
        }
        Ok(project)
    }

    /// Build a project from in-memory `(module name, source)` pairs.
    /// A name ending in `.__init__` marks a package.
    pub fn from_sources<'a, I>(sources: I) -> Result<Self, ProjectError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut project = Self::new()?;
        for (name, source) in sources {
            project.add_module(name, source)?;
        }
        Ok(project)
    }

    pub fn add_module(&mut self, name: &str, source: &str) -> Result<ModuleId, ProjectError> {
        let (name, is_package) = match name.strip_suffix(".__init__") {
            Some(package) => (package, true),
            None => (name, false),
        };
        self.insert(ModuleSource {
            name: name.to_string(),
            path: None,
            is_package,
            is_stub: false,
            source: source.to_string(),
        })
    }

    fn insert(&mut self, input: ModuleSource) -> Result<ModuleId, ProjectError> {
        let existing = self.by_name.get(&input.name).copied();
        if let Some(id) = existing {
            if !self.modules[id.0 as usize].is_stub {
                return Err(ProjectError::DuplicateModule { name: input.name });
            }
        }
        let id = existing.unwrap_or(ModuleId(self.modules.len() as u32));
        let name = input.name.clone();
        let module = build_module(id, input).map_err(|source| ProjectError::Parse {
            module: name.clone(),
            source,
        })?;
        if !module.is_stub {
            if let Some(first) = module.syntax_errors.first() {
                tracing::warn!(
                    module = %name,
                    line = first.start.line + 1,
                    column = first.start.column + 1,
                    count = module.syntax_errors.len(),
                    "syntax errors; definitions in those regions are skipped"
                );
            }
        }
        match existing {
            Some(id) => {
                tracing::debug!(module = %name, "project module replaces bundled stub");
                self.modules[id.0 as usize] = module;
            }
            None => {
                self.modules.push(module);
                self.by_name.insert(name, id);
            }
        }
        Ok(id)
    }

    pub fn module(&self, id: ModuleId) -> &PyModule {
        &self.modules[id.0 as usize]
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &PyModule)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId(i as u32), m))
    }

    pub fn module_id(&self, name: &str) -> Option<ModuleId> {
        self.by_name.get(name).copied()
    }

    pub fn function(&self, f: FunctionRef) -> &FunctionDef {
        &self.module(f.module).functions[f.index as usize]
    }

    pub fn class(&self, c: ClassRef) -> &ClassDef {
        &self.module(c.module).classes[c.index as usize]
    }

    /// Project modules in a stable order: stubs excluded, sorted by name.
    pub fn user_modules(&self) -> Vec<ModuleId> {
        let mut ids: Vec<ModuleId> = self
            .modules()
            .filter(|(_, m)| !m.is_stub)
            .map(|(id, _)| id)
            .collect();
        ids.sort_by(|a, b| self.module(*a).name.cmp(&self.module(*b).name));
        ids
    }
}
