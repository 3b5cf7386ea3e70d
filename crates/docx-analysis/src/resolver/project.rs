//! [`Resolver`] over a loaded [`Project`].

use rustc_hash::FxHashSet;

use super::{Object, Resolver};
use crate::model::{
    ClassDef, ClassRef, FunctionDef, FunctionRef, Import, ModuleId, Project, Symbol,
};
use crate::parsers::source::dedent;

/// Alias chains and star-import cycles stop here.
const MAX_DEPTH: usize = 32;

impl Project {
    fn lookup(&self, module: ModuleId, name: &str, depth: usize) -> Option<Object> {
        if depth > MAX_DEPTH {
            tracing::trace!(module = %self.module(module).name, name, "resolution depth exceeded");
            return None;
        }
        let py = self.module(module);
        if let Some(symbol) = py.symbols.get(name) {
            return self.symbol_object(module, None, symbol, depth);
        }
        for star in &py.star_imports {
            if name.starts_with('_') {
                break;
            }
            let Some(star_id) = self.module_id(star) else {
                continue;
            };
            if let Some(object) = self.lookup(star_id, name, depth + 1) {
                return Some(object);
            }
        }
        if py.name != "builtins" {
            let builtins = self.module_id("builtins")?;
            if let Some(symbol) = self.module(builtins).symbols.get(name) {
                return self.symbol_object(builtins, None, symbol, depth + 1);
            }
        }
        None
    }

    /// Turn a bound symbol into an object. `class` is the class whose body
    /// holds the symbol, when it is a class member.
    fn symbol_object(
        &self,
        module: ModuleId,
        class: Option<ClassRef>,
        symbol: &Symbol,
        depth: usize,
    ) -> Option<Object> {
        let object = match symbol {
            Symbol::Function(index) => Object::Function(FunctionRef {
                module,
                index: *index,
            }),
            Symbol::Class(index) => Object::Class(ClassRef {
                module,
                index: *index,
            }),
            Symbol::Constant(value) => Object::Constant(value.clone()),
            Symbol::Import(import) => return self.import_object(import, depth + 1),
            Symbol::Alias(parts) => {
                let (head, rest) = parts.split_first()?;
                // Inside a class body, earlier members shadow module names.
                let mut object = match class
                    .and_then(|c| self.class(c).members.get(head.as_str()))
                    .filter(|s| !matches!(s, Symbol::Alias(p) if p == parts))
                {
                    Some(member) => self.symbol_object(module, class, member, depth + 1)?,
                    None => self.lookup(module, head, depth + 1)?,
                };
                for attr in rest {
                    object = self.attribute(&object, attr, depth + 1)?;
                }
                object
            }
            Symbol::Call(call) => match self.resolve_callee(module, &call.callee, depth + 1) {
                Some(Object::Class(c)) => Object::Instance(c),
                _ => Object::Opaque,
            },
            Symbol::Annotated { provider } => Object::Annotated {
                module,
                provider: provider.clone(),
            },
            Symbol::Opaque => Object::Opaque,
        };
        Some(object)
    }

    fn resolve_callee(&self, module: ModuleId, callee: &[String], depth: usize) -> Option<Object> {
        let (head, rest) = callee.split_first()?;
        let mut object = self.lookup(module, head, depth)?;
        for attr in rest {
            object = self.attribute(&object, attr, depth)?;
        }
        Some(object)
    }

    fn import_object(&self, import: &Import, depth: usize) -> Option<Object> {
        match import {
            Import::Module(name) => Some(match self.module_id(name) {
                Some(id) => Object::Module(id),
                None => Object::Opaque,
            }),
            Import::Member { module, name } => {
                if let Some(sub) = self.module_id(&format!("{module}.{name}")) {
                    return Some(Object::Module(sub));
                }
                match self.module_id(module) {
                    Some(id) => self.lookup(id, name, depth),
                    None => Some(Object::Opaque),
                }
            }
        }
    }

    fn attribute(&self, object: &Object, name: &str, depth: usize) -> Option<Object> {
        if depth > MAX_DEPTH {
            return None;
        }
        match object {
            Object::Module(id) => self.lookup_own(*id, name, depth).or_else(|| {
                let full = format!("{}.{}", self.module(*id).name, name);
                self.module_id(&full).map(Object::Module)
            }),
            Object::Class(c) | Object::Instance(c) => self.lineage(*c).into_iter().find_map(|owner| {
                let member = self.class(owner).members.get(name)?;
                self.symbol_object(owner.module, Some(owner), member, depth + 1)
            }),
            Object::Opaque => Some(Object::Opaque),
            Object::Function(_) | Object::Constant(_) | Object::Annotated { .. } => None,
        }
    }

    /// Module attribute: own symbols and star imports, no builtins.
    fn lookup_own(&self, module: ModuleId, name: &str, depth: usize) -> Option<Object> {
        let py = self.module(module);
        if let Some(symbol) = py.symbols.get(name) {
            return self.symbol_object(module, None, symbol, depth);
        }
        if name.starts_with('_') {
            return None;
        }
        py.star_imports
            .iter()
            .filter_map(|star| self.module_id(star))
            .find_map(|star| self.lookup_own(star, name, depth + 1))
    }

    fn lineage_into(&self, class: ClassRef, out: &mut Vec<ClassRef>, seen: &mut FxHashSet<ClassRef>, depth: usize) {
        if depth > MAX_DEPTH || !seen.insert(class) {
            return;
        }
        out.push(class);
        let def = self.class(class);
        for base in &def.bases {
            if let Some(Object::Class(base)) = self.resolve_callee(def.module, base, 0) {
                self.lineage_into(base, out, seen, depth + 1);
            }
        }
    }

    fn builtin_class(&self, name: &str) -> Option<ClassRef> {
        let builtins = self.module_id("builtins")?;
        match self.module(builtins).symbols.get(name) {
            Some(Symbol::Class(index)) => Some(ClassRef {
                module: builtins,
                index: *index,
            }),
            _ => None,
        }
    }
}

impl Resolver for Project {
    fn module_id(&self, name: &str) -> Option<ModuleId> {
        Project::module_id(self, name)
    }

    fn module_name(&self, module: ModuleId) -> &str {
        &self.module(module).name
    }

    fn resolve_in_module(&self, module: ModuleId, name: &str) -> Option<Object> {
        let object = self.lookup(module, name, 0);
        if object.is_none() {
            tracing::trace!(module = %self.module(module).name, name, "name not found");
        }
        object
    }

    fn resolve_attribute(&self, object: &Object, name: &str) -> Option<Object> {
        self.attribute(object, name, 0)
    }

    fn function_def(&self, function: FunctionRef) -> &FunctionDef {
        self.function(function)
    }

    fn class_def(&self, class: ClassRef) -> &ClassDef {
        self.class(class)
    }

    fn function_source(&self, function: FunctionRef) -> String {
        let def = self.function(function);
        let source = &self.module(def.module).source;
        dedent(source.get(def.span.0..def.span.1).unwrap_or_default())
    }

    fn class_source(&self, class: ClassRef) -> String {
        let def = self.class(class);
        let source = &self.module(def.module).source;
        dedent(source.get(def.span.0..def.span.1).unwrap_or_default())
    }

    fn lineage(&self, class: ClassRef) -> Vec<ClassRef> {
        let object = self.builtin_class("object");
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        if let Some(object) = object {
            // Keeps `object` out of the walk so it can go last.
            seen.insert(object);
        }
        self.lineage_into(class, &mut out, &mut seen, 0);
        if let Some(object) = object {
            out.push(object);
        }
        out
    }

    fn base_names(&self, class: ClassRef) -> Vec<String> {
        let def = self.class(class);
        let names: Vec<String> = def
            .bases
            .iter()
            .filter_map(|base| match self.resolve_callee(def.module, base, 0) {
                Some(Object::Class(c)) => Some(self.class(c).name.clone()),
                _ => base.last().cloned(),
            })
            .collect();
        if names.is_empty() && self.builtin_class("object") != Some(class) {
            return vec!["object".to_string()];
        }
        names
    }

    fn metaclass_name(&self, class: ClassRef) -> String {
        // Metaclasses are inherited.
        let declared = self.lineage(class).into_iter().find_map(|c| {
            let def = self.class(c);
            def.metaclass.as_ref().map(|meta| (def.module, meta))
        });
        match declared {
            Some((module, meta)) => match self.resolve_callee(module, meta, 0) {
                Some(Object::Class(c)) => self.class(c).name.clone(),
                _ => meta.last().cloned().unwrap_or_else(|| "type".to_string()),
            },
            None => "type".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project::from_sources([
            (
                "app.errors",
                "from fastapi import HTTPException\n\
                 class AppError(HTTPException):\n    pass\n\
                 class App:\n    class NotFound(AppError):\n        pass\n",
            ),
            (
                "app.main",
                "from fastapi import status, HTTPException as E\n\
                 from app import errors\n\
                 from app.errors import App\n\
                 import app.errors as errs\n\
                 Missing = App.NotFound\n\
                 CODE = 404\n",
            ),
        ])
        .unwrap()
    }

    #[test]
    fn resolves_imports_aliases_and_constants() {
        let p = project();
        let main = p.module_id("app.main").unwrap();
        let exc = p.resolve_in_module(main, "E").unwrap();
        let Object::Class(exc) = exc else {
            panic!("expected class");
        };
        assert_eq!(p.qualified_name(exc), "fastapi.exceptions:HTTPException");
        assert_eq!(
            p.resolve_in_module(main, "CODE"),
            Some(Object::Constant(crate::eval::Value::Int(404)))
        );
        let status = p.resolve_in_module(main, "status").unwrap();
        assert_eq!(
            p.resolve_attribute(&status, "HTTP_404_NOT_FOUND"),
            Some(Object::Constant(crate::eval::Value::Int(404)))
        );
        assert!(matches!(p.resolve_in_module(main, "errs"), Some(Object::Module(_))));
        assert!(matches!(p.resolve_in_module(main, "errors"), Some(Object::Module(_))));
        assert!(p.resolve_in_module(main, "nothing").is_none());
    }

    #[test]
    fn lineage_ends_with_object() {
        let p = project();
        let main = p.module_id("app.main").unwrap();
        let Some(Object::Class(missing)) = p.resolve_in_module(main, "Missing") else {
            panic!("expected class");
        };
        let names = p.lineage_names(missing);
        assert_eq!(
            names,
            vec![
                "app.errors:App.NotFound",
                "app.errors:AppError",
                "fastapi.exceptions:HTTPException",
                "starlette.exceptions:HTTPException",
                "builtins:Exception",
                "builtins:BaseException",
                "builtins:object",
            ]
        );
        assert_eq!(p.base_names(missing), vec!["AppError"]);
        assert_eq!(p.metaclass_name(missing), "type");
        assert!(p.find_method(missing, "__init__").is_some());
    }
}
