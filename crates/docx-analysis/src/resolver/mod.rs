//! Name resolution over the static project model.
//!
//! [`Resolver`] answers "what does this name mean in that module" without
//! importing anything. The discovery engine and the evaluator only see the
//! trait; [`crate::model::Project`] implements it.

mod project;

use crate::eval::Value;
use crate::model::{ClassDef, ClassRef, DottedName, FunctionDef, FunctionRef, ModuleId};

/// What a name resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Module(ModuleId),
    Function(FunctionRef),
    Class(ClassRef),
    /// A module-level `name = Cls(...)`.
    Instance(ClassRef),
    Constant(Value),
    /// An `Annotated[T, Depends(provider)]` alias; `module` is where the
    /// provider name resolves.
    Annotated {
        module: ModuleId,
        provider: Option<DottedName>,
    },
    /// Exists at run time, unknowable statically (third-party imports,
    /// call results that are not instances of known classes).
    Opaque,
}

pub trait Resolver {
    fn module_id(&self, name: &str) -> Option<ModuleId>;

    fn module_name(&self, module: ModuleId) -> &str;

    /// A module-level name: own symbols, then `from m import *`, then builtins.
    fn resolve_in_module(&self, module: ModuleId, name: &str) -> Option<Object>;

    /// `getattr(object, name)`.
    fn resolve_attribute(&self, object: &Object, name: &str) -> Option<Object>;

    fn function_def(&self, function: FunctionRef) -> &FunctionDef;

    fn class_def(&self, class: ClassRef) -> &ClassDef;

    /// Full source lines of a function, decorators included, dedented.
    fn function_source(&self, function: FunctionRef) -> String;

    /// Full source lines of a class, dedented.
    fn class_source(&self, class: ClassRef) -> String;

    /// The class followed by its resolvable ancestors, depth-first left to
    /// right without repeats; `builtins.object` always last.
    fn lineage(&self, class: ClassRef) -> Vec<ClassRef>;

    /// Names of the direct bases as resolved; a base that does not resolve
    /// to a class contributes its last written identifier.
    fn base_names(&self, class: ClassRef) -> Vec<String>;

    /// Name of the metaclass, `"type"` when none is declared.
    fn metaclass_name(&self, class: ClassRef) -> String;

    /// Resolve `a.b.c` from a module scope.
    fn resolve_path(&self, module: ModuleId, parts: &[String]) -> Option<Object> {
        let (head, rest) = parts.split_first()?;
        let mut object = self.resolve_in_module(module, head)?;
        for attr in rest {
            object = self.resolve_attribute(&object, attr)?;
        }
        Some(object)
    }

    /// First function named `name` along the lineage of `class`, starting
    /// `skip` classes in.
    fn find_method_from(&self, class: ClassRef, name: &str, skip: usize) -> Option<FunctionRef> {
        self.lineage(class).into_iter().skip(skip).find_map(|c| {
            match self.class_def(c).members.get(name) {
                Some(crate::model::Symbol::Function(index)) => Some(FunctionRef {
                    module: c.module,
                    index: *index,
                }),
                _ => None,
            }
        })
    }

    fn find_method(&self, class: ClassRef, name: &str) -> Option<FunctionRef> {
        self.find_method_from(class, name, 0)
    }

    /// A literal class attribute, looked up along the lineage the way
    /// `getattr(instance, name)` falls back to the class.
    fn class_constant(&self, class: ClassRef, name: &str) -> Option<Value> {
        match self.resolve_attribute(&Object::Class(class), name)? {
            Object::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// `package.module:Outer.Inner`
    fn qualified_name(&self, class: ClassRef) -> String {
        let def = self.class_def(class);
        format!("{}:{}", self.module_name(def.module), def.qualname)
    }

    /// Qualified names of the whole lineage.
    fn lineage_names(&self, class: ClassRef) -> Vec<String> {
        self.lineage(class)
            .into_iter()
            .map(|c| self.qualified_name(c))
            .collect()
    }
}
