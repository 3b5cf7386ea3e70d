//! Predicates over resolved objects.

use crate::resolver::{Object, Resolver};

pub fn is_function_or_coroutine(object: &Object) -> bool {
    matches!(object, Object::Function(_))
}

/// Name-based class matching: for a class its own name, its direct base
/// names and its (possibly inherited) metaclass name; for anything else the name of its type.
pub fn class_matches_any<R, S>(resolver: &R, object: &Object, names: &[S]) -> bool
where
    R: Resolver + ?Sized,
    S: AsRef<str>,
{
    let candidates: Vec<String> = match object {
        Object::Class(class) => {
            let mut candidates = vec![resolver.class_def(*class).name.clone()];
            candidates.extend(resolver.base_names(*class));
            candidates.push(resolver.metaclass_name(*class));
            candidates
        }
        Object::Instance(class) => vec![resolver.class_def(*class).name.clone()],
        Object::Function(_) => vec!["function".to_string()],
        Object::Module(_) => vec!["module".to_string()],
        Object::Constant(value) => vec![value.type_name().to_string()],
        Object::Annotated { .. } | Object::Opaque => return false,
    };
    candidates
        .iter()
        .any(|candidate| names.iter().any(|n| n.as_ref() == candidate))
}

/// An instance whose class defines `__call__`. Classes never qualify.
pub fn is_callable_instance<R: Resolver + ?Sized>(resolver: &R, object: &Object) -> bool {
    match object {
        Object::Instance(class) => resolver.find_method(*class, "__call__").is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Project;

    #[test]
    fn matches_by_own_base_and_metaclass_names() {
        let project = Project::from_sources([(
            "svc",
            "class Meta(type):\n    pass\n\
             class Service(metaclass=Meta):\n    pass\n\
             class Users(Service):\n    def __call__(self):\n        pass\n\
             users = Users()\n\
             def helper():\n    pass\n",
        )])
        .unwrap();
        let module = project.module_id("svc").unwrap();
        let users_cls = project.resolve_in_module(module, "Users").unwrap();
        let users = project.resolve_in_module(module, "users").unwrap();
        let service = project.resolve_in_module(module, "Service").unwrap();
        let helper = project.resolve_in_module(module, "helper").unwrap();

        assert!(class_matches_any(&project, &users_cls, &["Service"]));
        assert!(class_matches_any(&project, &users_cls, &["Users"]));
        assert!(class_matches_any(&project, &service, &["Meta"]));
        assert!(class_matches_any(&project, &users_cls, &["Meta"]));
        assert!(!class_matches_any(&project, &users_cls, &["object"]));
        assert!(class_matches_any(&project, &users, &["Users"]));
        assert!(!class_matches_any(&project, &users, &["Service"]));

        assert!(is_callable_instance(&project, &users));
        assert!(!is_callable_instance(&project, &users_cls));
        assert!(is_function_or_coroutine(&helper));
        assert!(!is_function_or_coroutine(&users_cls));
    }
}
