//! Route table reconstruction.
//!
//! Rebuilds what the framework would register at import time: verb
//! decorators and `add_api_route` calls on `FastAPI`/`APIRouter` objects,
//! composed through `include_router` from each application instance.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::eval::Value;
use crate::model::{CallExpr, Expr, FunctionRef, ModuleId, Project, Symbol};
use crate::resolver::{Object, Resolver};

const APP_CLASS: &str = "fastapi.applications:FastAPI";
const ROUTER_CLASS: &str = "fastapi.routing:APIRouter";
const VERBS: &[&str] = &["get", "post", "put", "patch", "delete", "options", "head", "trace"];

/// One documented operation group: a path, its methods and the handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub name: String,
    pub path: String,
    /// Upper-case HTTP methods.
    pub methods: Vec<String>,
    pub include_in_schema: bool,
    #[serde(skip)]
    pub endpoint: FunctionRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouterKind {
    App,
    Router,
}

/// A route as declared on one router, path not yet prefixed.
#[derive(Debug, Clone)]
struct Declared {
    name: String,
    path: String,
    methods: Vec<String>,
    include_in_schema: bool,
    endpoint: FunctionRef,
}

#[derive(Debug, Clone)]
struct Include {
    router: usize,
    prefix: String,
    include_in_schema: bool,
}

/// What a router registers, in the order it happens.
#[derive(Debug, Clone)]
enum Entry {
    Route(Declared),
    Include(Include),
}

#[derive(Debug)]
struct RouterNode {
    kind: RouterKind,
    label: String,
    prefix: String,
    include_in_schema: bool,
    entries: Vec<Entry>,
    included: bool,
}

/// A registering call: a route decorator on a module-level function, or a
/// module-level `add_api_route`/`include_router`.
struct Registration<'p> {
    /// Execution order within the module.
    order: (usize, usize),
    call: &'p CallExpr,
    decorated: Option<FunctionRef>,
}

struct Table<'p> {
    project: &'p Project,
    nodes: Vec<RouterNode>,
    by_binding: FxHashMap<(ModuleId, String), usize>,
}

/// Every route reachable from an application instance, in registration
/// order. Without any `FastAPI(...)` instance, routers that nothing
/// includes are treated as roots.
pub fn extract_routes(project: &Project) -> Vec<Route> {
    let mut table = Table {
        project,
        nodes: Vec::new(),
        by_binding: FxHashMap::default(),
    };
    let modules = project.user_modules();
    for &module in &modules {
        table.collect_routers(module);
    }
    for &module in &modules {
        table.collect_registrations(module);
    }

    let has_app = table.nodes.iter().any(|n| n.kind == RouterKind::App);
    let roots: Vec<usize> = (0..table.nodes.len())
        .filter(|&i| {
            let node = &table.nodes[i];
            if has_app {
                node.kind == RouterKind::App
            } else {
                !node.included
            }
        })
        .collect();

    let mut routes = Vec::new();
    for root in roots {
        let mut stack = Vec::new();
        table.flatten(root, "", true, &mut stack, &mut routes);
    }
    tracing::debug!(routers = table.nodes.len(), routes = routes.len(), "route table built");
    routes
}

impl Table<'_> {
    /// Module-level `name = FastAPI(...)` / `name = APIRouter(...)`.
    fn collect_routers(&mut self, module: ModuleId) {
        let project = self.project;
        let py = project.module(module);
        let mut names: Vec<&String> = py.symbols.keys().collect();
        names.sort();
        for name in names {
            let Some(Symbol::Call(call)) = py.symbols.get(name.as_str()) else {
                continue;
            };
            let Some(kind) = self.router_kind(module, call) else {
                continue;
            };
            let prefix = string_keyword(call, "prefix").unwrap_or_default();
            let include_in_schema = bool_keyword(call, "include_in_schema").unwrap_or(true);
            self.by_binding.insert((module, name.clone()), self.nodes.len());
            self.nodes.push(RouterNode {
                kind,
                label: format!("{}:{}", py.name, name),
                prefix,
                include_in_schema,
                entries: Vec::new(),
                included: false,
            });
        }
    }

    fn router_kind(&self, module: ModuleId, call: &CallExpr) -> Option<RouterKind> {
        let Some(Object::Class(class)) = self.project.resolve_path(module, &call.callee) else {
            return None;
        };
        let lineage = self.project.lineage_names(class);
        if lineage.iter().any(|c| c == APP_CLASS) {
            Some(RouterKind::App)
        } else if lineage.iter().any(|c| c == ROUTER_CLASS) {
            Some(RouterKind::Router)
        } else {
            None
        }
    }

    /// Follow imports and aliases from a name in `module` to the router
    /// binding it denotes.
    fn router_for(&self, module: ModuleId, parts: &[String]) -> Option<usize> {
        let (last, init) = parts.split_last()?;
        let module = if init.is_empty() {
            module
        } else {
            match self.project.resolve_path(module, init)? {
                Object::Module(id) => id,
                _ => return None,
            }
        };
        self.binding(module, last, 0)
    }

    fn binding(&self, module: ModuleId, name: &str, depth: usize) -> Option<usize> {
        if depth > 32 {
            return None;
        }
        if let Some(index) = self.by_binding.get(&(module, name.to_string())) {
            return Some(*index);
        }
        match self.project.module(module).symbols.get(name)? {
            Symbol::Import(crate::model::Import::Member { module: source, name }) => {
                let source = self.project.module_id(source)?;
                self.binding(source, name, depth + 1)
            }
            Symbol::Alias(parts) => {
                let parts: Vec<String> = parts.iter().cloned().collect();
                let (last, init) = parts.split_last()?;
                let module = if init.is_empty() {
                    module
                } else {
                    match self.project.resolve_path(module, init)? {
                        Object::Module(id) => id,
                        _ => return None,
                    }
                };
                self.binding(module, last, depth + 1)
            }
            _ => None,
        }
    }

    /// Replay the module's registrations in execution order. Decorators run
    /// when their definition does, innermost first.
    fn collect_registrations(&mut self, module: ModuleId) {
        let project = self.project;
        let py = project.module(module);
        let mut registrations = Vec::new();
        for (index, function) in py.functions.iter().enumerate() {
            if function.owner.is_some() {
                continue;
            }
            let endpoint = FunctionRef {
                module,
                index: index as u32,
            };
            let count = function.decorators.len();
            for (position, decorator) in function.decorators.iter().enumerate() {
                if let Expr::Call(call) = decorator {
                    registrations.push(Registration {
                        order: (function.span.0, count - position),
                        call: &**call,
                        decorated: Some(endpoint),
                    });
                }
            }
        }
        for call in &py.calls {
            registrations.push(Registration {
                order: (call.start, 0),
                call,
                decorated: None,
            });
        }
        registrations.sort_by_key(|r| r.order);

        for registration in registrations {
            let call = registration.call;
            let Some((method, receiver)) = call.callee.split_last() else {
                continue;
            };
            match (registration.decorated, method.as_str()) {
                (Some(endpoint), _) => self.decorator_route(module, receiver, method, call, endpoint),
                (None, "add_api_route") => self.add_api_route(module, receiver, call),
                (None, "include_router") => self.include_router(module, receiver, call),
                _ => {}
            }
        }
    }

    fn decorator_route(
        &mut self,
        module: ModuleId,
        receiver: &[String],
        verb: &str,
        call: &CallExpr,
        endpoint: FunctionRef,
    ) {
        let methods = if VERBS.contains(&verb) {
            vec![verb.to_ascii_uppercase()]
        } else if verb == "api_route" {
            methods_keyword(call).unwrap_or_else(|| vec!["GET".to_string()])
        } else {
            return;
        };
        let project = self.project;
        let function = project.function(endpoint);
        let Some(router) = self.router_for(module, receiver) else {
            tracing::trace!(function = %function.name, "decorator receiver is not a known router");
            return;
        };
        let Some(path) = route_path(call) else {
            return;
        };
        let name = string_keyword(call, "name").unwrap_or_else(|| function.name.clone());
        self.nodes[router].entries.push(Entry::Route(Declared {
            name,
            path,
            methods,
            include_in_schema: bool_keyword(call, "include_in_schema").unwrap_or(true),
            endpoint,
        }));
    }

    fn add_api_route(&mut self, module: ModuleId, receiver: &[String], call: &CallExpr) {
        let Some(router) = self.router_for(module, receiver) else {
            return;
        };
        let Some(path) = route_path(call) else {
            return;
        };
        let endpoint = match call.args.get(1).or_else(|| call.keyword("endpoint")) {
            Some(Expr::Name(parts)) => match self.project.resolve_path(module, parts) {
                Some(Object::Function(f)) => f,
                _ => return,
            },
            _ => return,
        };
        let name = string_keyword(call, "name").unwrap_or_else(|| self.project.function(endpoint).name.clone());
        self.nodes[router].entries.push(Entry::Route(Declared {
            name,
            path,
            methods: methods_keyword(call).unwrap_or_else(|| vec!["GET".to_string()]),
            include_in_schema: bool_keyword(call, "include_in_schema").unwrap_or(true),
            endpoint,
        }));
    }

    fn include_router(&mut self, module: ModuleId, receiver: &[String], call: &CallExpr) {
        let Some(parent) = self.router_for(module, receiver) else {
            return;
        };
        let child = match call.args.first().or_else(|| call.keyword("router")) {
            Some(Expr::Name(parts)) => self.router_for(module, parts),
            _ => None,
        };
        let Some(child) = child else {
            tracing::trace!(module = %self.project.module(module).name, "included router not resolved");
            return;
        };
        self.nodes[child].included = true;
        self.nodes[parent].entries.push(Entry::Include(Include {
            router: child,
            prefix: string_keyword(call, "prefix").unwrap_or_default(),
            include_in_schema: bool_keyword(call, "include_in_schema").unwrap_or(true),
        }));
    }

    fn flatten(
        &self,
        node: usize,
        prefix: &str,
        visible: bool,
        stack: &mut Vec<usize>,
        out: &mut Vec<Route>,
    ) {
        if stack.contains(&node) {
            tracing::warn!(router = %self.nodes[node].label, "router includes itself, skipping");
            return;
        }
        stack.push(node);
        let router = &self.nodes[node];
        let prefix = format!("{prefix}{}", router.prefix);
        let visible = visible && router.include_in_schema;
        for entry in &router.entries {
            match entry {
                Entry::Route(route) => out.push(Route {
                    name: route.name.clone(),
                    path: format!("{prefix}{}", route.path),
                    methods: route.methods.clone(),
                    include_in_schema: visible && route.include_in_schema,
                    endpoint: route.endpoint,
                }),
                Entry::Include(include) => {
                    let nested = format!("{prefix}{}", include.prefix);
                    self.flatten(include.router, &nested, visible && include.include_in_schema, stack, out);
                }
            }
        }
        stack.pop();
    }
}

fn route_path(call: &CallExpr) -> Option<String> {
    match call.args.first().or_else(|| call.keyword("path"))? {
        Expr::Value(Value::Str(path)) => Some(path.clone()),
        _ => None,
    }
}

fn string_keyword(call: &CallExpr, name: &str) -> Option<String> {
    match call.keyword(name)?.as_value()? {
        Value::Str(s) => Some(s.clone()),
        _ => None,
    }
}

fn bool_keyword(call: &CallExpr, name: &str) -> Option<bool> {
    call.keyword(name)?.as_value()?.truthy()
}

fn methods_keyword(call: &CallExpr) -> Option<Vec<String>> {
    match call.keyword("methods")?.as_value()? {
        Value::List(items) | Value::Tuple(items) => {
            items.iter().map(|m| m.as_str().map(str::to_ascii_uppercase)).collect()
        }
        _ => None,
    }
}
