use crate::types::Sexpr;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

// --- Environment Definition ---

/// One frame of bindings plus a link to the enclosing frame.
///
/// Bindings are never overwritten or removed. Defining a name that is already
/// bound appends a new entry, and lookups scan newest first, so the latest
/// binding wins while the older ones stay in the frame.
#[derive(Debug, Default)]
pub struct Environment {
    // Use Rc<RefCell<...>> to allow shared ownership and interior mutability.
    // Closures keep their defining frame alive through this pointer.
    outer: Option<Rc<RefCell<Environment>>>,
    bindings: Vec<(String, Sexpr)>,
}

impl Environment {
    /// Creates a new, top-level (global) environment.
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// Builds the frame for a closure call: each parameter symbol is bound to
    /// the argument in the same position. Callers check the counts first.
    pub fn extend(
        params: &Sexpr,
        args: Vec<Sexpr>,
        outer_env: Rc<RefCell<Environment>>,
    ) -> Rc<RefCell<Self>> {
        let bindings = params
            .iter()
            .zip(args)
            .filter_map(|(param, arg)| param.as_symbol().map(|name| (name.to_string(), arg)))
            .collect();
        Rc::new(RefCell::new(Environment {
            outer: Some(outer_env),
            bindings,
        }))
    }

    /// Adds a binding to the *current* environment frame and returns the value.
    pub fn define(&mut self, name: String, value: Sexpr) -> Sexpr {
        self.bindings.push((name, value.clone()));
        value
    }

    /// Looks up a variable's value.
    /// Checks the current environment first, then walks up the outer environment chain.
    pub fn get(&self, name: &str) -> Option<Sexpr> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value.clone())
            .or_else(|| {
                self.outer
                    .as_ref()
                    .and_then(|outer_env_ptr| outer_env_ptr.borrow().get(name))
            })
    }

    /// Number of bindings held by this frame, shadowed ones included.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn add_identifiers(&self, mut identifiers: HashSet<String>) -> HashSet<String> {
        for (identifier, _) in &self.bindings {
            identifiers.insert(identifier.to_string());
        }
        match self.outer {
            Some(ref outer_env_ptr) => outer_env_ptr.borrow().add_identifiers(identifiers),
            None => identifiers,
        }
    }

    /// Gets a list of all identifiers visible from this environment
    pub fn get_identifiers(&self) -> HashSet<String> {
        self.add_identifiers(HashSet::new())
    }
}

/// The session-wide top frame: no parent, no bindings.
pub fn new_global_environment() -> Rc<RefCell<Environment>> {
    Environment::new()
}

/// Looks `symbol` up in `env`. Unbound symbols evaluate to themselves.
pub fn lookup(symbol: &Sexpr, env: &Rc<RefCell<Environment>>) -> Sexpr {
    match symbol {
        Sexpr::Symbol(name) => env.borrow().get(name).unwrap_or_else(|| symbol.clone()),
        _ => symbol.clone(),
    }
}
