//! Name resolution state for one module emission.
//!
//! Assembly names are the source names at module and function scope; inside a
//! nested block they are suffixed with `/<scope id>` so shadowed names stay
//! unique. A declaration that merely renames a function-typed binding becomes
//! an alias: no code is emitted and lookups rewrite through it. Globals whose
//! initializer is not a constant are queued here for the synthesized start
//! function.

use std::collections::HashMap;

use reed_frontend::ast::Expr;

pub struct Scopes {
    globals: HashMap<String, String>,
    locals: Vec<HashMap<String, String>>,
    aliases: Vec<HashMap<String, String>>,
    scope_ids: Vec<u32>,
    next_scope_id: u32,
    initializers: Vec<(String, Expr)>,
}

impl Scopes {
    pub fn new() -> Self {
        Scopes {
            globals: HashMap::new(),
            locals: Vec::new(),
            // The module-level alias frame is always present.
            aliases: vec![HashMap::new()],
            scope_ids: Vec::new(),
            next_scope_id: 0,
            initializers: Vec::new(),
        }
    }

    /// Open a function scope. Scope-ID numbering restarts per function.
    pub fn enter_function(&mut self) {
        self.locals.push(HashMap::new());
        self.aliases.push(HashMap::new());
        self.scope_ids.clear();
        self.next_scope_id = 0;
    }

    pub fn leave_function(&mut self) {
        self.locals.pop();
        self.aliases.pop();
        self.scope_ids.clear();
    }

    /// Open a nested block scope with a fresh scope ID.
    pub fn enter_block(&mut self) {
        self.locals.push(HashMap::new());
        self.aliases.push(HashMap::new());
        self.next_scope_id += 1;
        self.scope_ids.push(self.next_scope_id);
    }

    pub fn leave_block(&mut self) {
        self.locals.pop();
        self.aliases.pop();
        self.scope_ids.pop();
    }

    /// Bind `name` in the innermost frame (local if any, else global) and
    /// return the assembly name chosen for it.
    pub fn push_name(&mut self, name: &str) -> String {
        let asm = match self.scope_ids.last() {
            Some(id) => format!("{name}/{id}"),
            None => name.to_string(),
        };
        match self.locals.last_mut() {
            Some(frame) => frame.insert(name.to_string(), asm.clone()),
            None => self.globals.insert(name.to_string(), asm.clone()),
        };
        asm
    }

    pub fn push_alias(&mut self, from: &str, to: &str) {
        if let Some(frame) = self.aliases.last_mut() {
            frame.insert(from.to_string(), to.to_string());
        }
    }

    pub fn push_initializer(&mut self, asm_name: &str, expr: Expr) {
        self.initializers.push((asm_name.to_string(), expr));
    }

    pub fn initializers(&self) -> &[(String, Expr)] {
        &self.initializers
    }

    /// Innermost-first walk of the live local frames.
    pub fn local_name(&self, name: &str) -> Option<String> {
        self.locals
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .cloned()
    }

    /// Alias-transparent global lookup: the first alias hit, innermost frame
    /// first, rewrites the key once before the global map is consulted.
    pub fn global_name(&self, name: &str) -> Option<String> {
        let mut key = name;
        for frame in self.aliases.iter().rev() {
            if let Some(target) = frame.get(key) {
                key = target.as_str();
                break;
            }
        }
        self.globals.get(key).cloned()
    }
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}
