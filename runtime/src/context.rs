//! Scoped trace-variable mapping.
//!
//! A `Context` is an ancestor-chained map from trace key to [`Variable`].
//! Arrays ([`Variable::Array`]) *are* contexts, so this module doubles as
//! the engine's only container type.

use crate::errors::EngineError;
use crate::variable::Variable;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::rc::Rc;

/// Shared handle to a [`Context`]. Cloning a `ContextRef` shares the
/// underlying map (this is how `Variable::Array` gets reference, not value,
/// semantics) — mirrors the original's arena-owned `Context*` pointers,
/// adapted to safe Rust via `Rc<RefCell<_>>`.
pub type ContextRef = Rc<RefCell<Context>>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    None,
    Pushed,
    Popped,
}

pub struct Context {
    ancestor: Option<ContextRef>,
    map: HashMap<String, Variable>,
    /// Insertion order of first definition, for `list()`.
    order: Vec<String>,
    marks: HashMap<String, Mark>,
}

impl Context {
    /// A context with no ancestor.
    pub fn new_root() -> ContextRef {
        Rc::new(RefCell::new(Context {
            ancestor: None,
            map: HashMap::new(),
            order: Vec::new(),
            marks: HashMap::new(),
        }))
    }

    /// A context deriving from `ancestor` (may be `None`).
    pub fn new(ancestor: Option<ContextRef>) -> ContextRef {
        Rc::new(RefCell::new(Context {
            ancestor,
            map: HashMap::new(),
            order: Vec::new(),
            marks: HashMap::new(),
        }))
    }

    fn insert_ordered(&mut self, key: String, value: Variable) {
        if !self.map.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.map.insert(key, value);
    }

    /// Set a value directly, bypassing derivation. Used by
    /// `Variable::as_array` to build a fresh single-entry array.
    pub fn set_raw(&mut self, key: String, value: Variable) {
        self.insert_ordered(key, value);
    }

    /// Walk ancestors (without creating anything) for the first definition
    /// of `key`; returns the per-model default (`Variable::Null`) if none.
    pub fn val(&self, key: &str) -> Variable {
        if let Some(v) = self.map.get(key) {
            return v.clone();
        }
        match &self.ancestor {
            Some(a) => a.borrow().val(key),
            None => Variable::Null,
        }
    }

    /// `val`, but starting the walk at `start` rather than at `self` — used
    /// by `ref(key, reset=false)` to derive from the *ancestor's* value, not
    /// a value this context might already hold.
    fn val_from(start: &Option<ContextRef>, key: &str) -> Variable {
        match start {
            Some(c) => c.borrow().val(key),
            None => Variable::Null,
        }
    }

    /// Find-or-insert the local slot for `key`, returning its current value.
    /// If absent and `reset` is true, the new slot is `Variable::Null`;
    /// otherwise it is derived (copy-by-value for scalars, copy-by-share
    /// for arrays — i.e. `Variable::clone`) from the nearest ancestor's
    /// value.
    pub fn ref_get(&mut self, key: &str, reset: bool) -> Variable {
        if let Some(v) = self.map.get(key) {
            return v.clone();
        }
        let derived = if reset { Variable::Null } else { Self::val_from(&self.ancestor, key) };
        self.insert_ordered(key.to_string(), derived.clone());
        derived
    }

    /// Assign to the local slot for `key`, creating it first via `ref_get`
    /// semantics (derive-from-ancestor) if it does not exist.
    pub fn assign(&mut self, key: &str, value: Variable) {
        self.insert_ordered(key.to_string(), value);
    }

    /// Walk ancestors applying `pred` to the first defined value of `key`;
    /// `false` if `key` is defined nowhere in the chain.
    pub fn is_defined(&self, key: &str, pred: impl Fn(&Variable) -> bool) -> bool {
        if let Some(v) = self.map.get(key) {
            return pred(v);
        }
        match &self.ancestor {
            Some(a) => a.borrow().is_defined(key, pred),
            None => false,
        }
    }

    /// Mark `key` as pushed in this context's local marks.
    pub fn push(&mut self, key: &str) -> Result<(), EngineError> {
        match self.marks.get(key) {
            Some(Mark::Pushed) => {
                Err(EngineError::LogicViolation(format!("'{key}' has already been pushed")))
            }
            _ => {
                self.marks.insert(key.to_string(), Mark::Pushed);
                Ok(())
            }
        }
    }

    /// Mark `key` as popped, then restore the local value to that of the
    /// nearest ancestor where `key` is pushed-and-not-yet-popped (found by
    /// level counting across the ancestor chain), or error if there is no
    /// matching push.
    pub fn pop(&mut self, key: &str) -> Result<(), EngineError> {
        self.marks.insert(key.to_string(), Mark::Popped);
        let restored = Self::find_push_level(&self.ancestor, key, 1)
            .ok_or_else(|| EngineError::LogicViolation(format!("pop of unpushed variable '{key}'")))?;
        self.insert_ordered(key.to_string(), restored);
        Ok(())
    }

    /// Walk ancestors counting nesting: `level` starts at 1 on entry,
    /// decremented when an ancestor has `key` marked `Pushed`, incremented
    /// when marked `Popped`; once `level` reaches 0 that ancestor's value
    /// for `key` is the restore target.
    fn find_push_level(start: &Option<ContextRef>, key: &str, mut level: i32) -> Option<Variable> {
        let mut cur = start.clone();
        while let Some(c) = cur {
            let c_ref = c.borrow();
            match c_ref.marks.get(key) {
                Some(Mark::Pushed) => level -= 1,
                Some(Mark::Popped) => level += 1,
                _ => {}
            }
            if level == 0 {
                return Some(c_ref.val(key));
            }
            let next = c_ref.ancestor.clone();
            drop(c_ref);
            cur = next;
        }
        None
    }

    /// List every currently-visible entry (local map first, then
    /// ancestors), in first-definition order, with duplicates (by key) and
    /// empty-string keys suppressed. If `last_only`, only the local map is
    /// listed.
    pub fn list(&self, last_only: bool) -> Vec<(String, Variable)> {
        let mut passed: HashSet<String> = HashSet::new();
        let mut out = Vec::new();
        self.list_into(last_only, &mut passed, &mut out);
        out
    }

    fn list_into(&self, last_only: bool, passed: &mut HashSet<String>, out: &mut Vec<(String, Variable)>) {
        for key in &self.order {
            if key.is_empty() || passed.contains(key) {
                continue;
            }
            passed.insert(key.clone());
            out.push((key.clone(), self.map[key].clone()));
        }
        if !last_only {
            if let Some(a) = &self.ancestor {
                a.borrow().list_into(false, passed, out);
            }
        }
    }

    /// Number of visible entries: local-only if `last_only`, else the
    /// deduplicated count across the whole ancestor chain.
    pub fn entry_count(&self, last_only: bool) -> usize {
        if last_only {
            self.order.iter().filter(|k| !k.is_empty()).count()
        } else {
            self.list(false).len()
        }
    }

    /// `{k1: v1, k2: v2, ...}` array listing, insertion order of first
    /// definition, empty keys omitted, string values quoted.
    pub fn list_format(&self) -> String {
        let mut out = String::from("{");
        let mut first = true;
        for (k, v) in self.list(false) {
            if !first {
                out.push_str(", ");
            }
            first = false;
            let rendered = match &v {
                Variable::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
                other => other.as_string().unwrap_or_default(),
            };
            let _ = write!(out, "{k}: {rendered}");
        }
        out.push('}');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn val_walks_ancestors_and_defaults_to_null() {
        let root = Context::new_root();
        root.borrow_mut().assign("x", Variable::Integer(1));
        let child = Context::new(Some(root.clone()));
        assert_eq!(child.borrow().val("x").as_integer().unwrap(), 1);
        assert!(child.borrow().val("missing").is_null());
    }

    #[test]
    fn ref_get_derives_from_ancestor() {
        let root = Context::new_root();
        root.borrow_mut().assign("x", Variable::Integer(5));
        let child = Context::new(Some(root.clone()));
        let derived = child.borrow_mut().ref_get("x", false);
        assert_eq!(derived.as_integer().unwrap(), 5);
    }

    #[test]
    fn ref_get_reset_uses_default() {
        let root = Context::new_root();
        root.borrow_mut().assign("x", Variable::Integer(5));
        let child = Context::new(Some(root.clone()));
        let derived = child.borrow_mut().ref_get("x", true);
        assert!(derived.is_null());
    }

    #[test]
    fn push_pop_restores_value_at_same_level() {
        let root = Context::new_root();
        root.borrow_mut().assign("x", Variable::Integer(1));
        root.borrow_mut().push("x").unwrap();

        let child = Context::new(Some(root.clone()));
        child.borrow_mut().assign("x", Variable::Integer(2));
        assert_eq!(child.borrow().val("x").as_integer().unwrap(), 2);

        child.borrow_mut().pop("x").unwrap();
        assert_eq!(child.borrow().val("x").as_integer().unwrap(), 1);
    }

    #[test]
    fn pop_without_push_errors() {
        let root = Context::new_root();
        assert!(root.borrow_mut().pop("x").is_err());
    }

    #[test]
    fn double_push_errors() {
        let root = Context::new_root();
        root.borrow_mut().push("x").unwrap();
        assert!(root.borrow_mut().push("x").is_err());
    }

    #[test]
    fn array_sharing_via_clone() {
        let root = Context::new_root();
        root.borrow_mut().assign("arr", Variable::Array(Context::new_root()));
        let shared = root.borrow().val("arr");
        if let Variable::Array(ctx) = shared {
            ctx.borrow_mut().assign("k", Variable::Integer(9));
        }
        if let Variable::Array(ctx2) = root.borrow().val("arr") {
            assert_eq!(ctx2.borrow().val("k").as_integer().unwrap(), 9);
        } else {
            panic!("expected array");
        }
    }

    #[test]
    fn list_skips_duplicates_and_empty_keys() {
        let root = Context::new_root();
        root.borrow_mut().assign("", Variable::Integer(0));
        root.borrow_mut().assign("a", Variable::Integer(1));
        let child = Context::new(Some(root.clone()));
        child.borrow_mut().assign("a", Variable::Integer(2));
        child.borrow_mut().assign("b", Variable::Integer(3));
        let listed = child.borrow().list(false);
        let keys: Vec<&str> = listed.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(listed[0].1.as_integer().unwrap(), 2);
        assert_eq!(listed[1].1.as_integer().unwrap(), 3);
    }
}
