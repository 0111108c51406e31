//! Arc decoration: a composable (string, int, callback) triple.

/// A composite decoration carried by an [`crate::arc::Arc`].
///
/// Labels compose under nesting: as a state returns out through an outer
/// arc, the outer label's [`Label::advance`] is applied to the inner one so
/// trace decorations accumulate dotted-path style (`outer.inner`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Label {
    pub string_tag: String,
    pub int_tag: i64,
    pub callback: Option<String>,
}

impl Label {
    pub fn new() -> Self {
        Label::default()
    }

    pub fn with_string(string_tag: impl Into<String>) -> Self {
        Label { string_tag: string_tag.into(), int_tag: 0, callback: None }
    }

    /// A label is "actual" iff any of its components is non-empty.
    pub fn is_actual(&self) -> bool {
        !self.string_tag.is_empty() || self.int_tag != 0 || self.callback.is_some()
    }

    /// Advance `self` (the descendant label) out through `outer`, per
    /// spec.md 4.2:
    ///
    /// 1. if `self` is not actual, no-op;
    /// 2. if `outer` is not actual, void `self`;
    /// 3. otherwise merge: `string := outer.string + "." + self.string`
    ///    (omit the dot if `self.string` is `"."`), `int := self.int` if
    ///    nonzero else `outer.int`, `callback := self.callback` if present
    ///    else `outer.callback`.
    pub fn advance(&mut self, outer: &Label) {
        if !self.is_actual() {
            return;
        }
        if !outer.is_actual() {
            *self = Label::default();
            return;
        }
        self.string_tag = if self.string_tag == "." {
            outer.string_tag.clone()
        } else {
            format!("{}.{}", outer.string_tag, self.string_tag)
        };
        if self.int_tag == 0 {
            self.int_tag = outer.int_tag;
        }
        if self.callback.is_none() {
            self.callback = outer.callback.clone();
        }
    }
}
