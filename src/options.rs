use std::collections::HashMap;
use std::sync::Arc;

use crate::interpreter::functions::CustomFunction;

/// Per-call evaluation configuration (spec §3.5).
///
/// `dict_cls` has no analogue here: `Value::Object` is always an
/// `IndexMap`, which already satisfies the only externally observable
/// contract the option describes (insertion-order preservation), so no
/// constructor-swapping hook is exposed — see DESIGN.md Open Questions.
#[derive(Default, Clone)]
pub struct Options {
    pub custom_functions: HashMap<String, Arc<CustomFunction>>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_custom_function(mut self, name: impl Into<String>, function: CustomFunction) -> Self {
        self.custom_functions.insert(name.into(), Arc::new(function));
        self
    }
}
