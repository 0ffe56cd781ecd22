use std::collections::HashMap;

/// Variable name -> expanded string value.
pub type Context = HashMap<String, String>;

/// Reserved context variable carrying a pipeline's resolved artifact prefix.
pub const PIPELINE_PREFIX_VAR: &str = "PIPELINE_PREFIX";

/// Resolves `${ALIAS.NAME}` and `$PLN(alias,file)` references against pipelines other than the
/// one currently being expanded. Implemented by `trestle-core`'s `Pipeline` so this crate never
/// needs to depend on the core data model.
pub trait AliasResolver {
    fn context_var(&self, alias: &str, name: &str) -> Option<String>;
    fn prefix(&self, alias: &str) -> Option<String>;
}

/// An `AliasResolver` with no registered aliases, for expanding text with no `use` targets.
pub struct NoAliases;

impl AliasResolver for NoAliases {
    fn context_var(&self, _alias: &str, _name: &str) -> Option<String> {
        None
    }

    fn prefix(&self, _alias: &str) -> Option<String> {
        None
    }
}

/// The OS environment overlaid with `context` (context wins on conflict); this is the
/// environment every code block and inline shell call actually runs under.
pub fn total_context(context: &Context) -> HashMap<String, String> {
    let mut merged: HashMap<String, String> = std::env::vars().collect();
    for (k, v) in context {
        merged.insert(k.clone(), v.clone());
    }
    merged
}
