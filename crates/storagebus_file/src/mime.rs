//! Name-based content type inference.

use std::fmt;
use std::sync::Arc;

/// Content type used when inference is enabled but the name has no known type.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

type LookupFn = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Injected `name -> content type` table.
///
/// The default table is `mime_guess`, keyed on the extension of the last
/// path segment.
#[derive(Clone)]
pub struct MimeLookup(Arc<LookupFn>);

impl MimeLookup {
    /// Wrap a custom lookup function.
    pub fn new<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self(Arc::new(lookup))
    }

    /// Look up the type for `name`.
    pub fn lookup(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }

    /// Look up the type for `name`, falling back to [`DEFAULT_CONTENT_TYPE`].
    pub fn resolve(&self, name: &str) -> String {
        self.lookup(name)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
    }
}

impl Default for MimeLookup {
    fn default() -> Self {
        Self::new(|name| {
            let last = name.rsplit(['/', '\\']).next().unwrap_or(name);
            if !last.contains('.') {
                return None;
            }
            mime_guess::from_path(last)
                .first_raw()
                .map(str::to_string)
        })
    }
}

impl fmt::Debug for MimeLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MimeLookup(..)")
    }
}
