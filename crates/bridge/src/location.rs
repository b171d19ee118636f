/// Last location observed by the navigation watcher.
///
/// The only place that remembers the location between mutation batches;
/// updates go through [`CurrentLocation::swap_if_changed`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentLocation {
    href: String,
}

impl CurrentLocation {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }

    pub fn get(&self) -> &str {
        &self.href
    }

    /// Store `observed` if it differs, returning the previous value.
    pub fn swap_if_changed(&mut self, observed: &str) -> Option<String> {
        if self.href == observed {
            return None;
        }
        Some(std::mem::replace(&mut self.href, observed.to_string()))
    }
}
