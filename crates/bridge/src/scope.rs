/// Decides whether integration is active for a location.
///
/// Pure: the answer depends only on the location string passed in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopePredicate {
    pattern: String,
}

impl ScopePredicate {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, location: &str) -> bool {
        location.contains(self.pattern.as_str())
    }
}
