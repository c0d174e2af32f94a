use std::collections::HashSet;

use crate::domains::catalog::ObjectSummary;

/// Object types that are never backed up, whatever the configuration says.
/// They cannot be queried without a filter or are not real record stores.
pub const RESTRICTED_OBJECTS: &[&str] = &[
    "contentdocumentlink",
    "ideacomment",
    "vote",
    "support_document__kav",
    "collaborationgrouprecord",
];

/// Decides which object types a run backs up. Names compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectFilter {
    include: HashSet<String>,
    exclude: HashSet<String>,
    restricted: HashSet<String>,
}

fn lowercase_set<T: AsRef<str>>(names: &[T]) -> HashSet<String> {
    names
        .iter()
        .map(|n| n.as_ref().trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect()
}

impl ObjectFilter {
    /// An empty `include` admits every object type.
    pub fn new<I: AsRef<str>, E: AsRef<str>>(
        include: &[I],
        exclude: &[E],
        restricted: &[&str],
    ) -> Self {
        Self {
            include: lowercase_set(include),
            exclude: lowercase_set(exclude),
            restricted: lowercase_set(restricted),
        }
    }

    pub fn accepts(&self, summary: &ObjectSummary) -> bool {
        if !summary.queryable || !summary.createable {
            return false;
        }
        let name = summary.name.to_lowercase();
        (self.include.is_empty() || self.include.contains(&name))
            && !self.exclude.contains(&name)
            && !self.restricted.contains(&name)
    }
}
