// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// A type-safe wrapper for pipeline entry points - nodes with no incoming edges.
///
/// Every value handed to `Pipeline::execute` is delivered to each entry point
/// independently, so a pipeline with two entry points sees every input twice.
///
/// # Examples
///
/// ## Building entry points incrementally
/// ```
/// use cronicl::config::EntryPoints;
///
/// let mut entry_points = EntryPoints::new();
/// entry_points.add("ingest".to_string());
/// entry_points.add("audit".to_string());
///
/// assert_eq!(entry_points.len(), 2);
/// assert!(entry_points.contains("audit"));
/// ```
///
/// ## Converting back to Vec<String>
/// ```
/// use cronicl::config::EntryPoints;
///
/// let entry_points = EntryPoints::from(vec!["ingest".to_string()]);
/// let vec_form: Vec<String> = entry_points.into();
/// assert_eq!(vec_form, vec!["ingest".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPoints(pub Vec<String>);

impl EntryPoints {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn add(&mut self, node_id: String) {
        self.0.push(node_id);
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.0.iter().any(|id| id == node_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for EntryPoints {
    fn from(entrypoints: Vec<String>) -> Self {
        Self(entrypoints)
    }
}

impl From<EntryPoints> for Vec<String> {
    fn from(value: EntryPoints) -> Self {
        value.0
    }
}
