//! Queue identifiers and the tracked queue set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One outage schedule stream, identified by a group/subgroup pair.
///
/// Ordered numerically by `(group, subgroup)` and written as `"group.subgroup"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct QueueId {
    pub group: u32,
    pub subgroup: u32,
}

impl QueueId {
    pub fn new(group: u32, subgroup: u32) -> Self {
        Self { group, subgroup }
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.subgroup)
    }
}

impl FromStr for QueueId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (group, subgroup) = s
            .split_once('.')
            .ok_or_else(|| AppError::QueueId(s.to_string()))?;

        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| AppError::QueueId(s.to_string()))
        };

        Ok(Self::new(parse(group)?, parse(subgroup)?))
    }
}

impl From<QueueId> for String {
    fn from(id: QueueId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for QueueId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The statically enumerable set of tracked queues: `1..=groups` x `1..=subgroups`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSet {
    pub groups: u32,
    pub subgroups: u32,
}

impl QueueSet {
    pub fn new(groups: u32, subgroups: u32) -> Self {
        Self { groups, subgroups }
    }

    /// All queue ids in numeric order.
    pub fn ids(&self) -> Vec<QueueId> {
        (1..=self.groups)
            .flat_map(|group| (1..=self.subgroups).map(move |sub| QueueId::new(group, sub)))
            .collect()
    }

    pub fn len(&self) -> usize {
        (self.groups as usize) * (self.subgroups as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueueSet {
    fn default() -> Self {
        Self::new(6, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let id = QueueId::new(3, 2);
        assert_eq!(id.to_string(), "3.2");
        assert_eq!("3.2".parse::<QueueId>().unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("3".parse::<QueueId>().is_err());
        assert!("0.1".parse::<QueueId>().is_err());
        assert!("a.b".parse::<QueueId>().is_err());
    }

    #[test]
    fn test_numeric_ordering() {
        let mut ids = vec![QueueId::new(10, 1), QueueId::new(2, 2), QueueId::new(2, 1)];
        ids.sort();
        assert_eq!(ids, vec![QueueId::new(2, 1), QueueId::new(2, 2), QueueId::new(10, 1)]);
    }

    #[test]
    fn test_queue_set_reference_deployment() {
        let set = QueueSet::default();
        let ids = set.ids();
        assert_eq!(ids.len(), 12);
        assert_eq!(ids.first(), Some(&QueueId::new(1, 1)));
        assert_eq!(ids.last(), Some(&QueueId::new(6, 2)));
    }

    #[test]
    fn test_queue_set_partial_toml_keeps_defaults() {
        let set: QueueSet = toml::from_str("groups = 3").unwrap();
        assert_eq!(set, QueueSet::new(3, 2));
        assert_eq!(set.len(), 6);
    }

    #[test]
    fn test_serde_as_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(QueueId::new(1, 2), 5);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"1.2":5}"#);
        let back: std::collections::BTreeMap<QueueId, i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
