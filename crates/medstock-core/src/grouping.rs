//! # Duplicate Grouping & Master Selection
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items (retrieval order)                                                │
//! │   id=9 "針１８Ｇ"   id=5 "針18G"   id=7 "針20G"                          │
//! │        │                │               │                               │
//! │        └──── key "針18g" ┘               └── key "針20g"                 │
//! │                  │                               │                      │
//! │                  ▼                               ▼                      │
//! │   ItemGroup [9, 5]  (duplicate)      ItemGroup [7]  (singleton)         │
//! │                  │                                                      │
//! │                  ▼  select_master                                       │
//! │   master = 5, slaves = [9]                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use crate::normalize::normalize_name;
use crate::types::Item;

/// Items sharing one normalization key, in retrieval order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemGroup {
    pub key: String,
    pub items: Vec<Item>,
}

impl ItemGroup {
    /// True when the group needs merging (two or more members).
    #[inline]
    pub fn is_duplicate(&self) -> bool {
        self.items.len() >= 2
    }

    /// Display name of the first retrieved member, used in logs.
    pub fn label(&self) -> &str {
        self.items.first().map(|i| i.name.as_str()).unwrap_or("")
    }
}

/// Partitions items into groups by normalization key.
///
/// Groups are returned in order of the first appearance of their key; members
/// keep retrieval order.
pub fn group_by_name(items: impl IntoIterator<Item = Item>) -> Vec<ItemGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<ItemGroup> = Vec::new();

    for item in items {
        let key = normalize_name(&item.name);
        match index.get(&key) {
            Some(&pos) => groups[pos].items.push(item),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(ItemGroup {
                    key,
                    items: vec![item],
                });
            }
        }
    }

    groups
}

/// The surviving item of a duplicate group and the items folded into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterSelection {
    pub master: Item,
    /// Ascending by id.
    pub slaves: Vec<Item>,
}

impl MasterSelection {
    pub fn slave_ids(&self) -> Vec<i64> {
        self.slaves.iter().map(|s| s.id).collect()
    }
}

/// Picks the lowest id as master. Returns `None` for non-duplicate groups.
pub fn select_master(group: &ItemGroup) -> Option<MasterSelection> {
    if !group.is_duplicate() {
        return None;
    }

    let mut members = group.items.clone();
    members.sort_by_key(|item| item.id);
    let mut members = members.into_iter();
    let master = members.next()?;

    Some(MasterSelection {
        master,
        slaves: members.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, name: &str) -> Item {
        Item {
            id,
            name: name.to_string(),
            unit: "本".to_string(),
            has_expiry: false,
            min_stock: 0,
            category_id: Some(2),
        }
    }

    #[test]
    fn test_groups_by_normalized_key() {
        let groups = group_by_name(vec![
            item(9, "針１８Ｇ"),
            item(7, "針20G"),
            item(5, "針18G"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "針18g");
        let ids: Vec<i64> = groups[0].items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![9, 5]);
        assert!(groups[0].is_duplicate());
        assert!(!groups[1].is_duplicate());
    }

    #[test]
    fn test_group_label_uses_first_member() {
        let groups = group_by_name(vec![item(9, "針１８Ｇ"), item(5, "針18G")]);
        assert_eq!(groups[0].label(), "針１８Ｇ");
    }

    #[test]
    fn test_master_is_lowest_id() {
        let groups = group_by_name(vec![
            item(12, "LT#２"),
            item(4, "LT#2"),
            item(8, "lt #2"),
        ]);
        let selection = select_master(&groups[0]).unwrap();

        assert_eq!(selection.master.id, 4);
        assert_eq!(selection.slave_ids(), vec![8, 12]);
    }

    #[test]
    fn test_singleton_has_no_master() {
        let groups = group_by_name(vec![item(1, "三角巾")]);
        assert!(select_master(&groups[0]).is_none());
    }

    #[test]
    fn test_no_items_no_groups() {
        assert!(group_by_name(Vec::new()).is_empty());
    }
}
