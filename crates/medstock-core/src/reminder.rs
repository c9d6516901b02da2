//! # Expiry Reminders
//!
//! Selects the stock rows each department should be reminded about.
//! Composing and sending the messages happens outside this crate.
//!
//! ## Selection Rule
//! ```text
//!   today = 2026-05-01, schedule_days = [30, 10]
//!
//!   expiry 2026-05-31  → 30 days away → selected
//!   expiry 2026-05-11  → 10 days away → selected
//!   expiry 2026-05-20  → 19 days away → skipped
//!   expiry 9999-12-31  → sentinel     → skipped
//!   expiry none        →              → skipped
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Id, Item, StockRecord};
use crate::is_no_expiry_sentinel;

/// Key of the reminder setting in the settings table.
pub const REMINDER_SETTING_KEY: &str = "reminder_config";

/// Reminder settings, passed in by the caller at invocation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Master switch. A stored value without it counts as off.
    #[serde(default)]
    pub enabled: bool,

    /// Days before expiry on which a reminder fires.
    #[serde(default = "default_schedule_days")]
    pub schedule_days: BTreeSet<i64>,
}

fn default_schedule_days() -> BTreeSet<i64> {
    [30, 10].into_iter().collect()
}

impl Default for ReminderConfig {
    fn default() -> Self {
        ReminderConfig {
            enabled: true,
            schedule_days: default_schedule_days(),
        }
    }
}

impl ReminderConfig {
    /// Parses the JSON value stored under [`REMINDER_SETTING_KEY`].
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn disabled() -> Self {
        ReminderConfig {
            enabled: false,
            ..ReminderConfig::default()
        }
    }
}

/// One stock row due for a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderEntry {
    pub item_id: Id,
    /// `None` when the row's item is not in the catalog snapshot.
    pub item_name: Option<String>,
    pub unit: Option<String>,
    pub quantity: i64,
    pub expiry_date: NaiveDate,
    pub days_remaining: i64,
}

/// Reminder entries per department, each list ordered by days remaining.
pub type DueReminders = BTreeMap<Id, Vec<ReminderEntry>>;

/// Selects the stock rows whose expiry is exactly one of the scheduled day
/// offsets away from `today`.
pub fn due_reminders(
    config: &ReminderConfig,
    stocks: &[StockRecord],
    items: &[Item],
    today: NaiveDate,
) -> DueReminders {
    let mut due = DueReminders::new();
    if !config.enabled {
        return due;
    }

    let catalog: HashMap<Id, &Item> = items.iter().map(|item| (item.id, item)).collect();

    for stock in stocks {
        let Some(expiry) = stock.expiry_date else {
            continue;
        };
        if is_no_expiry_sentinel(expiry) {
            continue;
        }

        let days_remaining = (expiry - today).num_days();
        if !config.schedule_days.contains(&days_remaining) {
            continue;
        }

        let item = catalog.get(&stock.item_id);
        due.entry(stock.department_id).or_default().push(ReminderEntry {
            item_id: stock.item_id,
            item_name: item.map(|i| i.name.clone()),
            unit: item.map(|i| i.unit.clone()),
            quantity: stock.quantity,
            expiry_date: expiry,
            days_remaining,
        });
    }

    for entries in due.values_mut() {
        entries.sort_by_key(|e| (e.days_remaining, e.item_id));
    }

    due
}
