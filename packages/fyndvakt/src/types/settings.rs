use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Category allow-list sentinel that disables category filtering.
pub const CATEGORY_ALL: &str = "all";

/// Per-operator notification preferences, persisted by the settings store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchSettings {
    pub user_id: String,
    /// Alert recipient (phone number).
    pub recipient: String,
    pub alerts_enabled: bool,
    /// Minimum score that qualifies for an alert.
    pub min_score: u8,
    pub check_interval_minutes: u64,
    /// Max successful alerts per recipient per calendar day.
    pub daily_quota: u32,
    /// Category allow-list; `["all"]` disables filtering.
    pub categories: Vec<String>,
}

impl WatchSettings {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            user_id: "default_user".to_string(),
            recipient: String::new(),
            alerts_enabled: true,
            min_score: 4,
            check_interval_minutes: 10,
            daily_quota: 20,
            categories: vec![CATEGORY_ALL.to_string()],
        }
    }
}

/// Partial settings update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub recipient: Option<String>,
    pub alerts_enabled: Option<bool>,
    pub min_score: Option<u8>,
    pub check_interval_minutes: Option<u64>,
    pub daily_quota: Option<u32>,
    pub categories: Option<Vec<String>>,
}

impl SettingsUpdate {
    /// Apply this update over existing settings.
    pub fn apply(&self, settings: &mut WatchSettings) {
        if let Some(recipient) = &self.recipient {
            settings.recipient = recipient.clone();
        }
        if let Some(enabled) = self.alerts_enabled {
            settings.alerts_enabled = enabled;
        }
        if let Some(min_score) = self.min_score {
            settings.min_score = min_score;
        }
        if let Some(minutes) = self.check_interval_minutes {
            settings.check_interval_minutes = minutes;
        }
        if let Some(quota) = self.daily_quota {
            settings.daily_quota = quota;
        }
        if let Some(categories) = &self.categories {
            settings.categories = categories.clone();
        }
    }
}

/// Configuration owned by the monitoring cycle for its running lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Discovery target (saved search) to poll.
    pub watch_id: String,
    pub check_interval_minutes: u64,
    pub min_score: u8,
    pub daily_quota: u32,
    pub recipient: String,
    /// Sender id stamped on outgoing alerts.
    pub sender: String,
    pub categories: Vec<String>,
}

impl MonitorConfig {
    pub fn new(watch_id: impl Into<String>) -> Self {
        Self {
            watch_id: watch_id.into(),
            check_interval_minutes: 10,
            min_score: 4,
            daily_quota: 20,
            recipient: String::new(),
            sender: "Fyndvakt".to_string(),
            categories: vec![CATEGORY_ALL.to_string()],
        }
    }

    /// Build a cycle config from stored operator settings.
    pub fn from_settings(
        watch_id: impl Into<String>,
        sender: impl Into<String>,
        settings: &WatchSettings,
    ) -> Self {
        Self {
            watch_id: watch_id.into(),
            check_interval_minutes: settings.check_interval_minutes,
            min_score: settings.min_score,
            daily_quota: settings.daily_quota,
            recipient: settings.recipient.clone(),
            sender: sender.into(),
            categories: settings.categories.clone(),
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes * 60)
    }

    /// Merge a partial update into a new config.
    pub fn merged(&self, update: &MonitorConfigUpdate) -> Self {
        let mut merged = self.clone();
        if let Some(watch_id) = &update.watch_id {
            merged.watch_id = watch_id.clone();
        }
        if let Some(minutes) = update.check_interval_minutes {
            merged.check_interval_minutes = minutes;
        }
        if let Some(min_score) = update.min_score {
            merged.min_score = min_score;
        }
        if let Some(quota) = update.daily_quota {
            merged.daily_quota = quota;
        }
        if let Some(recipient) = &update.recipient {
            merged.recipient = recipient.clone();
        }
        if let Some(sender) = &update.sender {
            merged.sender = sender.clone();
        }
        if let Some(categories) = &update.categories {
            merged.categories = categories.clone();
        }
        merged
    }
}

/// Partial cycle-config update; `None` fields keep the running value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfigUpdate {
    pub watch_id: Option<String>,
    pub check_interval_minutes: Option<u64>,
    pub min_score: Option<u8>,
    pub daily_quota: Option<u32>,
    pub recipient: Option<String>,
    pub sender: Option<String>,
    pub categories: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_keeps_unset_fields() {
        let config = MonitorConfig::new("watch-1");
        let update = MonitorConfigUpdate {
            min_score: Some(5),
            recipient: Some("+46701234567".to_string()),
            ..Default::default()
        };

        let merged = config.merged(&update);
        assert_eq!(merged.min_score, 5);
        assert_eq!(merged.recipient, "+46701234567");
        assert_eq!(merged.watch_id, "watch-1");
        assert_eq!(merged.check_interval_minutes, 10);
    }

    #[test]
    fn test_settings_update_apply() {
        let mut settings = WatchSettings::default();
        SettingsUpdate {
            daily_quota: Some(3),
            categories: Some(vec!["bikes".to_string()]),
            ..Default::default()
        }
        .apply(&mut settings);

        assert_eq!(settings.daily_quota, 3);
        assert_eq!(settings.categories, vec!["bikes".to_string()]);
        assert_eq!(settings.min_score, 4);
    }
}
