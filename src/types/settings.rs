use serde::{Deserialize, Serialize};

use crate::types::User;

/// Notification preferences as exchanged with `/settings`.
///
/// The wire format is camelCase; snake_case keys from the database model are
/// accepted on input as well.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default = "default_true", alias = "email_notifications")]
    pub email_notifications: bool,

    #[serde(default = "default_true", alias = "weekly_reports")]
    pub weekly_reports: bool,

    #[serde(default, alias = "monthly_reports")]
    pub monthly_reports: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            email_notifications: true,
            weekly_reports: true,
            monthly_reports: false,
        }
    }
}

impl Settings {
    /// Default preferences prefilled with the user's identity.
    pub fn for_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            ..Self::default()
        }
    }

    /// Apply a single field edit.
    pub fn apply(&mut self, change: SettingChange) {
        match change {
            SettingChange::Name(name) => self.name = name,
            SettingChange::Email(email) => self.email = email,
            SettingChange::EmailNotifications(on) => self.email_notifications = on,
            SettingChange::WeeklyReports(on) => self.weekly_reports = on,
            SettingChange::MonthlyReports(on) => self.monthly_reports = on,
        }
    }
}

/// One edit to [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    Name(String),
    Email(String),
    EmailNotifications(bool),
    WeeklyReports(bool),
    MonthlyReports(bool),
}

impl SettingChange {
    /// Parse a `field value` pair as typed by the user.
    pub fn parse(field: &str, value: &str) -> Result<Self, String> {
        let value = value.trim();
        let flag = || parse_on_off(value).ok_or_else(|| format!("{field} expects 'on' or 'off'"));
        match field.to_lowercase().as_str() {
            "name" if !value.is_empty() => Ok(SettingChange::Name(value.to_string())),
            "email" if value.contains('@') => Ok(SettingChange::Email(value.to_string())),
            "email" => Err("email expects an address".to_string()),
            "notifications" | "email_notifications" => Ok(SettingChange::EmailNotifications(flag()?)),
            "weekly" | "weekly_reports" => Ok(SettingChange::WeeklyReports(flag()?)),
            "monthly" | "monthly_reports" => Ok(SettingChange::MonthlyReports(flag()?)),
            "name" => Err("name must not be empty".to_string()),
            _ => Err(format!(
                "unknown setting '{field}' (use name, email, notifications, weekly, monthly)"
            )),
        }
    }
}

pub(crate) fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}
