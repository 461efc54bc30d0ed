// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service queues tracked on the dashboard.

use serde::{Deserialize, Serialize};

use crate::record::QueuedRecord;
use crate::sql::{int, text};

/// Patch value for `active` that means "leave it as it is".
pub const ACTIVE_UNCHANGED: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceQueue {
    pub id: i64,
    pub mnemonic: String,
    pub active: i64,
    pub flag: i64,
    pub timezone: String,
    pub team_lead_user_mnemonic: String,
    pub client_team_name: String,
    pub creator: String,
    pub update_by: String,
}

impl Default for ServiceQueue {
    fn default() -> Self {
        Self {
            id: 0,
            mnemonic: String::new(),
            active: 1,
            flag: 0,
            timezone: "America/Chicago".to_string(),
            team_lead_user_mnemonic: String::new(),
            client_team_name: String::new(),
            creator: String::new(),
            update_by: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceQueuePatch {
    pub id: Option<i64>,
    pub mnemonic: Option<String>,
    pub active: Option<i64>,
    pub flag: Option<i64>,
    pub timezone: Option<String>,
    pub team_lead_user_mnemonic: Option<String>,
    pub client_team_name: Option<String>,
    pub creator: Option<String>,
    pub update_by: Option<String>,
}

impl ServiceQueue {
    pub fn new(mnemonic: impl Into<String>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            ..Self::default()
        }
    }

    /// Copy every field present in `patch`. An `active` of
    /// [`ACTIVE_UNCHANGED`] is ignored.
    pub fn apply(&mut self, patch: ServiceQueuePatch) {
        if let Some(id) = patch.id {
            self.id = id;
        }
        if let Some(mnemonic) = patch.mnemonic {
            self.mnemonic = mnemonic;
        }
        if let Some(active) = patch.active
            && active != ACTIVE_UNCHANGED
        {
            self.active = active;
        }
        if let Some(flag) = patch.flag {
            self.flag = flag;
        }
        if let Some(timezone) = patch.timezone {
            self.timezone = timezone;
        }
        if let Some(lead) = patch.team_lead_user_mnemonic {
            self.team_lead_user_mnemonic = lead;
        }
        if let Some(team) = patch.client_team_name {
            self.client_team_name = team;
        }
        if let Some(creator) = patch.creator {
            self.creator = creator;
        }
        if let Some(update_by) = patch.update_by {
            self.update_by = update_by;
        }
    }
}

impl QueuedRecord for ServiceQueue {
    fn insert_statement(&self) -> String {
        format!(
            "INSERT INTO queues (mnemonic, active, timezone, creator) VALUES ({}, {}, {}, {});",
            text(&self.mnemonic),
            int(self.active),
            text(&self.timezone),
            text(&self.creator),
        )
    }

    fn update_statement(&self) -> String {
        format!(
            "UPDATE queues SET active = {}, team_lead_user_mnemonic = {}, client_team_name = {}, \
             flag = {}, update_by = {}, updated = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
             WHERE mnemonic = {};",
            int(self.active),
            text(&self.team_lead_user_mnemonic),
            text(&self.client_team_name),
            int(self.flag),
            text(&self.update_by),
            text(&self.mnemonic),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let queue = ServiceQueue::new("NOC_T1");
        assert_eq!(queue.active, 1);
        assert_eq!(queue.timezone, "America/Chicago");
    }

    #[test]
    fn active_two_leaves_active_unchanged() {
        let mut queue = ServiceQueue::new("NOC_T1");
        queue.apply(ServiceQueuePatch {
            active: Some(0),
            ..ServiceQueuePatch::default()
        });
        assert_eq!(queue.active, 0);

        queue.apply(ServiceQueuePatch {
            active: Some(ACTIVE_UNCHANGED),
            flag: Some(3),
            ..ServiceQueuePatch::default()
        });
        assert_eq!(queue.active, 0);
        assert_eq!(queue.flag, 3);
    }

    #[test]
    fn update_statement_escapes_mnemonic() {
        let mut queue = ServiceQueue::new("x'; DELETE FROM queues; --");
        queue.update_by = "ab1234".to_string();
        let sql = queue.update_statement();
        assert!(sql.ends_with("WHERE mnemonic = 'x''; DELETE FROM queues; --';"));
        assert!(sql.contains("update_by = 'ab1234'"));
    }
}
