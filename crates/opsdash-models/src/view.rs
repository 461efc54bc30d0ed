// SPDX-FileCopyrightText: 2026 Opsdash Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard views.

use serde::{Deserialize, Serialize};

use crate::record::QueuedRecord;
use crate::sql::{flag, int, text};

/// A dashboard view and its owner and group memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct View {
    pub id: i64,
    pub mnemonic: String,
    pub display: String,
    pub active: i64,
    pub public: i64,
    pub timezone: String,
    /// Client codes, stored without whitespace.
    pub client: String,
    pub allview_ind: i64,
    pub teamview_ind: i64,
    pub service: String,
    /// 0 for a group of teams, 1 for a single team.
    pub team_group_flag: i64,
    pub team: String,
    pub team_view_template: String,
    /// User mnemonics.
    pub owners: Vec<String>,
    /// Group mnemonics.
    pub groups: Vec<String>,
    pub graph_min: i64,
    pub graph_lookback: i64,
    pub dirty_flot: i64,
    pub debug: bool,
    pub tat_notification: i64,
    pub net_chg_flag: i64,
    pub target_msg: String,
    pub target_cls: String,
    pub target_open: String,
    pub target_fcr: String,
    pub target_24h: String,
    pub target_7d: String,
    pub target_30d: String,
    pub target_opp: String,
    pub creator: String,
    pub update_by: String,
}

impl Default for View {
    fn default() -> Self {
        Self {
            id: 0,
            mnemonic: String::new(),
            display: String::new(),
            active: 1,
            public: 0,
            timezone: String::new(),
            client: String::new(),
            allview_ind: 0,
            teamview_ind: 0,
            service: String::new(),
            team_group_flag: 0,
            team: String::new(),
            team_view_template: String::new(),
            owners: Vec::new(),
            groups: Vec::new(),
            graph_min: 0,
            graph_lookback: 12,
            dirty_flot: 0,
            debug: false,
            tat_notification: 0,
            net_chg_flag: 0,
            target_msg: String::new(),
            target_cls: String::new(),
            target_open: String::new(),
            target_fcr: String::new(),
            target_24h: String::new(),
            target_7d: String::new(),
            target_30d: String::new(),
            target_opp: String::new(),
            creator: String::new(),
            update_by: String::new(),
        }
    }
}

/// Partial update for a [`View`]. Absent fields leave the view unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewPatch {
    pub id: Option<i64>,
    pub mnemonic: Option<String>,
    pub display: Option<String>,
    pub active: Option<i64>,
    pub public: Option<i64>,
    pub timezone: Option<String>,
    pub client: Option<String>,
    pub allview_ind: Option<i64>,
    pub teamview_ind: Option<i64>,
    pub service: Option<String>,
    pub team_group_flag: Option<i64>,
    pub team: Option<String>,
    pub team_view_template: Option<String>,
    pub owners: Option<Vec<String>>,
    pub groups: Option<Vec<String>>,
    pub graph_min: Option<i64>,
    pub graph_lookback: Option<i64>,
    pub dirty_flot: Option<i64>,
    pub debug: Option<bool>,
    pub tat_notification: Option<i64>,
    pub net_chg_flag: Option<i64>,
    pub target_msg: Option<String>,
    pub target_cls: Option<String>,
    pub target_open: Option<String>,
    pub target_fcr: Option<String>,
    pub target_24h: Option<String>,
    pub target_7d: Option<String>,
    pub target_30d: Option<String>,
    pub target_opp: Option<String>,
    pub creator: Option<String>,
    pub update_by: Option<String>,
}

macro_rules! copy_present {
    ($target:expr, $patch:ident, $($field:ident),+ $(,)?) => {
        $(if let Some(value) = $patch.$field {
            $target.$field = value;
        })+
    };
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

impl View {
    pub fn new(mnemonic: impl Into<String>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            ..Self::default()
        }
    }

    /// Build a view from a patch over the defaults.
    pub fn from_patch(patch: ViewPatch) -> Self {
        let mut view = Self::default();
        view.apply(patch);
        view
    }

    /// Copy every field present in `patch`. Groups come out sorted.
    pub fn apply(&mut self, patch: ViewPatch) {
        if let Some(client) = &patch.client {
            self.client = strip_whitespace(client);
        }
        copy_present!(
            self, patch, id, mnemonic, display, active, public, timezone, allview_ind,
            teamview_ind, service, team_group_flag, team, team_view_template, owners, groups,
            graph_min, graph_lookback, dirty_flot, debug, tat_notification, net_chg_flag,
            target_msg, target_cls, target_open, target_fcr, target_24h, target_7d, target_30d,
            target_opp, creator, update_by,
        );
        self.groups.sort();
    }

    /// Add an owner unless already present.
    pub fn add_owner(&mut self, user: impl Into<String>) {
        push_unique(&mut self.owners, user.into());
    }

    /// Add a group unless already present.
    pub fn add_group(&mut self, group: impl Into<String>) {
        push_unique(&mut self.groups, group.into());
    }

    fn view_id(&self) -> String {
        format!("(SELECT id FROM views WHERE mnemonic = {})", text(&self.mnemonic))
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

impl QueuedRecord for View {
    fn insert_statement(&self) -> String {
        format!(
            "INSERT INTO views (mnemonic, active, creator) VALUES ({}, {}, {});",
            text(&self.mnemonic),
            int(self.active),
            text(&self.creator),
        )
    }

    /// Updates the row, then replaces the owner and group relations.
    fn update_statement(&self) -> String {
        let columns = [
            ("display", text(&self.display)),
            ("active", int(self.active)),
            ("public", int(self.public)),
            ("client", text(&strip_whitespace(&self.client))),
            ("timezone", text(&self.timezone)),
            ("team_view_template", text(&self.team_view_template)),
            ("team_group_flag", int(self.team_group_flag)),
            ("graph_min", int(self.graph_min)),
            ("service", text(&self.service)),
            ("team", text(&self.team)),
            ("graph_lookback", int(self.graph_lookback)),
            ("dirty_flot", int(self.dirty_flot)),
            ("debug", flag(self.debug).to_string()),
            ("tat_notification", int(self.tat_notification)),
            ("teamview_ind", int(self.teamview_ind)),
            ("allview_ind", int(self.allview_ind)),
            ("net_chg_flag", int(self.net_chg_flag)),
            ("target_msg", text(&self.target_msg)),
            ("target_cls", text(&self.target_cls)),
            ("target_open", text(&self.target_open)),
            ("target_fcr", text(&self.target_fcr)),
            ("target_24h", text(&self.target_24h)),
            ("target_7d", text(&self.target_7d)),
            ("target_30d", text(&self.target_30d)),
            ("target_opp", text(&self.target_opp)),
        ];
        let assignments = columns
            .iter()
            .map(|(column, value)| format!("{column} = {value}"))
            .collect::<Vec<_>>()
            .join(", ");

        let view_id = self.view_id();
        let mut sql = format!(
            "UPDATE views SET {assignments}, update_by = {}, \
             updated = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE mnemonic = {};",
            text(&self.update_by),
            text(&self.mnemonic),
        );

        sql.push_str(&format!(
            " DELETE FROM view_owner_r WHERE view_id IN {view_id};"
        ));
        for owner in &self.owners {
            sql.push_str(&format!(
                " INSERT INTO view_owner_r (view_id, user_id) VALUES ({view_id}, \
                 (SELECT id FROM users WHERE mnemonic = {}));",
                text(owner)
            ));
        }

        sql.push_str(&format!(
            " DELETE FROM view_group_r WHERE view_id IN {view_id};"
        ));
        for group in &self.groups {
            sql.push_str(&format!(
                " INSERT INTO view_group_r (view_id, group_id) VALUES ({view_id}, \
                 (SELECT id FROM \"groups\" WHERE mnemonic = {}));",
                text(group)
            ));
        }
        sql
    }
}
