//! Record table view
//!
//! One table builder serves both places users are listed: the Users tab
//! and the database monitor. They differ only in wording, columns and the
//! placeholder shown for missing values.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::format::{from_millis, plural};
use crate::application::live::LiveView;
use crate::domain::UserRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecordTable {
    Users,
    Database,
}

impl RecordTable {
    fn title(self) -> &'static str {
        match self {
            Self::Users => "Users",
            Self::Database => "Database Monitor",
        }
    }

    fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Users => &["UID", "Email", "Created"],
            Self::Database => &["ID", "Email", "Role", "Created At"],
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Users => "registered",
            Self::Database => "found",
        }
    }

    pub fn empty_message(self) -> &'static str {
        match self {
            Self::Users => "No users found",
            Self::Database => "No data available.",
        }
    }

    pub fn loading_message(self) -> &'static str {
        match self {
            Self::Users => "Loading users...",
            Self::Database => "Loading data...",
        }
    }

    /// Shown in place of a missing value
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Users => "N/A",
            Self::Database => "null",
        }
    }

    fn created(self, creation_time: Option<i64>) -> String {
        let format = match self {
            Self::Users => "%d/%m/%Y",
            Self::Database => "%d/%m/%Y, %H:%M:%S",
        };
        creation_time
            .and_then(from_millis)
            .map(|t| t.format(format).to_string())
            .unwrap_or_else(|| self.placeholder().to_string())
    }

    fn row(self, user: &UserRecord) -> TableRow {
        let or_placeholder = |value: &str| {
            if value.is_empty() {
                self.placeholder().to_string()
            } else {
                value.to_string()
            }
        };

        let mut cells = vec![or_placeholder(&user.uid), or_placeholder(&user.email)];
        if self == Self::Database {
            cells.push(or_placeholder(user.role.as_deref().unwrap_or_default()));
        }
        cells.push(self.created(user.creation_time));

        TableRow {
            key: user.uid.clone(),
            cells,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TableRow {
    pub key: String,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub kind: RecordTable,
    pub title: String,
    /// e.g. "3 users registered"
    pub summary: String,
    pub loading: bool,
    pub loading_message: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    pub empty_message: Option<String>,
}

pub fn record_table(kind: RecordTable, live: &LiveView<UserRecord>) -> TableView {
    let loading = live.is_loading();
    let count = live.items.len();

    TableView {
        kind,
        title: kind.title().to_string(),
        summary: format!("{} {} {}", count, plural(count, "user", "users"), kind.verb()),
        loading,
        loading_message: loading.then(|| kind.loading_message().to_string()),
        columns: kind.columns().iter().map(|c| c.to_string()).collect(),
        rows: live.items.iter().map(|user| kind.row(user)).collect(),
        empty_message: (!loading && count == 0).then(|| kind.empty_message().to_string()),
    }
}
