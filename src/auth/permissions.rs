use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Administrator,
    Investor,
    Researcher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewAll,
    EditAll,
    DeleteAll,
    ManageUsers,
    ExportData,
    ViewAnalytics,
    DownloadReports,
}

const ADMINISTRATOR: &[Permission] = &[
    Permission::ViewAll,
    Permission::EditAll,
    Permission::DeleteAll,
    Permission::ManageUsers,
    Permission::ExportData,
    Permission::ViewAnalytics,
];

const INVESTOR: &[Permission] = &[
    Permission::ViewAll,
    Permission::ViewAnalytics,
    Permission::ExportData,
];

const RESEARCHER: &[Permission] = &[
    Permission::ViewAll,
    Permission::ViewAnalytics,
    Permission::DownloadReports,
];

impl Role {
    pub const ALL: [Role; 3] = [Role::Administrator, Role::Investor, Role::Researcher];

    pub fn permissions(self) -> &'static [Permission] {
        match self {
            Role::Administrator => ADMINISTRATOR,
            Role::Investor => INVESTOR,
            Role::Researcher => RESEARCHER,
        }
    }

    pub fn has(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Administrator => "Administrator",
            Role::Investor => "Investor",
            Role::Researcher => "Researcher",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("Unknown role: {s}"))
    }
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ViewAll => "view_all",
            Permission::EditAll => "edit_all",
            Permission::DeleteAll => "delete_all",
            Permission::ManageUsers => "manage_users",
            Permission::ExportData => "export_data",
            Permission::ViewAnalytics => "view_analytics",
            Permission::DownloadReports => "download_reports",
        }
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let permission = match s {
            "view_all" => Permission::ViewAll,
            "edit_all" => Permission::EditAll,
            "delete_all" => Permission::DeleteAll,
            "manage_users" => Permission::ManageUsers,
            "export_data" => Permission::ExportData,
            "view_analytics" => Permission::ViewAnalytics,
            "download_reports" => Permission::DownloadReports,
            other => return Err(format!("Unknown permission: {other}")),
        };
        Ok(permission)
    }
}

/// String-level permission check. Unknown roles and permissions grant nothing.
pub fn check_permission(role: &str, permission: &str) -> bool {
    match (role.parse::<Role>(), permission.parse::<Permission>()) {
        (Ok(role), Ok(permission)) => role.has(permission),
        _ => false,
    }
}
