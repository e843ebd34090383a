use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    Pending,
    #[serde(rename = "Installation Started")]
    InstallationStarted,
    #[serde(rename = "On-Going")]
    OnGoing,
    Completed,
    Stuck,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 5] = [
        ProjectStatus::Pending,
        ProjectStatus::InstallationStarted,
        ProjectStatus::OnGoing,
        ProjectStatus::Completed,
        ProjectStatus::Stuck,
    ];
}

/// An installation job assigned to an installer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub installer_id: String,
    pub client_name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub status: ProjectStatus,
}
