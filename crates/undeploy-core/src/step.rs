//! Steps of a director teardown

use serde::{Deserialize, Serialize};

/// One step of [`crate::TeardownOrchestrator::decommission`], in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownStep {
    /// Read the director's public address from the outputs store
    LookupDirectorAddress,
    /// Force-delete the deployment running on the director
    RemoveDeployment,
    /// Recompute gateway and internal addresses from the public CIDR
    DeriveNetwork,
    /// Collect the remaining environment fields
    GatherDescriptor,
    /// Delete the director VM and its disks
    DeleteEnvironment,
}

impl TeardownStep {
    /// Whether the deployment has already been removed when this step runs.
    pub fn is_past_commit_point(self) -> bool {
        self >= TeardownStep::RemoveDeployment
    }
}

impl std::fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeardownStep::LookupDirectorAddress => write!(f, "lookup-director-address"),
            TeardownStep::RemoveDeployment => write!(f, "remove-deployment"),
            TeardownStep::DeriveNetwork => write!(f, "derive-network"),
            TeardownStep::GatherDescriptor => write!(f, "gather-descriptor"),
            TeardownStep::DeleteEnvironment => write!(f, "delete-environment"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_point() {
        assert!(!TeardownStep::LookupDirectorAddress.is_past_commit_point());
        assert!(TeardownStep::RemoveDeployment.is_past_commit_point());
        assert!(TeardownStep::DeleteEnvironment.is_past_commit_point());
    }
}
