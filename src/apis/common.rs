use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lifecycle state of the cloud resource backing a custom resource.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceState {
    Pending,
    Provisioning,
    Available,
    Updating,
    Terminating,
    Terminated,
    Failed,
}

impl ResourceState {
    /// Whether the resource has settled and no further transition is expected.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Available | Self::Terminated | Self::Failed)
    }
}

/// Status subresource shared by every kind.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ResourceState>,
    /// OCID of the cloud resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}
