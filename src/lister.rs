// Fleet listing by ownership labels

use std::sync::Arc;

use crate::error::RuntimeError;
use crate::inspector::RuntimeInspector;
use crate::models::ContainerDescriptor;

/// Lists containers deployed by this platform, optionally narrowed to one owner.
pub struct ContainerLister {
    inspector: Arc<dyn RuntimeInspector>,
    platform_label: String,
    owner_label_key: String,
}

impl ContainerLister {
    /// `platform_label` is a full `key=value` filter; `owner_label_key` gets `=<owner>` appended.
    pub fn new(
        inspector: Arc<dyn RuntimeInspector>,
        platform_label: impl Into<String>,
        owner_label_key: impl Into<String>,
    ) -> Self {
        Self {
            inspector,
            platform_label: platform_label.into(),
            owner_label_key: owner_label_key.into(),
        }
    }

    pub fn label_filters(&self, owner: Option<&str>) -> Vec<String> {
        let mut labels = vec![self.platform_label.clone()];
        if let Some(owner) = owner.filter(|o| !o.is_empty()) {
            labels.push(format!("{}={}", self.owner_label_key, owner));
        }
        labels
    }

    /// Listing that keeps a runtime failure apart from an empty fleet.
    pub async fn try_list(
        &self,
        owner: Option<&str>,
    ) -> Result<Vec<ContainerDescriptor>, RuntimeError> {
        let labels = self.label_filters(owner);
        self.inspector.list_containers(&labels).await
    }

    /// Never fails: a runtime error is logged and reported as an empty fleet.
    pub async fn list(&self, owner: Option<&str>) -> Vec<ContainerDescriptor> {
        match self.try_list(owner).await {
            Ok(containers) => containers,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    operation = "list_containers",
                    owner = owner.unwrap_or("*"),
                    "container listing failed; reporting empty fleet"
                );
                Vec::new()
            }
        }
    }
}
