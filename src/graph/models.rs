// ABOUTME: Wire models for the drive API responses used by the workflow
// ABOUTME: Only the fields the workflow reads are modelled; the rest is ignored

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub parent_reference: Option<ItemReference>,
}

impl DriveItem {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_reference
            .as_ref()
            .and_then(|parent| parent.id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReference {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub drive_id: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drive {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub drive_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_item_parent_id() {
        let item: DriveItem = serde_json::from_str(
            r#"{"id":"ITEM1","name":"Letter.docx","parentReference":{"id":"PARENT1","driveId":"D1"}}"#,
        )
        .unwrap();
        assert_eq!(item.id.as_deref(), Some("ITEM1"));
        assert_eq!(item.parent_id(), Some("PARENT1"));

        let root: DriveItem = serde_json::from_str(r#"{"id":"ROOT","parentReference":{"id":""}}"#).unwrap();
        assert_eq!(root.parent_id(), None);
    }
}
