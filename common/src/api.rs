use serde::{Deserialize, Serialize};
use crate::job::RunId;

/// Response of `POST /api/jobs/{id}/kill`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub killed: u32,
}

/// Response of `POST /api/jobs/{id}/run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTriggered {
    pub run_id: RunId,
}

/// Error body returned by the backend on non-2xx responses. `detail` is a
/// string for application errors and a list of field errors for rejected
/// payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let msgs: Vec<String> = items
                    .iter()
                    .map(|item| match item.get("msg").and_then(|m| m.as_str()) {
                        Some(msg) => msg.to_string(),
                        None => item.to_string(),
                    })
                    .collect();
                Some(msgs.join("; "))
            }
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Dir,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseItem {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Absolute path on the server, present for files.
    #[serde(default)]
    pub path: Option<String>,
}

/// Response of `GET /api/browse?path=P`. `path` is relative to the browse
/// root and is `"."` for the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BrowseListing {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub items: Vec<BrowseItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browse_listing_decodes_mixed_items() {
        let listing: BrowseListing = serde_json::from_str(
            r#"{"type":"dir","path":"scripts","items":[
                {"name":"nightly","type":"dir"},
                {"name":"backup.sh","type":"file","path":"/home/op/scripts/backup.sh"}]}"#,
        )
        .unwrap();
        assert_eq!(listing.items.len(), 2);
        assert_eq!(listing.items[0].kind, EntryKind::Dir);
        assert_eq!(listing.items[1].path.as_deref(), Some("/home/op/scripts/backup.sh"));
    }

    #[test]
    fn test_error_body_messages() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":"Job j9 not found"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("Job j9 not found"));

        let body: ErrorBody = serde_json::from_str(
            r#"{"detail":[{"loc":["body","name"],"msg":"field required"}]}"#,
        )
        .unwrap();
        assert_eq!(body.message().as_deref(), Some("field required"));

        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.message(), None);
    }

    #[test]
    fn test_kill_response_tolerates_missing_ok() {
        let resp: KillResponse = serde_json::from_str(r#"{"killed":2}"#).unwrap();
        assert_eq!(resp.killed, 2);
    }
}
