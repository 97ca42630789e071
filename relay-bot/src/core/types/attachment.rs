//! Files attached to inbound messages.

use serde::{Deserialize, Serialize};

/// A file attached to an inbound message, as the platform describes it. The bytes are fetched
/// on demand through [`crate::core::Bot::download`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    /// Platform id used to download the file.
    pub file_id: String,
    /// Name given by the sender; photos have none.
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    /// Size in bytes as reported by the platform.
    pub size: u64,
}

impl FileAttachment {
    pub fn new(file_id: impl Into<String>, size: u64) -> Self {
        Self {
            file_id: file_id.into(),
            file_name: None,
            mime_type: None,
            size,
        }
    }

    pub fn with_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Name for notes and logs.
    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("photo")
    }

    /// Lowercase extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name.as_deref()?;
        let (stem, ext) = name.rsplit_once('.')?;
        (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
    }
}
