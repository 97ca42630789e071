//! # Files
//!
//! Turns attachments of an inbound message into model input before the turn is recorded.
//!
//! - **Text files** are downloaded and inlined into the question as a fenced block.
//! - **Images** become base64 `data:` URLs for vision models, only when image access is on.
//! - Everything else, oversized files and failed downloads leave a short note instead.

use base64::Engine as _;
use prompt::AttachmentRef;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::{Bot, FileAttachment};

/// Largest file downloaded for the model (20 MB, the vision API limit).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Extensions of files inlined as text.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "csv", "tsv", "json", "yaml", "yml", "toml", "xml", "html", "css",
    "js", "ts", "jsx", "tsx", "py", "rb", "rs", "go", "java", "kt", "scala", "swift", "c", "h",
    "cpp", "hpp", "cs", "fs", "hs", "lua", "php", "pl", "r", "sql", "sh", "ps1", "dart", "clj",
    "ex", "erl", "ml", "vb", "diff", "log", "ini", "cfg", "tex", "rtf", "vcf", "eml",
];

/// Text-like media types beyond `text/*`.
const TEXT_MIME_TYPES: &[&str] = &[
    "application/json",
    "application/xml",
    "application/javascript",
    "application/x-yaml",
    "application/toml",
];

/// Image media types vision models accept.
const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Text,
    /// An image with the media type to send it as.
    Image(&'static str),
    Other,
}

fn image_mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Decides how a file reaches the model, from its media type first and its extension second.
pub fn categorize(attachment: &FileAttachment) -> FileCategory {
    let mime = attachment.mime_type.as_deref().map(str::to_ascii_lowercase);
    if let Some(mime) = mime.as_deref() {
        if let Some(image) = IMAGE_MIME_TYPES.iter().find(|m| **m == mime) {
            return FileCategory::Image(*image);
        }
        if mime.starts_with("text/") || TEXT_MIME_TYPES.iter().any(|m| *m == mime) {
            return FileCategory::Text;
        }
    }
    match attachment.extension() {
        Some(ext) if TEXT_EXTENSIONS.iter().any(|t| *t == ext) => FileCategory::Text,
        Some(ext) => image_mime_for_extension(&ext).map_or(FileCategory::Other, FileCategory::Image),
        None => FileCategory::Other,
    }
}

/// What the model gets from a message's attachments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFiles {
    /// Inlined file contents and notes about skipped files, in attachment order.
    pub notes: Vec<String>,
    pub images: Vec<AttachmentRef>,
}

impl ResolvedFiles {
    /// `question` followed by every note, separated by blank lines.
    pub fn apply_to(&self, question: &str) -> String {
        std::iter::once(question)
            .chain(self.notes.iter().map(String::as_str))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Limits applied while resolving attachments.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSettings {
    /// Send images to the model. Off by default.
    pub image_access: bool,
    pub max_file_size: u64,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            image_access: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Downloads attachments through the [`Bot`] and converts them to model input.
pub struct FileResolver {
    bot: Arc<dyn Bot>,
    settings: FileSettings,
}

impl FileResolver {
    pub fn new(bot: Arc<dyn Bot>, settings: FileSettings) -> Self {
        Self { bot, settings }
    }

    pub fn settings(&self) -> &FileSettings {
        &self.settings
    }

    pub async fn resolve(&self, attachments: &[FileAttachment]) -> ResolvedFiles {
        let mut resolved = ResolvedFiles::default();
        for attachment in attachments {
            self.resolve_one(attachment, &mut resolved).await;
        }
        if !attachments.is_empty() {
            debug!(
                attachments = attachments.len(),
                notes = resolved.notes.len(),
                images = resolved.images.len(),
                "Attachments resolved"
            );
        }
        resolved
    }

    async fn resolve_one(&self, attachment: &FileAttachment, resolved: &mut ResolvedFiles) {
        let name = attachment.display_name();
        let category = categorize(attachment);

        if category == FileCategory::Other {
            resolved
                .notes
                .push(format!("[Skipped unsupported file: {}]", name));
            return;
        }
        if matches!(category, FileCategory::Image(_)) && !self.settings.image_access {
            resolved
                .notes
                .push(format!("[Skipped image: {} (image access is disabled)]", name));
            return;
        }
        if attachment.size > self.settings.max_file_size {
            info!(file = %name, size = attachment.size, "Skipping file over the size limit");
            resolved.notes.push(format!(
                "[Skipped file exceeding size limit: {} ({} bytes)]",
                name, attachment.size
            ));
            return;
        }

        let bytes = match self.bot.download(&attachment.file_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = %name, error = %e, "Failed to download attachment");
                resolved
                    .notes
                    .push(format!("[Failed to download file: {}]", name));
                return;
            }
        };

        match category {
            FileCategory::Text => match String::from_utf8(bytes) {
                Ok(text) => {
                    info!(file = %name, size = text.len(), "Inlined text attachment");
                    resolved
                        .notes
                        .push(format!("File: {}\n```\n{}\n```", name, text.trim_end()));
                }
                Err(_) => resolved
                    .notes
                    .push(format!("[Skipped file that is not UTF-8 text: {}]", name)),
            },
            FileCategory::Image(media_type) => {
                let data = base64::engine::general_purpose::STANDARD.encode(&bytes);
                info!(file = %name, mime = media_type, size = bytes.len(), "Encoded image attachment");
                resolved
                    .images
                    .push(AttachmentRef::data_url(media_type, &data));
            }
            FileCategory::Other => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, mime: Option<&str>) -> FileAttachment {
        let file = FileAttachment::new("id", 10).with_name(name);
        match mime {
            Some(mime) => file.with_mime_type(mime),
            None => file,
        }
    }

    #[test]
    fn test_categorize() {
        assert_eq!(categorize(&doc("a.rs", None)), FileCategory::Text);
        assert_eq!(categorize(&doc("a.bin", Some("text/plain"))), FileCategory::Text);
        assert_eq!(categorize(&doc("data", Some("application/json"))), FileCategory::Text);
        assert_eq!(categorize(&doc("a.PNG", None)), FileCategory::Image("image/png"));
        assert_eq!(
            categorize(&FileAttachment::new("id", 1).with_mime_type("image/jpeg")),
            FileCategory::Image("image/jpeg")
        );
        assert_eq!(categorize(&doc("a.pdf", Some("application/pdf"))), FileCategory::Other);
        assert_eq!(categorize(&doc("a.tiff", None)), FileCategory::Other);
        assert_eq!(categorize(&FileAttachment::new("id", 1)), FileCategory::Other);
    }

    #[test]
    fn test_apply_to() {
        let resolved = ResolvedFiles {
            notes: vec![
                "File: a.txt\n```\nhi\n```".to_string(),
                "[Skipped unsupported file: b.pdf]".to_string(),
            ],
            images: Vec::new(),
        };
        assert_eq!(
            resolved.apply_to("read this"),
            "read this\n\nFile: a.txt\n```\nhi\n```\n\n[Skipped unsupported file: b.pdf]"
        );
        assert_eq!(
            resolved.apply_to(""),
            "File: a.txt\n```\nhi\n```\n\n[Skipped unsupported file: b.pdf]"
        );
        assert_eq!(ResolvedFiles::default().apply_to("q"), "q");
    }
}
