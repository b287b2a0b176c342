//! Drop and upload intake: library drag payloads and dropped image files.

use crate::config::ImagePolicy;
use crate::media::{self, ImageFormat, MediaError};
use crate::scene::{CUSTOM_IMAGE_PLACEHOLDER, TokenKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors from the import paths.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid drag payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("{0} is not an image")]
    NotAnImage(String),
    #[error("could not read {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: MediaError,
    },
    #[error("no upload is pending")]
    NoPendingUpload,
}

/// What a library drag carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragKind {
    Asset,
    Character,
    Npc,
    Monster,
}

impl DragKind {
    /// Token kind for reference drags.
    pub fn token_kind(self) -> Option<TokenKind> {
        match self {
            DragKind::Asset => None,
            DragKind::Character => Some(TokenKind::Character),
            DragKind::Npc => Some(TokenKind::Npc),
            DragKind::Monster => Some(TokenKind::Monster),
        }
    }
}

/// JSON payload attached to drags from the library panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragPayload {
    #[serde(rename = "type")]
    pub kind: DragKind,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// What a parsed payload asks the editor to do.
#[derive(Debug, Clone, PartialEq)]
pub enum DropIntent {
    /// Malformed payload (no id). Nothing happens.
    Ignore,
    /// Remember the drop position and open the file chooser.
    RequestUpload,
    PlaceAsset {
        asset_type: String,
    },
    PlaceToken {
        kind: TokenKind,
        reference_id: String,
        label: String,
        image: Option<String>,
    },
}

impl DragPayload {
    pub fn parse(json: &str) -> Result<Self, ImportError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decide what dropping this payload does.
    pub fn intent(&self) -> DropIntent {
        let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) else {
            return DropIntent::Ignore;
        };
        match self.kind.token_kind() {
            None => match self.asset_type.as_deref() {
                Some(CUSTOM_IMAGE_PLACEHOLDER) => DropIntent::RequestUpload,
                Some(asset_type) if !asset_type.is_empty() => DropIntent::PlaceAsset {
                    asset_type: asset_type.to_string(),
                },
                _ => DropIntent::Ignore,
            },
            Some(kind) => DropIntent::PlaceToken {
                kind,
                reference_id: id.to_string(),
                label: self
                    .name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| "Unknown".to_string()),
                image: self.image_url.clone(),
            },
        }
    }
}

/// A file dropped onto the canvas or picked in the upload dialog.
#[derive(Debug, Clone)]
pub struct DroppedFile {
    pub name: String,
    /// MIME type reported by the host, if any.
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl DroppedFile {
    pub fn new(name: impl Into<String>, mime: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime,
            bytes,
        }
    }

    /// Whether the host or the file content says this is a decodable image.
    pub fn is_image(&self) -> bool {
        if let Some(mime) = &self.mime {
            return ImageFormat::from_mime(mime).is_some();
        }
        let by_extension = Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageFormat::from_extension);
        by_extension.is_some() || ImageFormat::from_magic_bytes(&self.bytes).is_some()
    }

    /// File name without extension, used as the asset label.
    pub fn label(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
            .to_string()
    }
}

/// An uploaded image ready to be placed.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    pub data_url: String,
    pub label: Option<String>,
}

/// Decode and recompress an uploaded file.
///
/// Pure and `Send`: hosts may run it on a worker and hand the result to
/// [`Editor::place_uploaded_image`](crate::editor::Editor::place_uploaded_image).
pub fn prepare_image(file: &DroppedFile, policy: ImagePolicy) -> Result<PreparedImage, ImportError> {
    if !file.is_image() {
        return Err(ImportError::NotAnImage(file.name.clone()));
    }
    let encoded = media::recompress(&file.bytes, policy).map_err(|source| ImportError::Decode {
        name: file.name.clone(),
        source,
    })?;
    log::debug!(
        "Prepared {} ({} bytes) as {}x{}",
        file.name,
        file.bytes.len(),
        encoded.width,
        encoded.height
    );
    Ok(PreparedImage {
        data_url: encoded.data_url,
        label: Some(file.label()),
    })
}
