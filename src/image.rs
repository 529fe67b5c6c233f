use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as Base64;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Prefix every encoded image carries.
pub const DATA_URL_IMAGE_PREFIX: &str = "data:image/";

const BASE64_MARKER: &str = ";base64,";

/// Error type for building images out of user input.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// The media type does not describe an image.
    #[error("not an image: {0}")]
    NotAnImage(String),
    /// The string is not a base64 image data URL.
    #[error("invalid image data url")]
    InvalidDataUrl,
    /// The file contents could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A user selected image as a base64 data URL, e.g. `data:image/png;base64,iVBO...`.
///
/// Always non-empty and always starts with [`DATA_URL_IMAGE_PREFIX`]. Instances are
/// never modified once built; a new selection produces a new value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Encodes raw file bytes as a data URL for the given image media type.
    pub fn encode(media_type: &str, bytes: &[u8]) -> Result<Self, IntakeError> {
        if !is_image_media_type(media_type) {
            return Err(IntakeError::NotAnImage(media_type.to_string()));
        }
        Ok(Self(format!(
            "data:{}{}{}",
            media_type,
            BASE64_MARKER,
            Base64.encode(bytes)
        )))
    }

    /// Wraps an existing data URL, checking only its prefix and base64 marker.
    pub fn parse(data_url: impl Into<String>) -> Result<Self, IntakeError> {
        let data_url = data_url.into();
        if !data_url.starts_with(DATA_URL_IMAGE_PREFIX) || !data_url.contains(BASE64_MARKER) {
            return Err(IntakeError::InvalidDataUrl);
        }
        Ok(Self(data_url))
    }

    /// The media type embedded in the data URL, e.g. `image/png`.
    pub fn media_type(&self) -> &str {
        let rest = &self.0["data:".len()..];
        rest.split(';').next().unwrap_or(rest)
    }

    /// The full data URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the image, returning the data URL.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the contents of an [`ImageFile`] come from.
#[derive(Clone, Debug, PartialEq)]
pub enum FileSource {
    /// Contents already in memory.
    Bytes(Vec<u8>),
    /// Contents read lazily from disk when the intake processes the file.
    Path(PathBuf),
}

/// A file handed over by the user, before any validation.
///
/// The media type is whatever the caller reports; nothing inspects the contents.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageFile {
    pub name: String,
    pub media_type: String,
    pub source: FileSource,
}

impl ImageFile {
    /// Describes a file whose contents are already in memory.
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            source: FileSource::Bytes(bytes.into()),
        }
    }

    /// Describes a file on disk, deriving the media type from its extension.
    ///
    /// The file is not opened here.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        Self {
            name,
            media_type: media_type_from_path(path).to_string(),
            source: FileSource::Path(path.to_path_buf()),
        }
    }

    /// Whether the reported media type is an image type.
    pub fn is_image(&self) -> bool {
        is_image_media_type(&self.media_type)
    }

    /// Reads the full contents of the file.
    pub fn read(&self) -> Result<Vec<u8>, IntakeError> {
        match &self.source {
            FileSource::Bytes(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => Ok(std::fs::read(path)?),
        }
    }

    /// Reads the file and encodes it as a data URL.
    pub fn encode(&self) -> Result<EncodedImage, IntakeError> {
        if !self.is_image() {
            return Err(IntakeError::NotAnImage(self.media_type.clone()));
        }
        EncodedImage::encode(&self.media_type, &self.read()?)
    }
}

/// Whether a media type names an image, i.e. starts with `image/`.
pub fn is_image_media_type(media_type: &str) -> bool {
    media_type.starts_with("image/")
}

/// Guesses the media type of a file from its extension.
pub fn media_type_from_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_builds_data_url() {
        let image = EncodedImage::encode("image/png", b"abc").unwrap();
        assert_eq!(image.as_str(), "data:image/png;base64,YWJj");
        assert_eq!(image.media_type(), "image/png");
    }

    #[test]
    fn encode_rejects_non_image_types() {
        let err = EncodedImage::encode("text/plain", b"abc").unwrap_err();
        assert!(matches!(err, IntakeError::NotAnImage(ref t) if t == "text/plain"));
    }

    #[test]
    fn parse_checks_prefix() {
        assert!(EncodedImage::parse("data:image/jpeg;base64,AAAA").is_ok());
        assert!(EncodedImage::parse("data:text/plain;base64,AAAA").is_err());
        assert!(EncodedImage::parse("data:image/png,raw").is_err());
        assert!(EncodedImage::parse("").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let image = EncodedImage::encode("image/gif", b"x").unwrap();
        let json = serde_json::to_string(&image).unwrap();
        assert_eq!(json, "\"data:image/gif;base64,eA==\"");
    }

    #[test]
    fn media_type_follows_extension() {
        assert_eq!(media_type_from_path(Path::new("cat.JPG")), "image/jpeg");
        assert_eq!(media_type_from_path(Path::new("a/b/dog.webp")), "image/webp");
        assert_eq!(
            media_type_from_path(Path::new("notes.txt")),
            "application/octet-stream"
        );
        assert_eq!(
            media_type_from_path(Path::new("no_extension")),
            "application/octet-stream"
        );
    }

    #[test]
    fn image_file_from_path_keeps_name() {
        let file = ImageFile::from_path("/tmp/photos/cat.png");
        assert_eq!(file.name, "cat.png");
        assert_eq!(file.media_type, "image/png");
        assert!(file.is_image());
    }

    #[test]
    fn missing_file_surfaces_io_error() {
        let file = ImageFile::from_path("/definitely/not/here.png");
        assert!(matches!(file.encode(), Err(IntakeError::Io(_))));
    }
}
