use std::{fmt, fs, path::Path};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use log::debug;

use crate::error::{Error, Result};

pub const DEFAULT_CONTENT_TYPE: &str = "image/png";

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
];

/// Raw image bytes plus the content type guessed from the file name. The bytes are never
/// decoded.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    content_type: &'static str,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, content_type: &'static str) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| Error::io("read", path, e))?;
        let content_type = content_type_for(path);
        debug!(
            "Loaded {} ({content_type}, {} bytes)",
            path.display(),
            bytes.len()
        );

        Ok(Self {
            bytes,
            content_type,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn extension(path: &str) -> Option<String> {
    path.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

fn lookup(ext: &str) -> Option<&'static str> {
    CONTENT_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, content_type)| *content_type)
}

pub fn content_type_for(path: impl AsRef<Path>) -> &'static str {
    extension(&path.as_ref().to_string_lossy())
        .as_deref()
        .and_then(lookup)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

pub fn has_image_extension(token: &str) -> bool {
    extension(token).as_deref().and_then(lookup).is_some()
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn content_types_are_case_insensitive() {
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("dir/b.JPG"), "image/jpeg");
        assert_eq!(content_type_for("c.Jpeg"), "image/jpeg");
        assert_eq!(content_type_for("d.gif"), "image/gif");
        assert_eq!(content_type_for("e.WEBP"), "image/webp");
        assert_eq!(content_type_for("f.bmp"), "image/bmp");
    }

    #[test]
    fn unknown_extensions_default_to_png() {
        assert_eq!(content_type_for("scan.tiff"), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for("no_extension"), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for("trailing."), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn image_extension_detection() {
        assert!(has_image_extension("shot.PNG"));
        assert!(!has_image_extension("notes.txt"));
        assert!(!has_image_extension("png"));
    }

    #[test]
    fn load_keeps_bytes_verbatim() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".webp").tempfile().unwrap();
        file.write_all(&[1, 2, 3, 250]).unwrap();

        let payload = ImagePayload::load(file.path())?;
        assert_eq!(payload.bytes(), &[1, 2, 3, 250]);
        assert_eq!(payload.content_type(), "image/webp");
        assert_eq!(payload.to_base64(), "AQID+g==");
        Ok(())
    }

    #[test]
    fn missing_file_is_reported() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("gone.png");

        let err = ImagePayload::load(&path).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
        assert!(err.to_string().contains("gone.png"));
    }
}
