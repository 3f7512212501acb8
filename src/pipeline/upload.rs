use std::path::Path;

use crate::error::ValidationError;

pub const FILE_REQUIRED: &str = "File is required";
pub const UNSUPPORTED_FORMAT: &str = "The file format is not supported. Please upload an audio file.";

/// One uploaded audio file as received at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadForm {
    pub filename: Option<String>,
    /// Declared MIME type, e.g. `audio/wav`.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadForm {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            filename: Some(filename.into()),
            content_type: Some(content_type.into()),
            bytes,
        }
    }

    /// Filename for display, falling back to `upload`.
    pub fn display_name(&self) -> &str {
        self.filename
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("upload")
    }
}

/// Run every boundary check and report all failures together.
pub fn validate_upload(form: &UploadForm) -> Result<(), ValidationError> {
    let mut reasons = Vec::new();
    let has_name = form
        .filename
        .as_deref()
        .is_some_and(|name| !name.trim().is_empty());
    if !has_name || form.bytes.is_empty() {
        reasons.push(FILE_REQUIRED.to_string());
    }
    if !is_audio_mime(form.content_type.as_deref()) {
        reasons.push(UNSUPPORTED_FORMAT.to_string());
    }
    if reasons.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { reasons })
    }
}

fn is_audio_mime(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .map(|essence| essence.trim().to_ascii_lowercase())
        .is_some_and(|essence| {
            essence
                .strip_prefix("audio/")
                .is_some_and(|subtype| !subtype.is_empty())
        })
}

/// MIME type implied by a file extension, for callers without a declared type.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "wav" | "wave" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        "flac" => Some("audio/flac"),
        "ogg" | "oga" => Some("audio/ogg"),
        "aif" | "aiff" => Some("audio/aiff"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_upload_passes() {
        let form = UploadForm::new("cry.wav", "audio/wav", vec![1, 2, 3]);
        assert!(validate_upload(&form).is_ok());
        let form = UploadForm::new("cry.ogg", "Audio/OGG; codecs=vorbis", vec![1]);
        assert!(validate_upload(&form).is_ok());
    }

    #[test]
    fn text_upload_lists_unsupported_format() {
        let form = UploadForm::new("notes.txt", "text/plain", b"hello".to_vec());
        let err = validate_upload(&form).unwrap_err();
        assert_eq!(err.reasons, vec![UNSUPPORTED_FORMAT.to_string()]);
    }

    #[test]
    fn missing_file_reports_every_reason() {
        let err = validate_upload(&UploadForm::default()).unwrap_err();
        assert_eq!(
            err.reasons,
            vec![FILE_REQUIRED.to_string(), UNSUPPORTED_FORMAT.to_string()]
        );
    }

    #[test]
    fn empty_bytes_count_as_missing_file() {
        let form = UploadForm::new("cry.wav", "audio/wav", Vec::new());
        let err = validate_upload(&form).unwrap_err();
        assert_eq!(err.reasons, vec![FILE_REQUIRED.to_string()]);
    }

    #[test]
    fn bare_audio_prefix_is_rejected() {
        assert!(!is_audio_mime(Some("audio/")));
        assert!(!is_audio_mime(Some("video/mp4")));
        assert!(!is_audio_mime(None));
    }

    #[test]
    fn extensions_map_to_audio_types() {
        assert_eq!(content_type_for_path(Path::new("a/b.WAV")), Some("audio/wav"));
        assert_eq!(content_type_for_path(Path::new("b.mp3")), Some("audio/mpeg"));
        assert_eq!(content_type_for_path(Path::new("notes.txt")), None);
        assert_eq!(content_type_for_path(Path::new("noext")), None);
    }
}
