//! Multipart upload handling shared by the grading endpoints.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::Bytes;
use lumigrade_core::constants::{IMAGE_FIELD, MISSING_IMAGE_MESSAGE};
use lumigrade_core::AppError;
use lumigrade_processing::geometry::DEFAULT_ASPECT;
use lumigrade_processing::{parse_aspect, GeometryParams, GradingConfig, ProRequest, Straighten};
use tempfile::NamedTempFile;

/// Uploaded photo spooled to disk. The file is removed when this drops.
#[derive(Debug)]
pub struct TempUpload {
    file: NamedTempFile,
    len: usize,
}

impl TempUpload {
    /// Write `data` to a fresh temp file in `dir` (or the system temp dir).
    pub async fn persist(dir: Option<PathBuf>, data: Bytes) -> Result<Self, AppError> {
        let len = data.len();
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
            let mut builder = tempfile::Builder::new();
            builder.prefix("lumigrade-");
            let mut file = match dir {
                Some(dir) => builder.tempfile_in(dir)?,
                None => builder.tempfile()?,
            };
            file.write_all(&data)?;
            file.flush()?;
            Ok(file)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Upload task failed: {}", e)))??;

        tracing::debug!(path = %file.path().display(), bytes = len, "Stored upload");
        Ok(Self { file, len })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size_bytes(&self) -> usize {
        self.len
    }
}

/// Parts of a grading form: the photo bytes and every text field
#[derive(Debug, Default)]
pub struct UploadForm {
    pub image: Option<Bytes>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// The photo, or the documented 400 when it is absent or empty
    pub fn require_image(&mut self) -> Result<Bytes, AppError> {
        self.image
            .take()
            .filter(|data| !data.is_empty())
            .ok_or_else(|| AppError::InvalidInput(MISSING_IMAGE_MESSAGE.to_string()))
    }

    /// Options of a pro request. Unparsable values fall back to their defaults.
    pub fn pro_request(&self, grading: &GradingConfig) -> ProRequest {
        let max_dim = self.field("maxDim").and_then(|s| s.parse::<u32>().ok());
        let defaults = GeometryParams::new(grading.effective_max_dim(max_dim));

        let straighten = self
            .field("straighten")
            .and_then(Straighten::parse)
            .unwrap_or(defaults.straighten);
        let vertical = self
            .field("vertical")
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(defaults.vertical);
        // A malformed ratio means no crop, not the default ratio
        let aspect = parse_aspect(Some(self.field("aspect").unwrap_or(DEFAULT_ASPECT)));

        ProRequest {
            tone: self.field("tone").map(str::to_string),
            geometry: GeometryParams {
                max_dim: defaults.max_dim,
                straighten,
                vertical,
                aspect,
            },
        }
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", err.body_text()))
    }
}

/// Collect the `image` part and the text fields of a multipart form.
/// Only one `image` part is accepted. A request that is not
/// `multipart/form-data` at all is reported as a missing image.
pub async fn read_upload_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadForm, AppError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(rejection = %rejection.body_text(), "Request is not a multipart form");
        AppError::InvalidInput(MISSING_IMAGE_MESSAGE.to_string())
    })?;
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if name == IMAGE_FIELD {
            if form.image.is_some() {
                return Err(AppError::InvalidInput(format!(
                    "Multiple '{}' fields are not allowed",
                    IMAGE_FIELD
                )));
            }
            form.image = Some(field.bytes().await.map_err(multipart_error)?);
        } else if !name.is_empty() {
            let value = field.text().await.map_err(multipart_error)?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumigrade_processing::geometry::{DEFAULT_STRAIGHTEN_DEG, DEFAULT_VERTICAL};

    fn form(fields: &[(&str, &str)]) -> UploadForm {
        UploadForm {
            image: None,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_pro_defaults() {
        let request = form(&[]).pro_request(&GradingConfig::default());
        assert_eq!(request.tone, None);
        assert_eq!(request.geometry.max_dim, 2560);
        assert_eq!(
            request.geometry.straighten,
            Straighten::Degrees(DEFAULT_STRAIGHTEN_DEG)
        );
        assert_eq!(request.geometry.vertical, DEFAULT_VERTICAL);
        let aspect = request.geometry.aspect.unwrap();
        assert!((aspect - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_pro_parses_fields() {
        let request = form(&[
            ("tone", "dusk"),
            ("maxDim", "1200"),
            ("straighten", "auto"),
            ("vertical", "-0.1"),
            ("aspect", "16:9"),
        ])
        .pro_request(&GradingConfig::default());
        assert_eq!(request.tone.as_deref(), Some("dusk"));
        assert_eq!(request.geometry.max_dim, 1200);
        assert_eq!(request.geometry.straighten, Straighten::Auto);
        assert_eq!(request.geometry.vertical, -0.1);
        assert!((request.geometry.aspect.unwrap() - 16.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_pro_garbage_falls_back() {
        let request = form(&[
            ("maxDim", "huge"),
            ("straighten", "level"),
            ("vertical", "NaN"),
            ("aspect", "wide"),
        ])
        .pro_request(&GradingConfig::default());
        assert_eq!(request.geometry.max_dim, 2560);
        assert_eq!(
            request.geometry.straighten,
            Straighten::Degrees(DEFAULT_STRAIGHTEN_DEG)
        );
        assert_eq!(request.geometry.vertical, DEFAULT_VERTICAL);
        assert_eq!(request.geometry.aspect, None);
    }

    #[test]
    fn test_pro_max_dim_is_capped() {
        let request = form(&[("maxDim", "50000")]).pro_request(&GradingConfig::default());
        assert_eq!(request.geometry.max_dim, 8192);
    }

    #[test]
    fn test_missing_or_empty_image() {
        let err = form(&[]).require_image().unwrap_err();
        assert_eq!(err.to_string(), format!("Invalid input: {}", MISSING_IMAGE_MESSAGE));

        let mut empty = UploadForm {
            image: Some(Bytes::new()),
            ..UploadForm::default()
        };
        assert!(empty.require_image().is_err());
    }

    #[tokio::test]
    async fn test_temp_upload_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let upload = TempUpload::persist(Some(dir.path().to_path_buf()), Bytes::from_static(b"abc"))
            .await
            .unwrap();
        let path = upload.path().to_path_buf();
        assert!(path.starts_with(dir.path()));
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
        assert_eq!(upload.size_bytes(), 3);

        drop(upload);
        assert!(!path.exists());
    }
}
