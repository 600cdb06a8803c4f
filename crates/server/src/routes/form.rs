//! Multipart form reading for the editor endpoints.
//!
//! The whole form is buffered up front (bounded by the body limit layer) so
//! handlers can look fields up by name in any order.

use std::fmt::Display;
use std::str::FromStr;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;

use vitrine_core::{ImageUpload, SingleAssetField};

use crate::error::AppError;

/// File extensions accepted when the client sends no image content type.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "svg", "avif"];

/// A buffered multipart form.
#[derive(Debug, Default)]
pub struct MultipartForm {
    texts: Vec<(String, String)>,
    files: Vec<(String, ImageUpload)>,
}

impl MultipartForm {
    /// Read every part of the request.
    ///
    /// File inputs left empty by the browser (no name, no bytes) are ignored.
    ///
    /// # Errors
    ///
    /// - `PayloadTooLarge` if the body limit was hit.
    /// - `BadRequest` for malformed multipart data or a non-image file.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if let Some(filename) = field.file_name().map(str::to_owned) {
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if bytes.is_empty() {
                    continue;
                }
                validate_image(&filename, content_type.as_deref())?;
                form.files.push((
                    name,
                    ImageUpload::new(filename, content_type, bytes.to_vec()),
                ));
            } else {
                let text = field.text().await.map_err(multipart_error)?;
                form.texts.push((name, text));
            }
        }

        Ok(form)
    }

    /// First text value named `name`.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// First non-blank text value named `name`, trimmed.
    #[must_use]
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.text(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Every text value named `name`, in submission order.
    pub fn texts<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.texts
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Checkbox-style flag: `true`, `1` or `on`.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.text(name)
            .is_some_and(|v| matches!(v.trim(), "true" | "1" | "on"))
    }

    /// Parse the first non-blank value named `name`.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` if the value does not parse.
    pub fn parsed<T>(&self, name: &str) -> Result<Option<T>, AppError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.non_blank(name)
            .map(|v| {
                v.parse()
                    .map_err(|e| AppError::BadRequest(format!("{name}: {e}")))
            })
            .transpose()
    }

    /// Remove and return the first file named `name`.
    pub fn take_file(&mut self, name: &str) -> Option<ImageUpload> {
        let index = self.files.iter().position(|(n, _)| n == name)?;
        Some(self.files.remove(index).1)
    }

    /// Edit of a single-image field: a new `file` replaces the image, otherwise
    /// the `clear` flag empties it, otherwise the field is untouched (`None`).
    pub fn image_field(&mut self, file: &str, clear: &str) -> Option<SingleAssetField> {
        match self.take_file(file) {
            Some(upload) => Some(SingleAssetField::Empty.replace_with(upload)),
            None if self.flag(clear) => Some(SingleAssetField::Empty),
            None => None,
        }
    }

    /// Remove and return every file named `name`, in submission order.
    pub fn take_files(&mut self, name: &str) -> Vec<ImageUpload> {
        let (matching, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.files).into_iter().partition(|(n, _)| n == name);
        self.files = rest;
        matching.into_iter().map(|(_, upload)| upload).collect()
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// Accept `image/*` content types, or a known image extension when the
/// client sent a generic type.
fn validate_image(filename: &str, content_type: Option<&str>) -> Result<(), AppError> {
    if content_type.is_some_and(|ct| ct.starts_with("image/")) {
        return Ok(());
    }

    let has_image_extension = filename.rsplit_once('.').is_some_and(|(_, ext)| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    });

    if has_image_extension {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("{filename} is not an image")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> MultipartForm {
        MultipartForm {
            texts: vec![
                ("keep".into(), "a".into()),
                ("name".into(), "  Mug ".into()),
                ("keep".into(), "b".into()),
                ("clearLogo".into(), "on".into()),
                ("logoSize".into(), "abc".into()),
            ],
            files: vec![
                ("slide".into(), ImageUpload::new("1.png", None, vec![1])),
                ("logo".into(), ImageUpload::new("l.png", None, vec![2])),
                ("slide".into(), ImageUpload::new("2.png", None, vec![3])),
            ],
        }
    }

    #[test]
    fn test_text_lookups() {
        let form = form();
        assert_eq!(form.non_blank("name"), Some("Mug"));
        assert_eq!(form.texts("keep").collect::<Vec<_>>(), ["a", "b"]);
        assert!(form.flag("clearLogo"));
        assert!(!form.flag("clearBanner"));
        assert!(form.parsed::<u32>("logoSize").is_err());
        assert!(matches!(form.parsed::<u32>("bannerHeight"), Ok(None)));
    }

    #[test]
    fn test_take_files_keeps_order() {
        let mut form = form();
        let slides = form.take_files("slide");
        let names: Vec<_> = slides.iter().map(|u| u.filename.as_str()).collect();
        assert_eq!(names, ["1.png", "2.png"]);
        assert!(form.take_file("logo").is_some());
        assert!(form.take_file("logo").is_none());
    }

    #[test]
    fn test_validate_image() {
        assert!(validate_image("a.bin", Some("image/png")).is_ok());
        assert!(validate_image("photo.JPG", Some("application/octet-stream")).is_ok());
        assert!(validate_image("logo.svg", None).is_ok());
        assert!(validate_image("notes.txt", Some("text/plain")).is_err());
        assert!(validate_image("noext", None).is_err());
    }
}
