//! Reading `multipart/form-data` request bodies.
//!
//! Upload endpoints receive one file part plus plain text fields. The whole
//! form is buffered into a [`MultipartForm`] so handlers can validate fields
//! in any order.

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::anyhow;
use axum::body::Bytes;
use axum::extract::Multipart;

use classhero_core::AppError;

/// A file part of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    file: Option<UploadedFile>,
}

impl MultipartForm {
    /// Buffers every part. The part named `file_field` becomes the file;
    /// an empty file part counts as no file.
    pub async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::bad_request(anyhow!("Invalid multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == file_field {
                let filename = field.file_name().unwrap_or("file").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(anyhow!("Failed to read file: {}", e)))?;

                if !bytes.is_empty() {
                    form.file = Some(UploadedFile {
                        filename,
                        content_type,
                        bytes,
                    });
                }
            } else {
                let value = field.text().await.map_err(|e| {
                    AppError::bad_request(anyhow!("Failed to read field {}: {}", name, e))
                })?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Trimmed value of a text field; empty values count as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn required_text(&self, name: &str) -> Result<String, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::unprocessable(anyhow!("{} is required", name)))
    }

    /// Parses an optional field, answering 422 when it is present but malformed.
    pub fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, AppError> {
        match self.text(name) {
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|_| AppError::unprocessable(anyhow!("{} is invalid", name))),
            None => Ok(None),
        }
    }

    pub fn parse_required<T: FromStr>(&self, name: &str) -> Result<T, AppError> {
        self.parse(name)?
            .ok_or_else(|| AppError::unprocessable(anyhow!("{} is required", name)))
    }

    pub fn take_file(&mut self) -> Option<UploadedFile> {
        self.file.take()
    }

    #[cfg(test)]
    pub fn from_parts(fields: &[(&str, &str)], file: Option<UploadedFile>) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            file,
        }
    }
}
