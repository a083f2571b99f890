use std::collections::HashMap;

use async_trait::async_trait;
use axum::extract::{FromRequest, Multipart, Request};
use bytes::Bytes;

use crate::error::ApiError;

/// A file part of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub body: Bytes,
    pub content_type: String,
    pub file_name: Option<String>,
}

/// A fully buffered multipart body: text parts and file parts by field name.
///
/// A part counts as a file when it carries a filename. File parts with an
/// empty body are dropped, which is what browsers send for an untouched
/// file input.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    /// Text value as sent, `None` when missing or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    async fn read(mut mp: Multipart) -> Result<Self, ApiError> {
        let mut form = FormData::default();
        while let Some(field) = mp.next_field().await.map_err(malformed)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if field.file_name().is_some() {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = field.bytes().await.map_err(malformed)?;
                if body.is_empty() {
                    continue;
                }
                form.files.insert(
                    name,
                    UploadedFile {
                        body,
                        content_type,
                        file_name,
                    },
                );
            } else {
                let value = field.text().await.map_err(malformed)?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }
}

fn malformed(e: impl std::fmt::Display) -> ApiError {
    ApiError::Validation(format!("Malformed multipart body: {e}"))
}

#[async_trait]
impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mp = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        FormData::read(mp).await
    }
}
