use std::path::Path;
use std::time::Duration;

use bon::Builder;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use uuid::Uuid;

use crate::error::InsurError;

/// Body of an outgoing request.
///
/// Bodies are kept as plain data so that the single retry after a token
/// refresh can rebuild the exact same request.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartBody),
}

impl RequestBody {
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self, InsurError> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }
}

/// A file to upload as one multipart field.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = guess_mime_type(&file_name).to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Read a file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, InsurError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                InsurError::InvalidArgument(format!("invalid file name: {}", path.display()))
            })?;
        Ok(Self::new(file_name, bytes))
    }
}

#[derive(Debug, Clone)]
enum MultipartField {
    Text { name: String, value: String },
    File { name: String, upload: FileUpload },
}

/// Multipart form fields, rebuilt into a reqwest form per attempt.
#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    fields: Vec<MultipartField>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push(MultipartField::Text {
            name: name.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn file(mut self, name: impl Into<String>, upload: FileUpload) -> Self {
        self.fields.push(MultipartField::File {
            name: name.into(),
            upload,
        });
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| match field {
            MultipartField::Text { name, .. } | MultipartField::File { name, .. } => name.as_str(),
        })
    }

    pub(crate) fn to_form(&self) -> Result<Form, InsurError> {
        let mut form = Form::new();
        for field in &self.fields {
            form = match field {
                MultipartField::Text { name, value } => form.text(name.clone(), value.clone()),
                MultipartField::File { name, upload } => {
                    let part = Part::bytes(upload.bytes.clone())
                        .file_name(upload.file_name.clone())
                        .mime_str(&upload.mime_type)
                        .map_err(|err| {
                            InsurError::InvalidArgument(format!(
                                "invalid mime type {}: {err}",
                                upload.mime_type
                            ))
                        })?;
                    form.part(name.clone(), part)
                }
            };
        }
        Ok(form)
    }
}

/// Per-request knobs.
#[derive(Debug, Clone, Default, Builder)]
pub struct RequestOptions {
    /// Query string pairs, appended in order.
    #[builder(default)]
    pub query: Vec<(String, String)>,
    /// Overrides the client-wide timeout.
    pub timeout: Option<Duration>,
    /// Send without credentials and skip refresh handling (login, register).
    #[builder(default)]
    pub anonymous: bool,
}

impl RequestOptions {
    pub fn query(pairs: impl IntoIterator<Item = (impl Into<String>, impl ToString)>) -> Self {
        Self {
            query: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn anonymous() -> Self {
        Self {
            anonymous: true,
            ..Self::default()
        }
    }

    /// Append a pair only when `value` is present.
    pub fn with_optional(mut self, key: &str, value: Option<impl ToString>) -> Self {
        if let Some(value) = value {
            self.query.push((key.to_string(), value.to_string()));
        }
        self
    }
}

/// One logical API call, including its automatic retry.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    id: Uuid,
    method: Method,
    path: String,
    body: RequestBody,
    options: RequestOptions,
    retried: bool,
}

impl RequestDescriptor {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        body: RequestBody,
        options: RequestOptions,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            body,
            options,
            retried: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// Mark the request as retried. Returns `true` only on the first call.
    pub fn mark_retried(&mut self) -> bool {
        !std::mem::replace(&mut self.retried, true)
    }
}

fn guess_mime_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "txt" => "text/plain",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}
