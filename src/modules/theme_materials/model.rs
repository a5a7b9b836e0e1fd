use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use classhero_core::AppError;

use crate::utils::multipart::{MultipartForm, UploadedFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    Text,
    Video,
    Link,
    Pdf,
    Quiz,
    Podcast,
    Other,
}

impl MaterialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Video => "video",
            Self::Link => "link",
            Self::Pdf => "pdf",
            Self::Quiz => "quiz",
            Self::Podcast => "podcast",
            Self::Other => "other",
        }
    }

    /// PDF and quiz materials are backed by an uploaded PDF.
    pub fn requires_file(&self) -> bool {
        matches!(self, Self::Pdf | Self::Quiz)
    }

    /// Storage folder for the uploaded file of this type.
    pub fn storage_folder(&self) -> &'static str {
        match self {
            Self::Quiz => "materials/quizzes",
            _ => "materials/pdfs",
        }
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "video" => Ok(Self::Video),
            "link" => Ok(Self::Link),
            "pdf" => Ok(Self::Pdf),
            "quiz" => Ok(Self::Quiz),
            "podcast" => Ok(Self::Podcast),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown material type: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct ThemeMaterial {
    pub material_id: Uuid,
    pub theme_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub material_type: String,
    /// Text body, external link, or public URL of the stored file
    pub content: String,
    pub order: i32,
    pub youtube_pt_url: Option<String>,
    pub youtube_en_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThemeMaterialResponse {
    pub data: ThemeMaterial,
}

/// Fields of a new material read from its multipart form.
#[derive(Debug)]
pub struct NewMaterial {
    pub theme_id: Uuid,
    pub material_type: MaterialType,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub order: i32,
    pub youtube_pt_url: Option<String>,
    pub youtube_en_url: Option<String>,
    pub file: Option<UploadedFile>,
}

impl NewMaterial {
    pub fn from_form(mut form: MultipartForm) -> Result<Self, AppError> {
        Ok(Self {
            theme_id: form.parse_required("theme_id")?,
            material_type: form.parse_required("type")?,
            title: form.required_text("title")?,
            description: form.text("description"),
            content: form.text("content"),
            order: form.parse_required("order")?,
            youtube_pt_url: form.text("youtube_pt_url"),
            youtube_en_url: form.text("youtube_en_url"),
            file: form.take_file(),
        })
    }
}

/// Changes to a material. `None` keeps the stored value.
#[derive(Debug)]
pub struct MaterialChanges {
    pub material_type: Option<MaterialType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub order: i32,
    pub youtube_pt_url: Option<String>,
    pub youtube_en_url: Option<String>,
    pub file: Option<UploadedFile>,
}

impl MaterialChanges {
    pub fn from_form(mut form: MultipartForm) -> Result<Self, AppError> {
        Ok(Self {
            material_type: form.parse("type")?,
            title: form.text("title"),
            description: form.text("description"),
            content: form.text("content"),
            order: form.parse_required("order")?,
            youtube_pt_url: form.text("youtube_pt_url"),
            youtube_en_url: form.text("youtube_en_url"),
            file: form.take_file(),
        })
    }
}

/// Multipart body of `POST /api/theme-materials`.
#[derive(ToSchema)]
pub struct CreateMaterialForm {
    pub theme_id: Uuid,
    #[schema(rename = "type")]
    pub material_type: MaterialType,
    pub title: String,
    pub description: Option<String>,
    /// Required unless the type is `pdf` or `quiz`
    pub content: Option<String>,
    pub order: i32,
    pub youtube_pt_url: Option<String>,
    pub youtube_en_url: Option<String>,
    /// PDF file, required for `pdf` and `quiz`
    #[schema(value_type = Option<String>, format = Binary)]
    pub file: Option<Vec<u8>>,
}

/// Multipart body of `PUT /api/theme-materials/{id}`.
#[derive(ToSchema)]
pub struct UpdateMaterialForm {
    #[schema(rename = "type")]
    pub material_type: Option<MaterialType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub order: i32,
    pub youtube_pt_url: Option<String>,
    pub youtube_en_url: Option<String>,
    /// Replacement PDF; the previous file is removed
    #[schema(value_type = Option<String>, format = Binary)]
    pub file: Option<Vec<u8>>,
}
