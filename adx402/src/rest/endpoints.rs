use std::path::Path;

use reqwest::multipart::{Form, Part};

use super::{Adx402HttpClient, PaidResponse, SubmitOptions};
use crate::error::{Adx402Error, Result};
use crate::types::*;
use crate::utils::{image_content_type, validate_target_url};

/// An ad creative ready to upload.
#[derive(Debug, Clone)]
pub struct AdUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub target_url: String,
    pub tags: Vec<String>,
}

impl AdUpload {
    /// Validate an in-memory creative and its target link.
    pub fn new(
        file_name: &str,
        data: Vec<u8>,
        target_url: &str,
        tags: Vec<String>,
    ) -> Result<Self> {
        if data.is_empty() {
            return Err(Adx402Error::Validation(format!("{file_name} is empty")));
        }
        let content_type = image_content_type(file_name)?;
        if !target_url.trim().is_empty() {
            validate_target_url(target_url)?;
        }
        Ok(Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            data,
            target_url: target_url.trim().to_string(),
            tags,
        })
    }

    /// Read a creative from disk.
    pub async fn from_path(path: &Path, target_url: &str, tags: Vec<String>) -> Result<Self> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            Adx402Error::Validation(format!("cannot read {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Adx402Error::Validation(format!("bad file name: {}", path.display())))?;
        Self::new(file_name, data, target_url, tags)
    }

    fn form(&self) -> Result<Form> {
        let part = Part::bytes(self.data.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)
            .map_err(|e| Adx402Error::Validation(format!("content type: {e}")))?;
        let mut form = Form::new().part("file", part);
        if !self.target_url.is_empty() {
            form = form.text("targetUrl", self.target_url.clone());
        }
        if !self.tags.is_empty() {
            form = form.text("tags", self.tags.join(","));
        }
        Ok(form)
    }
}

impl Adx402HttpClient {
    // --- Wallet verification ---

    /// POST {x402}/verify - Submit a signed ownership challenge.
    pub async fn verify(&self, x402_endpoint: &str, req: &VerifyRequest) -> Result<VerifyResponse> {
        let url = format!("{}/verify", x402_endpoint.trim_end_matches('/'));
        self.post_json(&url, req).await
    }

    // --- Brand ---

    /// POST /brand/ad?wallet= - Upload an ad creative (multipart, paid).
    pub async fn upload_ad(
        &self,
        wallet: &str,
        ad: &AdUpload,
        opts: &SubmitOptions,
    ) -> Result<PaidResponse<UploadAdResponse>> {
        let url = self.url("/brand/ad");
        self.send_paid(
            || {
                Ok(self
                    .http()
                    .post(&url)
                    .query(&[("wallet", wallet)])
                    .multipart(ad.form()?))
            },
            opts,
        )
        .await
    }

    // --- Publisher ---

    /// POST /publisher/create - Register a publisher domain (paid).
    pub async fn register_publisher(
        &self,
        req: &RegisterPublisherRequest,
        opts: &SubmitOptions,
    ) -> Result<PaidResponse<RegisterPublisherResponse>> {
        let url = self.url("/publisher/create");
        self.send_paid(|| Ok(self.http().post(&url).json(req)), opts)
            .await
    }

    /// POST /publisher/create-slot - Create an ad slot (paid).
    pub async fn create_slot(
        &self,
        req: &CreateSlotRequest,
        opts: &SubmitOptions,
    ) -> Result<PaidResponse<CreateSlotResponse>> {
        let url = self.url("/publisher/create-slot");
        self.send_paid(|| Ok(self.http().post(&url).json(req)), opts)
            .await
    }
}
