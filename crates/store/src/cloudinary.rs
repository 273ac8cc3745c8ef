//! Media Host client for the Cloudinary upload API.
//!
//! Uploads are unsigned (an upload preset authorises them). Asset deletion
//! is a signed call and needs `MEDIA_API_KEY` / `MEDIA_API_SECRET`.

use async_trait::async_trait;
use creativestalk_core::media::HostedAssetKey;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::MediaHostConfig;
use crate::error::MediaHostError;
use crate::media_host::{DestroyOutcome, MediaHost, MediaUpload, UploadedAsset};

/// Response of the `auto/upload` endpoint (fields we use).
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    resource_type: String,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

/// Response of the `destroy` endpoint.
#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// HTTP client for one Cloudinary cloud.
pub struct HttpMediaHost {
    client: reqwest::Client,
    config: MediaHostConfig,
}

impl HttpMediaHost {
    pub fn new(config: MediaHostConfig) -> Result<Self, MediaHostError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, resource_type: &str, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{resource_type}/{action}",
            self.config.base_url, self.config.cloud_name
        )
    }

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, MediaHostError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(MediaHostError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, MediaHostError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Sign request parameters: `k1=v1&k2=v2` sorted by key, followed by the
/// API secret, hashed with SHA-256 and hex encoded.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{:x}", Sha256::digest(format!("{joined}{api_secret}")))
}

/// Derive a poster-frame URL for a hosted video by swapping its extension.
fn video_poster_url(secure_url: &str) -> Option<String> {
    let (prefix, file) = secure_url.rsplit_once('/')?;
    let (stem, _ext) = file.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(format!("{prefix}/{stem}.jpg"))
}

#[async_trait]
impl MediaHost for HttpMediaHost {
    async fn upload(&self, upload: MediaUpload) -> Result<UploadedAsset, MediaHostError> {
        let mut part = reqwest::multipart::Part::bytes(upload.bytes).file_name(upload.filename);
        if let Some(content_type) = upload.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.config.upload_preset.clone());

        let response = self
            .client
            .post(self.endpoint("auto", "upload"))
            .multipart(form)
            .send()
            .await?;

        let body: UploadResponse = Self::parse_response(response).await?;
        let thumbnail_url = body.thumbnail_url.or_else(|| {
            (body.resource_type == "video")
                .then(|| video_poster_url(&body.secure_url))
                .flatten()
        });
        Ok(UploadedAsset {
            secure_url: body.secure_url,
            thumbnail_url,
            public_id: body.public_id,
            resource_type: body.resource_type,
        })
    }

    async fn destroy(&self, key: &HostedAssetKey) -> Result<DestroyOutcome, MediaHostError> {
        let (Some(api_key), Some(api_secret)) =
            (self.config.api_key.as_deref(), self.config.api_secret.as_deref())
        else {
            return Err(MediaHostError::MissingCredentials("asset deletion"));
        };

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("public_id", key.public_id.as_str()), ("timestamp", timestamp.as_str())],
            api_secret,
        );
        let form = [
            ("public_id", key.public_id.as_str()),
            ("timestamp", timestamp.as_str()),
            ("api_key", api_key),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let response = self
            .client
            .post(self.endpoint(&key.resource_type, "destroy"))
            .form(&form)
            .send()
            .await?;

        let body: DestroyResponse = Self::parse_response(response).await?;
        match body.result.as_str() {
            "ok" => Ok(DestroyOutcome::Deleted),
            "not found" => Ok(DestroyOutcome::NotFound),
            other => Err(MediaHostError::Decode(format!(
                "unexpected destroy result '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn signature_sorts_params_and_appends_secret() {
        let expected = "2b677cc9c35491c82cdfc612a589b64a2611d158939a5b589d3de971fbc5b867";
        assert_eq!(
            sign(&[("timestamp", "1700000000"), ("public_id", "reels/cut")], "abcd"),
            expected
        );
        assert_eq!(
            sign(&[("public_id", "reels/cut"), ("timestamp", "1700000000")], "abcd"),
            expected
        );
    }

    #[test]
    fn poster_url_swaps_extension() {
        assert_eq!(
            video_poster_url("https://res.cloudinary.com/s/video/upload/v1/cut.mp4").as_deref(),
            Some("https://res.cloudinary.com/s/video/upload/v1/cut.jpg")
        );
        assert_eq!(video_poster_url("https://res.cloudinary.com/s/video/upload/v1/"), None);
    }

    #[tokio::test]
    async fn destroy_without_credentials_is_refused() {
        let config = MediaHostConfig::new("studio", "unsigned").unwrap();
        let host = HttpMediaHost::new(config).unwrap();
        let key = HostedAssetKey {
            cloud_name: "studio".into(),
            resource_type: "video".into(),
            public_id: "cut".into(),
        };
        assert_matches!(
            host.destroy(&key).await,
            Err(MediaHostError::MissingCredentials(_))
        );
    }
}
