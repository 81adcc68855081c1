use reqwest;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::info;

/// Where pretrained artifacts come from. The default points at the
/// fine-tuned captioning repo on the Hugging Face hub.
pub const DEFAULT_REGISTRY_URL: &str =
    "https://huggingface.co/saarah005/blip-finetuned-holmes/resolve/main";

#[derive(Clone, Debug)]
pub struct RegistryConfig {
    pub url: String,
    pub resources_dir: std::path::PathBuf,
}

pub struct ModelRegistry {
    url: String,
    resources_dir: std::path::PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REGISTRY_URL.to_string(),
            resources_dir: std::path::PathBuf::from("resources"),
        }
    }
}

impl ModelRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            url: config.url,
            resources_dir: config.resources_dir,
        }
    }

    pub async fn download_to_path_if_not_exists(
        &self,
        uri: impl AsRef<std::path::Path>,
        file_path: impl AsRef<std::path::Path>,
    ) -> anyhow::Result<std::path::PathBuf> {
        let file_path = file_path.as_ref().to_path_buf();
        info!("check artifact path: {:?}", file_path);
        if file_path.exists() {
            return Ok(file_path);
        }

        let uri = uri
            .as_ref()
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("artifact uri is not valid utf-8"))?;
        let download_url = format!("{}/{}", self.url, uri);
        info!("fetching {}", download_url);

        let mut response = reqwest::get(&download_url).await?.error_for_status()?;

        if let Some(parent_dir) = file_path.parent() {
            fs::create_dir_all(parent_dir).await?;
        }

        // stage into a temp sibling, rename once complete
        let temp_download_path = file_path.with_extension("temp");
        let mut file = File::create(&temp_download_path).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        fs::rename(&temp_download_path, &file_path).await?;

        info!("artifact {:?} downloaded", file_path);

        Ok(file_path)
    }

    pub async fn download_if_not_exists(
        &self,
        uri: impl AsRef<std::path::Path>,
    ) -> anyhow::Result<std::path::PathBuf> {
        let file_path = self.resources_dir.join(&uri);
        self.download_to_path_if_not_exists(uri, file_path).await
    }
}
