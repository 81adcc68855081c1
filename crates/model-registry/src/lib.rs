mod download;
pub use download::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_existing_file_is_not_downloaded_again() {
        let resources_dir = std::env::temp_dir().join("model-registry-test");
        tokio::fs::create_dir_all(&resources_dir).await.unwrap();
        let file_path = resources_dir.join("tokenizer.json");
        tokio::fs::write(&file_path, b"{}").await.unwrap();

        // base url is unreachable on purpose, the call must short-circuit
        let registry = ModelRegistry::new(RegistryConfig {
            url: "http://127.0.0.1:1/nothing".to_string(),
            resources_dir: resources_dir.clone(),
        });

        let res = registry.download_if_not_exists("tokenizer.json").await;
        assert_eq!(res.unwrap(), file_path);

        tokio::fs::remove_dir_all(&resources_dir).await.unwrap();
    }
}
