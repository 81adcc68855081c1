use ai::{blip::Blip, ImageCaptionModel, ModelHandler};
use model_registry::{ModelRegistry, RegistryConfig};

/// Build the one caption model the whole process shares. Construction
/// downloads any missing artifacts and loads the weights; an error here
/// is fatal to startup.
pub async fn init_caption_model(
    registry_config: RegistryConfig,
) -> anyhow::Result<ImageCaptionModel> {
    ModelHandler::new("blip-finetuned-holmes", move || async move {
        let registry = ModelRegistry::new(registry_config);
        Blip::new(&registry).await
    })
    .await
}
