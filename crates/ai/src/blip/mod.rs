use crate::traits::{ImageCaptionInput, ImageCaptionOutput};
use crate::Model;
use anyhow::{anyhow, bail};
use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::blip::VisionConfig;
use candle_transformers::models::quantized_blip;
use candle_transformers::models::{blip, blip_text};
use model_registry::ModelRegistry;
use tokenizers::Tokenizer;
use tracing::debug;

pub struct Blip {
    tokenizer: Tokenizer,
    model: quantized_blip::BlipForConditionalGeneration,
    logits_processor: LogitsProcessor,
    device: Device,
}

/// `[DEC]`, the decoder start token of the BLIP text decoder.
const BOS_TOKEN_ID: u32 = 30522;
/// `[SEP]` ends the generated sequence.
const SEP_TOKEN_ID: u32 = 102;
/// Hard cap on generated tokens, matching the checkpoint's max_length.
const MAX_CAPTION_TOKENS: usize = 50;

const IMAGE_SIZE: usize = 384;

const TOKENIZER_URI: &str = "tokenizer.json";
const WEIGHTS_URI: &str = "model-q4_0.gguf";

fn blip_base_config() -> blip::Config {
    let text_config = blip_text::Config {
        vocab_size: 30524,
        hidden_size: 768,
        encoder_hidden_size: 768,
        intermediate_size: 3072,
        projection_dim: 768,
        num_hidden_layers: 12,
        num_attention_heads: 12,
        max_position_embeddings: 512,
        hidden_act: candle_nn::Activation::Gelu,
        layer_norm_eps: 1e-12,
        is_decoder: true,
    };
    let vision_config = VisionConfig {
        hidden_size: 768,
        intermediate_size: 3072,
        projection_dim: 512,
        num_hidden_layers: 12,
        num_attention_heads: 12,
        image_size: 384,
        patch_size: 16,
        hidden_act: candle_nn::Activation::Gelu,
        layer_norm_eps: 1e-5,
    };

    blip::Config {
        text_config,
        vision_config,
        projection_dim: 512,
        image_text_hidden_size: 256,
    }
}

fn select_device() -> candle_core::Result<Device> {
    if candle_core::utils::cuda_is_available() {
        Device::new_cuda(0)
    } else if candle_core::utils::metal_is_available() {
        Device::new_metal(0)
    } else {
        Ok(Device::Cpu)
    }
}

impl Model for Blip {
    type Item = ImageCaptionInput;
    type Output = ImageCaptionOutput;

    fn batch_size_limit(&self) -> usize {
        1
    }

    async fn process(
        &mut self,
        items: Vec<Self::Item>,
    ) -> anyhow::Result<Vec<anyhow::Result<Self::Output>>> {
        if items.len() > self.batch_size_limit() {
            bail!("too many items");
        }

        let mut results = vec![];

        for item in items {
            let res = self.caption(&item.image_bytes).await;
            results.push(res);
        }

        Ok(results)
    }
}

impl Blip {
    /// Fetch the pretrained tokenizer and weights through the registry and
    /// bind the model to the best available device. Any failure here is
    /// meant to abort startup, there is no fallback model.
    pub async fn new(registry: &ModelRegistry) -> anyhow::Result<Self> {
        let tokenizer_path = registry.download_if_not_exists(TOKENIZER_URI).await?;
        let model_path = registry.download_if_not_exists(WEIGHTS_URI).await?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|_| anyhow!("failed to initialize tokenizer"))?;

        // greedy decoding, the sampling seed is never exercised
        let logits_processor = LogitsProcessor::new(1337, None, None);

        let device = select_device()?;
        debug!("caption model device: {:?}", device);

        let vb = quantized_blip::VarBuilder::from_gguf(model_path, &device)?;
        let model = quantized_blip::BlipForConditionalGeneration::new(&blip_base_config(), vb)?;

        Ok(Self {
            tokenizer,
            model,
            logits_processor,
            device,
        })
    }

    pub async fn caption(&mut self, image_bytes: &[u8]) -> anyhow::Result<String> {
        debug!("generating caption for {} bytes of image data", image_bytes.len());
        let image = load_image(image_bytes)?.to_device(&self.device)?;
        let image_embeds = image.unsqueeze(0)?.apply(self.model.vision_model())?;

        let mut token_ids = vec![BOS_TOKEN_ID];

        // we need this to make multi time generation work
        self.model.text_decoder().reset_kv_cache();

        for index in 0..MAX_CAPTION_TOKENS {
            let context_size = if index > 0 { 1 } else { token_ids.len() };
            let start_pos = token_ids.len().saturating_sub(context_size);
            let input_ids = Tensor::new(&token_ids[start_pos..], &self.device)?.unsqueeze(0)?;
            let logits = self
                .model
                .text_decoder()
                .forward(&input_ids, &image_embeds)?;
            let logits = logits.squeeze(0)?;
            let logits = logits.get(logits.dim(0)? - 1)?;
            let token = self.logits_processor.sample(&logits)?;
            if token == SEP_TOKEN_ID {
                break;
            }
            token_ids.push(token);
        }

        self.tokenizer
            .decode(&token_ids, true)
            .map_err(|_| anyhow!("failed to decode caption"))
    }
}

/// Decode uploaded bytes and turn them into the (3, 384, 384) f32 tensor
/// the vision encoder expects, CLIP-normalized. Garbage bytes fail here
/// and the error propagates, a bad upload never yields a blank caption.
pub fn load_image(bytes: &[u8]) -> candle_core::Result<Tensor> {
    let img = image::io::Reader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(candle_core::Error::wrap)?
        .decode()
        .map_err(candle_core::Error::wrap)?
        .resize_to_fill(
            IMAGE_SIZE as u32,
            IMAGE_SIZE as u32,
            image::imageops::FilterType::Triangle,
        );
    let img = img.to_rgb8();
    let data = img.into_raw();
    let data = Tensor::from_vec(data, (IMAGE_SIZE, IMAGE_SIZE, 3), &Device::Cpu)?
        .permute((2, 0, 1))?;
    let mean = Tensor::new(&[0.48145466f32, 0.4578275, 0.40821073], &Device::Cpu)?
        .reshape((3, 1, 1))?;
    let std = Tensor::new(&[0.26862954f32, 0.261_302_6, 0.275_777_1], &Device::Cpu)?
        .reshape((3, 1, 1))?;
    (data.to_dtype(candle_core::DType::F32)? / 255.)?
        .broadcast_sub(&mean)?
        .broadcast_div(&std)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::IndexOp;

    fn png_bytes(width: u32, height: u32, pixel: [u8; 3]) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb(pixel));
        let mut bytes = std::io::Cursor::new(vec![]);
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .expect("encode png");
        bytes.into_inner()
    }

    #[test]
    fn test_load_image_shape_and_dtype() {
        let tensor = load_image(&png_bytes(8, 8, [128, 64, 32])).expect("load image");
        assert_eq!(tensor.dims(), &[3, IMAGE_SIZE, IMAGE_SIZE]);
        assert_eq!(tensor.dtype(), candle_core::DType::F32);
    }

    #[test]
    fn test_load_image_applies_clip_normalization() {
        // pixel values equal to the channel means land at zero
        let mean_pixel = [
            (0.48145466f32 * 255.0).round() as u8,
            (0.4578275f32 * 255.0).round() as u8,
            (0.40821073f32 * 255.0).round() as u8,
        ];
        let tensor = load_image(&png_bytes(4, 4, mean_pixel)).expect("load image");
        for channel in 0..3 {
            let v = tensor
                .i((channel, 0, 0))
                .and_then(|t| t.to_scalar::<f32>())
                .expect("read value");
            assert!(v.abs() < 0.02, "channel {} not normalized: {}", channel, v);
        }
    }

    #[test]
    fn test_load_image_rejects_garbage() {
        assert!(load_image(&[]).is_err());
        assert!(load_image(b"definitely not an image").is_err());
    }
}
