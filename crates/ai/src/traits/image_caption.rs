use super::ModelHandler;

/// One uploaded image, already read into memory. There is no identity or
/// lifecycle beyond the request that carries it.
#[derive(Clone)]
pub struct ImageCaptionInput {
    pub image_bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageCaptionInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCaptionInput")
            .field("image_bytes", &format_args!("{} bytes", self.image_bytes.len()))
            .finish()
    }
}

pub type ImageCaptionOutput = String;
pub type ImageCaptionModel = ModelHandler<ImageCaptionInput, ImageCaptionOutput>;
