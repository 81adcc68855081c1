use ::ai::ImageCaptionModel;

pub mod ai;
pub mod error;
pub mod routes;
pub mod standalone;

/// Shared per-process state, cloned into every request handler. The model
/// behind `caption_model` is loaded exactly once before the server starts
/// accepting traffic and is read-only afterwards.
#[derive(Clone)]
pub struct Ctx {
    pub caption_model: ImageCaptionModel,
}
