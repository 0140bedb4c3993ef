mod classifier;
mod loader;

pub use classifier::{Model, ModelHandle, top_class};
pub use loader::{default_model_path, load_trained_model};
