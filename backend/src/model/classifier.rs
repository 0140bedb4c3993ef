use std::sync::{Arc, Mutex};

use ndarray::Array4;
use tch::{CModule, Device, Kind, Tensor};

use crate::error::ServiceError;

/// A loaded TorchScript grading model. The mutex serializes forward passes
/// inside the runtime; the handle itself is read-only after startup.
#[derive(Clone)]
pub struct Model {
    module: Arc<Mutex<CModule>>,
    device: Device,
}

impl Model {
    pub fn new(module: CModule, device: Device) -> Self {
        Self {
            module: Arc::new(Mutex::new(module)),
            device,
        }
    }

    /// Runs the classifier over a staged (1, 224, 224, 3) input and returns
    /// softmax-normalized scores, one per severity grade.
    pub fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ServiceError> {
        let (batch, height, width, channels) = input.dim();
        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::from_slice(&data)
            .view([
                batch as i64,
                height as i64,
                width as i64,
                channels as i64,
            ])
            .to_device(self.device);

        let output = self.module.lock().unwrap().forward_ts(&[tensor])?;
        let output = output.softmax(-1, Kind::Float);
        let output_flat = output.to_kind(Kind::Float).view([-1]);
        let num_elements = output_flat.size()[0] as usize;
        let mut scores = vec![0.0f32; num_elements];
        output_flat.copy_data(&mut scores, num_elements);
        Ok(scores)
    }
}

/// Arg-max index and value of a score vector. An empty vector yields
/// (0, 0.0), which cannot occur for a well-formed model output.
pub fn top_class(scores: &[f32]) -> (usize, f32) {
    let mut best = (0usize, 0.0f32);
    for (index, &score) in scores.iter().enumerate() {
        if score > best.1 {
            best = (index, score);
        }
    }
    best
}

/// Shared model slot built once in the composition root and injected into
/// request handlers. `None` switches the service to deterministic fallback
/// responses.
#[derive(Clone, Default)]
pub struct ModelHandle {
    model: Option<Model>,
}

impl ModelHandle {
    pub fn new(model: Option<Model>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }
}
