pub mod setup;
pub mod preprocess;
pub mod engine;
pub mod extract;

pub use setup::ensure_tesseract;
pub use engine::{EngineMode, OcrEngine, OcrOptions, TesseractEngine};
pub use extract::FieldExtractor;
