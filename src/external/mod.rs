pub mod gemini;

pub use gemini::GeminiService;
