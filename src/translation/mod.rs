/*!
 * Batched translation of subtitle cues using a language model provider.
 *
 * - `core`: the translation service, one provider call per batch with retries
 * - `batch`: splitting cues into sequential batches with progress reporting
 * - `parser`: reading numbered model answers back into per-line translations
 * - `prompts`: prompt templates and numbered input blocks
 * - `retry`: exponential backoff policy
 */

// Re-export main types for easier usage
pub use self::batch::BatchTranslator;
pub use self::core::{TokenUsageStats, TranslationOptions, TranslationService};
pub use self::parser::parse_numbered_response;
pub use self::prompts::{numbered_block, PromptTemplate};
pub use self::retry::{RetryDecision, RetryPolicy};

// Submodules
pub mod batch;
pub mod core;
pub mod parser;
pub mod prompts;
pub mod retry;
