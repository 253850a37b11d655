/*!
 * Prompt construction for batched translation.
 */

pub mod templates;

// Re-export main types
pub use templates::{numbered_block, PromptTemplate};
