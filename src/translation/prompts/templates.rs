/*!
 * Prompt templates for batched subtitle translation.
 *
 * The model receives every line of a batch as a 1-indexed numbered block and
 * is asked to answer with the same numbering, one translation per line.
 */

/// Translation prompt template.
///
/// `{input_text}` is replaced by the numbered block; `{source_language}` and
/// `{target_language}` by the configured language names.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// Japanese idol-content to Simplified Chinese translator prompt.
    pub const IDOL_JA_ZH: &'static str = r#"あなたはアイドルコンテンツの専門翻訳者です。
以下の日本語を中国語（簡体字）に翻訳してください。

ルール:
- 自然で流暢な中国語にする
- アイドル用語は適切に翻訳する（例: 推し→本命/推、センター→C位、握手会→握手会/签名会）
- 番号付きで出力する
- 翻訳のみ出力し、説明は不要
- 各行の番号は入力と同じ番号を使用する

入力:
{input_text}

出力:"#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Whether the template has a slot for the numbered block
    pub fn has_input_slot(&self) -> bool {
        self.template.contains("{input_text}")
    }

    /// Render the template for one batch.
    pub fn render(&self, input_text: &str, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
            .replace("{input_text}", input_text)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(Self::IDOL_JA_ZH)
    }
}

/// Formats texts as `1. first\n2. second...`
pub fn numbered_block<S: AsRef<str>>(texts: &[S]) -> String {
    texts
        .iter()
        .enumerate()
        .map(|(idx, text)| format!("{}. {}", idx + 1, text.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}
