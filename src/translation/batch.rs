/*!
 * Batch translation processing.
 *
 * Cues are split into consecutive batches of `batch_size` and translated one
 * batch at a time, in order. Every batch failure is fatal for the whole run,
 * so the result always pairs each cue with its translation.
 */

use log::{debug, info};

use crate::errors::TranslationError;
use crate::segment::{Cue, TranslatedCue};

use super::core::{TokenUsageStats, TranslationService};

/// Batch translator for consolidated cues
#[derive(Debug, Clone)]
pub struct BatchTranslator {
    /// The translation service to use
    service: TranslationService,

    /// Number of cues per request
    batch_size: usize,
}

impl BatchTranslator {
    /// Create a new batch translator; a batch size of 0 is treated as 1
    pub fn new(service: TranslationService, batch_size: usize) -> Self {
        Self {
            service,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn service(&self) -> &TranslationService {
        &self.service
    }

    /// Number of provider batches needed for `count` cues
    pub fn batch_count(&self, count: usize) -> usize {
        count.div_ceil(self.batch_size)
    }

    /// Translate cues, reporting `(done, total)` after every batch.
    ///
    /// `done` is the number of cues translated so far; the last report is
    /// always `(total, total)`. Empty input makes no provider call and no
    /// progress report.
    pub async fn translate(
        &self,
        cues: &[Cue],
        progress_callback: impl Fn(usize, usize),
    ) -> Result<(Vec<TranslatedCue>, TokenUsageStats), TranslationError> {
        let mut usage = TokenUsageStats::new(self.service.model().to_string());
        let total = cues.len();
        let mut translated = Vec::with_capacity(total);

        if cues.is_empty() {
            return Ok((translated, usage));
        }

        let batches = self.batch_count(total);
        for (batch_index, batch) in cues.chunks(self.batch_size).enumerate() {
            debug!("Translating batch {}/{} ({} cues)", batch_index + 1, batches, batch.len());

            let texts: Vec<&str> = batch.iter().map(|cue| cue.text.as_str()).collect();
            let translations = self.service.translate_batch(&texts, &mut usage).await?;

            translated.extend(
                batch
                    .iter()
                    .zip(translations)
                    .map(|(cue, translation)| cue.clone().with_translation(translation)),
            );

            progress_callback(translated.len(), total);
        }

        info!("Translated {} cues in {} batches. {}", total, batches, usage.summary());

        Ok((translated, usage))
    }
}
