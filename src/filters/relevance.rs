use tracing::{info, warn};

use crate::model::{ChatMessage, GenerationOptions, TextGenerator};
use crate::retry::{retry, RetryPolicy};
use crate::types::MappedSpan;

/// Asks a model whether each span is worth keeping; one call per span.
pub struct RelevanceFilter<'a, G> {
    generator: &'a G,
    model_id: &'a str,
    options: GenerationOptions,
    policy: RetryPolicy,
}

impl<'a, G: TextGenerator> RelevanceFilter<'a, G> {
    pub fn new(generator: &'a G, model_id: &'a str, policy: RetryPolicy) -> Self {
        Self {
            generator,
            model_id,
            options: GenerationOptions::unset(),
            policy,
        }
    }

    /// Keep spans the model approves. A span without an answer, because its
    /// check kept failing, is dropped and logged.
    pub fn apply(&self, spans: Vec<MappedSpan>) -> Vec<MappedSpan> {
        let total = spans.len();
        let kept: Vec<MappedSpan> = spans
            .into_iter()
            .filter(|span| self.is_relevant(span))
            .collect();
        info!(model = self.model_id, "relevance filter kept {}/{}", kept.len(), total);
        kept
    }

    fn is_relevant(&self, span: &MappedSpan) -> bool {
        let messages = [ChatMessage::user(relevance_prompt(&span.text()))];
        let outcome = retry(self.policy, |_| true, |_| {
            self.generator.generate(self.model_id, &messages, &self.options)
        });
        match outcome.into_result() {
            Ok(answer) => is_affirmative(&answer),
            Err(err) => {
                warn!(start = span.start, end = span.end, "relevance check failed, dropping span: {err}");
                false
            }
        }
    }
}

/// True when the answer says YES and never says NO, judged on whole words so
/// "YES, but..." stays affirmative and "NOTHING" is not a refusal.
pub fn is_affirmative(answer: &str) -> bool {
    let upper = answer.to_uppercase();
    let tokens: Vec<&str> = upper
        .split(|c: char| !c.is_alphabetic())
        .filter(|token| !token.is_empty())
        .collect();
    tokens.contains(&"YES") && !tokens.contains(&"NO")
}

fn relevance_prompt(text: &str) -> String {
    format!(
        r#"Decide if the following podcast clip is interesting enough to keep.
Criteria:
- Emotionally engaging OR intellectually valuable
- Makes sense without outside context
If yes, return "YES".
If no, return "NO".

Clip:
"""{text}"""
"#
    )
}
