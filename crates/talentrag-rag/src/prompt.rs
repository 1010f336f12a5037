//! Prompt assembly under a hard token budget.
//!
//! Layout: the query first, then `"\nContexto:\n"` and the retrieved texts in
//! relevance order, one per line. `max_new_tokens` of the model window are
//! reserved for the answer; the rest is the prompt ceiling. Overflow drops the
//! least relevant contexts first, then cuts the last surviving context at a
//! word boundary. The query itself is never cut.

use std::sync::Arc;

use tracing::debug;

use talentrag_core::{Error, Result};
use talentrag_infer::TokenCounter;

/// Header introducing the retrieved contexts.
pub const CONTEXT_HEADER: &str = "\nContexto:\n";

/// Separator between retrieved contexts.
pub const CONTEXT_SEPARATOR: &str = "\n";

pub struct PromptAssembler {
    counter: Arc<dyn TokenCounter>,
}

impl PromptAssembler {
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self { counter }
    }

    /// Token count of `text` under this assembler's counting rule.
    pub fn count_tokens(&self, text: &str) -> usize {
        self.counter.count(text)
    }

    /// Build the prompt for `query` from `retrieved` (most relevant first).
    ///
    /// Fails with `InvalidInput` for a blank query, for a window that leaves
    /// no room for the answer, or when the query alone exceeds the budget.
    pub fn assemble<S: AsRef<str>>(
        &self,
        query: &str,
        retrieved: &[S],
        max_model_tokens: usize,
        max_new_tokens: usize,
    ) -> Result<String> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query is empty".into()));
        }
        if max_new_tokens == 0 || max_model_tokens <= max_new_tokens {
            return Err(Error::InvalidInput(format!(
                "max_model_tokens ({}) must exceed max_new_tokens ({}) and both must be positive",
                max_model_tokens, max_new_tokens
            )));
        }

        let budget = max_model_tokens - max_new_tokens;
        let query_tokens = self.count_tokens(query);
        if query_tokens > budget {
            return Err(Error::InvalidInput(format!(
                "query has {} tokens, prompt budget is {}",
                query_tokens, budget
            )));
        }

        let texts: Vec<&str> = retrieved.iter().map(AsRef::as_ref).collect();
        if texts.is_empty() {
            return Ok(query.to_string());
        }

        // Largest number of whole contexts that fits.
        let mut kept = texts.len();
        let mut prompt = render(query, &texts[..kept], None);
        while kept > 0 && self.count_tokens(&prompt) > budget {
            kept -= 1;
            prompt = render(query, &texts[..kept], None);
        }

        if kept == texts.len() {
            return Ok(prompt);
        }

        // Fill the remaining room with a prefix of the next context.
        if let Some(partial) = self.longest_fitting_prefix(query, &texts[..kept], texts[kept], budget)
        {
            prompt = partial;
        }

        debug!(
            "Prompt truncated: kept {} of {} contexts, {} tokens (budget {})",
            kept,
            texts.len(),
            self.count_tokens(&prompt),
            budget
        );

        Ok(prompt)
    }

    /// Binary search over word-end cut points of `text`. Only prompts whose
    /// count was checked against the budget are ever returned.
    fn longest_fitting_prefix(
        &self,
        query: &str,
        kept: &[&str],
        text: &str,
        budget: usize,
    ) -> Option<String> {
        let cuts = word_end_cuts(text);

        let (mut lo, mut hi) = (0usize, cuts.len());
        let mut best = None;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let candidate = render(query, kept, Some(&text[..cuts[mid]]));
            if self.count_tokens(&candidate) <= budget {
                best = Some(candidate);
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        best
    }
}

fn render(query: &str, contexts: &[&str], partial: Option<&str>) -> String {
    if contexts.is_empty() && partial.is_none() {
        return query.to_string();
    }

    let mut prompt = String::with_capacity(
        query.len()
            + CONTEXT_HEADER.len()
            + contexts.iter().map(|c| c.len() + 1).sum::<usize>()
            + partial.map_or(0, str::len),
    );
    prompt.push_str(query);
    prompt.push_str(CONTEXT_HEADER);
    let mut first = true;
    for text in contexts.iter().copied().chain(partial) {
        if !first {
            prompt.push_str(CONTEXT_SEPARATOR);
        }
        prompt.push_str(text);
        first = false;
    }
    prompt
}

/// Byte offsets where a non-empty word-aligned prefix of `text` ends.
fn word_end_cuts(text: &str) -> Vec<usize> {
    let mut cuts = Vec::new();
    let mut in_word = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if in_word {
                cuts.push(i);
            }
            in_word = false;
        } else {
            in_word = true;
        }
    }
    if in_word {
        cuts.push(text.len());
    }
    cuts
}

#[cfg(test)]
mod tests {
    use super::*;
    use talentrag_infer::WhitespaceTokenCounter;

    fn assembler() -> PromptAssembler {
        PromptAssembler::new(Arc::new(WhitespaceTokenCounter))
    }

    #[test]
    fn test_no_context_is_exactly_the_query() {
        let prompt = assembler()
            .assemble::<&str>("vaga Python", &[], 1024, 256)
            .unwrap();
        assert_eq!(prompt, "vaga Python");
    }

    #[test]
    fn test_layout_keeps_relevance_order() {
        let prompt = assembler()
            .assemble("vaga Python", &["Python, Django, SQL", "Java, Spring"], 1024, 256)
            .unwrap();
        assert_eq!(prompt, "vaga Python\nContexto:\nPython, Django, SQL\nJava, Spring");
    }

    #[test]
    fn test_drops_least_relevant_context_first() {
        // query 2 + header 1 + first context 3 = 6; second context would add 2.
        let prompt = assembler()
            .assemble("vaga Python", &["Python, Django, SQL", "Java, Spring"], 10, 4)
            .unwrap();
        assert_eq!(prompt, "vaga Python\nContexto:\nPython, Django, SQL");
    }

    #[test]
    fn test_partially_truncates_last_surviving_context() {
        let prompt = assembler()
            .assemble("vaga Python", &["Python Django SQL Docker AWS"], 10, 5)
            .unwrap();
        assert_eq!(prompt, "vaga Python\nContexto:\nPython Django");
    }

    #[test]
    fn test_header_dropped_when_nothing_fits() {
        let prompt = assembler()
            .assemble("vaga Python Django", &["SQL"], 7, 4)
            .unwrap();
        assert_eq!(prompt, "vaga Python Django");
    }

    #[test]
    fn test_query_too_long_is_rejected() {
        let result = assembler().assemble("um dois tres quatro", &["ctx"], 6, 3);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_budget_is_rejected() {
        let result = assembler().assemble("vaga", &["ctx"], 256, 256);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        let blank = assembler().assemble("   ", &["ctx"], 1024, 256);
        assert!(matches!(blank, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_budget_invariant_holds_across_budgets() {
        let asm = assembler();
        let contexts = [
            "Python Django SQL Flask Git",
            "Java Spring Hibernate Maven",
            "Excel Power BI análise de dados",
        ];
        for max_model in 4..40 {
            for max_new in 1..max_model {
                let Ok(prompt) = asm.assemble("vaga Python", &contexts, max_model, max_new) else {
                    // Only a query that cannot fit may fail.
                    assert!(max_model - max_new < 2);
                    continue;
                };
                assert!(asm.count_tokens(&prompt) <= max_model - max_new);
                assert!(prompt.starts_with("vaga Python"));
            }
        }
    }

    #[test]
    fn test_word_end_cuts() {
        assert_eq!(word_end_cuts("ab  cd e"), vec![2, 6, 8]);
        assert_eq!(word_end_cuts("  "), Vec::<usize>::new());
        assert_eq!(word_end_cuts("ção é"), vec!["ção".len(), "ção é".len()]);
    }
}
