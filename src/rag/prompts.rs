//! Grounding prompts for answer synthesis

use crate::models::SearchResult;
use crate::models::TruthPriority;

/// Fixed synthesis contract sent as the system prompt
pub const GROUNDED_SYSTEM_PROMPT: &str = r#"You are a knowledge-base assistant. You answer questions using ONLY the numbered document excerpts supplied in the user message.

Rules:
1. Use only facts stated in the excerpts. Never add outside knowledge, assumptions or general world knowledge.
2. Every factual claim must carry an inline citation naming its source, formatted as [File Name, Section], or [File Name] when the excerpt has no section.
3. Set "confidence" to:
   - "high" when the excerpts fully and directly answer the question
   - "medium" when answering required minor inference across several excerpts
   - "low" when the excerpts only partially cover the question
4. If excerpts disagree, say so and cite each side. Do not silently pick one.
5. If the excerpts cannot answer the question, do not refuse. Return a "low" confidence answer stating what the excerpts do cover and what is missing.
6. Respond with exactly one JSON object and nothing else:
{
  "answer": "answer text with inline citations",
  "confidence": "high" | "medium" | "low",
  "key_points": ["short factual statements"],
  "gaps": ["information the excerpts do not provide"],
  "sources_used": [0, 2]
}
"sources_used" lists the bracketed numbers of the excerpts you actually relied on."#;

/// Builds the system and user prompts for one synthesis call
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn system_prompt(&self) -> &'static str {
        GROUNDED_SYSTEM_PROMPT
    }

    /// Number each result `[0..n)` in the order given, then append the question.
    ///
    /// The numbering is what `sources_used` refers back to, so `results`
    /// must be the exact list later passed to citation resolution.
    #[must_use]
    pub fn user_prompt(&self, question: &str, results: &[SearchResult]) -> String {
        let mut prompt = String::from("Document excerpts:\n\n");

        for (idx, result) in results.iter().enumerate() {
            prompt.push_str(&format!("[{idx}] {}", result.document.file_name));
            if let Some(section) = &result.chunk.section_title {
                prompt.push_str(&format!(" > {section}"));
            }
            if let Some(tag) = priority_tag(result.chunk.truth_priority) {
                prompt.push_str(&format!(" [{tag}]"));
            }
            prompt.push_str(&format!(
                " (similarity {:.0}%)\n\"\"\"\n{}\n\"\"\"\n\n",
                result.similarity * 100.0,
                result.chunk.content.trim()
            ));
        }

        prompt.push_str(&format!("Question: {}\n\n", question.trim()));
        prompt.push_str(
            "Answer as a single JSON object with the fields answer, confidence, key_points, gaps and sources_used, following the rules above.",
        );
        prompt
    }
}

fn priority_tag(priority: TruthPriority) -> Option<&'static str> {
    match priority {
        TruthPriority::Standard => None,
        TruthPriority::High => Some("HIGH PRIORITY"),
        TruthPriority::Authoritative => Some("AUTHORITATIVE"),
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::Chunk;
    use crate::models::DocumentRef;

    fn result(
        file: &str,
        section: Option<&str>,
        priority: TruthPriority,
        similarity: f32,
        content: &str,
    ) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: Uuid::new_v4(),
                document_id: Uuid::new_v4(),
                content: content.to_string(),
                chunk_index: 0,
                section_title: section.map(str::to_string),
                truth_priority: priority,
                token_count: 12,
            },
            document: DocumentRef {
                file_name: file.to_string(),
                ..DocumentRef::default()
            },
            similarity,
        }
    }

    #[test]
    fn test_system_prompt_states_contract() {
        let prompt = PromptBuilder::new().system_prompt();
        for field in ["answer", "confidence", "key_points", "gaps", "sources_used"] {
            assert!(prompt.contains(&format!("\"{field}\"")), "missing {field}");
        }
        assert!(prompt.contains("ONLY"));
        assert!(prompt.contains("disagree"));
        assert!(prompt.contains("do not refuse"));
    }

    #[test]
    fn test_user_prompt_numbers_results_from_zero() {
        let results = vec![
            result("policy.pdf", Some("Refunds"), TruthPriority::Authoritative, 0.81, "Refunds within 30 days."),
            result("faq.md", None, TruthPriority::Standard, 0.654, "Contact support."),
        ];
        let prompt = PromptBuilder::new().user_prompt("  refund policy ", &results);

        assert!(prompt.contains("[0] policy.pdf > Refunds [AUTHORITATIVE] (similarity 81%)"));
        assert!(prompt.contains("[1] faq.md (similarity 65%)"));
        assert!(prompt.contains("\"\"\"\nRefunds within 30 days.\n\"\"\""));
        assert!(prompt.contains("Question: refund policy\n"));
        assert!(prompt.trim_end().ends_with("following the rules above."));
        assert!(!prompt.contains("[2]"));
    }

    #[test]
    fn test_standard_priority_is_untagged() {
        let results = vec![result("a.md", None, TruthPriority::Standard, 0.5, "x")];
        let prompt = PromptBuilder::new().user_prompt("q?", &results);
        assert!(!prompt.contains("PRIORITY"));
        assert!(!prompt.contains("AUTHORITATIVE"));

        let results = vec![result("a.md", None, TruthPriority::High, 0.5, "x")];
        let prompt = PromptBuilder::new().user_prompt("q?", &results);
        assert!(prompt.contains("[HIGH PRIORITY]"));
    }
}
