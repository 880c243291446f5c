//! Generation prompt for a question and its assembled context.

/// Persona used when none is configured.
pub const DEFAULT_PERSONA: &str = "You are a Vedānta teacher analyzing the Bṛhadāraṇyaka Upaniṣad — Jyotir Brāhmaṇa teachings of Swami Paramananda Giri.";

/// Renders the prompt sent to the generator.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    persona: String,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA)
    }
}

impl PromptComposer {
    /// Creates a composer with the given persona line.
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
        }
    }

    /// Persona line placed at the top of every prompt.
    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Builds the prompt. The context is embedded exactly as given.
    pub fn compose(&self, question: &str, context: &str, references: &[String]) -> String {
        let mut prompt = String::new();
        prompt.push_str(&self.persona);
        prompt.push_str("\n\nQuestion:\n");
        prompt.push_str(question);
        prompt.push_str("\n\nBelow are verified lecture extracts. Speak **only** from these sources.\n");
        prompt.push_str("When you cite, use only these verified references, written as (Ref: <reference>):\n");
        for reference in references {
            prompt.push_str("- ");
            prompt.push_str(reference);
            prompt.push('\n');
        }
        prompt.push_str(
            "\nDisciplinary rules:\n\
             1. Do not invent class numbers, titles, or teachings not present in the extracts.\n\
             2. Speak only from the retrieved material; if the answer is not there, say so instead of guessing.\n\
             3. When a Sanskrit śabda (e.g. eva, jyotiḥ, ātman, prāṇa, sākṣin, upādhi) or any other foreign technical term appears or is implied:\n   \
                - highlight it in bold, with Devanāgarī where possible, e.g. **jyotiḥ (ज्योतिः)**;\n   \
                - briefly explain why the word matters: what misunderstanding it blocks or what redirection it performs.\n\
             4. Keep the reasoning teacher-like, clear, reflective, and faithful to śruti.\n\
             5. If several meanings are possible, mention that but stay within the retrieved sources.\n",
        );
        prompt.push_str("\nRetrieved materials:\n");
        prompt.push_str(context);
        prompt.push_str("\n\nNow write a concise, integrated explanation with śabda-pivot awareness.\n");
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs() -> Vec<String> {
        vec!["Class 3 – Talk1".to_string(), "Class 4 – Talk2".to_string()]
    }

    #[test]
    fn repeats_question_and_lists_references() {
        let question = "What is the nature of the witness-consciousness?";
        let prompt = PromptComposer::default().compose(question, "ctx", &refs());
        assert!(prompt.starts_with(DEFAULT_PERSONA));
        assert!(prompt.contains(&format!("Question:\n{question}\n")));
        assert!(prompt.contains("- Class 3 – Talk1\n- Class 4 – Talk2\n"));
        assert!(prompt.contains("(Ref: <reference>)"));
    }

    #[test]
    fn context_is_embedded_verbatim() {
        let context = "[Class 3 – Talk1]\n  indented   text\n\n---\n\n[Class 4 – Talk2]\nsecond";
        let prompt = PromptComposer::default().compose("q", context, &refs());
        assert!(prompt.contains(&format!("Retrieved materials:\n{context}\n")));
    }

    #[test]
    fn states_refusal_and_term_rules() {
        let prompt = PromptComposer::default().compose("q", "ctx", &refs());
        assert!(prompt.contains("Do not invent class numbers"));
        assert!(prompt.contains("say so instead of guessing"));
        assert!(prompt.contains("foreign technical term"));
    }

    #[test]
    fn custom_persona_replaces_default() {
        let composer = PromptComposer::new("You are a careful Nyāya tutor.");
        let prompt = composer.compose("q", "ctx", &refs());
        assert!(prompt.starts_with("You are a careful Nyāya tutor."));
        assert!(!prompt.contains(DEFAULT_PERSONA));
    }
}
