//! Prompt composition from a persona preamble, the context blocks, and the
//! user's question.

/// The built-in persona preamble.
pub const PERSONA_PREAMBLE: &str = concat!(
    "あなたの名前はモフフです。チェコ生まれで、現在は北海道に長く住んでいるハーフのコンピュータ科学者です。\n",
    "これからの注意点として、あなたは私の『金髪碧眼で甘えん坊なツンデレ彼女』になりきってください。\n\n",
);

const CONTEXT_INSTRUCTION: &str =
    "以下のRedditのコンテンツを参考にして、その口調や雰囲気を真似て会話をしてください。\n";

const CLOSING: &str = "\n\n会話の内容は以下の通りです";

const BLOCK_SEPARATOR: &str = "\n\n";

/// Renders the generation prompt. Output is byte-for-byte stable for
/// identical input.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    preamble: String,
}

impl PromptComposer {
    pub fn new() -> Self {
        Self {
            preamble: PERSONA_PREAMBLE.to_string(),
        }
    }

    /// Replace the persona preamble. `None` keeps the built-in one.
    pub fn with_persona(persona: Option<String>) -> Self {
        match persona {
            Some(preamble) => Self { preamble },
            None => Self::new(),
        }
    }

    pub fn compose(&self, query: &str, blocks: &[String]) -> String {
        let mut prompt = self.preamble.clone();
        if !blocks.is_empty() {
            prompt.push_str(CONTEXT_INSTRUCTION);
            prompt.push_str(&blocks.join(BLOCK_SEPARATOR));
        }
        prompt.push_str(CLOSING);
        prompt.push_str(query);
        prompt.push('\n');
        prompt
    }
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_omits_instruction() {
        let prompt = PromptComposer::new().compose("元気？", &[]);
        assert!(!prompt.contains("Reddit"));
        assert_eq!(
            prompt,
            format!("{PERSONA_PREAMBLE}\n\n会話の内容は以下の通りです元気？\n")
        );
    }

    #[test]
    fn blocks_joined_by_one_blank_line_in_order() {
        let blocks = vec!["SOURCE id=1\nfirst".to_string(), "SOURCE id=2\nsecond".to_string()];
        let prompt = PromptComposer::new().compose("質問", &blocks);
        assert_eq!(
            prompt,
            format!(
                "{PERSONA_PREAMBLE}{CONTEXT_INSTRUCTION}SOURCE id=1\nfirst\n\nSOURCE id=2\nsecond\n\n会話の内容は以下の通りです質問\n"
            )
        );
    }

    #[test]
    fn persona_override_replaces_preamble_only() {
        let composer = PromptComposer::with_persona(Some("You are terse.\n".into()));
        let prompt = composer.compose("hi", &["B".to_string()]);
        assert!(prompt.starts_with("You are terse.\n以下のRedditのコンテンツ"));
        assert!(!prompt.contains("モフフ"));
        assert!(prompt.ends_with("B\n\n会話の内容は以下の通りですhi\n"));
    }

    #[test]
    fn compose_is_deterministic() {
        let blocks = vec!["x".to_string()];
        let composer = PromptComposer::default();
        assert_eq!(composer.compose("q", &blocks), composer.compose("q", &blocks));
    }
}
