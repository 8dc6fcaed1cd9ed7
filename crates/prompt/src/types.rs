//! Prompt types for docchat.
//!
//! This module defines the prompt definition that drives answer generation.

use serde::{Deserialize, Serialize};

/// Built-in answer template.
///
/// Variables: `chatHistory`, `context`, `question`.
pub const DEFAULT_TEMPLATE: &str = "Anda adalah asisten yang ramah dan membantu. Gunakan informasi dari dokumen berikut untuk menjawab pertanyaan dengan bahasa yang natural dan manusiawi dalam Bahasa Indonesia.
Jika informasi tidak ditemukan dalam dokumen, jawab dengan sopan bahwa Anda tidak memiliki informasinya.

Percakapan sebelumnya:
{{chatHistory}}

Dokumen referensi:
{{context}}

Pertanyaan: {{question}}

Jawaban yang alami dan membantu:";

/// Built-in template rewriting a follow-up into a standalone question.
pub const DEFAULT_CONDENSE_TEMPLATE: &str = "Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.

Chat History:
{{chatHistory}}
Follow Up Input: {{question}}
Standalone question:";

/// Built-in system instruction.
pub const DEFAULT_PERSONA: &str = "Anda adalah asisten AI yang ramah dan membantu. Berbicaralah dengan gaya santai namun profesional dalam Bahasa Indonesia. Gunakan kalimat lengkap dan alami seperti manusia.";

/// A prompt definition, built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Behavioral settings
    #[serde(default)]
    pub behavior: PromptBehavior,

    /// System instruction sent alongside every prompt
    #[serde(default = "default_persona")]
    pub persona: String,

    /// Answer template with Handlebars syntax
    pub template: String,

    /// Question-condensing template with Handlebars syntax
    #[serde(rename = "condenseTemplate", default = "default_condense_template")]
    pub condense_template: String,
}

fn default_persona() -> String {
    DEFAULT_PERSONA.to_string()
}

fn default_condense_template() -> String {
    DEFAULT_CONDENSE_TEMPLATE.to_string()
}

impl Default for PromptDefinition {
    fn default() -> Self {
        Self {
            id: "docchat.answer.default".to_string(),
            title: "Grounded document answer".to_string(),
            api_version: "1.0".to_string(),
            created_by: "docchat".to_string(),
            behavior: PromptBehavior::default(),
            persona: default_persona(),
            template: DEFAULT_TEMPLATE.to_string(),
            condense_template: default_condense_template(),
        }
    }
}

/// Behavioral settings describing the assistant's voice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptBehavior {
    /// Tone (e.g., "friendly", "professional")
    pub tone: String,

    /// Style (e.g., "conversational", "concise")
    pub style: String,

    /// Answer language
    pub language: String,
}

impl Default for PromptBehavior {
    fn default() -> Self {
        Self {
            tone: "friendly".to_string(),
            style: "conversational".to_string(),
            language: "id".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: support.answer
title: Support Answer
apiVersion: "1.0"
createdBy: test
behavior:
  tone: professional
  style: concise
  language: en
persona: "You are a support assistant."
template: "{{context}}\nQ: {{question}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "support.answer");
        assert_eq!(def.behavior.tone, "professional");
        assert_eq!(def.persona, "You are a support assistant.");
        assert_eq!(def.condense_template, DEFAULT_CONDENSE_TEMPLATE);
    }

    #[test]
    fn test_optional_fields_default() {
        let yaml = r#"
id: minimal
title: Minimal
apiVersion: "1.0"
template: "{{question}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.persona, DEFAULT_PERSONA);
        assert_eq!(def.behavior.language, "id");
        assert!(def.created_by.is_empty());
    }

    #[test]
    fn test_default_template_mentions_every_variable() {
        let def = PromptDefinition::default();
        for var in ["{{chatHistory}}", "{{context}}", "{{question}}"] {
            assert!(def.template.contains(var), "missing {}", var);
        }
    }
}
