//! Prompt assembly: render the answer template with history, context and question.

use crate::loader::validate_prompt;
use crate::types::PromptDefinition;
use docchat_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde::Serialize;

const ANSWER_TEMPLATE: &str = "answer";
const CONDENSE_TEMPLATE: &str = "condense";

/// Template variables.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptVariables<'a> {
    chat_history: &'a str,
    context: &'a str,
    question: &'a str,
}

/// Renders prompts from a validated [`PromptDefinition`].
///
/// Templates are compiled once; rendering is pure and deterministic.
#[derive(Debug)]
pub struct PromptAssembler {
    definition: PromptDefinition,
    registry: Handlebars<'static>,
}

impl PromptAssembler {
    pub fn new(definition: PromptDefinition) -> AppResult<Self> {
        validate_prompt(&definition)?;

        let mut registry = Handlebars::new();
        // Disable HTML escaping for plain text
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);

        registry
            .register_template_string(ANSWER_TEMPLATE, &definition.template)
            .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;
        registry
            .register_template_string(CONDENSE_TEMPLATE, &definition.condense_template)
            .map_err(|e| {
                AppError::Prompt(format!("Failed to register condense template: {}", e))
            })?;

        tracing::debug!("Prompt assembler ready: {}", definition.id);
        Ok(Self {
            definition,
            registry,
        })
    }

    pub fn definition(&self) -> &PromptDefinition {
        &self.definition
    }

    /// System instruction for the generation provider.
    pub fn persona(&self) -> &str {
        &self.definition.persona
    }

    /// Render the answer prompt.
    ///
    /// `chunks` are labelled in rank order as numbered reference documents.
    pub fn assemble(&self, transcript: &str, chunks: &[String], question: &str) -> AppResult<String> {
        let context = format_context(chunks);
        self.render(
            ANSWER_TEMPLATE,
            &PromptVariables {
                chat_history: transcript,
                context: &context,
                question,
            },
        )
    }

    /// Render the prompt that rewrites a follow-up into a standalone question.
    pub fn condense(&self, transcript: &str, question: &str) -> AppResult<String> {
        self.render(
            CONDENSE_TEMPLATE,
            &PromptVariables {
                chat_history: transcript,
                context: "",
                question,
            },
        )
    }

    fn render(&self, name: &str, variables: &PromptVariables<'_>) -> AppResult<String> {
        self.registry
            .render(name, variables)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
    }
}

/// Join retrieved chunks into labelled reference material.
pub fn format_context(chunks: &[String]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, text)| format!("[Dokumen {}]\n{}", i + 1, text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
