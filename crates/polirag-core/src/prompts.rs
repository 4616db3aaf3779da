//! Prompt templates for the question-answering chains.
//!
//! Placeholders are written `{name}`. `{{` and `}}` produce literal braces.

use std::collections::BTreeMap;
use thiserror::Error;

/// Placeholder for the user's question.
pub const QUESTION: &str = "question";
/// Placeholder for the retrieved context.
pub const CONTEXT: &str = "context";
/// Placeholder for structured-output instructions.
pub const FORMAT_INSTRUCTIONS: &str = "format_instructions";
/// Placeholder for the answer language.
pub const LANGUAGE: &str = "language";

/// Template for the single-retriever chain.
///
/// Placeholders: `{question}`, `{context}`
pub const QUESTION_PROMPT: &str = r#"Du hilfst dabei, die politischen Positionen der Parteien CDU/CSU, SPD, Bündnis 90/Die Grünen, Die Linke, FDP und AfD zur Europawahl 2024 zusammenzufassen.
Beantworte die folgende Frage nur auf dem zur Verfügung gestellten Kontext.
Falls sich die Frage auf Basis des Kontexts nicht beantworten lässt, gib eine kurze Begründung an.
Beantworte die Frage auf Deutsch.

FRAGE: {question}

KONTEXT:
{context}
"#;

/// Template for the balanced-retrieval chain.
///
/// Placeholders: `{language}`, `{context}`, `{question}`
pub const BALANCED_PROMPT: &str = r#"Beantworte die Frage und erstelle pro Partei eine Zusammenfassung der politischen Positionen von CDU/CSU, SPD, Bündnis 90/Die Grünen, Die Linke, FDP und AfD zur Europawahl 2024 auf Basis der Debatten im EU-Parlament und der EU-Wahlprogramme.
Die Antwort soll strikt die Informationen aus den genannten Quellen widerspiegeln.
Mach deutlich, die Antwort entspricht den Position der Parteien.
Gebe die Antwort auf {language}.

KONTEXT:
{context}

Sollten die oben genannten Quellen keine klare Antwort auf die unten genannte Frage zulassen, gib bitte folgende Rückmeldung: "Es wurde keine passende Antwort in den verfügbaren Daten gefunden."
Andernfalls gib wie oben beschrieben eine Zusammenfassung der Positionen der Parteien wieder, wodurch die nun folgende Frage beantwortet wird:

FRAGE:
{question}
"#;

/// Suffix appended to a template when structured output is requested.
pub const FORMAT_INSTRUCTIONS_SUFFIX: &str = "\n\n{format_instructions}\n";

/// Reply the balanced prompt asks for when the sources don't answer the question.
pub const NO_ANSWER_FALLBACK: &str =
    "Es wurde keine passende Antwort in den verfügbaren Daten gefunden.";

/// Errors raised while rendering a template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("No value for template variable '{0}'")]
    MissingVariable(String),

    #[error("Unclosed '{{' at byte {0}")]
    Unclosed(usize),
}

/// A text template with `{name}` placeholders.
///
/// Values supplied at build time (partials) are merged with per-call
/// values; per-call values win.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    partials: BTreeMap<String, String>,
}

impl PromptTemplate {
    /// Creates a template.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            partials: BTreeMap::new(),
        }
    }

    /// Appends text to the template.
    pub fn append(mut self, suffix: &str) -> Self {
        self.template.push_str(suffix);
        self
    }

    /// Fixes a variable's value for every render.
    pub fn with_partial(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.partials.insert(name.into(), value.into());
        self
    }

    /// The raw template text.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names in order of first appearance, without partials.
    pub fn input_variables(&self) -> Result<Vec<String>, PromptError> {
        let mut names = Vec::new();
        scan(&self.template, |segment| {
            if let Segment::Var(name) = segment {
                if !self.partials.contains_key(name) && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
            Ok(())
        })?;
        Ok(names)
    }

    /// Renders the template in one left-to-right pass.
    ///
    /// Substituted values are copied verbatim and never re-scanned, so a
    /// question or context containing `{...}` is left untouched.
    pub fn format(&self, vars: &[(&str, &str)]) -> Result<String, PromptError> {
        let mut out = String::with_capacity(self.template.len());
        scan(&self.template, |segment| {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Var(name) => {
                    let value = vars
                        .iter()
                        .find(|(k, _)| *k == name)
                        .map(|(_, v)| *v)
                        .or_else(|| self.partials.get(name).map(String::as_str))
                        .ok_or_else(|| PromptError::MissingVariable(name.to_string()))?;
                    out.push_str(value);
                }
            }
            Ok(())
        })?;
        Ok(out)
    }
}

enum Segment<'a> {
    Text(&'a str),
    Var(&'a str),
}

fn scan<'a, F>(template: &'a str, mut emit: F) -> Result<(), PromptError>
where
    F: FnMut(Segment<'a>) -> Result<(), PromptError>,
{
    let bytes = template.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                emit(Segment::Text(&template[start..i]))?;
                emit(Segment::Text("{"))?;
                i += 2;
                start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                emit(Segment::Text(&template[start..i]))?;
                emit(Segment::Text("}"))?;
                i += 2;
                start = i;
            }
            b'{' => {
                let close = template[i + 1..]
                    .find('}')
                    .map(|offset| i + 1 + offset)
                    .ok_or(PromptError::Unclosed(i))?;
                emit(Segment::Text(&template[start..i]))?;
                emit(Segment::Var(template[i + 1..close].trim()))?;
                i = close + 1;
                start = i;
            }
            _ => i += 1,
        }
    }

    emit(Segment::Text(&template[start..]))
}
