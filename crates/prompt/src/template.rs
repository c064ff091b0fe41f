//! Prompt templates with `{name}` placeholders.
//!
//! The template text is parsed once, at construction. Rendering is a single
//! substitution pass over the parsed segments, so a substituted value is
//! never scanned for placeholders again. `{{` and `}}` produce literal braces.

use chainwright_core::error::{Error, Result, TemplateError};
use chainwright_core::message::Message;
use chainwright_core::Variables;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// An immutable, pre-parsed prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
    segments: Vec<Segment>,
    /// Placeholder names in order of first appearance.
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Parse a template. Fails if the braces do not form valid placeholders.
    pub fn new(text: impl Into<String>) -> std::result::Result<Self, TemplateError> {
        let text = text.into();
        let segments = parse_segments(&text)?;

        let mut variables: Vec<String> = Vec::new();
        for segment in &segments {
            if let Segment::Variable(name) = segment {
                if !variables.contains(name) {
                    variables.push(name.clone());
                }
            }
        }

        Ok(Self {
            text,
            segments,
            variables,
        })
    }

    /// The raw template text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Placeholder names, in order of first appearance.
    pub fn input_variables(&self) -> &[String] {
        &self.variables
    }

    /// Substitute every placeholder from `values`.
    ///
    /// Fails with [`Error::MissingVariable`] naming the first unbound
    /// placeholder. Extra entries in `values` are ignored.
    pub fn render(&self, values: &Variables) -> Result<String> {
        if let Some(missing) = self.variables.iter().find(|v| !values.contains_key(*v)) {
            return Err(Error::MissingVariable(missing.clone()));
        }

        let mut out = String::with_capacity(self.text.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Variable(name) => {
                    // Presence checked above.
                    if let Some(value) = values.get(name) {
                        out.push_str(value);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Render and wrap the result as a user message.
    pub fn render_message(&self, values: &Variables) -> Result<Message> {
        Ok(Message::user(self.render(values)?))
    }
}

impl std::str::FromStr for PromptTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s)
    }
}

fn parse_segments(text: &str) -> std::result::Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = text.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' => {
                if chars.peek().is_some_and(|&(_, next)| next == '{') {
                    chars.next();
                    literal.push('{');
                    continue;
                }

                let mut name = String::new();
                let mut closed = false;
                for (_, next) in chars.by_ref() {
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    name.push(next);
                }

                if !closed {
                    return Err(TemplateError::Unclosed { position });
                }
                if !is_valid_name(&name) {
                    return Err(TemplateError::InvalidName { name, position });
                }

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Variable(name));
            }
            '}' => {
                if chars.peek().is_some_and(|&(_, next)| next == '}') {
                    chars.next();
                    literal.push('}');
                } else {
                    return Err(TemplateError::UnmatchedClose { position });
                }
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
