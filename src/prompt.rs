//! PII masking prompt template
//!
//! The template carries one worked example (context, task, masked output,
//! output mapping) followed by two substitution points: `{context_str}` for
//! the node text and `{query_str}` for the task sentence. `{{` and `}}`
//! render as literal braces so the example mapping can be written as JSON.

use std::sync::OnceLock;
use thiserror::Error;

/// Instructions and worked example that open the default prompt, as
/// rendered text (the mapping braces are not escaped).
pub const PII_EXAMPLE_PREAMBLE: &str = concat!(
    "The current context information is provided. \n",
    "A task is also provided to mask the PII within the context. \n",
    "Return the text, with all PII masked out, and a mapping of the original PII ",
    "to the masked PII. \n",
    "Return the output of the task in JSON. \n",
    "Context:\n",
    "Hello Zhang Wei, I am John. ",
    "Your AnyCompany Financial Services, ",
    "LLC credit card account 1111-0000-1111-0008 ",
    "has a minimum payment of $24.53 that is due ",
    "by July 31st. Based on your autopay settings, we will withdraw your payment. ",
    "Task: Mask out the PII, replace each PII with a tag, and return the text. Return the mapping in JSON. \n",
    "Output: \n",
    "Hello [NAME1], I am [NAME2]. ",
    "Your AnyCompany Financial Services, ",
    "LLC credit card account [CREDIT_CARD_NUMBER] ",
    "has a minimum payment of $24.53 that is due ",
    "by [DATE_TIME]. Based on your autopay settings, we will withdraw your payment. ",
    "Output Mapping:\n",
    "{\"NAME1\": \"Zhang Wei\", \"NAME2\": \"John\", \"CREDIT_CARD_NUMBER\": \"1111-0000-1111-0008\", \"DATE_TIME\": \"July 31st\"}\n",
    "Context:\n",
);

/// Default task sentence substituted for `{query_str}`.
pub const DEFAULT_TASK: &str = "Mask out the PII, replace each PII with a tag, and return the text. \
                                Return the mapping in JSON.";

const CONTEXT_VAR: &str = "context_str";
const QUERY_VAR: &str = "query_str";

/// Errors from validating a custom template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("unclosed '{{' at byte {0}")]
    UnclosedBrace(usize),
    #[error("unmatched '}}' at byte {0}")]
    UnmatchedBrace(usize),
    #[error("unknown template variable '{0}'")]
    UnknownVariable(String),
    #[error("template is missing the '{{{0}}}' variable")]
    MissingVariable(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Context,
    Query,
}

/// A validated prompt template.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Validate and compile a template.
    ///
    /// Both `{context_str}` and `{query_str}` must appear; any other
    /// `{name}` is rejected.
    pub fn new(template: impl Into<String>) -> Result<Self, PromptError> {
        let source = template.into();
        let segments = compile(&source)?;

        for (var, segment) in [(CONTEXT_VAR, Segment::Context), (QUERY_VAR, Segment::Query)] {
            if !segments.contains(&segment) {
                return Err(PromptError::MissingVariable(var));
            }
        }

        Ok(Self { source, segments })
    }

    /// The raw template text as supplied.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Substitute the context and task text verbatim.
    pub fn render(&self, context_str: &str, query_str: &str) -> String {
        let mut out = String::with_capacity(self.source.len() + context_str.len() + query_str.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Context => out.push_str(context_str),
                Segment::Query => out.push_str(query_str),
            }
        }
        out
    }
}

impl Default for PromptTemplate {
    /// The worked-example masking prompt, built once and cloned.
    fn default() -> Self {
        static DEFAULT: OnceLock<PromptTemplate> = OnceLock::new();
        DEFAULT
            .get_or_init(|| {
                let mut source = PII_EXAMPLE_PREAMBLE.replace('{', "{{").replace('}', "}}");
                source.push_str("{context_str}\nTask: {query_str}\nOutput: \n");
                Self {
                    source,
                    segments: vec![
                        Segment::Literal(PII_EXAMPLE_PREAMBLE.to_string()),
                        Segment::Context,
                        Segment::Literal("\nTask: ".to_string()),
                        Segment::Query,
                        Segment::Literal("\nOutput: \n".to_string()),
                    ],
                }
            })
            .clone()
    }
}

fn compile(template: &str) -> Result<Vec<Segment>, PromptError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, c)) => name.push(c),
                        None => return Err(PromptError::UnclosedBrace(pos)),
                    }
                }
                let segment = match name.as_str() {
                    CONTEXT_VAR => Segment::Context,
                    QUERY_VAR => Segment::Query,
                    _ => return Err(PromptError::UnknownVariable(name)),
                };
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(segment);
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(PromptError::UnmatchedBrace(pos)),
            c => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}
