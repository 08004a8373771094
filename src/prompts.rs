//! Prompt templates for the extraction system prompt.
//!
//! Templates are a closed set of consts looked up by slug; fragment text
//! (definitions, guidelines, statement information, examples) is passed in
//! explicitly by the caller rather than read from a process-wide registry.

/// Fragment contents assembled into a system prompt.
///
/// `logical_operator` is not substituted into the template body; it is the
/// standalone system text for the optional second refinement pass and rides
/// along with the other fragments.
#[derive(Debug, Clone, Default)]
pub struct PromptFragments {
    pub definitions: String,
    pub guidelines: String,
    pub statement_information: String,
    pub examples: Option<String>,
    pub logical_operator: Option<String>,
}

/// A system-prompt template with placeholders.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub slug: &'static str,
    pub body: &'static str,
    pub with_examples: bool,
}

impl PromptTemplate {
    /// Fill in the template. An examples section is present only in the
    /// `*_with_examples` templates; a missing examples fragment renders empty.
    pub fn render(&self, statement_type: &str, fragments: &PromptFragments) -> String {
        let mut body = self
            .body
            .replace("{statement_type}", statement_type)
            .replace("{definitions}", fragments.definitions.trim())
            .replace("{guidelines}", fragments.guidelines.trim())
            .replace(
                "{statement_information}",
                fragments.statement_information.trim(),
            );
        if self.with_examples {
            let examples = fragments.examples.as_deref().unwrap_or("").trim();
            body = body.replace("{examples}", examples);
        }
        body.trim().to_string()
    }
}

const BASE_BODY: &str = r#"You are an expert annotator of institutional statements. Extract the grammar components of the {statement_type} statement the user provides.

### Component Definitions
{definitions}

### Statement Information
{statement_information}

### Guidelines
{guidelines}

Return only a valid JSON object mapping component symbols to lists of text spans copied verbatim from the statement. Omit components that do not occur.
Example: {"A": ["the commission"], "D": ["shall"]}"#;

const BASE_BODY_WITH_EXAMPLES: &str = r#"You are an expert annotator of institutional statements. Extract the grammar components of the {statement_type} statement the user provides.

### Component Definitions
{definitions}

### Statement Information
{statement_information}

### Guidelines
{guidelines}

### Examples
{examples}

Return only a valid JSON object mapping component symbols to lists of text spans copied verbatim from the statement. Omit components that do not occur.
Example: {"A": ["the commission"], "D": ["shall"]}"#;

pub const REGULATIVE: PromptTemplate = PromptTemplate {
    slug: "regulative",
    body: BASE_BODY,
    with_examples: false,
};

pub const REGULATIVE_WITH_EXAMPLES: PromptTemplate = PromptTemplate {
    slug: "regulative_with_examples",
    body: BASE_BODY_WITH_EXAMPLES,
    with_examples: true,
};

pub const CONSTITUTIVE: PromptTemplate = PromptTemplate {
    slug: "constitutive",
    body: BASE_BODY,
    with_examples: false,
};

pub const CONSTITUTIVE_WITH_EXAMPLES: PromptTemplate = PromptTemplate {
    slug: "constitutive_with_examples",
    body: BASE_BODY_WITH_EXAMPLES,
    with_examples: true,
};

pub const TEMPLATES: &[PromptTemplate] = &[
    REGULATIVE,
    REGULATIVE_WITH_EXAMPLES,
    CONSTITUTIVE,
    CONSTITUTIVE_WITH_EXAMPLES,
];

pub fn template_by_slug(slug: &str) -> Option<PromptTemplate> {
    TEMPLATES.iter().find(|t| t.slug == slug).copied()
}

// =============================================================================
// TESTS
// =============================================================================
