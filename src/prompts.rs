//! Prompt templates for per-question scoring.
//!
//! Domain logic for rendering scoring prompts and the expected response
//! markers. Provider-agnostic.

use crate::gateway::Message;

// =============================================================================
// Prompt templates
// =============================================================================

/// Rendered prompt ready for the scoring provider.
#[derive(Debug, Clone)]
pub struct PromptInstance {
    pub template_slug: String,
    pub system: String,
    pub user: String,
}

impl PromptInstance {
    pub fn to_messages(&self) -> Vec<Message> {
        vec![Message::system(&self.system), Message::user(&self.user)]
    }
}

/// A scoring prompt template with placeholders, plus the response contract
/// that goes with it.
///
/// The score/comment markers are configuration: a rubric in another language
/// swaps markers without touching the parser.
#[derive(Debug, Clone, Copy)]
pub struct ScorePrompt {
    pub slug: &'static str,
    pub system: &'static str,
    pub user: &'static str,
    /// Line prefix the scorer must use for the numeric score.
    pub score_marker: &'static str,
    /// Line prefix the scorer must use for the comment.
    pub comment_marker: &'static str,
    /// Sampling temperature for this template.
    pub temperature: f32,
    /// Generation cap per answer.
    pub max_tokens: u32,
}

impl ScorePrompt {
    pub fn render(
        &self,
        category: &str,
        question: &str,
        document_text: &str,
        scale_max: u8,
        scale_guide: &str,
    ) -> PromptInstance {
        let scale_max = scale_max.to_string();

        let system = self
            .system
            .replace("{scale_max}", &scale_max)
            .replace("{scale_guide}", scale_guide);

        let user = self
            .user
            .replace("{category}", category)
            .replace("{question}", question)
            .replace("{scale_max}", &scale_max)
            .replace("{scale_guide}", scale_guide)
            .replace("{document}", document_text);

        PromptInstance {
            template_slug: self.slug.to_string(),
            system: system.trim().to_string(),
            user: user.trim().to_string(),
        }
    }
}

// =============================================================================
// Standard prompts
// =============================================================================

/// Prompt for the unweighted startup rubrics (0–3 scale).
pub const STARTUP_PROMPT: ScorePrompt = ScorePrompt {
    slug: "startup_v1",
    system: "Du er en ekspert på å evaluere søknader til Innovasjon Norge. \
             Gi en score fra 0-{scale_max} og en kort kommentar.",
    user: r#"Basert på følgende søknad, gi en score fra 0-{scale_max} for dette spørsmålet: {question}

Bruk denne scoringsskalaen:
{scale_guide}

Søknad: {document}

Svar i følgende format:
Score: [0-{scale_max}]
Kommentar: [kort kommentar]"#,
    score_marker: "Score:",
    comment_marker: "Kommentar:",
    temperature: 0.3,
    max_tokens: 200,
};

/// Prompt for the weighted cluster rubric (0–4 scale).
pub const CLUSTER_PROMPT: ScorePrompt = ScorePrompt {
    slug: "cluster_v1",
    system: "Du er en objektiv ekspert på å evaluere klyngesøknader til NIC. \
             Gi konstruktive og direkte vurderinger basert på 0-{scale_max} skala.",
    user: r#"Du er en objektiv og konstruktiv ekspert på å evaluere klyngesøknader til NIC (Norwegian Innovation Clusters).

Evaluer følgende spørsmål for kategorien "{category}":
{question}

Bruk denne scoringsskalaen:
{scale_guide}

Søknadstekst: {document}

Vær direkte, objektiv og konstruktiv i din vurdering. Fokuser på å nå målet med evalueringen.

Svar i følgende format:
Score: [0-{scale_max}]
Kommentar: [kort, konstruktiv kommentar]"#,
    score_marker: "Score:",
    comment_marker: "Kommentar:",
    temperature: 0.2,
    max_tokens: 200,
};

pub const PROMPTS: &[ScorePrompt] = &[STARTUP_PROMPT, CLUSTER_PROMPT];

pub fn prompt_by_slug(slug: &str) -> Option<ScorePrompt> {
    PROMPTS.iter().find(|t| t.slug == slug).copied()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_prompt_render() {
        let p = STARTUP_PROMPT.render(
            "Verdiskapning",
            "Hvor godt er kundeverdien beskrevet?",
            "Søknadstekst her.",
            3,
            "0 = dårlig\n3 = bra",
        );
        assert!(p.system.contains("0-3"));
        assert!(p.user.contains("Hvor godt er kundeverdien beskrevet?"));
        assert!(p.user.contains("0 = dårlig"));
        assert!(p.user.contains("Søknadstekst her."));
        assert!(p.user.contains("Score: [0-3]"));
    }

    #[test]
    fn cluster_prompt_includes_category() {
        let p = CLUSTER_PROMPT.render(
            "Klyngens rolle",
            "Beskriver klyngens fokusområder",
            "doc",
            4,
            "guide",
        );
        assert!(p.user.contains("kategorien \"Klyngens rolle\""));
        assert!(p.user.contains("Score: [0-4]"));
    }

    #[test]
    fn to_messages_is_system_then_user() {
        let p = STARTUP_PROMPT.render("k", "q", "d", 3, "g");
        let messages = p.to_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, p.system);
        assert_eq!(messages[1].content, p.user);
    }

    #[test]
    fn prompt_lookup() {
        assert!(prompt_by_slug("startup_v1").is_some());
        assert!(prompt_by_slug("cluster_v1").is_some());
        assert!(prompt_by_slug("nonexistent").is_none());
    }

    #[test]
    fn markers_default_to_norwegian_contract() {
        assert_eq!(STARTUP_PROMPT.score_marker, "Score:");
        assert_eq!(STARTUP_PROMPT.comment_marker, "Kommentar:");
        assert_eq!(CLUSTER_PROMPT.comment_marker, "Kommentar:");
    }
}
