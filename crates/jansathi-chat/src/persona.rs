//! Persona definition: the fixed system instruction and scheme variants.
//!
//! Every session is bound to the same base persona ("Asha", a community
//! guide for Ministry of Women & Child Development schemes); selecting a
//! scheme variant appends a contextual note that biases ambiguous queries
//! toward that scheme without locking other topics out.

use std::fmt;
use std::str::FromStr;

/// Base system instruction bound to every session.
pub const BASE_SYSTEM_INSTRUCTION: &str = r#"You are **Asha**, a trusted community guide for the Ministry of Women & Child Development (WCD), Government of India.

**PERSONA:**
*   **Role:** A warm, caring, and knowledgeable community sister helping women and Anganwadi workers navigate government schemes.
*   **Tone:** Empathetic, respectful, authoritative yet non-intimidating.
*   **Language:** Simple, clear, and jargon-free. Explain things as if talking to a neighbor.

**EMERGENCY PROTOCOL (ZERO TOLERANCE):**
Before generating ANY response, check whether the user's input indicates violence, abuse, suicide, self-harm, trafficking, or immediate danger. If so, STOP all other processing and output ONLY the official helplines: Police 100 or 112, Women's Helpline 181, Child Helpline 1098, with a request to move to a safe place and call a human for help now.

**MISSION:**
Provide accurate, rule-based guidance on WCD schemes (Mission Shakti, Mission Vatsalya, and Poshan 2.0).

**CORE RULES:**
1.  **KNOWLEDGE SOURCE HIERARCHY:** Use provided "RETRIEVED CONTEXT" first; use web search ONLY if context is missing. Cited sources MUST be .gov.in or .nic.in.
2.  **BEHAVIOR:** Do not repeat greetings; get straight to the helpful answer. No jargon. Ask clarifying questions gently. Check *if* the user can apply before explaining *how*.

**INTERACTIVE SUGGESTIONS (MANDATORY):**
Always end with 2-4 short suggested user replies in <actions> tags.
Format: <actions>["Option 1", "Option 2"]</actions>"#;

/// Scheme focus selected by the user, shaping the session's contextual note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemeVariant {
    /// No particular scheme; queries are routed on their own merit.
    #[default]
    General,
    /// Women's safety, empowerment, and maternity benefits (PMMVY).
    Shakti,
    /// Child protection, adoption, and foster care.
    Vatsalya,
    /// Nutrition and Anganwadi services.
    Poshan,
}

impl SchemeVariant {
    /// Human-readable scheme title.
    pub fn title(&self) -> &'static str {
        match self {
            SchemeVariant::General => "General Inquiry",
            SchemeVariant::Shakti => "Mission Shakti",
            SchemeVariant::Vatsalya => "Mission Vatsalya",
            SchemeVariant::Poshan => "Poshan 2.0",
        }
    }

    /// Variant-specific note appended to the base instruction, if any.
    pub fn contextual_note(&self) -> Option<String> {
        if *self == SchemeVariant::General {
            return None;
        }
        Some(format!(
            "\n\nCONTEXTUAL NOTE: The user has currently selected the **{}** tab.\n\
             - If the query is ambiguous, focus on {}.\n\
             - HOWEVER, if the user asks about a topic clearly belonging to another mission, answer correctly for that mission.",
            self.title(),
            self.title()
        ))
    }
}

impl fmt::Display for SchemeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for SchemeVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(SchemeVariant::General),
            "shakti" => Ok(SchemeVariant::Shakti),
            "vatsalya" => Ok(SchemeVariant::Vatsalya),
            "poshan" => Ok(SchemeVariant::Poshan),
            other => Err(format!(
                "unknown scheme '{}' (expected general, shakti, vatsalya, or poshan)",
                other
            )),
        }
    }
}

/// Compose the full system instruction for a scheme variant.
pub fn system_instruction(variant: SchemeVariant) -> String {
    match variant.contextual_note() {
        Some(note) => format!("{}{}", BASE_SYSTEM_INSTRUCTION, note),
        None => BASE_SYSTEM_INSTRUCTION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_has_no_note() {
        assert!(SchemeVariant::General.contextual_note().is_none());
        assert_eq!(
            system_instruction(SchemeVariant::General),
            BASE_SYSTEM_INSTRUCTION
        );
    }

    #[test]
    fn test_variant_note_names_the_scheme() {
        let note = SchemeVariant::Shakti.contextual_note().unwrap();
        assert!(note.contains("Mission Shakti"));

        let instruction = system_instruction(SchemeVariant::Poshan);
        assert!(instruction.starts_with(BASE_SYSTEM_INSTRUCTION));
        assert!(instruction.contains("Poshan 2.0"));
    }

    #[test]
    fn test_base_instruction_mandates_action_tags() {
        assert!(BASE_SYSTEM_INSTRUCTION.contains("<actions>"));
        assert!(BASE_SYSTEM_INSTRUCTION.contains("</actions>"));
    }

    #[test]
    fn test_from_str_accepts_known_variants() {
        assert_eq!(
            "shakti".parse::<SchemeVariant>().unwrap(),
            SchemeVariant::Shakti
        );
        assert_eq!(
            " Vatsalya ".parse::<SchemeVariant>().unwrap(),
            SchemeVariant::Vatsalya
        );
        assert_eq!(
            "GENERAL".parse::<SchemeVariant>().unwrap(),
            SchemeVariant::General
        );
        assert!("pension".parse::<SchemeVariant>().is_err());
    }

    #[test]
    fn test_display_matches_title() {
        assert_eq!(SchemeVariant::Poshan.to_string(), "Poshan 2.0");
        assert_eq!(SchemeVariant::General.to_string(), "General Inquiry");
    }
}
