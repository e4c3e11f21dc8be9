/// UI language. Every user-facing string the client shows comes from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Swedish,
    English,
}

/// Fixed strings for one language.
#[derive(Debug)]
pub struct Strings {
    pub placeholder: &'static str,
    pub input_hint: &'static str,
    pub send: &'static str,
    pub user_label: &'static str,
    pub typing: &'static str,
    pub fallback: &'static str,
    pub title_suffix: &'static str,
    pub subtitle: &'static str,
    pub info_heading: &'static str,
    pub info_description: &'static str,
    pub source_material: &'static str,
}

/// Components of the system, shown as badges in the header info card.
pub const STACK_BADGES: &[&str] = &["LangChain", "ChromaDB", "Flask API", "Ratatui", "Gemini API"];

const SWEDISH: Strings = Strings {
    placeholder: "Ställ en fråga om dina dokument för att börja...",
    input_hint: "Skriv din fråga här...",
    send: "Sök",
    user_label: "Du",
    typing: "skriver",
    fallback: "Kunde inte hämta svar.",
    title_suffix: "RAG Assistant",
    subtitle: "DEMO/POC VERSION",
    info_heading: "Systemarkitektur",
    info_description: "RAG-assistent som hämtar kontext via semantisk sökning och genererar svar med Gemini 2.5/3.",
    source_material: "PDF-material: Kapitel 1 och 2 av \"Lär dig AI från grunden, Tillämpad maskinlärning med Python\" av Prgomet, Johnsson, Solberg & Streuli",
};

const ENGLISH: Strings = Strings {
    placeholder: "Ask a question about your documents to get started...",
    input_hint: "Type your question here...",
    send: "Send",
    user_label: "You",
    typing: "is typing",
    fallback: "Could not fetch an answer.",
    title_suffix: "RAG Assistant",
    subtitle: "DEMO/POC VERSION",
    info_heading: "System architecture",
    info_description: "RAG assistant that retrieves context through semantic search and generates answers with Gemini 2.5/3.",
    source_material: "PDF material: chapters 1 and 2 of \"Lär dig AI från grunden, Tillämpad maskinlärning med Python\" by Prgomet, Johnsson, Solberg & Streuli",
};

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Swedish => "sv",
            Language::English => "en",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sv" | "swedish" | "svenska" => Some(Language::Swedish),
            "en" | "english" => Some(Language::English),
            _ => None,
        }
    }

    pub fn all() -> Vec<Language> {
        vec![Language::Swedish, Language::English]
    }

    pub fn strings(&self) -> &'static Strings {
        match self {
            Language::Swedish => &SWEDISH,
            Language::English => &ENGLISH,
        }
    }

    /// Text of the transient indicator shown while a request is outstanding.
    pub fn typing_indicator(&self, assistant: &str, frame: u8) -> String {
        let dots = ".".repeat(usize::from(frame % 3) + 1);
        format!("{} {}{}", assistant, self.strings().typing, dots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_accepts_codes_and_names() {
        assert_eq!(Language::from_str("sv"), Some(Language::Swedish));
        assert_eq!(Language::from_str(" English "), Some(Language::English));
        assert_eq!(Language::from_str("de"), None);
        for lang in Language::all() {
            assert_eq!(Language::from_str(lang.as_str()), Some(lang));
        }
    }

    #[test]
    fn test_swedish_fallback_text() {
        assert_eq!(Language::Swedish.strings().fallback, "Kunde inte hämta svar.");
    }

    #[test]
    fn test_typing_indicator_cycles_dots() {
        assert_eq!(Language::Swedish.typing_indicator("Gemini", 0), "Gemini skriver.");
        assert_eq!(Language::English.typing_indicator("Gemini", 2), "Gemini is typing...");
        assert_eq!(Language::English.typing_indicator("Gemini", 3), "Gemini is typing.");
    }
}
