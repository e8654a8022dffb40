//! Token Counting
//!
//! BPE token counts for prompt annotations and the input-size guard.
//! Encodings load lazily on first use; if one cannot be loaded the counter falls
//! back to a character estimate (4 chars ≈ 1 token) and says so once.

use std::str::FromStr;
use std::sync::LazyLock;

use tiktoken_rs::CoreBPE;
use tracing::warn;

static CL100K: LazyLock<Option<CoreBPE>> = LazyLock::new(|| {
    tiktoken_rs::cl100k_base()
        .map_err(|e| warn!("Failed to load cl100k_base tokenizer: {}", e))
        .ok()
});

static O200K: LazyLock<Option<CoreBPE>> = LazyLock::new(|| {
    tiktoken_rs::o200k_base()
        .map_err(|e| warn!("Failed to load o200k_base tokenizer: {}", e))
        .ok()
});

/// Supported BPE encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// GPT-4 / GPT-3.5 family
    #[default]
    Cl100kBase,
    /// GPT-4o / GPT-5 family
    O200kBase,
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k_base" | "cl100k" => Ok(Self::Cl100kBase),
            "o200k_base" | "o200k" => Ok(Self::O200kBase),
            _ => Err(format!(
                "Unknown encoding: {}. Valid values: cl100k_base, o200k_base",
                s
            )),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cl100kBase => write!(f, "cl100k_base"),
            Self::O200kBase => write!(f, "o200k_base"),
        }
    }
}

/// Token counter bound to one encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCounter {
    encoding: Encoding,
}

impl TokenCounter {
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    /// Counter for a configured encoding name; unknown names use the default
    pub fn for_name(name: &str) -> Self {
        let encoding = name.parse().unwrap_or_else(|e| {
            warn!("{}; using {}", e, Encoding::default());
            Encoding::default()
        });
        Self::new(encoding)
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn count(&self, text: &str) -> usize {
        let bpe = match self.encoding {
            Encoding::Cl100kBase => CL100K.as_ref(),
            Encoding::O200kBase => O200K.as_ref(),
        };
        match bpe {
            Some(bpe) => bpe.encode_ordinary(text).len(),
            None => text.chars().count().div_ceil(4),
        }
    }

    pub fn fits(&self, text: &str, limit: usize) -> bool {
        self.count(text) <= limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_names() {
        assert_eq!("cl100k_base".parse::<Encoding>().unwrap(), Encoding::Cl100kBase);
        assert_eq!("O200K_BASE".parse::<Encoding>().unwrap(), Encoding::O200kBase);
        assert!("p50k".parse::<Encoding>().is_err());
        assert_eq!(TokenCounter::for_name("bogus").encoding(), Encoding::Cl100kBase);
    }

    #[test]
    fn test_count() {
        let counter = TokenCounter::default();
        assert_eq!(counter.count(""), 0);
        let short = counter.count("hello world");
        assert!(short >= 1 && short <= 4);

        let long = "public class Parser { void parse() {} }\n".repeat(50);
        assert!(counter.count(&long) > short);
        assert!(counter.fits("hello", 10));
        assert!(!counter.fits(&long, 5));
    }
}
