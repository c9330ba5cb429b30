use clap::Parser;
use thiserror::Error;

pub const PROMPT_ENGLISH: &str = "You are a concise translation engine. Translate the following text into English. Output in Markdown format if helpful (e.g. code blocks, bold text).";
pub const PROMPT_CHINESE: &str = "You are a concise translation engine. Translate the following text into Simplified Chinese. Output in Markdown format if helpful.";
pub const PROMPT_NAMING: &str = "You are a coding assistant. Provide variable/class naming suggestions for the given description. Output formatted list: CamelCase, snake_case, PascalCase, CONSTANT_CASE. Use Markdown lists.";
pub const PROMPT_DICTIONARY: &str = "You are a sophisticated dictionary. For the given word/phrase, provide: 1. Phonetic (IPA), 2. Meaning (CN/EN), 3. 2-3 Examples, 4. Common Collocations. Use Markdown formatting (bold keys, lists, etc).";
pub const PROMPT_RAW: &str = "You are a helpful assistant. Follow the user's instructions directly. Use Markdown for clarity.";

pub const AUTH_USAGE: &str = "Usage: trans -a <base_url>,<api_key>\nExample: trans -a https://api.openai.com/v1,sk-xxxx";

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "trans", version)]
#[command(about = "An LLM-powered command-line translator")]
#[command(
    long_about = "Translate text, suggest identifier names and look up words with any OpenAI-compatible chat API.\n\nText is taken from the arguments, or from standard input when it is piped."
)]
pub struct Cli {
    /// Text to process (read from standard input when omitted)
    pub text: Vec<String>,

    /// Translate into Simplified Chinese
    #[arg(short, long)]
    pub chinese: bool,

    /// Suggest variable/class names for a description
    #[arg(short, long)]
    pub name: bool,

    /// Dictionary lookup for a word or phrase
    #[arg(short, long)]
    pub word: bool,

    /// Send the text as a plain instruction
    #[arg(short, long)]
    pub prompt: bool,

    /// Save provider settings: <base_url>,<api_key>
    #[arg(short, long, value_name = "BASE_URL,API_KEY")]
    pub auth: Vec<String>,

    /// Switch model, or 'list' to show available models
    #[arg(short, long, value_name = "NAME|list")]
    pub model: Option<String>,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        Mode::from_flags(self.chinese, self.name, self.word, self.prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Chinese,
    Naming,
    Dictionary,
    Raw,
    English,
}

impl Mode {
    /// First set flag wins, in the order chinese, name, word, prompt.
    pub fn from_flags(chinese: bool, name: bool, word: bool, prompt: bool) -> Self {
        [
            (chinese, Self::Chinese),
            (name, Self::Naming),
            (word, Self::Dictionary),
            (prompt, Self::Raw),
        ]
        .into_iter()
        .find_map(|(set, mode)| set.then_some(mode))
        .unwrap_or(Self::English)
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::Chinese => PROMPT_CHINESE,
            Self::Naming => PROMPT_NAMING,
            Self::Dictionary => PROMPT_DICTIONARY,
            Self::Raw => PROMPT_RAW,
            Self::English => PROMPT_ENGLISH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("expected <base_url>,<api_key> but found {found} value(s)")]
    Auth { found: usize },
}

/// Splits `-a` values into a base URL and an API key.
///
/// A single `-a` value followed by a positional argument takes that argument
/// as the second value, so `-a <url> <key>` works too.
pub fn parse_credentials(auth: &[String], positional: &[String]) -> Result<Credentials, UsageError> {
    let mut values: Vec<&str> = auth.iter().map(String::as_str).collect();
    if values.len() == 1
        && let Some(first) = positional.first()
    {
        values.push(first.as_str());
    }

    let tokens: Vec<&str> = values
        .into_iter()
        .flat_map(|value| value.split([',', ' ']))
        .filter(|token| !token.is_empty())
        .collect();

    match tokens.as_slice() {
        [base_url, api_key, ..] => Ok(Credentials {
            base_url: (*base_url).to_string(),
            api_key: (*api_key).to_string(),
        }),
        _ => Err(UsageError::Auth {
            found: tokens.len(),
        }),
    }
}
