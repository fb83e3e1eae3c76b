pub const DEFAULT_PROVIDER: &str = "openrouter";
pub const TEMPERATURE: f32 = 0.7;

pub const ANALYST_PROMPT: &str = "You are a cybersecurity assistant supporting authorized penetration \
testing and bug bounty work. You help with attack surface analysis, vulnerability assessment, \
testing methodology and reading reconnaissance output. Be technical and precise, name concrete \
tools and commands, and format answers with short sections and bullet points. Only give guidance \
for systems the user is authorized to test, and encourage responsible disclosure.";

/// OpenRouter's reasoning model gets a more offensive-minded brief.
pub const OPERATOR_PROMPT: &str = "You are an expert ethical hacker assisting an authorized \
engagement. Your focus areas are attack vector analysis, step-by-step penetration testing \
methodology, vulnerability assessment, payload crafting for the test scope and deep review of \
reconnaissance findings. Answer with specific commands and tools, concrete exploitation steps and \
realistic attack scenarios. Use clear sections, bullet points and code blocks. Only give guidance \
for authorized penetration tests and bug bounty programs, and always recommend responsible \
disclosure.";

/// One chat-completion endpoint and the knobs sent with every request.
#[derive(Debug, Clone)]
pub struct ProviderDef {
    pub id: &'static str,
    pub name: &'static str,
    pub endpoint: String,
    pub model: &'static str,
    pub max_tokens: u32,
    pub system_prompt: &'static str,
    pub extra_headers: Vec<(&'static str, &'static str)>,
}

pub fn openrouter() -> ProviderDef {
    ProviderDef {
        id: "openrouter",
        name: "OpenRouter",
        endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
        model: "deepseek/deepseek-r1:free",
        max_tokens: 2000,
        system_prompt: OPERATOR_PROMPT,
        extra_headers: vec![
            ("HTTP-Referer", "https://reconlab.ai"),
            ("X-Title", "ReconLab AI Assistant"),
        ],
    }
}

pub fn deepseek() -> ProviderDef {
    ProviderDef {
        id: "deepseek",
        name: "DeepSeek",
        endpoint: "https://api.deepseek.com/v1/chat/completions".to_string(),
        model: "deepseek-chat",
        max_tokens: 1000,
        system_prompt: ANALYST_PROMPT,
        extra_headers: Vec::new(),
    }
}

pub fn openai() -> ProviderDef {
    ProviderDef {
        id: "openai",
        name: "OpenAI",
        endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
        model: "gpt-4",
        max_tokens: 1000,
        system_prompt: ANALYST_PROMPT,
        extra_headers: Vec::new(),
    }
}

/// Missing selects OpenRouter; anything unrecognised selects OpenAI.
pub fn select(provider: Option<&str>) -> ProviderDef {
    let id = provider
        .map(|p| p.trim().to_lowercase())
        .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
    match id.as_str() {
        "openrouter" => openrouter(),
        "deepseek" => deepseek(),
        _ => openai(),
    }
}
