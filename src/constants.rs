//! Global Constants
//!
//! Centralized constants for configuration and tuning.

/// Orchestrator constants
pub mod pipeline {
    /// Maximum stage executions per run (five stages plus slack)
    pub const DEFAULT_MAX_STEPS: usize = 8;

    /// Extra steps granted per allowed revision cycle (Research, Math, Critic)
    pub const STEPS_PER_REVISION: usize = 3;

    /// Characters of each slot shown to the Critic
    pub const CRITIC_PREVIEW_CHARS: usize = 500;

    /// Progress channel capacity
    pub const PROGRESS_CHANNEL_CAPACITY: usize = 64;
}

/// Stage temperatures
pub mod temperature {
    pub const OUTLINE: f32 = 0.1;
    pub const RESEARCH: f32 = 0.0;
    pub const MATH: f32 = 0.0;
    pub const CRITIC: f32 = 0.0;
    pub const WRITER: f32 = 0.2;
}

/// Generation service defaults
pub mod llm {
    pub const DEFAULT_PROVIDER: &str = "azure";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
    pub const DEFAULT_MAX_TOKENS: usize = 4096;
    pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";
    pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

    /// Environment variables read when the config leaves a value empty
    pub mod env {
        pub const AZURE_API_KEY: &str = "AZURE_OPENAI_API_KEY";
        pub const AZURE_API_BASE: &str = "AZURE_OPENAI_API_BASE";
        pub const AZURE_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
        pub const AZURE_DEPLOYMENT: &str = "AZURE_OPENAI_API_DEPLOYMENT_NAME";
        pub const AZURE_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
        pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    }
}

/// Research stage defaults
pub mod research {
    /// Domain data injected into the Research prompt
    pub const DEFAULT_DATA_BLOCK: &str = "DONNÉES 2024:
- PIB USA: 28,000 milliards USD
- PIB New York: 2,200 milliards USD
- Population USA: 335 millions
- Population NY: 19.5 millions
- Secteurs NY: Finance 30%, Immobilier 15%, Tech 12%, Santé 10%
- Croissance NY 2023-2024: 4.8%
- PIB NY 2023: 2,100 milliards
- PIB NY 2022: 2,000 milliards";

    /// Computations the Math stage must perform
    pub const DEFAULT_COMPUTATIONS: &[&str] = &[
        "Part NY/USA: (2200/28000)*100",
        "PIB/habitant NY et USA",
        "Ratio PIB/hab NY vs USA",
        "Part population NY/USA",
        "Croissance 2023-2024",
    ];
}

/// Report persistence constants
pub mod report {
    pub const DEFAULT_REQUEST: &str = "Rédige un rapport complet sur la part du PIB de l'État de New York dans celui des États-Unis en 2024; inclure méthodologie, chiffres si disponibles, limites.";

    pub const FILE_PREFIX: &str = "rapport";

    /// Request characters considered when building a file name
    pub const SLUG_SOURCE_CHARS: usize = 50;

    /// Maximum length of the request slug in a file name
    pub const SLUG_MAX_CHARS: usize = 30;

    /// Characters of the report shown after generation
    pub const PREVIEW_CHARS: usize = 200;

    pub const INDEX_FILE: &str = "index.json";

    /// Reports listed or kept by default
    pub const DEFAULT_KEEP: usize = 10;
}

/// Search tool constants
pub mod search {
    pub const WIKI_API_URL: &str = "https://en.wikipedia.org/w/api.php";
    pub const WIKI_SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary/";

    /// Calls allowed per process
    pub const DEFAULT_CALL_LIMIT: u32 = 3;
    pub const DEFAULT_MAX_RESULTS: usize = 2;
    pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
    pub const EXTRACT_CHARS: usize = 400;

    pub const LIMIT_REACHED: &str = "tool_guard: limit reached";
    pub const NO_RESULTS: &str = "no_results";
    pub const NO_SUMMARIES: &str = "no_summaries";
}
