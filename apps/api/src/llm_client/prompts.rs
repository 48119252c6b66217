// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that pins field names while freeing the content language.
/// Replace `{language}` before use.
pub const LANGUAGE_INSTRUCTION: &str = "\
    CRITICAL: Write every content VALUE (hooks, script, captions, explanations) in {language}. \
    The JSON KEYS are fixed literal tokens: copy them exactly as shown, in lowercase English, \
    and NEVER translate or rename them.";
