// Cross-cutting prompt fragments. Feature modules keep their own prompts.rs
// next to the code that uses them.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to extraction prompts so the model never fills gaps.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Only use information present in the input. \
    If a field is not present, use null (or an empty array for lists). \
    Never guess contact details, dates, or employers.";
