// Shared prompt fragments. Feature prompts live next to the feature
// (see flow/prompts.rs).

/// Appended to every system prompt that expects a machine-readable reply.
pub const JSON_ONLY_SYSTEM: &str = "Reply with exactly one JSON object and nothing else: \
    no prose before or after it, no markdown code fences, no comments inside it.";
