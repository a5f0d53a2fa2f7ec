// Shared prompt fragments. Feature-specific prompts live next to the feature
// (see ideas/prompts.rs).

/// System prompt for every call that expects a JSON array back.
pub const JSON_ARRAY_SYSTEM: &str = "You are an expert content strategist and SEO specialist. \
    You MUST respond with a valid JSON array only. \
    Do NOT include any text outside the JSON array. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or comments.";

/// Field list every blog idea in a response must carry.
pub const BLOG_IDEA_FIELDS: &str = "\
Each blog idea must include these exact fields:
- title: string (compelling and SEO-friendly)
- description: string (2-3 sentences)
- content_format: string (how_to_guide, listicle, case_study, comparison, trend_analysis, or tutorial)
- difficulty_level: string (beginner, intermediate, or advanced)
- primary_keywords: array of strings (3-5 keywords relevant to the title and description, no generic keywords)
- secondary_keywords: array of strings (5-8 keywords relevant to the title and description, no generic keywords)
- outline: array of strings (5-8 sections)
- key_points: array of strings (3-5 points)
- business_value: string (how this helps the audience)
- call_to_action: string (what readers should do)
- estimated_word_count: number (1500-4000)
- estimated_reading_time: number (5-20 minutes)";
