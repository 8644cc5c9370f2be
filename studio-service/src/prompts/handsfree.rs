//! Free-form edit prompts for hands-free mode.

const REQUIREMENTS: &str = "\n\nREQUIREMENTS:\n\
1. IDENTITY: keep the same face, body, hair and clothing as the source image.\n\
2. QUALITY: photorealistic, natural light, realistic shadows, sharp detail.\n\
3. Only the view or angle changes. The subject stays identical.\n\
\n\
TEXT AND LOGOS:\n\
- Existing text and logos are preserved exactly\n\
- Plain items stay plain; never invent prints, text or graphics\n\
\n\
CLEANUP: remove scratches, dust and fingerprints so the product looks new.\n\
\n\
Do not add captions, labels or watermarks.";

/// Build the edit prompt from the user's instruction and requested aspect ratio.
pub fn handsfree_prompt(custom: &str, aspect_ratio: &str) -> String {
    let ratio = aspect_ratio.trim();
    let aspect = if ratio.is_empty() || ratio.eq_ignore_ascii_case("original") {
        String::new()
    } else {
        format!(" Output aspect ratio: {}.", ratio)
    };
    format!("{}{}{}", custom.trim(), aspect, REQUIREMENTS)
}
