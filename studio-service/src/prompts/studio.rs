//! Studio background-swap prompts, keyed by camera angle and product placement.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraAngle {
    Overhead,
    FlatLay,
    #[default]
    Front,
    ThreeQuarter,
    Side,
    FromBelow,
}

impl CameraAngle {
    /// Unknown values fall back to a front view.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "OVERHEAD" => Self::Overhead,
            "FLAT_LAY" => Self::FlatLay,
            "THREE_QUARTER" => Self::ThreeQuarter,
            "SIDE" => Self::Side,
            "FROM_BELOW" => Self::FromBelow,
            _ => Self::Front,
        }
    }

    fn instructions(self) -> &'static str {
        match self {
            Self::Overhead => {
                "\nCAMERA: overhead, looking straight down at the product.\n\
                 - Keep the top-down viewpoint; do not switch to a front view\n\
                 - Shadow spreads outward from the product center\n\
                 - Flat products lie flat with the surface visible around them\n"
            }
            Self::FlatLay => {
                "\nCAMERA: flat lay, directly above.\n\
                 - Product lies flat on the surface\n\
                 - Only soft ambient occlusion at the edges, no side shadows\n"
            }
            Self::Front => {
                "\nCAMERA: front view at eye level.\n\
                 - Product stands or sits upright on the surface\n\
                 - Contact shadow beneath, key light from the upper left at 45 degrees\n"
            }
            Self::ThreeQuarter => {
                "\nCAMERA: three-quarter view at roughly 45 degrees.\n\
                 - Slight diagonal showing front and one side\n\
                 - Product grounded with a visible contact shadow\n"
            }
            Self::Side => {
                "\nCAMERA: pure side profile.\n\
                 - Full silhouette visible\n\
                 - Product standing on the surface with a contact shadow\n"
            }
            Self::FromBelow => {
                "\nCAMERA: low angle looking up.\n\
                 - Product sits above the camera line, suited to suspended items\n"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductPlacement {
    Hanging,
    #[default]
    OnSurface,
    FlatLay,
    Worn,
    Mounted,
}

impl ProductPlacement {
    /// Unknown values fall back to a product resting on a surface.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "HANGING" => Self::Hanging,
            "FLAT_LAY" => Self::FlatLay,
            "WORN" => Self::Worn,
            "MOUNTED" => Self::Mounted,
            _ => Self::OnSurface,
        }
    }

    fn instructions(self) -> &'static str {
        match self {
            Self::Hanging => {
                "\nSTAGING: hanging item.\n\
                 - Show it on a visible hook, stand or ornament display\n\
                 - Loop or string stays visible and the item hangs with gravity\n"
            }
            Self::OnSurface => {
                "\nSTAGING: resting on a solid surface.\n\
                 - Clear contact point and contact shadow\n\
                 - Product looks stable and grounded\n"
            }
            Self::FlatLay => {
                "\nSTAGING: laid flat, seen from above, surface visible around the edges.\n"
            }
            Self::Worn => {
                "\nSTAGING: worn by a person. Keep the person, replace only the background.\n"
            }
            Self::Mounted => {
                "\nSTAGING: mounted on a clean wall with the mounting hardware visible.\n"
            }
        }
    }
}

const BASE: &str = "Professional e-commerce product photography studio.\n\
\n\
BACKGROUND: warm beige seamless backdrop (#E8DDD0), solid, no pattern or texture.\n\
LIGHTING: soft diffused studio light.\n";

const HANGING_OVERRIDE: &str = "\nHANGING PRODUCT:\n\
- Display it on a stand, hook or ornament hanger\n\
- Hanging loop at the top, product hangs down naturally\n\
- Never show it in the air without support\n";

/// Shared with the angle-shot prompts.
pub(crate) const ANTI_FLOATING: &str = "\nGROUNDING RULES:\n\
- The product never floats in mid-air\n\
- It touches a surface or hangs from a visible support\n\
- Resting products show a contact shadow\n\
- The result must read as a real photograph, not a render\n";

const PRESERVATION: &str = "\nPRODUCT PRESERVATION:\n\
- Keep the product completely unchanged\n\
- Exact color, every print, logo and text, same material and proportions\n";

/// Clean prompt for Gemini image output. Contains no section headings that
/// could be rendered into the picture.
pub const GEMINI_STUDIO_PROMPT: &str = "Professional product photography on a clean warm beige studio background. \
Seamless backdrop with soft diffused lighting. \
Product placed naturally with a realistic contact shadow beneath it. \
Preserve every original product detail, color, text and logo exactly. \
High quality e-commerce product photo.";

pub fn studio_prompt(angle: CameraAngle, placement: ProductPlacement, is_hanging: bool) -> String {
    let mut prompt = String::with_capacity(1024);
    prompt.push_str(BASE);
    prompt.push_str(angle.instructions());
    prompt.push_str(placement.instructions());
    if is_hanging {
        prompt.push_str(HANGING_OVERRIDE);
    }
    prompt.push_str(ANTI_FLOATING);
    prompt.push_str(PRESERVATION);
    prompt
}

const KITCHENWARE_BACKGROUND: &str =
    "https://images.unsplash.com/photo-1556909114-f6e7ad7d3136?w=800&h=800&fit=crop";
const FURNITURE_BACKGROUND: &str =
    "https://images.unsplash.com/photo-1586023492125-27b2c045efd7?w=800&h=800&fit=crop";
const OTHER_BACKGROUND: &str =
    "https://images.unsplash.com/photo-1557682250-33bd709cbe85?w=800&h=800&fit=crop";

/// Static stock background used when no generator produced an image.
pub fn fallback_background_url(category: &str) -> &'static str {
    match category {
        "Kitchenware" => KITCHENWARE_BACKGROUND,
        "Furniture" => FURNITURE_BACKGROUND,
        _ => OTHER_BACKGROUND,
    }
}
