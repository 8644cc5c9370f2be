//! Physics classification and per-category staging for multi-angle shots.

use super::studio::ANTI_FLOATING;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// How a product naturally rests, which decides how it is staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhysicsCategory {
    ApparelWorn,
    ApparelFlat,
    ApparelGhost,
    WallMounted,
    Suspended,
    HangingOrnament,
    SmallIrregular,
    #[default]
    StandardGround,
}

impl PhysicsCategory {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "APPAREL_WORN" => Self::ApparelWorn,
            "APPAREL_FLAT" => Self::ApparelFlat,
            "APPAREL_GHOST" => Self::ApparelGhost,
            "WALL_MOUNTED" => Self::WallMounted,
            "SUSPENDED" => Self::Suspended,
            "HANGING_ORNAMENT" => Self::HangingOrnament,
            "SMALL_IRREGULAR" => Self::SmallIrregular,
            _ => Self::StandardGround,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApparelWorn => "APPAREL_WORN",
            Self::ApparelFlat => "APPAREL_FLAT",
            Self::ApparelGhost => "APPAREL_GHOST",
            Self::WallMounted => "WALL_MOUNTED",
            Self::Suspended => "SUSPENDED",
            Self::HangingOrnament => "HANGING_ORNAMENT",
            Self::SmallIrregular => "SMALL_IRREGULAR",
            Self::StandardGround => "STANDARD_GROUND",
        }
    }

    pub fn is_hanging(&self) -> bool {
        matches!(self, Self::HangingOrnament | Self::Suspended)
    }

    pub fn staging(&self) -> Staging {
        let (angles, staging) = match self {
            Self::ApparelWorn => (
                [
                    "front view of person wearing it",
                    "three-quarter side view",
                    "back view",
                ],
                "Person wearing the clothing in a professional studio, feet touching the floor",
            ),
            Self::ApparelFlat => (
                [
                    "top-down flat lay",
                    "slightly angled overhead",
                    "detail closeup",
                ],
                "Flat lay on a clean solid surface, fabric fully touching the surface",
            ),
            Self::ApparelGhost => (
                ["front view ghost mannequin", "side view", "back view"],
                "Ghost mannequin effect, bottom hem touching the surface",
            ),
            Self::WallMounted => (
                [
                    "straight-on front",
                    "angled left view",
                    "angled right view",
                ],
                "Mounted on a clean wall with visible mounting hardware",
            ),
            Self::Suspended => (
                ["view from below", "side view", "three-quarter view"],
                "Hanging from a visible ceiling mount, chain or hook",
            ),
            Self::HangingOrnament => (
                [
                    "front view on ornament stand",
                    "side view on display hook",
                    "three-quarter on jewelry bust",
                ],
                "Hanging from an ornament stand or display hook, loop visible at the top, hanging down naturally",
            ),
            Self::SmallIrregular => (
                [
                    "front on display riser",
                    "three-quarter on platform",
                    "side profile on stand",
                ],
                "Placed on a geometric riser, base touching the platform",
            ),
            Self::StandardGround => (
                [
                    "front view standing on floor",
                    "side view on surface",
                    "back view grounded",
                ],
                "Standing firmly on the studio floor, base touching the ground",
            ),
        };
        Staging { angles, staging }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Staging {
    pub angles: [&'static str; 3],
    pub staging: &'static str,
}

impl Staging {
    /// Short labels for the UI, at most 30 characters each.
    pub fn shot_names(&self) -> [String; 3] {
        self.angles.map(|angle| angle.chars().take(30).collect())
    }
}

/// Model output for [`PHYSICS_CLASSIFICATION_PROMPT`]. Missing fields default.
#[derive(Debug, Clone, Deserialize)]
pub struct PhysicsClassification {
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_detected_object")]
    pub detected_object: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_human_model: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_hanging_loop: bool,
}

fn default_detected_object() -> String {
    "Product".to_string()
}

/// Models sometimes answer `"true"`, `"yes"`, `1` or `null` for flags.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "1"
        ),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    })
}

impl Default for PhysicsClassification {
    fn default() -> Self {
        Self {
            category: PhysicsCategory::StandardGround.as_str().to_string(),
            detected_object: default_detected_object(),
            has_human_model: false,
            has_hanging_loop: false,
        }
    }
}

impl PhysicsClassification {
    pub fn physics_category(&self) -> PhysicsCategory {
        PhysicsCategory::parse(&self.category)
    }

    pub fn is_hanging_product(&self) -> bool {
        self.physics_category().is_hanging() || self.has_hanging_loop
    }
}

pub const PHYSICS_CLASSIFICATION_PROMPT: &str = "You are an industrial designer. Classify how the product in this image naturally rests for a photo shoot.

Categories:
- APPAREL_WORN: clothing on a person
- APPAREL_FLAT: folded or flat-laid clothing
- APPAREL_GHOST: ghost mannequin style
- WALL_MOUNTED: signs, shelves and other wall items
- SUSPENDED: large hanging items such as chandeliers or hanging planters
- HANGING_ORNAMENT: small items with a loop, hook, string or ribbon (ornaments, keychains, pendants, bag charms)
- SMALL_IRREGULAR: small items that sit on a surface (boxes, controllers, gadgets)
- STANDARD_GROUND: items that stand on their base (bottles, furniture, boxes)

Any visible hanging loop or hook at the top means HANGING_ORNAMENT.

Reply with JSON only:
{\"category\": \"CATEGORY_NAME\", \"detected_object\": \"short description\", \"has_human_model\": false, \"has_hanging_loop\": false}";

const HANGING_SHOT: &str = "\nHANGING PRODUCT:\n\
- Show it on a display stand, hook or ornament hanger that is clearly visible\n\
- Loop at the top stays visible and the product hangs down with gravity\n";

pub fn angle_shot_prompt(angle: &str, staging: &str, product: &str, is_hanging: bool) -> String {
    let hanging = if is_hanging { HANGING_SHOT } else { "" };
    format!(
        "Professional product photography, {angle}.

REFERENCE: the provided image is the exact product. Keep its color, prints, logos, text, material and hardware identical.

CAMERA: show the product from {angle}, as if the camera moved around a frozen product.

STAGING: {staging}
{hanging}
BACKGROUND: warm beige studio backdrop (#E8DDD0), professional lighting, soft realistic contact shadow.
{ANTI_FLOATING}
PRODUCT: {product}

OUTPUT: the identical product from the requested angle, grounded or displayed in a studio setting."
    )
}
