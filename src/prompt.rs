//! Prompt composition for the yacht scene

/// Scene preset shown to the visitor and folded into every instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptPreset {
    pub scene: &'static str,
    pub guidance: &'static str,
}

macro_rules! yacht_guidance {
    () => {
        "golden-hour rim light, shallow DOF, teak deck, chrome rail, turquoise water bokeh"
    };
}

pub const YACHT_PRESET: PromptPreset = PromptPreset {
    scene: "yacht",
    guidance: yacht_guidance!(),
};

/// Joins the non-empty prompt segments
pub const SEPARATOR: &str = " — ";

/// Used when no user photo is supplied
pub const EDIT_BASE: &str = "Edit the provided yacht photo according to the instructions. \
Keep the result photorealistic and preserve the original lighting, perspective, \
color grading and camera characteristics of the scene.";

/// Used when a user photo accompanies the scene
pub const COMPOSITE_BASE: &str = "Place the person from the second image onto the yacht \
in the first image. Keep their face, skin tone, hairstyle and identity unchanged. \
Frame them from the waist up near the chrome rail, facing the camera with a relaxed pose, \
and match the scene's lighting, shadows and color temperature so they look photographed \
on board. Output a vertical 4:5 portrait.";

/// Appended to every instruction
pub const EXTRA_INSTRUCTIONS: &str = concat!(
    "Extra instructions: ",
    yacht_guidance!(),
    ". No text, logos or watermarks."
);

/// Generation mode, selected by whether a user photo is present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    Edit,
    Composite,
}

impl PromptMode {
    pub fn for_user_image(has_user_image: bool) -> Self {
        if has_user_image {
            Self::Composite
        } else {
            Self::Edit
        }
    }

    pub fn base(self) -> &'static str {
        match self {
            Self::Edit => EDIT_BASE,
            Self::Composite => COMPOSITE_BASE,
        }
    }
}

/// Build the model instruction from the mode base, the extra clause and the
/// trimmed user text, skipping empty segments.
pub fn compose(user_prompt: &str, has_user_image: bool) -> String {
    let mode = PromptMode::for_user_image(has_user_image);
    [mode.base(), EXTRA_INSTRUCTIONS, user_prompt.trim()]
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Prompt pre-filled in the generator widget
pub fn default_user_prompt() -> String {
    format!("Photoreal portrait on a {}, {}", YACHT_PRESET.scene, YACHT_PRESET.guidance)
}
