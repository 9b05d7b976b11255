//! Mood parameters and the text derived from them.

mod descriptors;
mod params;
mod prompt;

pub use descriptors::{
    describe_bass, describe_drums, describe_energy, describe_lead, describe_style, Band,
    DescriptorBundle,
};
pub use params::{
    coerce_flag, coerce_slider, ParameterSet, RawMoodPayload, MAX_BPM, MIN_BPM, SLIDER_MAX,
};
pub use prompt::compose_prompt;
