//! Pure mappings from mood parameters to English descriptor fragments.
//!
//! Every slider is split into three bands with thresholds at 33 and 66
//! (`< 33`, `33..66`, `>= 66`). Each band selects one fixed fragment; a few
//! functions then append clauses in a fixed order.

use serde::{Deserialize, Serialize};

use super::params::ParameterSet;

const LOW_UPPER: u8 = 33;
const MID_UPPER: u8 = 66;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Low,
    Mid,
    High,
}

impl Band {
    pub fn of(value: u8) -> Band {
        if value < LOW_UPPER {
            Band::Low
        } else if value < MID_UPPER {
            Band::Mid
        } else {
            Band::High
        }
    }

    fn pick(self, low: &'static str, mid: &'static str, high: &'static str) -> &'static str {
        match self {
            Band::Low => low,
            Band::Mid => mid,
            Band::High => high,
        }
    }
}

pub fn describe_style(style: u8) -> String {
    Band::of(style)
        .pick(
            "retro 90s eurodance with lo-fi drum machines, plastic synths and naive hooks",
            "modern EDM dance-pop hybrid with clean bright synths",
            "hyper-modern Scandinavian EPA-dunk with brutal aggressive sound",
        )
        .to_string()
}

pub fn describe_energy(energy: u8) -> String {
    Band::of(energy)
        .pick(
            "low-energy smooth groove with mellow dynamics",
            "medium-high intensity with punchy rhythmic movement",
            "extreme aggressive EPA-style energy with clipped peaks",
        )
        .to_string()
}

pub fn describe_drums(drums: u8, energy: u8) -> String {
    let band = Band::of(drums);
    let mut text = band
        .pick(
            "soft eurodance drum machine: gentle kick and bright hats",
            "tight modern EDM drums: punchy kick and crisp hats",
            "hardstyle-influenced EPA drums with distorted kick",
        )
        .to_string();

    if band == Band::High && Band::of(energy) == Band::High {
        text.push_str(", even more aggressive due to extreme energy");
    }
    text
}

pub fn describe_bass(energy: u8, style: u8, bass_boost: bool, distortion: bool) -> String {
    let mut text = Band::of(energy)
        .pick(
            "soft warm sub-bass with minimal distortion",
            "punchy EDM bass with moderate saturation",
            "extreme EPA-dunk bass with blown-out distortion",
        )
        .to_string();

    match Band::of(style) {
        Band::Low => text.push_str(", retro analog texture"),
        Band::High => text.push_str(", modern hyper-digital tone"),
        Band::Mid => {}
    }
    if bass_boost {
        text.push_str(", deep sub-boost");
    }
    if distortion {
        text.push_str(", extra heavy distortion");
    }
    text
}

pub fn describe_lead(energy: u8, style: u8, distortion: bool) -> String {
    let mut text = Band::of(energy)
        .pick(
            "soft mellow eurodance-style lead",
            "bright EDM saw lead with rhythmic motion",
            "intense screaming EPA lead dominating the mix",
        )
        .to_string();

    match Band::of(style) {
        Band::Low => text.push_str(", retro square/saw character"),
        Band::High => text.push_str(", polished modern digital tone"),
        Band::Mid => {}
    }
    if distortion {
        text.push_str(", with extra biting distortion");
    }
    text
}

/// All descriptor fragments for one parameter set, plus the derived tempo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorBundle {
    pub bpm: u16,
    pub style: String,
    pub energy: String,
    pub drums: String,
    pub bass: String,
    pub lead: String,
}

impl DescriptorBundle {
    pub fn from_params(params: &ParameterSet) -> Self {
        Self {
            bpm: params.bpm(),
            style: describe_style(params.style),
            energy: describe_energy(params.energy),
            drums: describe_drums(params.drums, params.energy),
            bass: describe_bass(
                params.energy,
                params.style,
                params.bass_boost,
                params.distortion,
            ),
            lead: describe_lead(params.energy, params.style, params.distortion),
        }
    }
}
