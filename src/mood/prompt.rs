use super::descriptors::DescriptorBundle;

/// Builds the text-to-audio prompt for a descriptor bundle.
///
/// Section order is fixed: intro, tempo, one labeled section per descriptor,
/// then the generation rules.
pub fn compose_prompt(bundle: &DescriptorBundle) -> String {
    format!(
        r#"
Create a 30-second instrumental EPA-dunk inspired track.

Tempo: {bpm} BPM.

Style character:
{style}

Energy profile:
{energy}

Drums:
{drums}

Bass:
{bass}

Lead synths:
{lead}

Rules:
- Low values = retro eurodance
- Mid values = modern EDM
- High values = brutal EPA-dunk

The track MUST reflect the descriptions accurately.
No vocals.
Loop-friendly arrangement.
"#,
        bpm = bundle.bpm,
        style = bundle.style,
        energy = bundle.energy,
        drums = bundle.drums,
        bass = bundle.bass,
        lead = bundle.lead,
    )
    .trim()
    .to_string()
}
