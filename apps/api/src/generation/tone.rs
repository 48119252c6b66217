//! Tone and platform calibration: static guidance tables fed into the prompt.

use crate::models::request::{Platform, Tone};

/// Strategy and phrasing calibrated to one content tone.
#[derive(Debug, Clone)]
pub struct ToneProfile {
    pub label: &'static str,
    pub strategy: &'static str,
    pub hook_styles: &'static [&'static str],
    pub avoid: &'static [&'static str],
}

/// Returns the guidance profile for a tone.
pub fn tone_profile(tone: Tone) -> ToneProfile {
    match tone {
        Tone::Controversial => ToneProfile {
            label: "Controversial",
            strategy: "Challenge a belief the audience holds. Take a clear side and defend it. \
                Built for fast growth through comments and shares.",
            hook_styles: &["Pattern Interrupt", "Bold Claim", "Us vs Them"],
            avoid: &["hedging", "both-sides framing", "soft openers"],
        },
        Tone::Educational => ToneProfile {
            label: "Educational",
            strategy: "Teach one concrete, non-obvious idea with a clear payoff. \
                Built for authority and saves.",
            hook_styles: &["Curiosity Gap", "Common Mistake", "Direct Benefit"],
            avoid: &["jargon without explanation", "listing more than 3 points", "vague tips"],
        },
        Tone::Storytelling => ToneProfile {
            label: "Storytelling",
            strategy: "Open inside a moment of tension, build to a turn, land an emotional payoff. \
                Built for connection and watch time.",
            hook_styles: &["In Medias Res", "Confession", "Stakes First"],
            avoid: &["long backstory before the hook", "morals stated outright", "flat endings"],
        },
        Tone::DirectSales => ToneProfile {
            label: "Direct Sales",
            strategy: "Name the pain, show the outcome, make one specific offer. \
                Built for conversion.",
            hook_styles: &["Pain Point", "Result Reveal", "Direct Benefit"],
            avoid: &["multiple calls to action", "feature dumps", "fake urgency"],
        },
    }
}

/// Pacing constraints for a short-form platform.
#[derive(Debug, Clone, Copy)]
pub struct PlatformProfile {
    pub target_seconds: u32,
    pub pacing: &'static str,
}

pub fn platform_profile(platform: Platform) -> PlatformProfile {
    match platform {
        Platform::Tiktok => PlatformProfile {
            target_seconds: 30,
            pacing: "Hook inside the first 2 seconds; a visual change every 2-3 seconds.",
        },
        Platform::InstagramReels => PlatformProfile {
            target_seconds: 30,
            pacing: "Hook inside the first 3 seconds; polished visuals; text overlays carry the message muted.",
        },
        Platform::YoutubeShorts => PlatformProfile {
            target_seconds: 45,
            pacing: "Hook inside the first 3 seconds; loopable ending that flows back into the opening.",
        },
    }
}
