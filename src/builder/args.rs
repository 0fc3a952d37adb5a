//! Configure flag assembly for the FFmpeg package.
//!
//! Flags are appended in a fixed order on top of a profile's baseline, and
//! configure honors the last flag it sees for a feature, so later blocks win
//! over earlier ones. The assembler reads nothing but its arguments.

use crate::core::package::Channel;
use crate::core::platform::{HardwareFacts, Os, PlatformFacts};

/// Encoders, decoders and devices that are never shipped.
pub const TRAILING_DISABLES: &[&str] = &[
    "--disable-encoder=avui,dca,mlp,opus,s302m,sonic,sonic_ls,truehd,vorbis",
    "--disable-decoder=sonic",
    "--disable-libjack",
    "--disable-indev=jack",
];

/// Starting point of a profile's FFmpeg configure line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    /// Flags switching off everything the profile doesn't re-enable
    pub flags: Vec<String>,

    /// GPL codec libraries, enabled only for the community channel
    pub gpl_codecs: Vec<String>,

    /// Use MediaFoundation on Windows
    pub windows_mediafoundation: bool,
}

impl Baseline {
    pub fn new<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Baseline {
            flags: flags.into_iter().map(Into::into).collect(),
            gpl_codecs: Vec::new(),
            windows_mediafoundation: false,
        }
    }

    pub fn gpl_codecs<I, S>(mut self, codecs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gpl_codecs = codecs.into_iter().map(Into::into).collect();
        self
    }

    pub fn windows_mediafoundation(mut self, enabled: bool) -> Self {
        self.windows_mediafoundation = enabled;
        self
    }
}

/// Build the ordered configure arguments.
pub fn assemble(
    baseline: &Baseline,
    platform: &PlatformFacts,
    channel: Channel,
    hardware: &HardwareFacts,
) -> Vec<String> {
    let mut args = baseline.flags.clone();

    // Native OS backends
    match platform.os {
        Os::MacOs => args.extend(
            [
                "--enable-videotoolbox",
                "--enable-audiotoolbox",
                "--extra-ldflags=-Wl,-ld_classic",
            ]
            .map(String::from),
        ),
        Os::Windows if baseline.windows_mediafoundation => {
            args.push("--enable-mediafoundation".to_string());
        }
        _ => {}
    }

    // GPU paths need the vendor headers staged before FFmpeg
    if hardware.nv_codec_headers {
        args.push("--enable-nvenc".to_string());
        args.push("--enable-nvdec".to_string());
    }

    // Licensing
    if channel.is_community() {
        args.extend(baseline.gpl_codecs.iter().map(|c| format!("--enable-{}", c)));
        if !baseline.gpl_codecs.is_empty() {
            args.push("--enable-gpl".to_string());
        }
    } else {
        args.extend(baseline.gpl_codecs.iter().map(|c| format!("--disable-{}", c)));
    }

    args.extend(TRAILING_DISABLES.iter().map(|s| s.to_string()));
    args
}

/// Whether `feature` ends up enabled, judging by the last
/// `--enable-<feature>` / `--disable-<feature>` in `args`.
///
/// Returns `None` if the feature is never mentioned.
pub fn effective(args: &[String], feature: &str) -> Option<bool> {
    args.iter().rev().find_map(|arg| {
        if arg.strip_prefix("--enable-") == Some(feature) {
            Some(true)
        } else if arg.strip_prefix("--disable-") == Some(feature) {
            Some(false)
        } else {
            None
        }
    })
}
