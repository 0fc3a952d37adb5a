//! The package catalog: which sources make up each build profile.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::builder::args::{assemble, Baseline};
use crate::core::errors::PipelineError;
use crate::core::package::{BuildSystem, Channel, PackageDescriptor, Visibility};
use crate::core::platform::{HardwareFacts, Os, PlatformFacts};
use crate::core::schedule::Schedule;
use crate::util::config::Config;

/// A set of packages and FFmpeg features to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Libraries only, AV1 and H.264 codecs.
    Minimal,
    /// Command-line programs plus the broader codec set.
    #[default]
    Full,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Minimal => f.write_str("minimal"),
            Profile::Full => f.write_str("full"),
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimal" | "min" => Ok(Profile::Minimal),
            "full" => Ok(Profile::Full),
            other => Err(format!("unknown profile: {} (expected `minimal` or `full`)", other)),
        }
    }
}

const FULL_BASELINE: &[&str] = &[
    "--disable-doc",
    "--disable-libtheora",
    "--disable-libfreetype",
    "--disable-libfontconfig",
    "--disable-libbluray",
    "--disable-libopenjpeg",
    "--disable-mediafoundation",
    "--enable-libsvtav1",
    "--enable-zlib",
];

const MINIMAL_BASELINE: &[&str] = &[
    "--disable-programs",
    "--disable-ffmpeg",
    "--disable-ffplay",
    "--disable-ffprobe",
    "--disable-doc",
    "--disable-htmlpages",
    "--disable-manpages",
    "--disable-podpages",
    "--disable-txtpages",
    "--enable-version3",
    "--disable-libxml2",
    "--disable-lzma",
    "--disable-libtheora",
    "--disable-libfreetype",
    "--disable-libfontconfig",
    "--disable-libbluray",
    "--disable-libopenjpeg",
    "--disable-mediafoundation",
    "--disable-gmp",
    "--disable-alsa",
    "--disable-gnutls",
    "--disable-libaom",
    "--enable-libdav1d",
    "--disable-libmp3lame",
    "--disable-libopencore-amrnb",
    "--disable-libopencore-amrwb",
    "--disable-libopus",
    "--disable-libspeex",
    "--enable-libsvtav1",
    "--disable-libsrt",
    "--disable-libtwolame",
    "--disable-libvorbis",
    "--disable-libvpx",
    "--disable-libwebp",
    "--disable-libopenh264",
    "--disable-libxcb",
    "--disable-zlib",
    "--disable-libx265",
];

impl Profile {
    /// FFmpeg configure baseline for this profile.
    pub fn baseline(self) -> Baseline {
        match self {
            Profile::Full => Baseline::new(FULL_BASELINE.iter().copied())
                .gpl_codecs(["libx264", "libx265"])
                .windows_mediafoundation(true),
            Profile::Minimal => {
                Baseline::new(MINIMAL_BASELINE.iter().copied()).gpl_codecs(["libx264"])
            }
        }
    }
}

/// Assemble the unfiltered schedule for a profile on a platform.
///
/// Channel filtering is left to [`Schedule::select`]; the channel only
/// decides the FFmpeg licensing flags here.
pub fn schedule_for(
    profile: Profile,
    platform: &PlatformFacts,
    channel: Channel,
    config: &Config,
) -> Result<Schedule, PipelineError> {
    let mut tools = Vec::new();
    if !config.tool_available("gperf", platform.os) {
        tools.push(gperf());
    }
    // nasm is only needed for x86 assembly
    if !config.tool_available("nasm", platform.os) && !platform.is_arm64() {
        tools.push(nasm());
    }

    let hardware = HardwareFacts {
        nv_codec_headers: platform.supports_cuda(),
    };

    let mut packages = Vec::new();
    if hardware.nv_codec_headers {
        packages.push(nv_codec_headers());
    }

    match profile {
        Profile::Full => {
            packages.push(svtav1(
                "3.0.1",
                "f1d1ad8db551cd84ab52ae579b0e5086d8a0b7e47aea440e75907242a51b4cb9",
            ));
            packages.push(x264(platform));
            packages.push(x265());
        }
        Profile::Minimal => {
            packages.push(dav1d(platform));
            packages.push(svtav1(
                "3.1.0",
                "8231b63ea6c50bae46a019908786ebfa2696e5743487270538f3c25fddfa215a",
            ));
            packages.push(x264(platform));
        }
    }

    let ffmpeg_args = assemble(&profile.baseline(), platform, channel, &hardware);
    packages.push(ffmpeg(profile, platform, ffmpeg_args));

    Schedule::new(tools, packages)
}

fn gperf() -> PackageDescriptor {
    PackageDescriptor::builder(
        "gperf",
        "http://ftp.gnu.org/pub/gnu/gperf/gperf-3.1.tar.gz",
        "588546b945bba4b70b6a3a616e80b4ab466e3f33024a352fc2198112cdbb3ae2",
    )
    .build()
}

fn nasm() -> PackageDescriptor {
    PackageDescriptor::builder(
        "nasm",
        "https://www.nasm.us/pub/nasm/releasebuilds/2.14.02/nasm-2.14.02.tar.bz2",
        "34fd26c70a277a9fdd54cb5ecf389badedaf48047b269d1008fbc819b24e80bc",
    )
    .build()
}

fn nv_codec_headers() -> PackageDescriptor {
    PackageDescriptor::builder(
        "nv-codec-headers",
        "https://github.com/FFmpeg/nv-codec-headers/archive/refs/tags/n13.0.19.0.tar.gz",
        "86d15d1a7c0ac73a0eafdfc57bebfeba7da8264595bf531cf4d8db1c22940116",
    )
    .build_system(BuildSystem::Make)
    .build()
}

fn svtav1(version: &str, sha256: &str) -> PackageDescriptor {
    PackageDescriptor::builder(
        "libsvtav1",
        format!(
            "https://gitlab.com/AOMediaCodec/SVT-AV1/-/archive/v{0}/SVT-AV1-v{0}.tar.bz2",
            version
        ),
        sha256,
    )
    .build_system(BuildSystem::CMake)
    .build()
}

fn dav1d(platform: &PlatformFacts) -> PackageDescriptor {
    let requires: &[&str] = if platform.is_arm64() {
        &["meson", "ninja"]
    } else {
        &["meson", "nasm", "ninja"]
    };

    PackageDescriptor::builder(
        "dav1d",
        "https://code.videolan.org/videolan/dav1d/-/archive/1.5.1/dav1d-1.5.1.tar.bz2",
        "4eddffd108f098e307b93c9da57b6125224dc5877b1b3d157b31be6ae8f1f093",
    )
    .build_system(BuildSystem::Meson)
    .requires(requires.iter().copied())
    .build()
}

fn x264(platform: &PlatformFacts) -> PackageDescriptor {
    const COMMIT: &str = "32c3b801191522961102d4bea292cdb61068d0dd";

    // The assembly has text relocations, which musl refuses to load
    let args: &[&str] = if platform.is_musl() { &["--disable-asm"] } else { &[] };

    PackageDescriptor::builder(
        "x264",
        format!(
            "https://code.videolan.org/videolan/x264/-/archive/{0}/x264-{0}.tar.bz2",
            COMMIT
        ),
        "d7748f350127cea138ad97479c385c9a35a6f8527bc6ef7a52236777cf30b839",
    )
    .args(args.iter().copied())
    // Parallel builds run out of memory on Windows runners
    .parallel(platform.os != Os::Windows)
    .visibility(Visibility::CommunityOnly)
    .build()
}

fn x265() -> PackageDescriptor {
    PackageDescriptor::builder(
        "x265",
        "https://bitbucket.org/multicoreware/x265_git/downloads/x265_4.1.tar.gz",
        "a31699c6a89806b74b0151e5e6a7df65de4b49050482fe5ebf8a4379d7af8f29",
    )
    .build_system(BuildSystem::CMake)
    .source_dir("source")
    .visibility(Visibility::CommunityOnly)
    .build()
}

fn ffmpeg(profile: Profile, platform: &PlatformFacts, args: Vec<String>) -> PackageDescriptor {
    let (version, sha256) = match profile {
        Profile::Full => (
            "7.1.1",
            "733984395e0dbbe5c046abda2dc49a5544e7e0e1e2366bba849222ae9e3a03b1",
        ),
        Profile::Minimal => (
            "8.0",
            "b2751fccb6cc4c77708113cd78b561059b6fa904b24162fa0be2d60273d27b8e",
        ),
    };

    PackageDescriptor::builder(
        "ffmpeg",
        format!("https://ffmpeg.org/releases/ffmpeg-{}.tar.xz", version),
        sha256,
    )
    .args(args)
    .parallel(platform.os != Os::Windows)
    .build()
}
