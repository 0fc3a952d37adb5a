//! Host platform facts that drive package selection and configure flags.

use std::fmt;

use serde::Serialize;

/// Host operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Os {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "linux" => Os::Linux,
            "macos" => Os::MacOs,
            "windows" => Os::Windows,
            _ => Os::Other,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Os::Linux => "linux",
            Os::MacOs => "macos",
            Os::Windows => "windows",
            Os::Other => "other",
        };
        f.write_str(s)
    }
}

/// C library flavor on Linux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Libc {
    Glibc,
    Musl,
    /// Not Linux, or not applicable.
    None,
}

/// Static facts about the build host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformFacts {
    pub os: Os,
    /// Machine architecture as reported by the toolchain (`x86_64`, `aarch64`, ...).
    pub arch: String,
    pub libc: Libc,
}

impl PlatformFacts {
    /// Detect facts for the running host.
    pub fn detect() -> Self {
        let os = Os::current();
        let libc = if os != Os::Linux {
            Libc::None
        } else if cfg!(target_env = "musl") {
            Libc::Musl
        } else {
            Libc::Glibc
        };

        PlatformFacts {
            os,
            arch: std::env::consts::ARCH.to_string(),
            libc,
        }
    }

    pub fn new(os: Os, arch: impl Into<String>, libc: Libc) -> Self {
        PlatformFacts {
            os,
            arch: arch.into(),
            libc,
        }
    }

    pub fn is_musl(&self) -> bool {
        self.libc == Libc::Musl
    }

    pub fn is_arm64(&self) -> bool {
        matches!(self.arch.as_str(), "arm64" | "aarch64")
    }

    /// Whether NVIDIA's codec headers are usable on this OS.
    pub fn supports_cuda(&self) -> bool {
        matches!(self.os, Os::Linux | Os::Windows)
    }

    /// Wheel-style platform tag used to name the output tarball.
    pub fn tag(&self) -> String {
        let arch = self.arch.to_lowercase();
        match self.os {
            Os::MacOs => {
                let arch = if arch == "aarch64" { "arm64" } else { arch.as_str() };
                format!("macosx_{}", arch)
            }
            Os::Linux if self.is_musl() => format!("musllinux_{}", arch),
            Os::Linux => format!("manylinux_{}", arch),
            Os::Windows => "win_amd64".to_string(),
            Os::Other => format!("{}_{}", std::env::consts::OS, arch),
        }
    }
}

/// Hardware capability facts, derived from what the schedule stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HardwareFacts {
    /// The NVIDIA codec headers package is part of the build.
    pub nv_codec_headers: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_tags() {
        assert_eq!(
            PlatformFacts::new(Os::Linux, "x86_64", Libc::Glibc).tag(),
            "manylinux_x86_64"
        );
        assert_eq!(
            PlatformFacts::new(Os::Linux, "aarch64", Libc::Musl).tag(),
            "musllinux_aarch64"
        );
        assert_eq!(
            PlatformFacts::new(Os::MacOs, "aarch64", Libc::None).tag(),
            "macosx_arm64"
        );
        assert_eq!(
            PlatformFacts::new(Os::Windows, "x86_64", Libc::None).tag(),
            "win_amd64"
        );
    }

    #[test]
    fn test_cuda_support() {
        assert!(PlatformFacts::new(Os::Linux, "x86_64", Libc::Glibc).supports_cuda());
        assert!(PlatformFacts::new(Os::Windows, "x86_64", Libc::None).supports_cuda());
        assert!(!PlatformFacts::new(Os::MacOs, "arm64", Libc::None).supports_cuda());
    }

    #[test]
    fn test_detect_matches_host() {
        let facts = PlatformFacts::detect();
        assert_eq!(facts.arch, std::env::consts::ARCH);
        if facts.os != Os::Linux {
            assert_eq!(facts.libc, Libc::None);
        }
    }
}
