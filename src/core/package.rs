//! Package descriptors - declarative records for one buildable unit.

use std::fmt;

use serde::Serialize;
use url::Url;

/// Build system used to configure, compile and install a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystem {
    /// `configure && make && make install`
    #[default]
    Autotools,
    CMake,
    Meson,
    /// Plain `make` with a `PREFIX=` variable.
    Make,
}

impl fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildSystem::Autotools => "autotools",
            BuildSystem::CMake => "cmake",
            BuildSystem::Meson => "meson",
            BuildSystem::Make => "make",
        };
        f.write_str(s)
    }
}

/// Release channel a build is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Default,
    /// Community release: may ship GPL and patent-encumbered codecs.
    Community,
}

impl Channel {
    pub fn from_community_flag(community: bool) -> Self {
        if community {
            Channel::Community
        } else {
            Channel::Default
        }
    }

    pub fn is_community(self) -> bool {
        self == Channel::Community
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Default => f.write_str("default"),
            Channel::Community => f.write_str("community"),
        }
    }
}

/// Licensing visibility of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    #[default]
    Always,
    CommunityOnly,
    CommercialOnly,
}

impl Visibility {
    /// Whether a package with this visibility is part of a build for `channel`.
    pub fn admits(self, channel: Channel) -> bool {
        match self {
            Visibility::Always => true,
            Visibility::CommunityOnly => channel.is_community(),
            Visibility::CommercialOnly => !channel.is_community(),
        }
    }
}

/// A single third-party source package.
///
/// Descriptors are assembled once through [`PackageDescriptorBuilder`] and are
/// read-only afterwards: there is no way to change the argument list of a
/// finished descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDescriptor {
    name: String,
    source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_filename: Option<String>,
    sha256: String,
    build_system: BuildSystem,
    build_arguments: Vec<String>,
    build_parallel: bool,
    visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_dir: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    requires: Vec<String>,
}

impl PackageDescriptor {
    /// Start describing a package.
    pub fn builder(
        name: impl Into<String>,
        source_url: impl Into<String>,
        sha256: impl Into<String>,
    ) -> PackageDescriptorBuilder {
        PackageDescriptorBuilder {
            inner: PackageDescriptor {
                name: name.into(),
                source_url: source_url.into(),
                source_filename: None,
                sha256: sha256.into(),
                build_system: BuildSystem::default(),
                build_arguments: Vec::new(),
                build_parallel: true,
                visibility: Visibility::default(),
                source_dir: None,
                requires: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    pub fn build_system(&self) -> BuildSystem {
        self.build_system
    }

    pub fn build_arguments(&self) -> &[String] {
        &self.build_arguments
    }

    pub fn build_parallel(&self) -> bool {
        self.build_parallel
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn source_dir(&self) -> Option<&str> {
        self.source_dir.as_deref()
    }

    /// External executables this package needs at build time.
    pub fn requires(&self) -> &[String] {
        &self.requires
    }

    /// Local filename of the source archive.
    ///
    /// Uses the explicit override if present, otherwise the last path
    /// segment of the source URL.
    pub fn source_filename(&self) -> String {
        if let Some(ref name) = self.source_filename {
            return name.clone();
        }

        if let Ok(url) = Url::parse(&self.source_url) {
            if let Some(last) = url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|s| !s.is_empty())
            {
                return last.to_string();
            }
        }

        // Not a parseable URL; fall back to the raw trailing component
        self.source_url
            .rsplit('/')
            .next()
            .unwrap_or(&self.source_url)
            .to_string()
    }
}

impl fmt::Display for PackageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Builder for [`PackageDescriptor`].
#[derive(Debug, Clone)]
pub struct PackageDescriptorBuilder {
    inner: PackageDescriptor,
}

impl PackageDescriptorBuilder {
    pub fn source_filename(mut self, filename: impl Into<String>) -> Self {
        self.inner.source_filename = Some(filename.into());
        self
    }

    pub fn build_system(mut self, build_system: BuildSystem) -> Self {
        self.inner.build_system = build_system;
        self
    }

    /// Append build arguments, in order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner
            .build_arguments
            .extend(args.into_iter().map(Into::into));
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.inner.build_parallel = parallel;
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.inner.visibility = visibility;
        self
    }

    pub fn source_dir(mut self, dir: impl Into<String>) -> Self {
        self.inner.source_dir = Some(dir.into());
        self
    }

    pub fn requires<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.requires.extend(tools.into_iter().map(Into::into));
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> PackageDescriptor {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_filename_from_url() {
        let pkg = PackageDescriptor::builder(
            "ffmpeg",
            "https://ffmpeg.org/releases/ffmpeg-7.1.1.tar.xz",
            "00",
        )
        .build();
        assert_eq!(pkg.source_filename(), "ffmpeg-7.1.1.tar.xz");
    }

    #[test]
    fn test_source_filename_override() {
        let pkg = PackageDescriptor::builder("x", "https://example.com/download?id=3", "00")
            .source_filename("x-1.0.tar.gz")
            .build();
        assert_eq!(pkg.source_filename(), "x-1.0.tar.gz");
    }

    #[test]
    fn test_builder_defaults() {
        let pkg = PackageDescriptor::builder("gperf", "http://example.com/gperf-3.1.tar.gz", "ab")
            .build();
        assert_eq!(pkg.build_system(), BuildSystem::Autotools);
        assert!(pkg.build_parallel());
        assert_eq!(pkg.visibility(), Visibility::Always);
        assert!(pkg.build_arguments().is_empty());
        assert!(pkg.source_dir().is_none());
    }

    #[test]
    fn test_args_keep_order() {
        let pkg = PackageDescriptor::builder("a", "https://example.com/a.tar.gz", "00")
            .args(["--one", "--two"])
            .args(vec!["--three".to_string()])
            .build();
        assert_eq!(pkg.build_arguments(), ["--one", "--two", "--three"]);
    }

    #[test]
    fn test_visibility_admits() {
        assert!(Visibility::Always.admits(Channel::Default));
        assert!(Visibility::Always.admits(Channel::Community));
        assert!(Visibility::CommunityOnly.admits(Channel::Community));
        assert!(!Visibility::CommunityOnly.admits(Channel::Default));
        assert!(Visibility::CommercialOnly.admits(Channel::Default));
        assert!(!Visibility::CommercialOnly.admits(Channel::Community));
    }
}
