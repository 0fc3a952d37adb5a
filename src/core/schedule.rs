//! The fixed two-phase build schedule and its install prefixes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::errors::PipelineError;
use crate::core::package::{Channel, PackageDescriptor};
use crate::ops::select::select;

/// Phase of the build schedule a package belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Build-time tools, installed into the builder prefix.
    Tools,
    /// Shipped libraries, installed into the destination prefix.
    Packages,
}

/// Ordered tools-phase and package-phase descriptor lists.
///
/// Declared order within each phase is the build order. Nothing is inferred:
/// a package that needs another must be declared after it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schedule {
    tools: Vec<PackageDescriptor>,
    packages: Vec<PackageDescriptor>,
}

impl Schedule {
    /// Create a schedule, rejecting duplicate package names across both phases.
    pub fn new(
        tools: Vec<PackageDescriptor>,
        packages: Vec<PackageDescriptor>,
    ) -> Result<Self, PipelineError> {
        let mut seen = HashSet::new();
        for pkg in tools.iter().chain(packages.iter()) {
            if !seen.insert(pkg.name()) {
                return Err(PipelineError::DuplicatePackage {
                    name: pkg.name().to_string(),
                });
            }
        }

        Ok(Schedule { tools, packages })
    }

    pub fn tools(&self) -> &[PackageDescriptor] {
        &self.tools
    }

    pub fn packages(&self) -> &[PackageDescriptor] {
        &self.packages
    }

    /// Every descriptor, tools first, in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (Phase, &PackageDescriptor)> {
        self.tools
            .iter()
            .map(|p| (Phase::Tools, p))
            .chain(self.packages.iter().map(|p| (Phase::Packages, p)))
    }

    /// All descriptors in fetch order (tools first).
    pub fn all(&self) -> Vec<PackageDescriptor> {
        self.iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len() + self.packages.len()
    }

    /// Look up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&PackageDescriptor> {
        self.iter().map(|(_, p)| p).find(|p| p.name() == name)
    }

    /// Apply channel filtering to both phases.
    pub fn select(self, channel: Channel) -> Self {
        Schedule {
            tools: select(self.tools, channel),
            packages: select(self.packages, channel),
        }
    }
}

/// Builder-local and destination install prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prefixes {
    /// Install location for tools; never shipped.
    pub builder: PathBuf,
    /// Install location assembled into the shipped artifact.
    pub dest: PathBuf,
}

impl Prefixes {
    /// Derive the prefixes from a destination path.
    ///
    /// The builder prefix sits next to the destination with a `.builder` suffix.
    pub fn for_destination(dest: &Path) -> Self {
        let mut builder = dest.as_os_str().to_os_string();
        builder.push(".builder");
        Prefixes {
            builder: PathBuf::from(builder),
            dest: dest.to_path_buf(),
        }
    }

    /// Prefix a phase installs into.
    pub fn for_phase(&self, phase: Phase) -> &Path {
        match phase {
            Phase::Tools => &self.builder,
            Phase::Packages => &self.dest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str) -> PackageDescriptor {
        PackageDescriptor::builder(name, format!("https://example.com/{}.tar.gz", name), "00")
            .build()
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Schedule::new(vec![pkg("nasm")], vec![pkg("x264"), pkg("nasm")]).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicatePackage { ref name } if name == "nasm"));
    }

    #[test]
    fn test_iter_is_tools_first() {
        let schedule =
            Schedule::new(vec![pkg("gperf")], vec![pkg("dav1d"), pkg("ffmpeg")]).unwrap();
        let order: Vec<_> = schedule.iter().map(|(phase, p)| (phase, p.name())).collect();
        assert_eq!(
            order,
            vec![
                (Phase::Tools, "gperf"),
                (Phase::Packages, "dav1d"),
                (Phase::Packages, "ffmpeg"),
            ]
        );
        assert_eq!(schedule.len(), 3);
        assert!(schedule.get("dav1d").is_some());
        assert!(schedule.get("x265").is_none());
    }

    #[test]
    fn test_prefixes_for_destination() {
        let prefixes = Prefixes::for_destination(Path::new("/tmp/vendor"));
        assert_eq!(prefixes.builder, PathBuf::from("/tmp/vendor.builder"));
        assert_eq!(prefixes.for_phase(Phase::Tools), Path::new("/tmp/vendor.builder"));
        assert_eq!(prefixes.for_phase(Phase::Packages), Path::new("/tmp/vendor"));
    }
}
