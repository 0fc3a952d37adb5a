//! Channel-based package selection.

use crate::core::package::{Channel, PackageDescriptor};

/// Keep the descriptors whose visibility admits `channel`, in declared order.
pub fn select(packages: Vec<PackageDescriptor>, channel: Channel) -> Vec<PackageDescriptor> {
    let before = packages.len();
    let selected: Vec<_> = packages
        .into_iter()
        .filter(|p| p.visibility().admits(channel))
        .collect();

    if selected.len() != before {
        tracing::debug!(
            "{} channel: skipped {} package(s)",
            channel,
            before - selected.len()
        );
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::package::Visibility;

    fn pkg(name: &str, visibility: Visibility) -> PackageDescriptor {
        PackageDescriptor::builder(name, format!("https://example.com/{}.tar.gz", name), "00")
            .visibility(visibility)
            .build()
    }

    fn names(packages: &[PackageDescriptor]) -> Vec<&str> {
        packages.iter().map(PackageDescriptor::name).collect()
    }

    #[test]
    fn test_community_only_needs_community_channel() {
        let packages = vec![
            pkg("a", Visibility::Always),
            pkg("b", Visibility::CommunityOnly),
        ];

        assert_eq!(names(&select(packages.clone(), Channel::Default)), ["a"]);
        assert_eq!(names(&select(packages, Channel::Community)), ["a", "b"]);
    }

    #[test]
    fn test_commercial_only_dropped_for_community() {
        let packages = vec![
            pkg("openh264", Visibility::CommercialOnly),
            pkg("x264", Visibility::CommunityOnly),
            pkg("ffmpeg", Visibility::Always),
        ];

        assert_eq!(
            names(&select(packages.clone(), Channel::Community)),
            ["x264", "ffmpeg"]
        );
        assert_eq!(
            names(&select(packages, Channel::Default)),
            ["openh264", "ffmpeg"]
        );
    }

    #[test]
    fn test_preserves_order() {
        let packages: Vec<_> = ["e", "d", "c", "b", "a"]
            .iter()
            .map(|n| pkg(n, Visibility::Always))
            .collect();
        assert_eq!(
            names(&select(packages, Channel::Default)),
            ["e", "d", "c", "b", "a"]
        );
    }
}
