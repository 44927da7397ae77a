#![no_main]

use arbitrary::Arbitrary;
use depot_core::{
    DependencyVersion, Package, PackageId, SelectionOptions, VersionRange, select_best,
};
use libfuzzer_sys::fuzz_target;
use semver::Version;
use std::sync::Arc;

#[derive(Debug, Arbitrary)]
struct Input {
    versions: Vec<(u8, u8, u8)>,
    range: String,
    policy: u8,
    allow_prerelease: bool,
}

fuzz_target!(|input: Input| {
    let Ok(range) = VersionRange::parse(&input.range) else {
        return;
    };
    let id = PackageId::new("Fuzz.Pkg");
    let candidates: Vec<Arc<Package>> = input
        .versions
        .iter()
        .map(|&(major, minor, patch)| {
            let version = Version::new(major.into(), minor.into(), patch.into());
            Arc::new(Package::new(id.clone(), version))
        })
        .collect();

    let options = SelectionOptions {
        dependency_version: match input.policy % 4 {
            0 => DependencyVersion::Highest,
            1 => DependencyVersion::Lowest,
            2 => DependencyVersion::HighestPatch,
            _ => DependencyVersion::HighestMinor,
        },
        allow_prerelease: input.allow_prerelease,
    };

    if let Some(best) = select_best(&candidates, &id, &range, &options) {
        assert!(range.contains(best.version()), "selected version outside range");
    } else if options.dependency_version == DependencyVersion::Highest {
        assert!(candidates.iter().all(|p| !range.contains(p.version())));
    }
});
