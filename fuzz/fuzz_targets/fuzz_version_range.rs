#![no_main]

use depot_core::VersionRange;
use libfuzzer_sys::fuzz_target;
use semver::Version;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let Ok(range) = VersionRange::parse(s) else {
            return;
        };

        let test_versions = [
            Version::new(0, 0, 0),
            Version::new(0, 0, 1),
            Version::new(1, 0, 0),
            Version::new(1, 2, 3),
            Version::new(2, 0, 0),
            Version::new(99, 99, 99),
        ];

        for version in &test_versions {
            // Should not panic
            let _ = range.contains(version);
        }

        // The canonical form must parse back to the same range
        let printed = range.to_string();
        let reparsed = VersionRange::parse(&printed).expect("canonical range must parse");
        assert_eq!(reparsed, range, "round trip of {s:?} via {printed:?}");
    }
});
