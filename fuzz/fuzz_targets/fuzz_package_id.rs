#![no_main]

use depot_core::PackageId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Some(id) = PackageId::parse(s) {
            // Ids compare case-insensitively
            let upper = PackageId::parse(&id.as_str().to_ascii_uppercase());
            assert_eq!(upper.as_ref(), Some(&id));
            assert!(id.matches(&id.as_str().to_ascii_lowercase()));
        }
    }
});
