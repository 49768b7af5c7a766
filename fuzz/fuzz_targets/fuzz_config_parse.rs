//! Fuzz target: configuration parsing and validation
//!
//! Feeds arbitrary text to both the JSON and YAML front ends and, when
//! parsing succeeds, through validation.  Verifies:
//! - No panics on any input
//! - Validated weights and tunables are finite
//!
//! cargo fuzz run fuzz_config_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use smartheat::config::ControllerConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for parsed in [ControllerConfig::from_json(text), ControllerConfig::from_yaml(text)] {
        let Ok(config) = parsed else {
            continue;
        };
        let Ok(settings) = config.validate() else {
            continue;
        };

        let weights = settings
            .floor_weights
            .as_slice()
            .iter()
            .chain(settings.radiator_weights.as_slice());
        for w in weights {
            assert!(w.is_finite(), "non-finite weight {w}");
        }
        assert!(settings.update_threshold.is_finite());
        assert!(settings.forced_burn_factor.is_finite());
    }
});
