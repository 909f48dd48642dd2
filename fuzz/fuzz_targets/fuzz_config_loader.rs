#![no_main]

use libfuzzer_sys::fuzz_target;
use runcfg::config::ConfigLoader;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        let loader = ConfigLoader::with_defaults();

        // Only panics matter here
        let _ = loader.load(yaml_str);
    }
});
