#![no_main]

use libfuzzer_sys::fuzz_target;
use runcfg::config::ConfigLoader;

fuzz_target!(|data: &[u8]| {
    let Ok(yaml_str) = std::str::from_utf8(data) else {
        return;
    };
    let loader = ConfigLoader::with_defaults();
    let Ok(first) = loader.load(yaml_str) else {
        return;
    };

    let rendered = first.config.to_yaml().expect("accepted config must render");
    let second = loader
        .load(&rendered)
        .expect("rendered config must load again");
    assert_eq!(first.config, second.config);
});
