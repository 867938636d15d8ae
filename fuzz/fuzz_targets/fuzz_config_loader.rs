#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use punishtrack::config::ConfigLoader;
use punishtrack::filter::EventComposer;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        let loader = ConfigLoader::with_defaults();
        // Anything that loads must also compile or fail cleanly
        if let Ok(loaded) = loader.load_str(yaml_str, Path::new("fuzz.yaml")) {
            let _ = EventComposer::compile(&loaded.config);
        }
    }
});
