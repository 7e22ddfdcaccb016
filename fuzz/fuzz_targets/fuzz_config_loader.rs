#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are fine; panics are not.
    let Ok(cfg) = trainer_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        let _engine = trainer_core::EngineCfg::from(&cfg);
        let _feed = trainer_core::FeedCfg::from(&cfg.feed);
    }
});
