#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let toml = trainer_config::parse_plan_toml(data);
    let json = trainer_config::parse_plan_json(data);
    for plan in [toml.ok(), json.ok()].into_iter().flatten() {
        if plan.validate().is_ok() {
            // Unknown modes/levels are errors, never panics.
            let _ = trainer_core::plan_items(&plan);
        }
    }
});
