#[path = "common/mod.rs"]
mod common;

#[path = "equal/equal_basic.rs"]
mod equal_basic;
#[path = "equal/equal_free_vars.rs"]
mod equal_free_vars;
#[path = "equal/equal_paths.rs"]
mod equal_paths;
#[path = "json/json_roundtrip.rs"]
mod json_roundtrip;
#[path = "json/json_load.rs"]
mod json_load;
#[path = "tensor/tensors.rs"]
mod tensors;
