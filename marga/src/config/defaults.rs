//! Default value functions for serde deserialization.

pub fn max_attempts() -> u32 {
    3
}

pub fn retry_delay_ms() -> u64 {
    100
}

pub fn probe_spacing() -> f32 {
    0.5
}

pub fn min_segment_length() -> f32 {
    0.1
}

pub fn max_grid_cells() -> usize {
    45
}

pub fn margin_cells() -> usize {
    4
}

pub fn time_budget_ms() -> u64 {
    2000
}

pub fn iteration_factor() -> usize {
    4
}

pub fn memory_budget_bytes() -> usize {
    64 * 1024
}

pub fn max_slope() -> f32 {
    1.0
}

pub fn search_radius() -> f32 {
    4.0
}

pub fn ring_samples() -> usize {
    8
}
