//! Conversion between linear gain and the logarithmic (perceptual) gain scale.
//!
//! Both scales span `[0, 1]`. The mapping is a fixed lookup curve; converting
//! log back to linear lands on the nearest table step, so a linear value
//! survives a round trip through the log scale to within `1 / 128`.

#[rustfmt::skip]
const LOG_TABLE: [f32; 128] = [
    0.00, 0.001, 0.002, 0.003, 0.004, 0.005, 0.01, 0.011,
    0.012, 0.013, 0.014, 0.015, 0.016, 0.02, 0.021, 0.022,
    0.023, 0.024, 0.025, 0.03, 0.031, 0.032, 0.033, 0.034,
    0.04, 0.041, 0.042, 0.043, 0.044, 0.05, 0.051, 0.052,
    0.053, 0.054, 0.06, 0.061, 0.062, 0.063, 0.064, 0.07,
    0.071, 0.072, 0.073, 0.08, 0.081, 0.082, 0.083, 0.084,
    0.09, 0.091, 0.092, 0.093, 0.094, 0.10, 0.101, 0.102,
    0.103, 0.11, 0.111, 0.112, 0.113, 0.12, 0.121, 0.122,
    0.123, 0.124, 0.13, 0.131, 0.132, 0.14, 0.141, 0.142,
    0.143, 0.15, 0.151, 0.152, 0.16, 0.161, 0.162, 0.17,
    0.171, 0.172, 0.18, 0.181, 0.19, 0.191, 0.192, 0.20,
    0.201, 0.21, 0.211, 0.22, 0.221, 0.23, 0.231, 0.24,
    0.25, 0.251, 0.26, 0.27, 0.271, 0.28, 0.29, 0.30,
    0.301, 0.31, 0.32, 0.33, 0.34, 0.35, 0.36, 0.37,
    0.38, 0.39, 0.40, 0.41, 0.43, 0.50, 0.60, 0.65,
    0.70, 0.75, 0.80, 0.85, 0.90, 0.95, 0.97, 0.99,
];

/// Step size of the table in linear units.
pub const LOG_STEP: f32 = 1.0 / LOG_TABLE.len() as f32;

/// Maps a linear gain onto the log scale.
pub fn linear_to_log(value: f32) -> f32 {
    if value <= 0.0 {
        return 0.0;
    }
    if value >= 1.0 {
        return 1.0;
    }
    let index = (LOG_TABLE.len() as f32 * value) as usize;
    LOG_TABLE[index.min(LOG_TABLE.len() - 1)]
}

/// Maps a log-scale gain back to linear by bisecting the table.
pub fn log_to_linear(value: f32) -> f32 {
    if value <= 0.0 {
        return 0.0;
    }
    if value >= 1.0 {
        return 1.0;
    }

    let mut max = LOG_TABLE.len();
    let mut min = 0;
    let mut mid = (max - min) / 2;
    loop {
        let last = mid;
        if LOG_TABLE[mid] == value {
            break;
        }
        if LOG_TABLE[mid] < value {
            min = mid;
        } else {
            max = mid;
        }
        mid = min + (max - min) / 2;
        if last == mid {
            break;
        }
    }

    mid as f32 / LOG_TABLE.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_strictly_increasing() {
        for pair in LOG_TABLE.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_bounds_clamp() {
        assert_eq!(linear_to_log(-1.0), 0.0);
        assert_eq!(linear_to_log(2.0), 1.0);
        assert_eq!(log_to_linear(-0.5), 0.0);
        assert_eq!(log_to_linear(1.5), 1.0);
    }

    #[test]
    fn test_linear_round_trip_within_one_step() {
        for i in 1..100 {
            let linear = i as f32 / 100.0;
            let back = log_to_linear(linear_to_log(linear));
            assert!(
                (linear - back).abs() <= LOG_STEP,
                "{linear} came back as {back}"
            );
        }
    }

    #[test]
    fn test_log_scale_is_monotonic() {
        let mut previous = 0.0;
        for i in 0..=100 {
            let value = linear_to_log(i as f32 / 100.0);
            assert!(value >= previous);
            previous = value;
        }
    }
}
