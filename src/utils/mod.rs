pub mod numeric;

pub use numeric::{closest_value, encode_index, round_to_6_decimals, PHI};
