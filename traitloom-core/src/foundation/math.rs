/// 64-bit FNV-1a, used for content-addressed image keys.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub(crate) fn update(&mut self, bytes: &[u8]) {
        self.0 = bytes
            .iter()
            .fold(self.0, |h, &b| (h ^ u64::from(b)).wrapping_mul(Self::PRIME));
    }

    pub(crate) fn digest(self) -> u64 {
        self.0
    }
}

/// `round(a * b / 255)` for 8-bit channel values.
pub(crate) fn mul_div255(a: u8, b: u8) -> u8 {
    ((u32::from(a) * u32::from(b) + 127) / 255) as u8
}

/// Greatest common divisor on `u128` (Euclid).
pub(crate) fn gcd_u128(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// `(a + b) % m` for `a, b < m` without overflowing.
pub(crate) fn add_mod_u128(a: u128, b: u128, m: u128) -> u128 {
    debug_assert!(a < m && b < m);
    if a >= m - b { a - (m - b) } else { a + b }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
