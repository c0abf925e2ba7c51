/// xorshift32 generator. Every hazard stream is a pure function of its seed.
#[derive(Clone, Copy, Debug)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0xDEAD_BEEF } else { seed },
        }
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn next(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        self.state
    }

    pub fn next_int(&mut self, max: u32) -> u32 {
        self.next() % max
    }

    pub fn next_range(&mut self, min: i32, max_exclusive: i32) -> i32 {
        debug_assert!(max_exclusive > min);
        let span = (max_exclusive - min) as u32;
        min + self.next_int(span) as i32
    }

    /// Uniform integer in `[min, max]`, both ends included.
    pub fn next_inclusive(&mut self, min: i32, max: i32) -> i32 {
        self.next_range(min, max + 1)
    }

    /// Uniform pick from `min, min + step, ...` below `max_exclusive`.
    pub fn next_stepped(&mut self, min: u32, max_exclusive: u32, step: u32) -> u32 {
        debug_assert!(step > 0 && max_exclusive > min);
        let slots = (max_exclusive - min).div_ceil(step);
        min + self.next_int(slots) * step
    }

    /// Uniform float in `[-scale, scale)`.
    pub fn next_signed_unit(&mut self, scale: f64) -> f64 {
        let unit = self.next() as f64 / (u32::MAX as f64 + 1.0);
        (unit * 2.0 - 1.0) * scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_seed_falls_back_to_fixed_state() {
        assert_eq!(SeededRng::new(0).state(), 0xDEAD_BEEF);
    }

    #[test]
    fn stepped_values_stay_on_grid() {
        let mut rng = SeededRng::new(0x1234_5678);
        for _ in 0..500 {
            let size = rng.next_stepped(50, 100, 5);
            assert!((50..100).contains(&size));
            assert_eq!(size % 5, 0);
        }
    }

    #[test]
    fn inclusive_range_reaches_both_ends() {
        let mut rng = SeededRng::new(7);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..2_000 {
            let value = rng.next_inclusive(0, 3);
            assert!((0..=3).contains(&value));
            seen_min |= value == 0;
            seen_max |= value == 3;
        }
        assert!(seen_min && seen_max);
    }
}
