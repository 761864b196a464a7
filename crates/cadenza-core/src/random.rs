//! Injected randomness for suggestion embellishment

/// Source of the random decisions made while suggesting chords
pub trait RandomSource {
    /// True with the given probability
    fn chance(&mut self, probability: f64) -> bool;

    /// Uniform index in `0..len`; `len` is never zero
    fn pick(&mut self, len: usize) -> usize;
}

impl RandomSource for fastrand::Rng {
    fn chance(&mut self, probability: f64) -> bool {
        self.f64() < probability
    }

    fn pick(&mut self, len: usize) -> usize {
        self.usize(..len)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn chance(&mut self, probability: f64) -> bool {
        (**self).chance(probability)
    }

    fn pick(&mut self, len: usize) -> usize {
        (**self).pick(len)
    }
}

/// Pick one element of a non-empty slice
pub fn choose<'a, T, R: RandomSource + ?Sized>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.pick(items.len())]
}
