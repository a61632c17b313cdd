//! Gradient surflet noise over a power-of-two lattice.

use std::f64::consts::PI;

use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct Noise {
    mask: i64,
    permutation: Vec<usize>,
    gradients: Vec<(f64, f64)>,
}

impl Noise {
    /// Panics unless `size` is a non-zero power of two.
    pub fn new<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        assert!(
            size.is_power_of_two(),
            "noise table size must be a power of two, got {size}"
        );
        let mut permutation = vec![0; size];
        for i in 0..size {
            let other = (rng.gen::<f64>() * i as f64).round() as usize;
            if i > other {
                permutation[i] = permutation[other];
            }
            permutation[other] = i;
        }
        Self::from_tables(permutation, evenly_spaced_gradients(size))
    }

    /// Rebuilds a generator from explicit tables.
    pub fn from_tables(permutation: Vec<usize>, gradients: Vec<(f64, f64)>) -> Self {
        let size = permutation.len();
        assert!(
            size.is_power_of_two(),
            "noise table size must be a power of two, got {size}"
        );
        assert_eq!(
            gradients.len(),
            size,
            "gradient table must match permutation size"
        );
        assert!(
            permutation.iter().all(|&entry| entry < size),
            "permutation entries must be below {size}"
        );
        Self {
            mask: size as i64 - 1,
            permutation,
            gradients,
        }
    }

    pub fn size(&self) -> usize {
        self.permutation.len()
    }

    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    pub fn gradients(&self) -> &[(f64, f64)] {
        &self.gradients
    }

    pub fn noise(&self, x: f64, y: f64) -> f64 {
        let cell_x = x.floor() as i64;
        let cell_y = y.floor() as i64;
        let mut result = 0.0;
        for grid_y in cell_y..=cell_y + 1 {
            for grid_x in cell_x..=cell_x + 1 {
                let (gx, gy) = self.gradients[self.hash(grid_x, grid_y)];
                result += surflet(x - grid_x as f64, y - grid_y as f64, gx, gy);
            }
        }
        result
    }

    fn hash(&self, grid_x: i64, grid_y: i64) -> usize {
        let inner = self.permutation[(grid_x & self.mask) as usize] as i64;
        self.permutation[((inner + grid_y) & self.mask) as usize]
    }
}

fn evenly_spaced_gradients(size: usize) -> Vec<(f64, f64)> {
    (0..size)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / size as f64;
            (angle.cos(), angle.sin())
        })
        .collect()
}

fn falloff(t: f64) -> f64 {
    let t = t.abs();
    if t >= 1.0 {
        0.0
    } else {
        1.0 - (3.0 - 2.0 * t) * t * t
    }
}

fn surflet(x: f64, y: f64, grad_x: f64, grad_y: f64) -> f64 {
    falloff(x) * falloff(y) * (grad_x * x + grad_y * y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_permutation_is_a_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let noise = Noise::new(64, &mut rng);
        let mut sorted = noise.permutation().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..64).collect::<Vec<_>>());
    }

    #[test]
    fn test_gradients_are_unit_vectors_by_index() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let noise = Noise::new(8, &mut rng);
        let (x, y) = noise.gradients()[2];
        assert!(x.abs() < 1e-12);
        assert!((y - 1.0).abs() < 1e-12);
        for (gx, gy) in noise.gradients() {
            assert!(((gx * gx + gy * gy) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_noise_vanishes_on_lattice_points() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let noise = Noise::new(16, &mut rng);
        assert_eq!(noise.noise(0.0, 0.0), 0.0);
        assert_eq!(noise.noise(3.0, 5.0), 0.0);
    }

    #[test]
    fn test_noise_is_deterministic_for_equal_tables() {
        let mut rng_a = ChaCha8Rng::seed_from_u64(99);
        let mut rng_b = ChaCha8Rng::seed_from_u64(99);
        let a = Noise::new(256, &mut rng_a);
        let b = Noise::new(256, &mut rng_b);
        let rebuilt = Noise::from_tables(a.permutation().to_vec(), a.gradients().to_vec());

        for (x, y) in [(0.3, 0.7), (1.25, 3.5), (-2.4, 0.1), (3.99, 3.99)] {
            let value = a.noise(x, y);
            assert_eq!(value.to_bits(), a.noise(x, y).to_bits());
            assert_eq!(value.to_bits(), b.noise(x, y).to_bits());
            assert_eq!(value.to_bits(), rebuilt.noise(x, y).to_bits());
        }
    }

    #[test]
    fn test_negative_coordinates_wrap_into_table() {
        let noise = Noise::from_tables(vec![1, 0, 3, 2], evenly_spaced_gradients(4));
        assert!(noise.noise(-0.5, -1.5).is_finite());
    }

    #[test]
    #[should_panic(expected = "must be below 4")]
    fn test_rejects_out_of_range_permutation() {
        let _ = Noise::from_tables(vec![0, 1, 2, 9], evenly_spaced_gradients(4));
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn test_rejects_non_power_of_two() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let _ = Noise::new(12, &mut rng);
    }
}
