use rand::Rng;

use crate::pattern::{BoundaryMode, Pattern};

/// Ping-pong cell planes plus the boundary-aware coordinate mapper.
///
/// Reads always hit the front plane (last committed generation) and writes
/// always hit the back plane, so every lookup within one pass sees the same
/// generation. [`GridBuffer::commit`] is the only way a written generation
/// becomes visible.
pub struct GridBuffer {
    /// Plane A - ping
    plane_a: Vec<u8>,
    /// Plane B - pong
    plane_b: Vec<u8>,
    /// Which plane is front (true = A is front, false = B is front)
    read_from_a: bool,
    width: u32,
    height: u32,
    boundary: BoundaryMode,
    /// Number of commits so far
    generation: u64,
}

impl GridBuffer {
    /// Allocate both planes for `pattern`, all cells in state 0
    pub fn new(pattern: &Pattern) -> Self {
        let cell_count = pattern.cell_count();
        Self {
            plane_a: vec![0; cell_count],
            plane_b: vec![0; cell_count],
            read_from_a: true,
            width: pattern.width(),
            height: pattern.height(),
            boundary: pattern.boundary(),
            generation: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolve any integer coordinate to a cell index in `[0, width * height)`.
    #[inline]
    pub fn index(&self, x: i64, y: i64) -> usize {
        let (w, h) = (self.width as i64, self.height as i64);
        let (x, y) = match self.boundary {
            BoundaryMode::Mirror => (mirror(x, w), mirror(y, h)),
            BoundaryMode::Wrap => (wrap(x, w), wrap(y, h)),
        };
        (y * w + x) as usize
    }

    /// Front-plane state at `(x, y)`
    #[inline]
    pub fn read(&self, x: i64, y: i64) -> u8 {
        self.front()[self.index(x, y)]
    }

    /// Store `value` at `(x, y)` in the back plane
    #[inline]
    pub fn write(&mut self, x: i64, y: i64, value: u8) {
        let i = self.index(x, y);
        self.back_mut()[i] = value;
    }

    /// Promote the back plane to front
    pub fn commit(&mut self) {
        self.read_from_a = !self.read_from_a;
        self.generation += 1;
    }

    /// Fill the back plane with uniform states in `[0, modulus)` and commit.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R, modulus: u32) {
        for cell in self.back_mut().iter_mut() {
            *cell = rng.gen_range(0..modulus) as u8;
        }
        self.commit();
    }

    /// Last committed generation, row-major
    pub fn front(&self) -> &[u8] {
        if self.read_from_a {
            &self.plane_a
        } else {
            &self.plane_b
        }
    }

    fn back_mut(&mut self) -> &mut [u8] {
        if self.read_from_a {
            &mut self.plane_b
        } else {
            &mut self.plane_a
        }
    }
}

/// Single fold at the edges. Not a true reflection for coordinates more
/// than one extent out of range, which is the intended look.
#[inline]
fn mirror(v: i64, extent: i64) -> i64 {
    if v < 0 {
        (v.unsigned_abs() % extent as u64) as i64
    } else if v >= extent {
        extent - 1 - v % extent
    } else {
        v
    }
}

#[inline]
fn wrap(v: i64, extent: i64) -> i64 {
    if v < 0 {
        // exact multiples land on `extent` itself
        (extent - (v.unsigned_abs() % extent as u64) as i64) % extent
    } else if v >= extent {
        v % extent
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(width: u32, height: u32, boundary: BoundaryMode) -> GridBuffer {
        let pattern = Pattern::builder()
            .size(width, height)
            .boundary(boundary)
            .build()
            .unwrap();
        GridBuffer::new(&pattern)
    }

    #[test]
    fn test_grid_creation() {
        let g = grid(100, 50, BoundaryMode::Mirror);
        assert_eq!(g.front().len(), 5000);
        assert_eq!(g.generation(), 0);
        assert!(g.front().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_index_in_range() {
        let coords = [
            i64::MIN,
            i64::from(i32::MIN),
            -100_003,
            -401,
            -200,
            -17,
            -1,
            0,
            1,
            6,
            7,
            13,
            14,
            199,
            12_345,
            i64::from(i32::MAX),
            i64::MAX,
        ];
        for boundary in [BoundaryMode::Mirror, BoundaryMode::Wrap] {
            let g = grid(7, 5, boundary);
            for &x in &coords {
                for &y in &coords {
                    let i = g.index(x, y);
                    assert!(i < 35, "{:?} index({}, {}) = {}", boundary, x, y, i);
                }
            }
        }
    }

    #[test]
    fn test_in_range_is_row_major() {
        for boundary in [BoundaryMode::Mirror, BoundaryMode::Wrap] {
            let g = grid(7, 5, boundary);
            assert_eq!(g.index(0, 0), 0);
            assert_eq!(g.index(6, 0), 6);
            assert_eq!(g.index(0, 1), 7);
            assert_eq!(g.index(3, 4), 31);
        }
    }

    #[test]
    fn test_mirror_formula() {
        let g = grid(10, 10, BoundaryMode::Mirror);
        // x < 0 -> (-x) mod width
        assert_eq!(g.index(-1, 0), 1);
        assert_eq!(g.index(-3, 0), 3);
        assert_eq!(g.index(-10, 0), 0);
        assert_eq!(g.index(-23, 0), 3);
        // x >= width -> width - 1 - (x mod width)
        assert_eq!(g.index(10, 0), 9);
        assert_eq!(g.index(12, 0), 7);
        assert_eq!(g.index(25, 0), 4);
        // y handled the same way against height
        assert_eq!(g.index(0, -2), 20);
        assert_eq!(g.index(0, 11), 80);
    }

    #[test]
    fn test_wrap_formula() {
        let g = grid(10, 10, BoundaryMode::Wrap);
        assert_eq!(g.index(-1, 0), 9);
        assert_eq!(g.index(-3, 0), 7);
        assert_eq!(g.index(-10, 0), 0);
        assert_eq!(g.index(10, 0), 0);
        assert_eq!(g.index(13, 0), 3);
        assert_eq!(g.index(0, -1), 90);
    }

    #[test]
    fn test_wrap_periodicity() {
        let g = grid(7, 5, BoundaryMode::Wrap);
        for x in -20..20 {
            for y in -12..12 {
                let base = g.index(x, y);
                for k in -4..=4 {
                    assert_eq!(g.index(x + k * 7, y), base, "x={} y={} k={}", x, y, k);
                    assert_eq!(g.index(x, y + k * 5), base, "x={} y={} k={}", x, y, k);
                }
            }
        }
    }

    #[test]
    fn test_write_is_invisible_until_commit() {
        let mut g = grid(4, 4, BoundaryMode::Wrap);
        g.write(1, 2, 1);
        assert_eq!(g.read(1, 2), 0);

        g.commit();
        assert_eq!(g.read(1, 2), 1);
        assert_eq!(g.generation(), 1);
    }

    #[test]
    fn test_writes_target_one_back_plane() {
        let mut g = grid(3, 1, BoundaryMode::Mirror);
        g.write(0, 0, 1);
        g.write(1, 0, 1);
        g.write(2, 0, 1);
        g.commit();
        assert_eq!(g.front(), &[1, 1, 1]);

        // previous front is now the back plane
        g.write(1, 0, 0);
        g.commit();
        assert_eq!(g.front(), &[0, 0, 0]);
    }

    #[test]
    fn test_randomize_range_and_single_commit() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut g = grid(40, 30, BoundaryMode::Mirror);

        g.randomize(&mut rng, 5);

        assert_eq!(g.generation(), 1);
        assert!(g.front().iter().all(|&c| c < 5));
        // with 1200 cells every state shows up
        for state in 0..5u8 {
            assert!(g.front().contains(&state), "state {} missing", state);
        }
    }

    #[test]
    fn test_randomize_full_byte_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut g = grid(64, 64, BoundaryMode::Wrap);
        g.randomize(&mut rng, 256);
        assert!(g.front().contains(&255));
    }
}
