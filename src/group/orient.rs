//! Orientations of pieces.
//!
//! A corner carries an element of the dihedral group D3 acting on its three stickers. Only the
//! three rotations (values 0, 1, 2) occur for real puzzle states; the reflections (3, 4, 5) occur
//! in mirror symmetries, which conjugate real states back into real states. An edge carries an
//! element of Z2.

/// The elements of D3 as permutations of three stickers.
const D3: [[u8; 3]; 6] = [
    [0, 1, 2],
    [2, 0, 1],
    [1, 2, 0],
    [0, 2, 1],
    [2, 1, 0],
    [1, 0, 2],
];

const fn d3_index(c: [u8; 3]) -> u8 {
    let mut i = 0;
    while i < 6 {
        if D3[i][0] == c[0] && D3[i][1] == c[1] && D3[i][2] == c[2] {
            return i as u8;
        }
        i += 1;
    }
    panic!("not an element of D3");
}

const fn d3_mul() -> [[u8; 6]; 6] {
    let mut t = [[0u8; 6]; 6];
    let mut i = 0;
    while i < 6 {
        let mut j = 0;
        while j < 6 {
            let mut c = [0u8; 3];
            let mut k = 0;
            while k < 3 {
                c[k] = D3[i][D3[j][k] as usize];
                k += 1;
            }
            t[i][j] = d3_index(c);
            j += 1;
        }
        i += 1;
    }
    t
}

const fn d3_inv() -> [u8; 6] {
    let mul = d3_mul();
    let mut t = [0u8; 6];
    let mut i = 0;
    while i < 6 {
        let mut j = 0;
        while j < 6 {
            if mul[i][j] == 0 {
                t[i] = j as u8;
            }
            j += 1;
        }
        i += 1;
    }
    t
}

/// Multiplication table of the corner twist group.
pub const TWIST_MUL: [[u8; 6]; 6] = d3_mul();
/// Inverse table of the corner twist group.
pub const TWIST_INV: [u8; 6] = d3_inv();

/// Multiply two orientation values in the group of order `N` (2 or 3).
pub const fn orient_mul<const N: usize>(a: u8, b: u8) -> u8 {
    if N == 2 {
        a ^ b
    } else {
        TWIST_MUL[a as usize][b as usize]
    }
}

/// Invert an orientation value in the group of order `N` (2 or 3).
pub const fn orient_inv<const N: usize>(a: u8) -> u8 {
    if N == 2 {
        a
    } else {
        TWIST_INV[a as usize]
    }
}

/// The orientations of `M` pieces, each in the cyclic group of order `N`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Orient<const M: usize, const N: usize>(pub [u8; M]);

const fn power(n: usize, m: usize) -> usize {
    let mut x = 1;
    let mut i = 0;
    while i < m {
        x *= n;
        i += 1;
    }
    x
}

impl<const M: usize, const N: usize> Orient<M, N> {
    /// Every piece oriented.
    pub const IDENTITY: Self = Orient([0; M]);

    /// The number of orientations with a zero sum, `N^(M-1)`.
    pub const COUNT: usize = power(N, M - 1);

    /// Whether every value is a rotation and the values sum to zero, so that the orientation can
    /// be ranked.
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|&o| (o as usize) < N)
            && self.0.iter().map(|&o| o as usize).sum::<usize>() % N == 0
    }

    /// The rank of the orientation in `0..COUNT`. The last value is implied by the others.
    pub fn rank(&self) -> usize {
        self.0[..M - 1]
            .iter()
            .fold(0, |x, &o| x * N + o as usize)
    }

    /// The orientation with the given rank.
    pub fn unrank(mut x: usize) -> Self {
        let mut o = [0u8; M];
        let mut y = 0;
        for i in 1..M {
            let d = x % N;
            x /= N;
            o[M - i - 1] = d as u8;
            y += N - d;
        }
        o[M - 1] = (y % N) as u8;
        Orient(o)
    }
}

impl<const M: usize, const N: usize> Default for Orient<M, N> {
    fn default() -> Self {
        Self::IDENTITY
    }
}
