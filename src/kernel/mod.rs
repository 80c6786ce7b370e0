// src/kernel/mod.rs

//! Small numerical helpers: the dense types the pipeline assembles into, and
//! element-wise arithmetic over fixed-size vectors.

use nalgebra::{DMatrix, DVector, RealField, SVector};

// Type aliases for clarity throughout the harness.
pub type Matrix = DMatrix<f64>;
pub type Vector = DVector<f64>;

/// Fixed-dimension vector the arithmetic helpers operate on.
pub type MathVector<T, const D: usize> = SVector<T, D>;

fn sum_at<T: RealField + Copy, const D: usize>(terms: &[&MathVector<T, D>], i: usize) -> T {
    let mut iter = terms.iter();
    match iter.next() {
        Some(first) => iter.fold(first[i], |acc, v| acc + v[i]),
        None => T::zero(),
    }
}

/// `out[i] = Σ terms[k][i]`
pub fn vec_add<T: RealField + Copy, const D: usize>(
    out: &mut MathVector<T, D>,
    terms: &[&MathVector<T, D>],
) {
    for i in 0..D {
        out[i] = sum_at(terms, i);
    }
}

/// `out[i] += Σ terms[k][i]`
pub fn vec_append<T: RealField + Copy, const D: usize>(
    out: &mut MathVector<T, D>,
    terms: &[&MathVector<T, D>],
) {
    for i in 0..D {
        out[i] += sum_at(terms, i);
    }
}

/// `out[i] += Σ s_k * v_k[i]`
pub fn vec_scale_append<T: RealField + Copy, const D: usize>(
    out: &mut MathVector<T, D>,
    terms: &[(T, &MathVector<T, D>)],
) {
    for i in 0..D {
        let mut iter = terms.iter();
        let scaled = match iter.next() {
            Some((s, v)) => iter.fold(*s * v[i], |acc, (s, v)| acc + *s * v[i]),
            None => T::zero(),
        };
        out[i] += scaled;
    }
}

/// `out[i] = a[i] - b[i]`
pub fn vec_subtract<T: RealField + Copy, const D: usize>(
    out: &mut MathVector<T, D>,
    a: &MathVector<T, D>,
    b: &MathVector<T, D>,
) {
    for i in 0..D {
        out[i] = a[i] - b[i];
    }
}

/// `out[i] = a[i]^s`
pub fn vec_pow<T: RealField + Copy, const D: usize>(
    out: &mut MathVector<T, D>,
    a: &MathVector<T, D>,
    s: T,
) {
    for i in 0..D {
        out[i] = a[i].powf(s);
    }
}

/// Copies the overlapping components of `src` into `dest` and sets the rest
/// of `dest` to `fill`. The dimensions may differ.
pub fn vec_copy<T: RealField + Copy, const D: usize, const E: usize>(
    dest: &mut MathVector<T, D>,
    src: &MathVector<T, E>,
    fill: T,
) {
    for i in 0..D {
        dest[i] = if i < E { src[i] } else { fill };
    }
}
