//! Data-parallel dispatch shared by every pass.
//!
//! Each helper returns only after all of its work has finished, which is
//! the barrier between pipeline stages.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Run `f(i, &mut out[i])` for every element.
pub(crate) fn for_each_indexed<T, F>(out: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        out.par_iter_mut().enumerate().for_each(|(i, v)| f(i, v));
    }

    #[cfg(not(feature = "parallel"))]
    {
        out.iter_mut().enumerate().for_each(|(i, v)| f(i, v));
    }
}

/// Run `f(block, chunk)` over consecutive chunks of `chunk_size` elements.
pub(crate) fn for_each_chunk<T, F>(data: &mut [T], chunk_size: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        data.par_chunks_mut(chunk_size)
            .enumerate()
            .for_each(|(b, chunk)| f(b, chunk));
    }

    #[cfg(not(feature = "parallel"))]
    {
        data.chunks_mut(chunk_size)
            .enumerate()
            .for_each(|(b, chunk)| f(b, chunk));
    }
}

/// Run `f(&mut a[i], &mut b[i])` over two equally long slices.
pub(crate) fn for_each_zip<A, B, F>(a: &mut [A], b: &mut [B], f: F)
where
    A: Send,
    B: Send,
    F: Fn(&mut A, &mut B) + Sync + Send,
{
    debug_assert_eq!(a.len(), b.len());

    #[cfg(feature = "parallel")]
    {
        a.par_iter_mut().zip(b.par_iter_mut()).for_each(|(x, y)| f(x, y));
    }

    #[cfg(not(feature = "parallel"))]
    {
        a.iter_mut().zip(b.iter_mut()).for_each(|(x, y)| f(x, y));
    }
}

/// Index with the smallest `key(i)` among those returning `Some`.
///
/// Ties go to the lower index so the result does not depend on scheduling.
pub(crate) fn min_by_key<F>(count: usize, key: F) -> Option<(usize, f32)>
where
    F: Fn(usize) -> Option<f32> + Sync + Send,
{
    let better = |a: (usize, f32), b: (usize, f32)| match a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)) {
        std::cmp::Ordering::Greater => b,
        _ => a,
    };

    #[cfg(feature = "parallel")]
    {
        (0..count)
            .into_par_iter()
            .filter_map(|i| key(i).map(|k| (i, k)))
            .reduce_with(better)
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..count)
            .filter_map(|i| key(i).map(|k| (i, k)))
            .reduce(better)
    }
}

/// Run `f(chunk, &mut out[block])`, pairing each chunk of `data` with one output slot.
pub(crate) fn for_each_chunk_zip<T, U, F>(data: &mut [T], chunk_size: usize, out: &mut [U], f: F)
where
    T: Send,
    U: Send,
    F: Fn(&mut [T], &mut U) + Sync + Send,
{
    debug_assert_eq!(data.len().div_ceil(chunk_size), out.len());

    #[cfg(feature = "parallel")]
    {
        data.par_chunks_mut(chunk_size)
            .zip(out.par_iter_mut())
            .for_each(|(chunk, o)| f(chunk, o));
    }

    #[cfg(not(feature = "parallel"))]
    {
        data.chunks_mut(chunk_size)
            .zip(out.iter_mut())
            .for_each(|(chunk, o)| f(chunk, o));
    }
}
