//! Fork-join execution helpers for the per-floe passes.
//!
//! Every pass of the timestep loop is a task-per-floe map; with the
//! `parallel` feature the maps run on the rayon pool, otherwise they fall
//! back to plain iteration with identical semantics.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Maps `f` over `0..n` and collects the results in index order.
#[cfg(feature = "parallel")]
pub fn map_indices<R, G>(n: usize, f: G) -> Vec<R>
where
    R: Send,
    G: Fn(usize) -> R + Sync + Send,
{
    (0..n).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
pub fn map_indices<R, G>(n: usize, f: G) -> Vec<R>
where
    G: Fn(usize) -> R,
{
    (0..n).map(f).collect()
}

/// Applies `f` to every element of the slice.
#[cfg(feature = "parallel")]
pub fn for_each_mut<T, G>(items: &mut [T], f: G)
where
    T: Send,
    G: Fn(&mut T) + Sync + Send,
{
    items.par_iter_mut().for_each(f);
}

#[cfg(not(feature = "parallel"))]
pub fn for_each_mut<T, G>(items: &mut [T], f: G)
where
    G: Fn(&mut T),
{
    items.iter_mut().for_each(f);
}

/// Applies `f` to every element of the slice along with its index.
#[cfg(feature = "parallel")]
pub fn for_each_mut_indexed<T, G>(items: &mut [T], f: G)
where
    T: Send,
    G: Fn(usize, &mut T) + Sync + Send,
{
    items
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, item)| f(i, item));
}

#[cfg(not(feature = "parallel"))]
pub fn for_each_mut_indexed<T, G>(items: &mut [T], f: G)
where
    G: Fn(usize, &mut T),
{
    items.iter_mut().enumerate().for_each(|(i, item)| f(i, item));
}
