//! User-supplied functions called by mutation models.
//!
//! Callbacks are opaque closures shared through `Arc`, so operators holding
//! them stay `Clone + Send + Sync`. A callback reports failure with a message,
//! which aborts the current apply as [`MutationError::Callback`].

use crate::errors::MutationError;
use std::fmt;
use std::sync::Arc;

type AlleleFnInner = dyn Fn(i64) -> Result<i64, String> + Send + Sync;
type ContextFnInner = dyn Fn(i64, &[i64]) -> Result<i64, String> + Send + Sync;

/// A function of one allele value.
#[derive(Clone)]
pub struct AlleleFn(Arc<AlleleFnInner>);

impl AlleleFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(i64) -> Result<i64, String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn call(&self, allele: i64) -> Result<i64, MutationError> {
        (self.0)(allele).map_err(MutationError::Callback)
    }
}

impl fmt::Debug for AlleleFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AlleleFn(..)")
    }
}

/// A function of an allele value and its context window.
#[derive(Clone)]
pub struct ContextFn(Arc<ContextFnInner>);

impl ContextFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(i64, &[i64]) -> Result<i64, String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn call(&self, allele: i64, context: &[i64]) -> Result<i64, MutationError> {
        (self.0)(allele, context).map_err(MutationError::Callback)
    }
}

impl fmt::Debug for ContextFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContextFn(..)")
    }
}
