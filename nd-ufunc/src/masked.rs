//! Masked execution of an unmasked inner loop.

use nd_dtype::{CastOperand, CastOracle, CastingRule, Descr};

use crate::ufunc::{InnerLoop, TypeTup, Ufunc};
use crate::Result;

/// The wrapped loop and the operand count it expects.
#[derive(Clone, Debug)]
pub struct MaskerData {
    unmasked: InnerLoop,
    nargs: usize,
}

impl MaskerData {
    pub fn unmasked(&self) -> &InnerLoop {
        &self.unmasked
    }

    pub fn nargs(&self) -> usize {
        self.nargs
    }
}

/// Inner loop taking one extra operand, a byte mask, after the regular
/// ones. Only elements whose mask byte has bit 0 set are computed; the
/// others are skipped untouched.
#[derive(Clone, Debug)]
pub struct MaskedLoop {
    data: MaskerData,
}

impl MaskedLoop {
    pub fn new(unmasked: InnerLoop, nargs: usize) -> Self {
        Self {
            data: MaskerData { unmasked, nargs },
        }
    }

    pub fn data(&self) -> &MaskerData {
        &self.data
    }

    /// Run over `len` elements. `args` and `steps` hold `nargs + 1` entries,
    /// the mask last.
    ///
    /// The wrapped loop is called once per maximal run of exposed elements.
    ///
    /// # Safety
    ///
    /// The [`LoopFn`](crate::LoopFn) contract for the first `nargs`
    /// operands, and `args[nargs] + i * steps[nargs]` readable for every
    /// `i < len`.
    pub unsafe fn call(&self, args: &[*mut u8], len: usize, steps: &[isize]) {
        let nargs = self.data.nargs;
        let steps_data = &steps[..nargs];
        let mut ptrs: Vec<*mut u8> = args[..nargs].to_vec();
        let mut mask = args[nargs] as *const u8;
        let mask_step = steps[nargs];

        let advance = |ptrs: &mut [*mut u8], n: usize| {
            for (p, &s) in ptrs.iter_mut().zip(steps_data) {
                *p = p.wrapping_offset(n as isize * s);
            }
        };

        let mut remaining = len;
        while remaining > 0 {
            let mut skipped = 0;
            while skipped < remaining && *mask & 1 == 0 {
                skipped += 1;
                mask = mask.wrapping_offset(mask_step);
            }
            advance(&mut ptrs[..], skipped);
            remaining -= skipped;

            let mut run = 0;
            while run < remaining && *mask & 1 != 0 {
                run += 1;
                mask = mask.wrapping_offset(mask_step);
            }
            if run > 0 {
                self.data.unmasked.call(&ptrs, run, steps_data);
            }
            advance(&mut ptrs[..], run);
            remaining -= run;
        }
    }
}

/// Resolution result with a masked loop.
#[derive(Clone, Debug)]
pub struct MaskedResolved {
    pub dtypes: Vec<Descr>,
    pub inner_loop: MaskedLoop,
}

/// Resolve with the ufunc's own resolver and wrap the selected loop so it
/// honours a mask operand.
pub fn default_type_resolution_masked(
    ufunc: &Ufunc,
    casting: CastingRule,
    operands: &[Option<&dyn CastOperand>],
    type_tup: Option<&TypeTup>,
    oracle: &dyn CastOracle,
) -> Result<MaskedResolved> {
    let resolved = ufunc.resolve(casting, operands, type_tup, oracle)?;
    log::trace!("ufunc {}: wrapping loop for masked execution", ufunc.name());
    Ok(MaskedResolved {
        dtypes: resolved.dtypes,
        inner_loop: MaskedLoop::new(resolved.inner_loop, ufunc.nargs()),
    })
}
