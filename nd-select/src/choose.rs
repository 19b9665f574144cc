use nd_array::{as_intp, broadcast_arrays, cast_array, common_type, copy_into, for_each_segment, Array};
use nd_dtype::{CastingRule, ClipMode, NativeType};
use smallvec::SmallVec;

use crate::axis::incref_all;
use crate::{Result, SelectError};

/// Build an array by picking, at every position, the element of the choice
/// that `a` names there.
///
/// The choices are converted to their common dtype and broadcast together
/// with `a`. Under [`ClipMode::Raise`] every entry of `a` must lie in
/// `0..choices.len()`; negative entries are not counted from the end.
pub fn choose(a: &Array, choices: &[Array], out: Option<&mut Array>, mode: ClipMode) -> Result<Array> {
    if choices.is_empty() {
        return Err(SelectError::NoChoices);
    }
    let refs: Vec<&Array> = choices.iter().collect();
    let descr = common_type(&refs)?;
    let converted = choices
        .iter()
        .map(|c| cast_array(c, &descr, CastingRule::Safe))
        .collect::<nd_array::Result<Vec<_>>>()?;
    let selector = as_intp(a)?;

    let mut operands: Vec<&Array> = Vec::with_capacity(converted.len() + 1);
    operands.push(&selector);
    operands.extend(converted.iter());
    let views = broadcast_arrays(&operands)?;
    let shape = views[0].dims().to_vec();
    if let Some(out) = out.as_deref() {
        if out.dims() != shape.as_slice() {
            return Err(SelectError::ChooseOutputShape);
        }
    }

    let n = choices.len();
    let elsize = descr.elsize();
    let total: usize = shape.iter().product();
    let mut dest = vec![0u8; total * elsize];
    let strides: SmallVec<[&[isize]; 8]> = views.iter().map(|v| v.strides()).collect();
    let offsets: SmallVec<[isize; 8]> = views.iter().map(|v| v.offset()).collect();
    let index_bytes = views[0].bytes();
    let mut pos = 0usize;
    for_each_segment::<SelectError, _>(&shape, &strides, &offsets, |o, len, s| {
        for k in 0..len as isize {
            let at = (o[0] + k * s[0]) as usize;
            let mi = i64::read(&index_bytes[at..at + 8]) as isize;
            let which = match mode {
                ClipMode::Raise => {
                    if mi < 0 || mi >= n as isize {
                        return Err(SelectError::InvalidChoice);
                    }
                    mi as usize
                }
                _ => mode.apply(mi, n)?,
            };
            let c = &views[which + 1];
            let from = (o[which + 1] + k * s[which + 1]) as usize;
            dest[pos..pos + elsize].copy_from_slice(&c.bytes()[from..from + elsize]);
            pos += elsize;
        }
        Ok(())
    })?;
    incref_all(&descr, &dest);
    let result = Array::from_bytes(descr, dest, &shape)?;

    match out {
        Some(out) => {
            let converted = cast_array(&result, out.descr(), CastingRule::Unsafe)?;
            copy_into(out, &converted)?;
            Ok(out.clone())
        }
        None => Ok(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nd_dtype::{Descr, TypeNum};

    fn arr(v: &[i64]) -> Array {
        Array::from_slice(v).unwrap()
    }

    #[test]
    fn test_choose_picks_per_position() {
        let choices = [arr(&[0, 1, 2, 3]), arr(&[10, 11, 12, 13]), arr(&[20, 21, 22, 23])];
        let r = choose(&arr(&[2, 0, 1, 0]), &choices, None, ClipMode::Raise).unwrap();
        assert_eq!(r.to_vec::<i64>().unwrap(), vec![20, 1, 12, 3]);
    }

    #[test]
    fn test_choose_broadcasts_and_promotes() {
        let a = Array::from_vec(vec![0i64, 1, 1, 0], &[2, 2]).unwrap();
        let choices = [
            Array::from_slice(&[1i32, 2]).unwrap(),
            Array::from_slice(&[0.5f64]).unwrap(),
        ];
        let r = choose(&a, &choices, None, ClipMode::Raise).unwrap();
        assert_eq!(r.dims(), &[2, 2]);
        assert_eq!(r.descr().type_num(), TypeNum::DOUBLE);
        let v = r.to_vec::<f64>().unwrap();
        for (g, w) in v.iter().zip([1.0, 0.5, 0.5, 2.0]) {
            assert_relative_eq!(*g, w);
        }
    }

    #[test]
    fn test_choose_modes() {
        let choices = [arr(&[1, 1, 1]), arr(&[2, 2, 2])];
        let sel = arr(&[-1, 0, 3]);
        assert_eq!(
            choose(&sel, &choices, None, ClipMode::Raise).unwrap_err().to_string(),
            "invalid entry in choice array"
        );
        let r = choose(&sel, &choices, None, ClipMode::Wrap).unwrap();
        assert_eq!(r.to_vec::<i64>().unwrap(), vec![2, 1, 2]);
        let r = choose(&sel, &choices, None, ClipMode::Clip).unwrap();
        assert_eq!(r.to_vec::<i64>().unwrap(), vec![1, 1, 2]);
    }

    #[test]
    fn test_choose_out_and_errors() {
        let choices = [arr(&[5, 6])];
        let mut out = Array::zeros(Descr::from_type(TypeNum::DOUBLE).unwrap(), &[2]);
        choose(&arr(&[0, 0]), &choices, Some(&mut out), ClipMode::Raise).unwrap();
        assert_eq!(out.to_vec::<f64>().unwrap(), vec![5.0, 6.0]);

        let mut bad = Array::zeros(Descr::from_type(TypeNum::DOUBLE).unwrap(), &[3]);
        assert_eq!(
            choose(&arr(&[0, 0]), &choices, Some(&mut bad), ClipMode::Raise)
                .unwrap_err()
                .to_string(),
            "choose: invalid shape for output array."
        );
        assert_eq!(
            choose(&arr(&[0]), &[], None, ClipMode::Raise).unwrap_err(),
            SelectError::NoChoices
        );
    }
}
