//! Generic type resolution: linear search over user loops and table rows.

use nd_dtype::{should_use_min_scalar, CastOperand, CastOracle, CastingRule, Descr, DtypeError, TypeNum};

use crate::ufunc::{InnerLoop, Resolved, TypeSpec, TypeTup, Ufunc};
use crate::{Result, UfuncError};

/// Check the operand count and collect the (required) inputs.
pub(crate) fn inputs<'a>(
    ufunc: &Ufunc,
    operands: &[Option<&'a dyn CastOperand>],
) -> Result<Vec<&'a dyn CastOperand>> {
    if operands.len() != ufunc.nargs() {
        return Err(UfuncError::OperandCount {
            name: ufunc.name().to_string(),
            expected: ufunc.nargs(),
            got: operands.len(),
        });
    }
    operands[..ufunc.nin()]
        .iter()
        .enumerate()
        .map(|(index, op)| {
            op.ok_or_else(|| UfuncError::MissingInput {
                name: ufunc.name().to_string(),
                index,
            })
        })
        .collect()
}

/// Resolution used when a ufunc has no specialized resolver.
///
/// Inputs are matched with `min(casting, safe)`, outputs with `casting`.
/// An explicit `type_tup` selects the row by signature instead.
pub fn default_type_resolution(
    ufunc: &Ufunc,
    casting: CastingRule,
    operands: &[Option<&dyn CastOperand>],
    type_tup: Option<&TypeTup>,
    oracle: &dyn CastOracle,
) -> Result<Resolved> {
    inputs(ufunc, operands)?;
    let input_casting = casting.min(CastingRule::Safe);
    let any_object = operands
        .iter()
        .flatten()
        .any(|op| op.descr().type_num().is_object());
    match type_tup {
        None => find_best_inner_loop(ufunc, operands, input_casting, casting, any_object, oracle),
        Some(tt) => find_specified_inner_loop(ufunc, tt, operands, casting, any_object, oracle),
    }
}

/// First output cast failure seen during a search, for the error message.
#[derive(Default)]
struct OutputMiss(Option<(char, char)>);

/// Whether the operands can run the loop with signature `types`.
#[allow(clippy::too_many_arguments)]
fn loop_matches(
    ufunc: &Ufunc,
    operands: &[Option<&dyn CastOperand>],
    input_casting: CastingRule,
    output_casting: CastingRule,
    any_object: bool,
    use_min_scalar: bool,
    types: &[TypeNum],
    miss: &mut OutputMiss,
    oracle: &dyn CastOracle,
) -> Result<bool> {
    let nin = ufunc.nin();
    for (i, op) in operands[..nin].iter().enumerate() {
        let Some(op) = op else { continue };
        // Object loops are only reached through object operands when there
        // is more than one loop to choose from.
        if types[i] == TypeNum::OBJECT && !any_object && ufunc.ntypes() > 1 {
            return Ok(false);
        }
        let target = oracle.descr_from_type(types[i])?;
        let ok = if use_min_scalar {
            oracle.can_cast_array_to(*op, &target, input_casting)
        } else {
            oracle.can_cast_type_to(op.descr(), &target, input_casting)
        };
        if !ok {
            return Ok(false);
        }
    }
    for (i, op) in operands.iter().enumerate().skip(nin) {
        let Some(op) = op else { continue };
        let src = oracle.descr_from_type(types[i])?;
        if !oracle.can_cast_type_to(&src, op.descr(), output_casting) {
            if miss.0.is_none() {
                miss.0 = Some((src.type_char(), op.descr().type_char()));
            }
            return Ok(false);
        }
    }
    Ok(true)
}

fn loop_dtypes(types: &[TypeNum], oracle: &dyn CastOracle) -> Result<Vec<Descr>> {
    types
        .iter()
        .map(|&t| oracle.descr_from_type(t).map_err(UfuncError::from))
        .collect()
}

/// User-defined input tags in order, skipping immediate repeats.
fn user_tags(inputs: &[&dyn CastOperand]) -> Vec<TypeNum> {
    let mut last = None;
    let mut tags = Vec::new();
    for op in inputs {
        let t = op.descr().type_num();
        if Some(t) != last && t.is_user_defined() {
            last = Some(t);
            tags.push(t);
        }
    }
    tags
}

#[allow(clippy::too_many_arguments)]
fn find_matching_user_loop(
    ufunc: &Ufunc,
    operands: &[Option<&dyn CastOperand>],
    input_casting: CastingRule,
    output_casting: CastingRule,
    any_object: bool,
    use_min_scalar: bool,
    miss: &mut OutputMiss,
    oracle: &dyn CastOracle,
) -> Result<Option<Resolved>> {
    for tag in user_tags(&inputs(ufunc, operands)?) {
        for user in ufunc.user_loops(tag) {
            let types = user.arg_types();
            if loop_matches(
                ufunc,
                operands,
                input_casting,
                output_casting,
                any_object,
                use_min_scalar,
                types,
                miss,
                oracle,
            )? {
                log::debug!("ufunc {}: user loop {:?} selected", ufunc.name(), types);
                return Ok(Some(Resolved {
                    dtypes: loop_dtypes(types, oracle)?,
                    inner_loop: user.inner_loop().clone(),
                }));
            }
        }
    }
    Ok(None)
}

/// Linear search for the first loop all operands can be cast to.
///
/// User loops of the inputs' user-defined types are tried first, then the
/// table rows in declaration order. Value-based casting of 0-d inputs is
/// used when [`should_use_min_scalar`] says so.
pub fn find_best_inner_loop(
    ufunc: &Ufunc,
    operands: &[Option<&dyn CastOperand>],
    input_casting: CastingRule,
    output_casting: CastingRule,
    any_object: bool,
    oracle: &dyn CastOracle,
) -> Result<Resolved> {
    let ins = inputs(ufunc, operands)?;
    let use_min_scalar = should_use_min_scalar(&ins);
    let mut miss = OutputMiss::default();

    if ufunc.has_user_loops() {
        if let Some(found) = find_matching_user_loop(
            ufunc,
            operands,
            input_casting,
            output_casting,
            any_object,
            use_min_scalar,
            &mut miss,
            oracle,
        )? {
            return Ok(found);
        }
    }

    for i in 0..ufunc.ntypes() {
        let types = ufunc.row(i);
        if loop_matches(
            ufunc,
            operands,
            input_casting,
            output_casting,
            any_object,
            use_min_scalar,
            types,
            &mut miss,
            oracle,
        )? {
            log::debug!("ufunc {}: row {} {:?} selected", ufunc.name(), i, types);
            return Ok(Resolved {
                dtypes: loop_dtypes(types, oracle)?,
                inner_loop: ufunc.inner_loop(i).clone(),
            });
        }
    }

    let name = ufunc.name().to_string();
    Err(match miss.0 {
        Some((src, dst)) => UfuncError::OutputCoercion {
            name,
            src,
            dst,
            rule: output_casting,
        },
        None => UfuncError::UnsupportedInputTypes {
            name,
            rule: input_casting,
        },
    })
}

fn spec_type(spec: &TypeSpec) -> Result<TypeNum> {
    match spec {
        TypeSpec::Descr(d) => Ok(d.type_num()),
        TypeSpec::Code(c) => Ok(TypeNum::from_type_char(*c).ok_or(DtypeError::UnknownTypecode(*c))?),
    }
}

/// Tags named by `type_tup`: either one (the first output) or all `nargs`.
fn specified_types(ufunc: &Ufunc, type_tup: &TypeTup) -> Result<Vec<TypeNum>> {
    let (nin, nop) = (ufunc.nin(), ufunc.nargs());
    match type_tup {
        TypeTup::Tuple(items) => {
            if items.len() != 1 && items.len() != nop {
                return Err(UfuncError::BadTypeTupleLength {
                    name: ufunc.name().to_string(),
                    nop,
                });
            }
            items.iter().map(spec_type).collect()
        }
        TypeTup::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let well_formed = chars.len() == 1
                || (chars.len() == nop + 2 && chars[nin] == '-' && chars[nin + 1] == '>');
            if !well_formed {
                return Err(UfuncError::BadTypeString {
                    name: ufunc.name().to_string(),
                    nin,
                    nout: ufunc.nout(),
                });
            }
            let codes: Vec<char> = if chars.len() == 1 {
                chars
            } else {
                (0..nop)
                    .map(|i| if i < nin { chars[i] } else { chars[i + 2] })
                    .collect()
            };
            codes
                .into_iter()
                .map(|c| spec_type(&TypeSpec::Code(c)))
                .collect()
        }
    }
}

/// A single specified tag is compared with the first output slot; a full
/// signature with every slot.
fn signature_matches(types: &[TypeNum], specified: &[TypeNum], nin: usize) -> bool {
    if specified.len() == types.len() {
        types == specified
    } else {
        types[nin] == specified[0]
    }
}

/// Search for the loop named by an explicit signature.
///
/// Candidates are filtered by exact tag match first; a candidate that
/// matches the signature but cannot be cast to under `casting` is an error
/// rather than a reason to keep looking.
pub fn find_specified_inner_loop(
    ufunc: &Ufunc,
    type_tup: &TypeTup,
    operands: &[Option<&dyn CastOperand>],
    casting: CastingRule,
    any_object: bool,
    oracle: &dyn CastOracle,
) -> Result<Resolved> {
    let ins = inputs(ufunc, operands)?;
    let use_min_scalar = should_use_min_scalar(&ins);
    let specified = specified_types(ufunc, type_tup)?;
    let nin = ufunc.nin();
    let mut miss = OutputMiss::default();

    if ufunc.has_user_loops() {
        for tag in user_tags(&ins) {
            for user in ufunc.user_loops(tag) {
                let types = user.arg_types();
                if !signature_matches(types, &specified, nin) {
                    continue;
                }
                if !loop_matches(
                    ufunc, operands, casting, casting, any_object, use_min_scalar, types,
                    &mut miss, oracle,
                )? {
                    return Err(UfuncError::SpecifiedLoopCasting {
                        name: ufunc.name().to_string(),
                        kind: "user loop",
                    });
                }
                log::debug!("ufunc {}: specified user loop {:?}", ufunc.name(), types);
                return Ok(Resolved {
                    dtypes: loop_dtypes(types, oracle)?,
                    inner_loop: user.inner_loop().clone(),
                });
            }
        }
    }

    for i in 0..ufunc.ntypes() {
        let types = ufunc.row(i);
        if !signature_matches(types, &specified, nin) {
            continue;
        }
        if !loop_matches(
            ufunc, operands, casting, casting, any_object, use_min_scalar, types, &mut miss,
            oracle,
        )? {
            return Err(UfuncError::SpecifiedLoopCasting {
                name: ufunc.name().to_string(),
                kind: "loop",
            });
        }
        log::debug!("ufunc {}: specified row {} {:?}", ufunc.name(), i, types);
        return Ok(Resolved {
            dtypes: loop_dtypes(types, oracle)?,
            inner_loop: ufunc.inner_loop(i).clone(),
        });
    }

    Err(UfuncError::NoMatchingSignature {
        name: ufunc.name().to_string(),
    })
}

/// Check that the inputs cast to `dtypes` (value-aware) and that `dtypes`
/// cast to every provided output, both under `casting`.
pub fn validate_casting(
    ufunc: &Ufunc,
    casting: CastingRule,
    operands: &[Option<&dyn CastOperand>],
    dtypes: &[Descr],
    oracle: &dyn CastOracle,
) -> Result<()> {
    let nin = ufunc.nin();
    for (i, op) in operands.iter().enumerate() {
        let Some(op) = op else { continue };
        if i < nin {
            if !oracle.can_cast_array_to(*op, &dtypes[i], casting) {
                return Err(UfuncError::InputCast {
                    name: ufunc.name().to_string(),
                    from: op.descr().to_string(),
                    to: dtypes[i].to_string(),
                    rule: casting,
                });
            }
        } else if !oracle.can_cast_type_to(&dtypes[i], op.descr(), casting) {
            return Err(UfuncError::OutputCast {
                name: ufunc.name().to_string(),
                from: dtypes[i].to_string(),
                to: op.descr().to_string(),
                rule: casting,
            });
        }
    }
    Ok(())
}

/// The row whose leading tags equal `lead`, if any.
pub(crate) fn find_row(ufunc: &Ufunc, lead: &[TypeNum]) -> Option<InnerLoop> {
    (0..ufunc.ntypes())
        .find(|&i| ufunc.row(i).starts_with(lead))
        .map(|i| ufunc.inner_loop(i).clone())
}
