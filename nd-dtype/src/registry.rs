//! Default casting oracle with user-defined type registration.

use std::collections::HashMap;

use crate::casting::{builtin_can_cast, builtin_promote, CastOracle, CastingRule};
use crate::{Descr, DtypeError, Result, TypeNum};

/// Built-in types plus any registered user-defined types and the casts
/// declared for them.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    user: Vec<Descr>,
    casts: HashMap<(TypeNum, TypeNum), CastingRule>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user-defined type and return the tag assigned to it.
    ///
    /// Tags are handed out in registration order starting at
    /// [`TypeNum::USERDEF`].
    pub fn register_user_type(&mut self, descr: Descr) -> Result<TypeNum> {
        if descr.elsize() == 0 {
            return Err(DtypeError::InvalidUserType(descr.name().to_string()));
        }
        if self.user.iter().any(|d| d.name() == descr.name()) {
            return Err(DtypeError::DuplicateUserType(descr.name().to_string()));
        }
        let tag = TypeNum(TypeNum::USERDEF + self.user.len() as u16);
        log::debug!("registered user type {} as {}", descr.name(), tag.0);
        self.user.push(descr.with_type_num(tag));
        Ok(tag)
    }

    pub fn user_descr(&self, type_num: TypeNum) -> Option<&Descr> {
        if !type_num.is_user_defined() {
            return None;
        }
        self.user.get((type_num.0 - TypeNum::USERDEF) as usize)
    }

    /// Declare that `from` casts to `to` under `rule` (and every looser rule).
    pub fn register_cast(&mut self, from: TypeNum, to: TypeNum, rule: CastingRule) {
        self.casts.insert((from, to), rule);
    }
}

impl CastOracle for TypeRegistry {
    fn descr_from_type(&self, type_num: TypeNum) -> Result<Descr> {
        if type_num.is_builtin() {
            return Descr::from_type(type_num);
        }
        self.user_descr(type_num)
            .cloned()
            .ok_or(DtypeError::UnknownType(type_num))
    }

    fn can_cast_type_to(&self, from: &Descr, to: &Descr, rule: CastingRule) -> bool {
        if from.type_num().is_builtin() && to.type_num().is_builtin() {
            return builtin_can_cast(from, to, rule);
        }
        match rule {
            CastingRule::No => from == to,
            CastingRule::Equiv => from.equivalent(to),
            CastingRule::Unsafe => true,
            _ => {
                from.equivalent(to)
                    || self
                        .casts
                        .get(&(from.type_num(), to.type_num()))
                        .is_some_and(|&r| r <= rule)
            }
        }
    }

    fn promote_types(&self, a: &Descr, b: &Descr) -> Result<Descr> {
        if a.type_num().is_builtin() && b.type_num().is_builtin() {
            return builtin_promote(a, b);
        }
        if self.can_cast_type_to(b, a, CastingRule::Safe) {
            return Ok(a.ensure_native());
        }
        if self.can_cast_type_to(a, b, CastingRule::Safe) {
            return Ok(b.ensure_native());
        }
        Err(DtypeError::InvalidPromotion(a.to_string(), b.to_string()))
    }
}
